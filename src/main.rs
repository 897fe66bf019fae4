use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use inkmark::{
    Config, ExportJob, ExportOptions, Exporter, ImageSource, PreviewModel,
    data_url::data_url_for_file,
    export::DecodeOutcome,
    filter::compute_filter,
    preview::PreviewMetrics,
    render::{
        Canvas, FontProvider, FontTypeface, NEUTRAL_BRIGHTNESS, SingleFace, decode_logo,
        font_size_for,
    },
    startup_checks,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a watermarked JPEG
    Export {
        /// Base image
        #[arg(short, long)]
        input: PathBuf,

        /// Job file with [watermark] and [adjustments] tables
        #[arg(short, long)]
        job: PathBuf,

        /// Where to write the JPEG
        #[arg(short, long)]
        output: PathBuf,

        /// Extra logo files, appended after the job's logos
        #[arg(long)]
        logo: Vec<PathBuf>,

        /// Override the configured device pixel ratio
        #[arg(long)]
        dpr: Option<f32>,

        /// Use this font file for every family and weight
        #[arg(long)]
        font: Option<PathBuf>,
    },

    /// Print the CSS filter expression for a job's adjustments
    Filter {
        #[arg(short, long)]
        job: PathBuf,
    },

    /// Print the live preview model for a job as JSON
    Preview {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        job: PathBuf,

        #[arg(long)]
        font: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set up logging first
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Export {
            input,
            job,
            output,
            logo,
            dpr,
            font,
        } => run_export(cli.config, input, job, output, logo, dpr, font).await,
        Commands::Filter { job } => {
            let job = ExportJob::load(&job)?;
            println!("{}", compute_filter(&job.adjustments).to_css());
            Ok(())
        }
        Commands::Preview { input, job, font } => run_preview(cli.config, input, job, font).await,
    }
}

fn font_provider(
    config: &Config,
    font: Option<PathBuf>,
) -> Result<Arc<dyn FontProvider>, Box<dyn std::error::Error>> {
    Ok(match font {
        Some(path) => {
            info!("Using font {:?} for all text", path);
            Arc::new(SingleFace(Arc::new(FontTypeface::from_file(&path)?)))
        }
        None => Arc::new(config.font_library()),
    })
}

async fn run_export(
    config_path: PathBuf,
    input: PathBuf,
    job_path: PathBuf,
    output: PathBuf,
    logos: Vec<PathBuf>,
    dpr: Option<f32>,
    font: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load(&config_path)?;
    if let Some(dpr) = dpr {
        config.export.device_pixel_ratio = dpr;
    }

    if let Err(errors) = startup_checks::perform_startup_checks(&config).await {
        for error in &errors {
            warn!("Startup check failed: {}", error);
        }
        if errors.iter().any(|e| e.is_critical()) {
            return Err("Critical startup check failed".into());
        }
    }

    let job = ExportJob::load(&job_path)?;
    let mut session = job.session();
    let mut data_urls = Vec::new();
    for path in &logos {
        data_urls.push(data_url_for_file(path)?);
    }
    if !data_urls.is_empty() {
        let ids = session.add_logos(data_urls);
        info!("Added logos {:?}", ids);
    }

    let exporter = Exporter::new(font_provider(&config, font)?)
        .with_options(ExportOptions::from(&config.export));

    info!("Exporting {:?} with {:?}", input, job_path);
    let exported = exporter
        .export(
            ImageSource::from_path(&input),
            session.config(),
            session.adjustments(),
            &CancellationToken::new(),
        )
        .await?;

    tokio::fs::write(&output, &exported.bytes).await?;
    info!(
        "Wrote {}x{} JPEG to {:?}",
        exported.width, exported.height, output
    );
    Ok(())
}

async fn run_preview(
    config_path: PathBuf,
    input: PathBuf,
    job_path: PathBuf,
    font: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(&config_path)?;
    let job = ExportJob::load(&job_path)?;

    let source = match ImageSource::from_path(&input)
        .decode(&CancellationToken::new())
        .await
    {
        DecodeOutcome::Ready(source) => source,
        DecodeOutcome::Aborted => return Err("Image decode aborted".into()),
        DecodeOutcome::Failed(e) => return Err(e.into()),
    };

    let mut canvas = Canvas::from_image(&source.image, 1.0);
    canvas.apply_filter(&compute_filter(&job.adjustments));
    let brightness = canvas.average_brightness().unwrap_or(NEUTRAL_BRIGHTNESS);

    let watermark = job.watermark.normalized();
    let font_size = font_size_for(source.width() as f32, watermark.size);
    let text_width = font_provider(&config, font)?
        .typeface(watermark.font_family, watermark.font_weight)
        .map(|face| face.text_width(&watermark.text, font_size))
        .unwrap_or(0.0);

    let companion_size = match watermark.logo_url.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => match decode_logo(url) {
            Ok(logo) => Some(logo.dimensions()),
            Err(e) => {
                warn!("Could not decode legacy logo for preview: {}", e);
                None
            }
        },
        None => None,
    };

    let model = PreviewModel::derive_measured(
        &job.watermark,
        &job.adjustments,
        source.width(),
        source.height(),
        &PreviewMetrics {
            text_width,
            brightness,
            companion_size,
        },
        &[],
    );
    println!("{}", serde_json::to_string_pretty(&model)?);
    Ok(())
}
