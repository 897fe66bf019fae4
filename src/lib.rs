use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub mod data_url;
pub mod error;
pub mod export;
pub mod faces;
pub mod filter;
pub mod placement;
pub mod preview;
pub mod render;
pub mod startup_checks;
pub mod watermark;

pub use error::{
    ConfigError, ExportError, FaceDetectionError, FontError, ImageLoadError, LogoLoadError,
    PixelSampleError,
};
pub use export::{ExportOptions, ExportStage, ExportedImage, Exporter, ImageSource};
pub use faces::{DynFaceDetector, FaceDetector, FaceRegion, FaceRegionOracle};
pub use filter::{FilterExpression, FilterPreset, ImageAdjustments, compute_filter};
pub use preview::{PreviewMetrics, PreviewModel};
pub use watermark::{EditSession, WatermarkConfig, WatermarkLogo, WatermarkStyle};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub fonts: FontConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FontConfig {
    /// Directory holding `<Family>-<Weight>.ttf` files.
    pub directory: PathBuf,
    /// Used when no family file matches.
    #[serde(default)]
    pub fallback: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    pub device_pixel_ratio: f32,
    pub jpeg_quality: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Inkmark".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("fonts"),
            fallback: Some(PathBuf::from("static/DejaVuSans.ttf")),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
            jpeg_quality: export::DEFAULT_JPEG_QUALITY,
        }
    }
}

impl Config {
    /// Load from `path`, or fall back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml_edit::de::from_str::<Config>(&content)?)
    }

    pub fn font_library(&self) -> render::FontLibrary {
        render::FontLibrary::new(self.fonts.directory.clone(), self.fonts.fallback.clone())
    }
}

/// One export request as written in a job file: a `[watermark]` table
/// (with `[[watermark.logos]]`) and an `[adjustments]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportJob {
    pub watermark: WatermarkConfig,
    pub adjustments: ImageAdjustments,
}

impl ExportJob {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let job = toml_edit::de::from_str::<ExportJob>(content)?;
        job.watermark.validate()?;
        Ok(job)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn session(&self) -> EditSession {
        EditSession::new(self.watermark.clone(), self.adjustments.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watermark::{Anchor, PatternMode};
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults_when_missing() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.export.jpeg_quality, 95);
        assert_eq!(config.export.device_pixel_ratio, 1.0);
        assert_eq!(config.app.log_level, "info");
        assert_eq!(
            config.fonts.fallback,
            Some(PathBuf::from("static/DejaVuSans.ttf"))
        );
    }

    #[test]
    fn test_config_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[fonts]
directory = "/usr/share/fonts/inkmark"

[export]
device_pixel_ratio = 2.0
jpeg_quality = 90
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.fonts.directory, PathBuf::from("/usr/share/fonts/inkmark"));
        assert_eq!(config.fonts.fallback, None);
        assert_eq!(config.export.device_pixel_ratio, 2.0);
        assert_eq!(config.app.name, "Inkmark");
    }

    #[test]
    fn test_job_file() {
        let job = ExportJob::from_toml(
            r##"
[watermark]
text = "© Studio"
position = "top-right"
pattern = "border"
pattern_spacing = 60

[[watermark.logos]]
id = "logo-1"
data_url = "data:image/png;base64,AAAA"
size = 80

[adjustments]
exposure = 25
filter_preset = "golden-hour"
"##,
        )
        .unwrap();

        assert_eq!(job.watermark.text, "© Studio");
        assert_eq!(job.watermark.position, Anchor::TopRight);
        assert_eq!(job.watermark.pattern, PatternMode::Border);
        assert_eq!(job.watermark.logos[0].size, 80.0);
        assert_eq!(job.adjustments.exposure, 25.0);
        assert_eq!(job.adjustments.filter_preset, FilterPreset::GoldenHour);
        assert_eq!(job.session().config(), &job.watermark);
    }

    #[test]
    fn test_job_rejects_duplicate_logo_ids() {
        let result = ExportJob::from_toml(
            r#"
[[watermark.logos]]
id = "same"

[[watermark.logos]]
id = "same"
"#,
        );
        assert!(matches!(result, Err(ConfigError::DuplicateLogoId(_))));
    }
}
