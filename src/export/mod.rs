// Export pipeline - decode, filter, place, composite and encode
pub mod jpeg;
pub mod source;

pub use source::{DecodeOutcome, ImageSource, SourceImage};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::ExportError;
use crate::faces::{DynFaceDetector, FaceRegionOracle};
use crate::filter::{ImageAdjustments, compute_filter};
use crate::placement::{PlacementTarget, resolve};
use crate::render::logo::{keep_decoded, load_logos};
use crate::render::{Canvas, FontProvider, NEUTRAL_BRIGHTNESS, Overlay, composite_overlay};
use crate::watermark::{PatternMode, WatermarkConfig};

pub const JPEG_MIME: &str = "image/jpeg";
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExportStage {
    Idle,
    LoadingImage,
    Filtering,
    SamplingBrightness,
    ResolvingPlacement,
    DetectingFaces,
    Compositing,
    LoadingLogo,
    Rasterizing,
    Done,
    Failed,
}

/// Records the stages one export walks through.
#[derive(Debug)]
struct StageLog {
    stages: Vec<ExportStage>,
}

impl StageLog {
    fn new() -> Self {
        Self {
            stages: vec![ExportStage::Idle],
        }
    }

    fn enter(&mut self, stage: ExportStage) {
        if let Some(previous) = self.stages.last() {
            debug!("Export stage {:?} -> {:?}", previous, stage);
        }
        self.stages.push(stage);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    pub device_pixel_ratio: f32,
    pub jpeg_quality: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl From<&crate::ExportConfig> for ExportOptions {
    fn from(config: &crate::ExportConfig) -> Self {
        Self {
            device_pixel_ratio: config.device_pixel_ratio,
            jpeg_quality: config.jpeg_quality,
        }
    }
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Where the text unit ended up; `None` in pattern mode.
    pub placement: Option<PlacementTarget>,
    pub stages: Vec<ExportStage>,
}

impl ExportedImage {
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", JPEG_MIME, STANDARD.encode(&self.bytes))
    }
}

/// Produces the final watermarked JPEG. Holds no per-export state, so one
/// exporter can serve concurrent exports.
#[derive(Clone)]
pub struct Exporter {
    fonts: Arc<dyn FontProvider>,
    faces: FaceRegionOracle,
    options: ExportOptions,
}

impl Exporter {
    pub fn new(fonts: Arc<dyn FontProvider>) -> Self {
        Self {
            fonts,
            faces: FaceRegionOracle::disabled(),
            options: ExportOptions::default(),
        }
    }

    pub fn with_face_detector(mut self, detector: DynFaceDetector) -> Self {
        self.faces = FaceRegionOracle::new(detector);
        self
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Run the whole pipeline. Only an undecodable source
    /// ([`ExportError::ImageLoad`]) or an aborted decode
    /// ([`ExportError::Aborted`]) fail the export; face detection, pixel
    /// readback and logo problems degrade the result instead.
    pub async fn export(
        &self,
        source: ImageSource,
        config: &WatermarkConfig,
        adjustments: &ImageAdjustments,
        cancel: &CancellationToken,
    ) -> Result<ExportedImage, ExportError> {
        let mut stages = StageLog::new();
        match self.run(&mut stages, source, config, adjustments, cancel).await {
            Ok((bytes, width, height, placement)) => {
                stages.enter(ExportStage::Done);
                info!("Exported {}x{} JPEG ({} bytes)", width, height, bytes.len());
                Ok(ExportedImage {
                    bytes,
                    width,
                    height,
                    placement,
                    stages: stages.stages,
                })
            }
            Err(e) => {
                stages.enter(ExportStage::Failed);
                if e.is_retryable() {
                    info!("Export aborted, source may be retried: {}", e);
                } else {
                    error!("Export failed: {}", e);
                }
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        stages: &mut StageLog,
        source: ImageSource,
        config: &WatermarkConfig,
        adjustments: &ImageAdjustments,
        cancel: &CancellationToken,
    ) -> Result<(Vec<u8>, u32, u32, Option<PlacementTarget>), ExportError> {
        let config = config.normalized();
        if let Err(e) = config.validate() {
            warn!("Watermark configuration is inconsistent: {}", e);
        }

        stages.enter(ExportStage::LoadingImage);
        let source = match source.decode(cancel).await {
            DecodeOutcome::Ready(source) => Arc::new(source),
            DecodeOutcome::Aborted => return Err(ExportError::Aborted),
            DecodeOutcome::Failed(e) => return Err(e.into()),
        };
        let (width, height) = (source.width() as f32, source.height() as f32);

        stages.enter(ExportStage::Filtering);
        let expression = compute_filter(adjustments);
        debug!("Export filter: {}", expression.to_css());
        let device_pixel_ratio = self.options.device_pixel_ratio;
        let filter_source = source.clone();
        let canvas = tokio::task::spawn_blocking(move || {
            let mut canvas = Canvas::from_image(&filter_source.image, device_pixel_ratio);
            canvas.set_readback(filter_source.pixel_readback);
            canvas.apply_filter(&expression);
            canvas
        })
        .await?;

        stages.enter(ExportStage::SamplingBrightness);
        let brightness = match canvas.average_brightness() {
            Ok(brightness) => brightness,
            Err(e) => {
                warn!(
                    "Could not sample background brightness, assuming {}: {}",
                    NEUTRAL_BRIGHTNESS, e
                );
                NEUTRAL_BRIGHTNESS
            }
        };

        let placement = if config.pattern == PatternMode::None {
            stages.enter(ExportStage::ResolvingPlacement);
            let faces = if config.ai_placement && config.custom_position.is_none() {
                stages.enter(ExportStage::DetectingFaces);
                self.faces.detect_faces(&source.image).await
            } else {
                Vec::new()
            };
            Some(resolve(
                config.position,
                width,
                height,
                &faces,
                config.ai_placement,
                config.custom_position,
            ))
        } else {
            None
        };

        stages.enter(ExportStage::Compositing);
        let legacy_url = config.logo_url.clone().filter(|url| !url.is_empty());
        let mut urls: Vec<String> = legacy_url.iter().cloned().collect();
        urls.extend(config.logos.iter().map(|logo| logo.data_url.clone()));

        let (companion, logos) = if urls.is_empty() {
            (None, Vec::new())
        } else {
            stages.enter(ExportStage::LoadingLogo);
            let mut decoded = load_logos(urls).await;
            let companion = if legacy_url.is_some() {
                match decoded.remove(0) {
                    Ok(image) => Some(image),
                    Err(e) => {
                        warn!("Skipping legacy logo: {}", e);
                        None
                    }
                }
            } else {
                None
            };
            (companion, keep_decoded(&config.logos, decoded))
        };

        let fonts = self.fonts.clone();
        let target = placement.unwrap_or(PlacementTarget::Anchor(config.position));
        let composited = tokio::task::spawn_blocking(move || {
            let face = fonts.typeface(config.font_family, config.font_weight);
            let mut canvas = canvas;
            composite_overlay(
                &mut canvas,
                &Overlay {
                    face: face.as_deref(),
                    config: &config,
                    target,
                    brightness,
                    companion: companion.as_ref(),
                    logos: &logos,
                },
            );
            canvas
        })
        .await?;

        stages.enter(ExportStage::Rasterizing);
        let quality = self.options.jpeg_quality;
        let image = composited.into_image();
        let (out_width, out_height) = image.dimensions();
        let bytes =
            tokio::task::spawn_blocking(move || jpeg::encode_jpeg(&image, quality)).await??;

        Ok((bytes, out_width, out_height, placement))
    }
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("faces", &self.faces)
            .field("options", &self.options)
            .finish()
    }
}
