use crate::Config;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Font directory does not exist: {0}")]
    FontDirectoryMissing(String),

    #[error("Fallback font missing: {0}")]
    FallbackFontMissing(String),

    #[error("Invalid export option: {0}")]
    InvalidExportOption(String),
}

impl StartupCheckError {
    /// Critical errors make every export wrong, not just unstyled.
    pub fn is_critical(&self) -> bool {
        matches!(self, StartupCheckError::InvalidExportOption(_))
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let font_dir = &config.fonts.directory;
    match tokio::fs::metadata(font_dir).await {
        Ok(meta) if meta.is_dir() => info!("Font directory exists: {:?}", font_dir),
        _ => {
            warn!("Font directory does not exist: {:?}", font_dir);
            errors.push(StartupCheckError::FontDirectoryMissing(
                font_dir.display().to_string(),
            ));
        }
    }

    if let Some(fallback) = &config.fonts.fallback {
        if fallback.exists() {
            info!("Fallback font found: {:?}", fallback);
        } else {
            warn!("Fallback font missing: {:?}", fallback);
            errors.push(StartupCheckError::FallbackFontMissing(
                fallback.display().to_string(),
            ));
        }
    }

    let dpr = config.export.device_pixel_ratio;
    if !dpr.is_finite() || dpr <= 0.0 {
        error!("Device pixel ratio must be positive, got {}", dpr);
        errors.push(StartupCheckError::InvalidExportOption(format!(
            "device_pixel_ratio = {}",
            dpr
        )));
    }

    let quality = config.export.jpeg_quality;
    if !(1..=100).contains(&quality) {
        error!("JPEG quality must be within 1..=100, got {}", quality);
        errors.push(StartupCheckError::InvalidExportOption(format!(
            "jpeg_quality = {}",
            quality
        )));
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
