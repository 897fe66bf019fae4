use thiserror::Error;

/// Errors that reject an export call.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Image load error: {0}")]
    ImageLoad(#[from] ImageLoadError),

    /// The source was withdrawn while it was still decoding. Retry with a fresh source.
    #[error("Image decode aborted")]
    Aborted,

    #[error("Encoding error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ExportError {
    /// Whether the caller should retry instead of reporting a failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExportError::Aborted)
    }
}

#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    DecodeError(#[from] image::ImageError),

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Image has no pixels")]
    EmptyImage,
}

#[derive(Debug, Error)]
pub enum LogoLoadError {
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Decode error: {0}")]
    DecodeError(#[from] image::ImageError),

    #[error("SVG error: {0}")]
    SvgError(String),

    #[error("Logo loader task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum FaceDetectionError {
    #[error("Face model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PixelSampleError {
    #[error("Pixel readback is not permitted for this source")]
    ReadbackBlocked,

    #[error("Canvas has no pixels to sample")]
    Empty,
}

#[derive(Debug, Error)]
pub enum FontError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse font {0}")]
    InvalidFont(String),

    #[error("No font file found for {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml_edit::de::Error),

    #[error("Duplicate logo id: {0}")]
    DuplicateLogoId(String),
}
