use image::RgbaImage;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::data_url::DataUrl;
use crate::error::ImageLoadError;

#[derive(Debug, Clone)]
enum SourceData {
    Bytes(Vec<u8>),
    DataUrl(String),
    Path(PathBuf),
}

/// The base image for an export, still encoded.
#[derive(Debug, Clone)]
pub struct ImageSource {
    data: SourceData,
    pixel_readback: bool,
}

/// A decoded base image.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub image: RgbaImage,
    /// False when the pixels came from somewhere that forbids reading them
    /// back (a tainted canvas in browser terms).
    pub pixel_readback: bool,
}

impl SourceImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Result of decoding a source. Aborted is distinct from Failed: the former is
/// worth retrying with a fresh source, the latter is not.
#[derive(Debug)]
pub enum DecodeOutcome {
    Ready(SourceImage),
    Aborted,
    Failed(ImageLoadError),
}

impl ImageSource {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            data: SourceData::Bytes(bytes),
            pixel_readback: true,
        }
    }

    pub fn from_data_url(url: impl Into<String>) -> Self {
        Self {
            data: SourceData::DataUrl(url.into()),
            pixel_readback: true,
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            data: SourceData::Path(path.into()),
            pixel_readback: true,
        }
    }

    /// Mark the source as cross-origin: brightness sampling will be refused.
    pub fn without_pixel_readback(mut self) -> Self {
        self.pixel_readback = false;
        self
    }

    /// Decode on the blocking pool. Cancelling `cancel` while the decode is in
    /// flight yields [`DecodeOutcome::Aborted`].
    pub async fn decode(self, cancel: &CancellationToken) -> DecodeOutcome {
        if cancel.is_cancelled() {
            return DecodeOutcome::Aborted;
        }

        let pixel_readback = self.pixel_readback;
        let handle = tokio::task::spawn_blocking(move || self.decode_blocking());

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Source decode aborted");
                DecodeOutcome::Aborted
            }
            joined = handle => match joined {
                Ok(Ok(image)) => DecodeOutcome::Ready(SourceImage { image, pixel_readback }),
                Ok(Err(e)) => DecodeOutcome::Failed(e),
                Err(e) if e.is_cancelled() => DecodeOutcome::Aborted,
                Err(e) => DecodeOutcome::Failed(ImageLoadError::IoError(std::io::Error::other(e))),
            },
        }
    }

    fn decode_blocking(self) -> Result<RgbaImage, ImageLoadError> {
        let bytes = match self.data {
            SourceData::Bytes(bytes) => bytes,
            SourceData::DataUrl(url) => {
                DataUrl::parse(&url)
                    .map_err(ImageLoadError::InvalidDataUrl)?
                    .bytes
            }
            SourceData::Path(path) => std::fs::read(&path)?,
        };

        let image = image::load_from_memory(&bytes)?.to_rgba8();
        if image.width() == 0 || image.height() == 0 {
            return Err(ImageLoadError::EmptyImage);
        }
        debug!("Decoded source image {}x{}", image.width(), image.height());
        Ok(image)
    }
}
