use ab_glyph::{FontVec, PxScale};
use image::{GrayImage, Luma};
use imageproc::drawing::{draw_text_mut, text_size};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use crate::error::FontError;
use crate::watermark::{FontFamily, FontWeight};

/// A face that can measure and rasterize a single line of text.
pub trait Typeface: Send + Sync {
    /// Advance width of `text` at `font_size` pixels.
    fn text_width(&self, text: &str, font_size: f32) -> f32;

    /// Coverage mask for `text` at `font_size` pixels. The mask is
    /// `ceil(font_size)` rows tall and its last row is the text's bottom edge.
    fn rasterize(&self, text: &str, font_size: f32) -> GrayImage;
}

/// Resolves the face for a family/weight pair.
pub trait FontProvider: Send + Sync {
    fn typeface(&self, family: FontFamily, weight: FontWeight) -> Option<Arc<dyn Typeface>>;
}

pub struct FontTypeface {
    font: FontVec,
    name: String,
}

impl FontTypeface {
    pub fn from_file(path: &Path) -> Result<Self, FontError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data, path.display().to_string())
    }

    pub fn from_bytes(data: Vec<u8>, name: impl Into<String>) -> Result<Self, FontError> {
        let name = name.into();
        let font = FontVec::try_from_vec(data).map_err(|_| FontError::InvalidFont(name.clone()))?;
        Ok(Self { font, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Typeface for FontTypeface {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text_size(PxScale::from(font_size), &self.font, text).0 as f32
    }

    fn rasterize(&self, text: &str, font_size: f32) -> GrayImage {
        let scale = PxScale::from(font_size);
        let (width, _) = text_size(scale, &self.font, text);
        let height = font_size.ceil().max(1.0) as u32;
        let mut mask = GrayImage::new(width.max(1), height);
        draw_text_mut(&mut mask, Luma([255u8]), 0, 0, scale, &self.font, text);
        mask
    }
}

/// One face for every family and weight.
pub struct SingleFace(pub Arc<dyn Typeface>);

impl FontProvider for SingleFace {
    fn typeface(&self, _family: FontFamily, _weight: FontWeight) -> Option<Arc<dyn Typeface>> {
        Some(self.0.clone())
    }
}

/// Font files laid out as `<directory>/<Family>-<Weight>.ttf`.
pub struct FontLibrary {
    directory: PathBuf,
    fallback: Option<PathBuf>,
    cache: RwLock<HashMap<(FontFamily, FontWeight), Arc<FontTypeface>>>,
}

impl FontLibrary {
    pub fn new(directory: impl Into<PathBuf>, fallback: Option<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            fallback,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Files tried for a family/weight, most specific first.
    pub fn candidates(&self, family: FontFamily, weight: FontWeight) -> Vec<PathBuf> {
        let mut paths = vec![self.directory.join(format!(
            "{}-{}.ttf",
            family.file_stem(),
            weight.file_suffix()
        ))];
        if weight != FontWeight::Regular {
            paths.push(
                self.directory
                    .join(format!("{}-Regular.ttf", family.file_stem())),
            );
        }
        if let Some(fallback) = &self.fallback {
            paths.push(fallback.clone());
        }
        paths
    }

    pub fn load(&self, family: FontFamily, weight: FontWeight) -> Result<Arc<FontTypeface>, FontError> {
        if let Ok(cache) = self.cache.read()
            && let Some(face) = cache.get(&(family, weight))
        {
            return Ok(face.clone());
        }

        let path = self
            .candidates(family, weight)
            .into_iter()
            .find(|path| path.exists())
            .ok_or_else(|| FontError::NotFound(format!("{:?} {}", family, weight.value())))?;

        debug!("Loading font {:?} for {:?} {}", path, family, weight.value());
        let face = Arc::new(FontTypeface::from_file(&path)?);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert((family, weight), face.clone());
        }
        Ok(face)
    }
}

impl FontProvider for FontLibrary {
    fn typeface(&self, family: FontFamily, weight: FontWeight) -> Option<Arc<dyn Typeface>> {
        match self.load(family, weight) {
            Ok(face) => Some(face),
            Err(e) => {
                warn!("Font unavailable, watermark text will be skipped: {}", e);
                None
            }
        }
    }
}
