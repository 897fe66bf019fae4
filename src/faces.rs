use async_trait::async_trait;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::FaceDetectionError;

/// Axis-aligned face bounding box in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub top_left: [f32; 2],
    pub bottom_right: [f32; 2],
}

impl FaceRegion {
    pub fn new(top_left: [f32; 2], bottom_right: [f32; 2]) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    pub fn width(&self) -> f32 {
        (self.bottom_right[0] - self.top_left[0]).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.bottom_right[1] - self.top_left[1]).max(0.0)
    }
}

/// External face-detection capability.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn estimate_faces(&self, image: &RgbaImage) -> Result<Vec<FaceRegion>, FaceDetectionError>;
    fn name(&self) -> &str;
}

pub type DynFaceDetector = Arc<dyn FaceDetector>;

/// Wraps an optional detector so that callers always get a list back.
#[derive(Clone, Default)]
pub struct FaceRegionOracle {
    detector: Option<DynFaceDetector>,
}

impl FaceRegionOracle {
    pub fn new(detector: DynFaceDetector) -> Self {
        Self {
            detector: Some(detector),
        }
    }

    pub fn disabled() -> Self {
        Self { detector: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.detector.is_some()
    }

    /// Detect faces, degrading any failure to "no faces". Never retries.
    pub async fn detect_faces(&self, image: &RgbaImage) -> Vec<FaceRegion> {
        let Some(detector) = &self.detector else {
            debug!("No face detector configured, skipping detection");
            return Vec::new();
        };

        match detector.estimate_faces(image).await {
            Ok(faces) => {
                debug!("{} detected {} face(s)", detector.name(), faces.len());
                faces
            }
            Err(e) => {
                warn!(
                    "Face detection with {} failed, continuing without adaptive placement: {}",
                    detector.name(),
                    e
                );
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for FaceRegionOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceRegionOracle")
            .field("detector", &self.detector.as_ref().map(|d| d.name().to_string()))
            .finish()
    }
}
