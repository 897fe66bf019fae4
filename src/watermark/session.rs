use tracing::debug;

use super::types::{LogoPatch, NormalizedPoint, WatermarkConfig, WatermarkLogo};
use crate::faces::FaceRegion;
use crate::filter::ImageAdjustments;
use crate::preview::PreviewModel;

/// Movement reported by a gesture recognizer, already converted to image
/// fractions (`dx`, `dy`), a multiplicative `scale` and degrees of `rotation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureDelta {
    pub dx: f32,
    pub dy: f32,
    pub scale: f32,
    pub rotation: f32,
}

impl GestureDelta {
    pub fn translate(dx: f32, dy: f32) -> Self {
        Self {
            dx,
            dy,
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

/// The single authoritative watermark/adjustment state of one editing session.
/// Preview and export both read from it; nothing else holds a copy that can drift.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    config: WatermarkConfig,
    adjustments: ImageAdjustments,
}

impl EditSession {
    pub fn new(config: WatermarkConfig, adjustments: ImageAdjustments) -> Self {
        Self {
            config,
            adjustments,
        }
    }

    pub fn config(&self) -> &WatermarkConfig {
        &self.config
    }

    pub fn adjustments(&self) -> &ImageAdjustments {
        &self.adjustments
    }

    pub fn update_config(&mut self, update: impl FnOnce(&mut WatermarkConfig)) {
        update(&mut self.config);
    }

    pub fn set_adjustments(&mut self, adjustments: ImageAdjustments) {
        self.adjustments = adjustments;
    }

    /// Register freshly uploaded logos, returning their new ids in upload order.
    pub fn add_logos<I, S>(&mut self, data_urls: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stamp = chrono::Utc::now().timestamp_millis();
        let mut ids = Vec::new();

        for (index, data_url) in data_urls.into_iter().enumerate() {
            let mut id = format!("logo-{}-{}", stamp, index);
            let mut bump = 0;
            while self.config.logo(&id).is_some() {
                bump += 1;
                id = format!("logo-{}-{}-{}", stamp, index, bump);
            }

            self.config.logos.push(WatermarkLogo {
                id: id.clone(),
                data_url: data_url.into(),
                ..Default::default()
            });
            ids.push(id);
        }

        debug!("Added {} logo(s) to session", ids.len());
        ids
    }

    /// Programmatic update. Applies even to locked logos.
    pub fn update_logo(&mut self, id: &str, patch: &LogoPatch) -> bool {
        match self.config.logos.iter_mut().find(|logo| logo.id == id) {
            Some(logo) => {
                *logo = logo.merged(patch).normalized();
                true
            }
            None => false,
        }
    }

    /// Interactive move from a gesture. Locked logos ignore it.
    pub fn move_logo(&mut self, id: &str, delta: GestureDelta) -> bool {
        let Some(logo) = self.config.logo(id) else {
            return false;
        };
        if logo.locked {
            debug!("Ignoring gesture on locked logo {}", id);
            return false;
        }

        let patch = LogoPatch {
            position: Some(NormalizedPoint::new(
                logo.position.x + delta.dx,
                logo.position.y + delta.dy,
            )),
            size: Some(logo.size * delta.scale),
            rotation: Some(logo.rotation + delta.rotation),
            ..Default::default()
        };
        self.update_logo(id, &patch)
    }

    pub fn remove_logo(&mut self, id: &str) -> bool {
        let before = self.config.logos.len();
        self.config.logos.retain(|logo| logo.id != id);
        before != self.config.logos.len()
    }

    /// Restore the default watermark, dropping every logo.
    pub fn reset_config(&mut self) {
        self.config = WatermarkConfig::default();
    }

    /// Restore every adjustment at once.
    pub fn reset_adjustments(&mut self) {
        self.adjustments = ImageAdjustments::default();
    }

    pub fn preview(
        &self,
        image_width: u32,
        image_height: u32,
        text_width: f32,
        faces: &[FaceRegion],
    ) -> PreviewModel {
        PreviewModel::derive(
            &self.config,
            &self.adjustments,
            image_width,
            image_height,
            text_width,
            faces,
        )
    }
}
