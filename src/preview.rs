//! Live preview description. Everything here is derived on demand from the
//! session's config and adjustments through the same filter model and
//! placement resolver the exporter uses, so the two cannot disagree.

use serde::Serialize;

use crate::faces::FaceRegion;
use crate::filter::{ImageAdjustments, compute_filter};
use crate::placement::{PlacementTarget, resolve};
use crate::render::logo::{LOGO_GAP, fitted_logo_size, logo_size_for};
use crate::render::{
    NEUTRAL_BRIGHTNESS, ShadowSpec, StrokeSpec, TextLayout, TilePlacement, fill_color,
    font_size_for, pattern_unit, shadow_for, stroke_passes, tile,
};
use crate::watermark::{HexColor, HorizontalAlign, PatternMode, WatermarkConfig};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLayerStyle {
    pub text: String,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub font_size: f32,
    pub font_family: &'static str,
    pub font_weight: u16,
    pub color: String,
    /// `linear-gradient(...)` clipped to the glyphs when a gradient is set.
    pub background: Option<String>,
    pub opacity: f32,
    pub rotation: f32,
    pub mix_blend_mode: &'static str,
    pub text_shadow: String,
    /// Outlines in draw order, as `<width>px <color>`.
    pub text_strokes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogoLayerStyle {
    pub id: String,
    /// Center, in image pixels.
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub opacity: f32,
    pub rotation: f32,
    pub z_index: usize,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompanionSide {
    After,
    Before,
    Above,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanionLogoStyle {
    pub side: CompanionSide,
    pub width: f32,
    pub gap: f32,
    pub opacity: f32,
}

/// What the host measured for the preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewMetrics {
    /// Advance of the watermark text at the derived font size.
    pub text_width: f32,
    /// Sampled background brightness of the filtered image.
    pub brightness: f32,
    /// Intrinsic size of the decoded legacy logo. Treated as square when unknown.
    pub companion_size: Option<(u32, u32)>,
}

impl PreviewMetrics {
    pub fn new(text_width: f32) -> Self {
        Self {
            text_width,
            brightness: NEUTRAL_BRIGHTNESS,
            companion_size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewModel {
    pub filter: String,
    pub image_width: u32,
    pub image_height: u32,
    pub placement: Option<PlacementTarget>,
    pub text: Option<TextLayerStyle>,
    pub companion: Option<CompanionLogoStyle>,
    pub tiles: Vec<TilePlacement>,
    pub logos: Vec<LogoLayerStyle>,
}

fn rgba(color: HexColor, alpha: f32) -> String {
    format!("rgba({}, {}, {}, {:.2})", color.r, color.g, color.b, alpha)
}

// Layer opacity is applied to the whole text element, so only the pass alpha goes here.
fn css_stroke(stroke: &StrokeSpec) -> String {
    format!("{}px {}", stroke.width, rgba(stroke.color, stroke.alpha))
}

fn css_shadow(shadow: &ShadowSpec) -> String {
    if shadow.alpha <= 0.0 {
        return "none".to_string();
    }
    format!(
        "{}px {}px {}px {}",
        shadow.offset.0,
        shadow.offset.1,
        shadow.blur,
        rgba(shadow.color, shadow.alpha)
    )
}

impl PreviewModel {
    /// Preview with an unsampled background, treated as mid-gray.
    pub fn derive(
        config: &WatermarkConfig,
        adjustments: &ImageAdjustments,
        image_width: u32,
        image_height: u32,
        text_width: f32,
        faces: &[FaceRegion],
    ) -> Self {
        Self::derive_measured(
            config,
            adjustments,
            image_width,
            image_height,
            &PreviewMetrics::new(text_width),
            faces,
        )
    }

    pub fn derive_measured(
        config: &WatermarkConfig,
        adjustments: &ImageAdjustments,
        image_width: u32,
        image_height: u32,
        metrics: &PreviewMetrics,
        faces: &[FaceRegion],
    ) -> Self {
        let config = config.normalized();
        let (w, h) = (image_width as f32, image_height as f32);
        let font_size = font_size_for(w, config.size);
        let opacity = config.opacity / 100.0;
        let text_width = metrics.text_width;
        let has_companion = config.logo_url.as_ref().is_some_and(|url| !url.is_empty());
        let companion_width = logo_size_for(w, config.size);

        let logos = config
            .logos
            .iter()
            .enumerate()
            .map(|(index, logo)| LogoLayerStyle {
                id: logo.id.clone(),
                center_x: logo.position.x * w,
                center_y: logo.position.y * h,
                width: logo_size_for(w, logo.size),
                opacity: logo.opacity / 100.0,
                rotation: logo.rotation,
                z_index: index + 1,
                locked: logo.locked,
            })
            .collect();

        let mut model = PreviewModel {
            filter: compute_filter(adjustments).to_css(),
            image_width,
            image_height,
            placement: None,
            text: None,
            companion: None,
            tiles: Vec::new(),
            logos,
        };

        let companion_style = |side| CompanionLogoStyle {
            side,
            width: companion_width,
            gap: LOGO_GAP,
            opacity,
        };

        if config.pattern != PatternMode::None {
            let text = (!config.text.trim().is_empty() && text_width > 0.0)
                .then_some((text_width, font_size));
            let logo = has_companion.then(|| {
                let source = metrics.companion_size.unwrap_or((1, 1));
                fitted_logo_size(source, companion_width, 1.0)
            });
            if let Some(unit) = pattern_unit(text, logo) {
                model.tiles = tile(
                    config.pattern,
                    unit,
                    config.pattern_spacing,
                    config.rotation,
                    w,
                    h,
                );
            }
            if has_companion {
                model.companion = Some(companion_style(CompanionSide::Before));
            }
            return model;
        }

        let target = resolve(
            config.position,
            w,
            h,
            faces,
            config.ai_placement,
            config.custom_position,
        );
        let layout = TextLayout::new(target, w, h, text_width, font_size);
        let bounds = layout.bounds();
        let fill = fill_color(&config, metrics.brightness);

        let background = match (config.gradient_from, config.gradient_to) {
            (Some(from), Some(to)) => Some(format!("linear-gradient(90deg, {}, {})", from, to)),
            _ => None,
        };
        let text_strokes = stroke_passes(&config, fill)
            .iter()
            .map(css_stroke)
            .collect();

        model.placement = Some(target);
        model.text = Some(TextLayerStyle {
            text: config.text.clone(),
            left: bounds.x,
            top: bounds.y,
            width: bounds.width,
            font_size,
            font_family: config.font_family.css_name(),
            font_weight: config.font_weight.value(),
            color: fill.to_string(),
            background,
            opacity,
            rotation: config.rotation,
            mix_blend_mode: config.blend_mode.css_name(),
            text_shadow: css_shadow(&shadow_for(&config, metrics.brightness)),
            text_strokes,
        });
        if has_companion {
            model.companion = Some(companion_style(match layout.decision.horizontal() {
                HorizontalAlign::Right => CompanionSide::After,
                HorizontalAlign::Left => CompanionSide::Before,
                HorizontalAlign::Center => CompanionSide::Above,
            }));
        }
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterPreset;
    use crate::watermark::{Anchor, BlendMode, NormalizedPoint, WatermarkLogo};

    #[test]
    fn test_default_preview() {
        let model = PreviewModel::derive(
            &WatermarkConfig::default(),
            &ImageAdjustments::default(),
            1000,
            1000,
            180.0,
            &[],
        );
        assert_eq!(
            model.filter,
            "brightness(1) contrast(1) saturate(1) hue-rotate(0deg)"
        );
        assert_eq!(model.placement, Some(PlacementTarget::Anchor(Anchor::BottomRight)));

        let text = model.text.unwrap();
        assert_eq!(text.font_size, 45.0);
        assert_eq!(text.left + text.width, 980.0);
        assert_eq!(text.top, 935.0);
        assert_eq!(text.color, "#FFFFFF");
        assert_eq!(text.opacity, 0.8);
        assert_eq!(text.mix_blend_mode, "normal");
        assert_eq!(text.text_shadow, "2px 2px 12px rgba(255, 255, 255, 0.21)");
        assert!(text.text_strokes.is_empty());
        assert!(model.tiles.is_empty());
    }

    #[test]
    fn test_preview_matches_export_filter() {
        let adjustments = ImageAdjustments {
            exposure: 20.0,
            filter_preset: FilterPreset::Noir,
            ..Default::default()
        };
        let model = PreviewModel::derive(
            &WatermarkConfig::default(),
            &adjustments,
            800,
            600,
            100.0,
            &[],
        );
        assert_eq!(model.filter, compute_filter(&adjustments).to_css());
        assert!(model.filter.starts_with("grayscale(1)"));
    }

    #[test]
    fn test_preview_avoids_faces() {
        let config = WatermarkConfig {
            ai_placement: true,
            ..Default::default()
        };
        let face = FaceRegion::new([700.0, 700.0], [1000.0, 1000.0]);
        let model = PreviewModel::derive(
            &config,
            &ImageAdjustments::default(),
            1000,
            1000,
            100.0,
            &[face],
        );
        assert_eq!(model.placement, Some(PlacementTarget::Anchor(Anchor::TopLeft)));
        assert_eq!(model.text.unwrap().left, 20.0);
    }

    #[test]
    fn test_preview_styles() {
        let config = WatermarkConfig {
            glow_effect: true,
            shadow_intensity: 80.0,
            blend_mode: BlendMode::Screen,
            color: Some(HexColor::new(0, 229, 255)),
            logo_url: Some("data:image/png;base64,AAAA".to_string()),
            position: Anchor::BottomLeft,
            ..Default::default()
        };
        let model = PreviewModel::derive(
            &config,
            &ImageAdjustments::default(),
            1000,
            1000,
            100.0,
            &[],
        );
        let text = model.text.unwrap();
        assert_eq!(text.mix_blend_mode, "screen");
        assert_eq!(text.text_shadow, "0px 0px 20px rgba(59, 130, 246, 0.64)");
        assert_eq!(text.text_strokes, vec!["2px rgba(0, 0, 0, 0.30)".to_string()]);
        assert_eq!(model.companion.unwrap().side, CompanionSide::Before);
    }

    #[test]
    fn test_preview_logos_and_pattern() {
        let config = WatermarkConfig {
            pattern: PatternMode::Tiled,
            logos: vec![
                WatermarkLogo {
                    id: "a".to_string(),
                    position: NormalizedPoint::new(0.25, 0.5),
                    ..Default::default()
                },
                WatermarkLogo {
                    id: "b".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let model = PreviewModel::derive(
            &config,
            &ImageAdjustments::default(),
            800,
            400,
            120.0,
            &[],
        );
        assert!(model.text.is_none());
        assert!(model.placement.is_none());
        assert!(!model.tiles.is_empty());
        assert_eq!(model.logos.len(), 2);
        assert_eq!(model.logos[0].center_x, 200.0);
        assert_eq!(model.logos[0].center_y, 200.0);
        assert_eq!(model.logos[0].width, 40.0);
        assert!(model.logos[1].z_index > model.logos[0].z_index);
    }

    #[test]
    fn test_pattern_tiles_include_companion_logo() {
        let text_only = WatermarkConfig {
            pattern: PatternMode::Tiled,
            ..Default::default()
        };
        let with_logo = WatermarkConfig {
            logo_url: Some("data:image/png;base64,AAAA".to_string()),
            ..text_only.clone()
        };
        let metrics = PreviewMetrics {
            companion_size: Some((100, 50)),
            ..PreviewMetrics::new(120.0)
        };

        let plain = PreviewModel::derive_measured(
            &text_only,
            &ImageAdjustments::default(),
            1000,
            1000,
            &metrics,
            &[],
        );
        let model = PreviewModel::derive_measured(
            &with_logo,
            &ImageAdjustments::default(),
            1000,
            1000,
            &metrics,
            &[],
        );

        let unit = pattern_unit(Some((120.0, 45.0)), Some((50.0, 25.0))).unwrap();
        assert_eq!(unit.width, 182.0);
        assert_eq!(
            model.tiles,
            tile(PatternMode::Tiled, unit, 120.0, 0.0, 1000.0, 1000.0)
        );
        assert!(model.tiles.len() < plain.tiles.len());
        assert_eq!(model.companion.unwrap().side, CompanionSide::Before);
        assert!(plain.companion.is_none());
    }

    #[test]
    fn test_preview_lists_every_stroke_pass() {
        let config = WatermarkConfig {
            shadow_intensity: 80.0,
            stroke_width: Some(3.0),
            stroke_color: Some(HexColor::new(255, 0, 0)),
            ..Default::default()
        };
        let model = PreviewModel::derive(
            &config,
            &ImageAdjustments::default(),
            1000,
            1000,
            100.0,
            &[],
        );
        assert_eq!(
            model.text.unwrap().text_strokes,
            vec![
                "3px rgba(255, 0, 0, 1.00)".to_string(),
                "2px rgba(255, 0, 0, 0.30)".to_string(),
            ]
        );
    }

    #[test]
    fn test_legibility_stroke_follows_gradient_start() {
        let config = WatermarkConfig {
            shadow_intensity: 80.0,
            gradient_from: Some(HexColor::new(16, 16, 16)),
            gradient_to: Some(HexColor::WHITE),
            ..Default::default()
        };
        let model = PreviewModel::derive(
            &config,
            &ImageAdjustments::default(),
            1000,
            1000,
            100.0,
            &[],
        );
        let fill = fill_color(&config, NEUTRAL_BRIGHTNESS);
        assert_eq!(fill, HexColor::WHITE);
        assert_eq!(
            model.text.unwrap().text_strokes,
            vec!["2px rgba(255, 255, 255, 0.30)".to_string()]
        );
        assert_eq!(
            stroke_passes(&config, fill)[0].color,
            HexColor::WHITE
        );
    }
}
