//! Color/filter model.
//!
//! Adjustment sliders are mapped to an ordered chain of CSS-style filter
//! operations. The same chain is rendered as a CSS `filter` string for the live
//! preview and applied to pixels during export, so both paths see operations in
//! exactly the same order.

mod apply;
mod presets;

pub use apply::apply_filter;
pub use presets::FilterPreset;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Photographic adjustment sliders. Every field defaults to zero.
///
/// `highlights`, `shadows`, `whites`, `blacks`, `dehaze`, `vignette` and `grain`
/// are carried for the editing UI but have no effect in either preview or export.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageAdjustments {
    pub exposure: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub temperature: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub whites: f32,
    pub blacks: f32,
    pub vibrance: f32,
    pub clarity: f32,
    pub dehaze: f32,
    pub vignette: f32,
    pub grain: f32,
    pub sharpen: f32,
    pub tint: f32,
    pub hue: f32,
    pub filter_preset: FilterPreset,
}

impl ImageAdjustments {
    /// Copy with every slider clamped to its declared range.
    pub fn normalized(&self) -> ImageAdjustments {
        let signed = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(-100.0, 100.0) };
        let unsigned = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 100.0) };
        ImageAdjustments {
            exposure: signed(self.exposure),
            contrast: signed(self.contrast),
            saturation: signed(self.saturation),
            temperature: signed(self.temperature),
            highlights: signed(self.highlights),
            shadows: signed(self.shadows),
            whites: signed(self.whites),
            blacks: signed(self.blacks),
            vibrance: signed(self.vibrance),
            clarity: signed(self.clarity),
            dehaze: unsigned(self.dehaze),
            vignette: signed(self.vignette),
            grain: unsigned(self.grain),
            sharpen: unsigned(self.sharpen),
            tint: signed(self.tint),
            hue: signed(self.hue),
            filter_preset: self.filter_preset,
        }
    }
}

/// A single filter primitive. Amounts use CSS units: factors for
/// brightness/contrast/saturate, 0..1 for sepia/grayscale/invert, degrees for
/// hue rotation and pixels for blur.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "amount", rename_all = "kebab-case")]
pub enum FilterOp {
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    HueRotate(f32),
    Sepia(f32),
    Grayscale(f32),
    Invert(f32),
    Blur(f32),
}

// Avoid printing "-0" for values that collapse to zero.
fn css_number(value: f32) -> f32 {
    if value == 0.0 { 0.0 } else { value }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FilterOp::Brightness(v) => write!(f, "brightness({})", css_number(v)),
            FilterOp::Contrast(v) => write!(f, "contrast({})", css_number(v)),
            FilterOp::Saturate(v) => write!(f, "saturate({})", css_number(v)),
            FilterOp::HueRotate(v) => write!(f, "hue-rotate({}deg)", css_number(v)),
            FilterOp::Sepia(v) => write!(f, "sepia({})", css_number(v)),
            FilterOp::Grayscale(v) => write!(f, "grayscale({})", css_number(v)),
            FilterOp::Invert(v) => write!(f, "invert({})", css_number(v)),
            FilterOp::Blur(v) => write!(f, "blur({}px)", css_number(v)),
        }
    }
}

impl FilterOp {
    pub fn is_identity(&self) -> bool {
        match *self {
            FilterOp::Brightness(v) | FilterOp::Contrast(v) | FilterOp::Saturate(v) => v == 1.0,
            FilterOp::HueRotate(v) => v % 360.0 == 0.0,
            FilterOp::Sepia(v) | FilterOp::Grayscale(v) | FilterOp::Invert(v) => v == 0.0,
            FilterOp::Blur(v) => v <= 0.0,
        }
    }
}

/// Ordered filter chain.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterExpression {
    pub ops: Vec<FilterOp>,
}

impl FilterExpression {
    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(FilterOp::is_identity)
    }

    /// The CSS `filter` property value for the preview.
    pub fn to_css(&self) -> String {
        if self.ops.is_empty() {
            return "none".to_string();
        }
        self.to_string()
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", op)?;
        }
        Ok(())
    }
}

/// Largest contrast boost used to approximate sharpening.
const MAX_SHARPEN_BOOST: f32 = 0.06;

/// Map adjustments to the fixed-order filter chain:
/// preset, brightness, contrast, saturate, hue-rotate, then the sharpen boost.
pub fn compute_filter(adjustments: &ImageAdjustments) -> FilterExpression {
    let adj = adjustments.normalized();
    let mut ops = adj.filter_preset.ops().to_vec();

    ops.push(FilterOp::Brightness((1.0 + adj.exposure / 200.0).max(0.2)));
    ops.push(FilterOp::Contrast(
        (1.0 + adj.contrast / 200.0 + adj.clarity / 800.0).max(0.2),
    ));
    ops.push(FilterOp::Saturate(
        (1.0 + adj.saturation / 150.0 + adj.vibrance / 300.0).max(0.0),
    ));
    ops.push(FilterOp::HueRotate(
        adj.temperature * 0.3 + adj.hue + adj.tint * 0.5,
    ));

    // No convolution kernel: a mild contrast lift stands in for sharpening.
    if adj.sharpen > 0.0 {
        ops.push(FilterOp::Contrast(
            1.0 + (adj.sharpen / 3000.0).min(MAX_SHARPEN_BOOST),
        ));
    }

    FilterExpression { ops }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_adjustments_are_identity() {
        let expr = compute_filter(&ImageAdjustments::default());
        assert_eq!(
            expr.to_string(),
            "brightness(1) contrast(1) saturate(1) hue-rotate(0deg)"
        );
        assert!(expr.is_identity());
    }

    #[test]
    fn test_slider_formulas() {
        let adjustments = ImageAdjustments {
            exposure: 40.0,
            contrast: 20.0,
            clarity: 80.0,
            saturation: 30.0,
            vibrance: 60.0,
            temperature: 10.0,
            hue: 5.0,
            tint: -4.0,
            ..Default::default()
        };
        let expr = compute_filter(&adjustments);

        let FilterOp::Brightness(b) = expr.ops[0] else { panic!("expected brightness") };
        let FilterOp::Contrast(c) = expr.ops[1] else { panic!("expected contrast") };
        let FilterOp::Saturate(s) = expr.ops[2] else { panic!("expected saturate") };
        let FilterOp::HueRotate(h) = expr.ops[3] else { panic!("expected hue-rotate") };

        assert!((b - 1.2).abs() < 1e-6);
        assert!((c - 1.2).abs() < 1e-6);
        assert!((s - 1.4).abs() < 1e-6);
        assert!((h - 6.0).abs() < 1e-6);
        assert_eq!(expr.ops.len(), 4);
    }

    #[test]
    fn test_floors_hold_at_extremes() {
        let expr = compute_filter(&ImageAdjustments {
            exposure: -100.0,
            contrast: -100.0,
            clarity: -100.0,
            saturation: -100.0,
            vibrance: -100.0,
            ..Default::default()
        });
        assert_eq!(expr.ops[0], FilterOp::Brightness(0.5));
        assert_eq!(expr.ops[1], FilterOp::Contrast(0.375));
        let FilterOp::Saturate(s) = expr.ops[2] else { panic!("expected saturate") };
        assert!(s.abs() < 1e-6);

        // Values beyond the slider range are clamped first, so the floors apply.
        let expr = compute_filter(&ImageAdjustments {
            exposure: -1000.0,
            ..Default::default()
        });
        assert_eq!(expr.ops[0], FilterOp::Brightness(0.5));
    }

    #[test]
    fn test_sharpen_boost_is_last_and_capped() {
        let expr = compute_filter(&ImageAdjustments {
            sharpen: 30.0,
            ..Default::default()
        });
        assert_eq!(expr.ops.len(), 5);
        let FilterOp::Contrast(boost) = expr.ops[4] else { panic!("expected contrast") };
        assert!((boost - 1.01).abs() < 1e-6);

        let expr = compute_filter(&ImageAdjustments {
            sharpen: 100.0,
            ..Default::default()
        });
        let FilterOp::Contrast(boost) = expr.ops[4] else { panic!("expected contrast") };
        assert!(boost <= 1.0 + MAX_SHARPEN_BOOST + 1e-6);
        assert!((boost - (1.0 + 100.0 / 3000.0)).abs() < 1e-6);
    }

    #[test]
    fn test_preset_comes_first() {
        let adjustments = ImageAdjustments {
            filter_preset: FilterPreset::Noir,
            ..Default::default()
        };
        let expr = compute_filter(&adjustments);
        let preset_ops = FilterPreset::Noir.ops();
        assert_eq!(&expr.ops[..preset_ops.len()], preset_ops);
        assert_eq!(expr.ops[preset_ops.len()], FilterOp::Brightness(1.0));
        assert!(expr.to_css().starts_with("grayscale(1)"));
    }

    #[test]
    fn test_inert_fields_do_not_change_filter() {
        let inert = ImageAdjustments {
            highlights: 50.0,
            shadows: -50.0,
            whites: 20.0,
            blacks: -20.0,
            dehaze: 40.0,
            vignette: 60.0,
            grain: 70.0,
            ..Default::default()
        };
        assert_eq!(
            compute_filter(&inert),
            compute_filter(&ImageAdjustments::default())
        );
    }
}
