// Rendering - canvas, text, logo and pattern compositing
mod blend;
pub mod canvas;
pub mod logo;
pub mod pattern;
pub mod text;
pub mod typeface;

pub use blend::{blend_channel, composite_pixel};
pub use canvas::{Canvas, NEUTRAL_BRIGHTNESS};
pub use logo::{decode_logo, load_logos, logo_size_for};
pub use pattern::{TilePlacement, TileUnit, pattern_unit, tile};
pub use text::{
    PassKind, ShadowSpec, Stamp, StrokeSpec, TextBox, TextLayout, draw_text, fill_color,
    font_size_for, render_text_stamp, shadow_for, stroke_passes,
};
pub use typeface::{FontLibrary, FontProvider, FontTypeface, SingleFace, Typeface};

use image::RgbaImage;
use tracing::debug;

use crate::placement::PlacementTarget;
use crate::watermark::{BlendMode, PatternMode, WatermarkConfig, WatermarkLogo};

/// Everything the compositor draws on top of the filtered base image.
pub struct Overlay<'a> {
    pub face: Option<&'a dyn Typeface>,
    pub config: &'a WatermarkConfig,
    /// Resolved placement. Ignored in pattern mode.
    pub target: PlacementTarget,
    pub brightness: f32,
    /// Decoded legacy logo, drawn next to the text.
    pub companion: Option<&'a RgbaImage>,
    /// Decoded positioned logos in insertion order.
    pub logos: &'a [(WatermarkLogo, RgbaImage)],
}

/// Draw text, companion logo and positioned logos, in that order.
pub fn composite_overlay(canvas: &mut Canvas, overlay: &Overlay<'_>) {
    let config = overlay.config;
    if config.pattern == PatternMode::None {
        let layout = text::draw_text(
            canvas,
            overlay.face,
            config,
            overlay.target,
            overlay.brightness,
        );
        if let Some(logo) = overlay.companion {
            logo::draw_companion_logo(canvas, logo, &layout, config.size, config.opacity / 100.0);
        }
    } else {
        draw_pattern_unit(canvas, overlay);
    }

    logo::draw_logos(canvas, overlay.logos);
}

fn draw_pattern_unit(canvas: &mut Canvas, overlay: &Overlay<'_>) {
    let config = overlay.config;
    let scale = canvas.scale();
    let font_size = font_size_for(canvas.logical_width(), config.size);
    let opacity = config.opacity / 100.0;

    let text = overlay
        .face
        .filter(|_| !config.text.trim().is_empty())
        .map(|face| (face, face.text_width(&config.text, font_size)));
    let logo_width = logo_size_for(canvas.logical_width(), config.size);
    let companion = overlay
        .companion
        .map(|logo| (logo::fit_logo(logo, logo_width * scale), logo.dimensions()));

    let Some(unit) = pattern_unit(
        text.map(|(_, width)| (width, font_size)),
        companion
            .as_ref()
            .map(|(_, source)| logo::fitted_logo_size(*source, logo_width, scale)),
    ) else {
        return;
    };

    let stamp = match (text, companion) {
        (Some((face, _)), companion) => {
            let stamp = render_text_stamp(face, config, font_size, scale, overlay.brightness);
            match companion {
                Some((logo, _)) => {
                    let gap = (logo::LOGO_GAP * scale).round() as u32;
                    stamp.with_logo_left(&logo, gap, opacity)
                }
                None => stamp,
            }
        }
        (None, Some((logo, _))) => Stamp::single(
            PassKind::Logo,
            text::with_alpha(&logo, opacity),
            BlendMode::Normal,
            scale,
        ),
        (None, None) => return,
    };

    let placements = tile(
        config.pattern,
        unit,
        config.pattern_spacing,
        config.rotation,
        canvas.logical_width(),
        canvas.logical_height(),
    );
    debug!(
        "Pattern {:?} with unit {}x{}",
        config.pattern, unit.width, unit.height
    );
    pattern::draw_pattern(canvas, &stamp, &placements);
}

#[cfg(test)]
mod tests {
    mod compositor_tests;
    mod pattern_render_tests;
    mod support;
}
