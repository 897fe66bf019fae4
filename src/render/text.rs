use image::{GrayImage, Rgba, RgbaImage};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{dilate, erode};
use serde::Serialize;
use tracing::debug;

use super::canvas::Canvas;
use super::typeface::Typeface;
use crate::placement::{PlacementDecision, PlacementTarget};
use crate::watermark::{BlendMode, HexColor, WatermarkConfig};

pub const MIN_FONT_SIZE: f32 = 12.0;
const FONT_SIZE_FACTOR: f32 = 0.045;

/// Brand blue used for the glow halo.
pub const GLOW_COLOR: HexColor = HexColor::new(59, 130, 246);

/// Shadow intensities above this get an extra legibility outline.
pub const LEGIBILITY_THRESHOLD: f32 = 70.0;
const LEGIBILITY_STROKE_WIDTH: f32 = 2.0;
const LEGIBILITY_ALPHA: f32 = 0.3;

/// Text pixel size for an image `image_width` pixels wide at `size` percent.
pub fn font_size_for(image_width: f32, size: f32) -> f32 {
    (image_width * size / 100.0 * FONT_SIZE_FACTOR)
        .round()
        .max(MIN_FONT_SIZE)
}

/// White over dark backgrounds, black over light ones.
pub fn contrast_color(brightness: f32) -> HexColor {
    if brightness <= 128.0 {
        HexColor::WHITE
    } else {
        HexColor::BLACK
    }
}

pub fn fill_color(config: &WatermarkConfig, brightness: f32) -> HexColor {
    match config.color {
        Some(color) => color,
        None if config.adaptive_color => contrast_color(brightness),
        None => HexColor::WHITE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShadowSpec {
    pub color: HexColor,
    pub alpha: f32,
    pub blur: f32,
    pub offset: (f32, f32),
}

pub fn shadow_for(config: &WatermarkConfig, brightness: f32) -> ShadowSpec {
    let intensity = config.shadow_intensity / 100.0;
    if config.glow_effect {
        ShadowSpec {
            color: GLOW_COLOR,
            alpha: intensity * 0.8,
            blur: 20.0,
            offset: (0.0, 0.0),
        }
    } else {
        ShadowSpec {
            color: contrast_color(brightness),
            alpha: intensity * 0.7,
            blur: 12.0,
            offset: (2.0, 2.0),
        }
    }
}

pub fn has_legibility_stroke(config: &WatermarkConfig) -> bool {
    config.shadow_intensity > LEGIBILITY_THRESHOLD
}

/// One outline around the glyphs. `alpha` is multiplied by the text opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSpec {
    pub kind: PassKind,
    pub width: f32,
    pub color: HexColor,
    pub alpha: f32,
    pub mode: BlendMode,
}

/// Outline passes in draw order: the user stroke, then the legibility outline.
pub fn stroke_passes(config: &WatermarkConfig, fill: HexColor) -> Vec<StrokeSpec> {
    let mut strokes = Vec::new();
    if let (Some(width), Some(color)) = (config.stroke_width, config.stroke_color)
        && width > 0.0
    {
        strokes.push(StrokeSpec {
            kind: PassKind::Stroke,
            width,
            color,
            alpha: 1.0,
            mode: config.blend_mode,
        });
    }
    if has_legibility_stroke(config) {
        let base = config.gradient_from.unwrap_or(fill);
        strokes.push(StrokeSpec {
            kind: PassKind::Legibility,
            width: LEGIBILITY_STROKE_WIDTH,
            color: config
                .stroke_color
                .unwrap_or_else(|| contrast_color(base.brightness())),
            alpha: LEGIBILITY_ALPHA,
            mode: BlendMode::Normal,
        });
    }
    strokes
}

/// Axis-aligned text bounds in logical pixels, before rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Where the text unit sits on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    pub decision: PlacementDecision,
    pub font_size: f32,
    pub text_width: f32,
}

impl TextLayout {
    pub fn new(
        target: PlacementTarget,
        image_width: f32,
        image_height: f32,
        text_width: f32,
        font_size: f32,
    ) -> Self {
        Self {
            decision: PlacementDecision::locate(
                target,
                image_width,
                image_height,
                text_width,
                font_size,
            ),
            font_size,
            text_width,
        }
    }

    pub fn bounds(&self) -> TextBox {
        TextBox {
            x: self.decision.x,
            y: self.decision.y - self.font_size,
            width: self.text_width,
            height: self.font_size,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.decision.x + self.text_width / 2.0,
            self.decision.y - self.font_size / 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Shadow,
    Fill,
    Stroke,
    Legibility,
    Logo,
}

#[derive(Debug, Clone)]
pub struct StampPass {
    pub kind: PassKind,
    pub layer: RgbaImage,
    pub mode: BlendMode,
}

/// A pre-rendered watermark unit at backing resolution. Every pass has the
/// same dimensions and shares its center with the text.
#[derive(Debug, Clone)]
pub struct Stamp {
    passes: Vec<StampPass>,
    width: u32,
    height: u32,
    scale: f32,
}

impl Stamp {
    /// A stamp holding a single pre-rendered layer.
    pub fn single(kind: PassKind, layer: RgbaImage, mode: BlendMode, scale: f32) -> Stamp {
        let (width, height) = layer.dimensions();
        Stamp {
            passes: vec![StampPass { kind, layer, mode }],
            width,
            height,
            scale,
        }
    }

    pub fn passes(&self) -> &[StampPass] {
        &self.passes
    }

    pub fn kinds(&self) -> Vec<PassKind> {
        self.passes.iter().map(|pass| pass.kind).collect()
    }

    /// Logical width.
    pub fn width(&self) -> f32 {
        self.width as f32 / self.scale
    }

    /// Logical height.
    pub fn height(&self) -> f32 {
        self.height as f32 / self.scale
    }

    pub fn draw(&self, canvas: &mut Canvas, center: (f32, f32), rotation: f32) {
        for pass in &self.passes {
            canvas.draw_centered(&pass.layer, center, rotation, pass.mode, 1.0);
        }
    }

    /// Place `logo` to the left of the current content, `gap` backing pixels
    /// away and vertically centered. Used to build pattern units.
    pub fn with_logo_left(self, logo: &RgbaImage, gap: u32, opacity: f32) -> Stamp {
        let width = self.width + gap + logo.width();
        let height = self.height.max(logo.height());
        let text_x = (logo.width() + gap) as i64;
        let text_y = ((height - self.height) / 2) as i64;

        let mut logo_layer = RgbaImage::new(width, height);
        image::imageops::overlay(
            &mut logo_layer,
            &with_alpha(logo, opacity),
            0,
            ((height - logo.height()) / 2) as i64,
        );

        let mut passes = vec![StampPass {
            kind: PassKind::Logo,
            layer: logo_layer,
            mode: BlendMode::Normal,
        }];
        for pass in self.passes {
            let mut layer = RgbaImage::new(width, height);
            image::imageops::replace(&mut layer, &pass.layer, text_x, text_y);
            passes.push(StampPass {
                layer,
                ..pass
            });
        }

        Stamp {
            passes,
            width,
            height,
            scale: self.scale,
        }
    }
}

pub(crate) fn with_alpha(image: &RgbaImage, opacity: f32) -> RgbaImage {
    let mut out = image.clone();
    if opacity < 1.0 {
        for pixel in out.pixels_mut() {
            pixel[3] = (pixel[3] as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        }
    }
    out
}

fn colorize(mask: &GrayImage, alpha: f32, color_at: impl Fn(u32) -> HexColor) -> RgbaImage {
    let mut layer = RgbaImage::new(mask.width(), mask.height());
    for (x, y, coverage) in mask.enumerate_pixels() {
        if coverage[0] == 0 {
            continue;
        }
        let color = color_at(x);
        let a = (coverage[0] as f32 * alpha).round().clamp(0.0, 255.0) as u8;
        layer.put_pixel(x, y, Rgba([color.r, color.g, color.b, a]));
    }
    layer
}

fn lerp_color(from: HexColor, to: HexColor, t: f32) -> HexColor {
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    HexColor::new(mix(from.r, to.r), mix(from.g, to.g), mix(from.b, to.b))
}

/// Outline of `mask`, `radius` pixels to each side of the glyph edge.
fn outline(mask: &GrayImage, radius: u8) -> GrayImage {
    let outer = dilate(mask, Norm::LInf, radius);
    let inner = erode(mask, Norm::LInf, radius);
    let mut ring = GrayImage::new(mask.width(), mask.height());
    for (x, y, pixel) in ring.enumerate_pixels_mut() {
        pixel[0] = outer.get_pixel(x, y)[0].saturating_sub(inner.get_pixel(x, y)[0]);
    }
    ring
}

fn stroke_radius(width: f32, scale: f32) -> u8 {
    (width * scale / 2.0).round().clamp(1.0, 255.0) as u8
}

/// Render the text and its effects into a [`Stamp`] at `scale` backing
/// pixels per logical pixel.
pub fn render_text_stamp(
    face: &dyn Typeface,
    config: &WatermarkConfig,
    font_size: f32,
    scale: f32,
    brightness: f32,
) -> Stamp {
    let mask = face.rasterize(&config.text, font_size * scale);
    let opacity = config.opacity / 100.0;
    let fill = fill_color(config, brightness);
    let shadow = shadow_for(config, brightness);
    let strokes = stroke_passes(config, fill);

    let blur = shadow.blur * scale;
    let (offset_x, offset_y) = (
        (shadow.offset.0 * scale).round() as i64,
        (shadow.offset.1 * scale).round() as i64,
    );
    let stroke_extent = strokes
        .iter()
        .map(|stroke| stroke.width)
        .fold(LEGIBILITY_STROKE_WIDTH, f32::max)
        * scale;
    let pad = (blur * 1.5 + offset_x.abs().max(offset_y.abs()) as f32 + stroke_extent + 2.0).ceil()
        as u32;

    let width = mask.width() + 2 * pad;
    let height = mask.height() + 2 * pad;
    let mut padded = GrayImage::new(width, height);
    image::imageops::replace(&mut padded, &mask, pad as i64, pad as i64);

    let fill_at = |x: u32| -> HexColor {
        match (config.gradient_from, config.gradient_to) {
            (Some(from), Some(to)) => {
                let t = (x as f32 - pad as f32) / mask.width().max(1) as f32;
                lerp_color(from, to, t.clamp(0.0, 1.0))
            }
            _ => fill,
        }
    };

    let mut passes = Vec::new();

    if shadow.alpha > 0.0 {
        let mut shifted = GrayImage::new(width, height);
        image::imageops::replace(
            &mut shifted,
            &mask,
            pad as i64 + offset_x,
            pad as i64 + offset_y,
        );
        if blur > 0.0 {
            shifted = gaussian_blur_f32(&shifted, blur / 2.0);
        }
        passes.push(StampPass {
            kind: PassKind::Shadow,
            layer: colorize(&shifted, shadow.alpha * opacity, |_| shadow.color),
            mode: config.blend_mode,
        });
    }

    passes.push(StampPass {
        kind: PassKind::Fill,
        layer: colorize(&padded, opacity, fill_at),
        mode: config.blend_mode,
    });

    for stroke in &strokes {
        let ring = outline(&padded, stroke_radius(stroke.width, scale));
        passes.push(StampPass {
            kind: stroke.kind,
            layer: colorize(&ring, stroke.alpha * opacity, |_| stroke.color),
            mode: stroke.mode,
        });
    }

    Stamp {
        passes,
        width,
        height,
        scale,
    }
}

/// Lay out and draw the watermark text. Without a face only the layout is
/// computed, so companion logos still have something to anchor to.
pub fn draw_text(
    canvas: &mut Canvas,
    face: Option<&dyn Typeface>,
    config: &WatermarkConfig,
    target: PlacementTarget,
    brightness: f32,
) -> TextLayout {
    let (image_width, image_height) = (canvas.logical_width(), canvas.logical_height());
    let font_size = font_size_for(image_width, config.size);
    let text_width = face
        .map(|face| face.text_width(&config.text, font_size))
        .unwrap_or(0.0);
    let layout = TextLayout::new(target, image_width, image_height, text_width, font_size);

    let Some(face) = face else {
        return layout;
    };
    if config.text.trim().is_empty() {
        debug!("Watermark text is empty, nothing to draw");
        return layout;
    }

    let stamp = render_text_stamp(face, config, font_size, canvas.scale(), brightness);
    debug!(
        "Drawing text at ({}, {}) size {} with {:?}",
        layout.decision.x,
        layout.decision.y,
        font_size,
        stamp.kinds()
    );
    stamp.draw(canvas, layout.center(), config.rotation);
    layout
}
