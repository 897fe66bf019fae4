use image::{Rgba, RgbaImage, imageops::FilterType};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};

use super::blend::composite_pixel;
use crate::error::PixelSampleError;
use crate::filter::{FilterExpression, apply_filter};
use crate::watermark::BlendMode;

/// Brightness assumed when the canvas cannot be sampled.
pub const NEUTRAL_BRIGHTNESS: f32 = 128.0;

/// Upper bound on pixels read by [`Canvas::average_brightness`].
pub const MAX_BRIGHTNESS_SAMPLES: usize = 10_000;

/// Raster surface for one export. Callers work in logical (source image)
/// pixels; the backing store is `round(logical * device_pixel_ratio)`.
#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: RgbaImage,
    logical_width: u32,
    logical_height: u32,
    scale: f32,
    readback: bool,
}

impl Canvas {
    pub fn from_image(image: &RgbaImage, device_pixel_ratio: f32) -> Self {
        let scale = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        let (width, height) = image.dimensions();
        let backing_width = ((width as f32 * scale).round() as u32).max(1);
        let backing_height = ((height as f32 * scale).round() as u32).max(1);

        let pixels = if (backing_width, backing_height) == (width, height) {
            image.clone()
        } else {
            image::imageops::resize(image, backing_width, backing_height, FilterType::Triangle)
        };

        Self {
            pixels,
            logical_width: width,
            logical_height: height,
            scale,
            readback: true,
        }
    }

    pub fn logical_width(&self) -> f32 {
        self.logical_width as f32
    }

    pub fn logical_height(&self) -> f32 {
        self.logical_height as f32
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Mark the canvas as tainted (or not). A tainted canvas refuses readback.
    pub fn set_readback(&mut self, allowed: bool) {
        self.readback = allowed;
    }

    pub fn apply_filter(&mut self, expression: &FilterExpression) {
        apply_filter(&mut self.pixels, expression);
    }

    /// Average `(R+G+B)/3` over the first [`MAX_BRIGHTNESS_SAMPLES`] pixels
    /// of the backing buffer, read four bytes at a time.
    pub fn average_brightness(&self) -> Result<f32, PixelSampleError> {
        if !self.readback {
            return Err(PixelSampleError::ReadbackBlocked);
        }
        let mut sum = 0.0f64;
        let mut count = 0u64;
        for px in self
            .pixels
            .as_raw()
            .chunks_exact(4)
            .take(MAX_BRIGHTNESS_SAMPLES)
        {
            sum += (px[0] as f64 + px[1] as f64 + px[2] as f64) / 3.0;
            count += 1;
        }
        if count == 0 {
            return Err(PixelSampleError::Empty);
        }

        Ok((sum / count as f64) as f32)
    }

    /// Composite `layer` with its top-left corner at backing pixel (`x`, `y`).
    /// Anything outside the canvas is clipped.
    pub fn draw_layer(&mut self, layer: &RgbaImage, x: i64, y: i64, mode: BlendMode, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }

        let (canvas_w, canvas_h) = (self.pixels.width() as i64, self.pixels.height() as i64);
        let x_start = x.max(0);
        let y_start = y.max(0);
        let x_end = (x + layer.width() as i64).min(canvas_w);
        let y_end = (y + layer.height() as i64).min(canvas_h);

        for cy in y_start..y_end {
            for cx in x_start..x_end {
                let src = layer.get_pixel((cx - x) as u32, (cy - y) as u32);
                if src[3] == 0 {
                    continue;
                }
                let src = [
                    src[0] as f32 / 255.0,
                    src[1] as f32 / 255.0,
                    src[2] as f32 / 255.0,
                    src[3] as f32 / 255.0 * alpha,
                ];
                let dst = *self.pixels.get_pixel(cx as u32, cy as u32);
                self.pixels
                    .put_pixel(cx as u32, cy as u32, composite_pixel(dst, src, mode));
            }
        }
    }

    /// Composite a backing-resolution `layer` centered on a logical point,
    /// rotated clockwise by `rotation` degrees about that point.
    pub fn draw_centered(
        &mut self,
        layer: &RgbaImage,
        center: (f32, f32),
        rotation: f32,
        mode: BlendMode,
        alpha: f32,
    ) {
        let rotated;
        let layer = if rotation.abs() > f32::EPSILON {
            rotated = rotate_layer(layer, rotation);
            &rotated
        } else {
            layer
        };

        let x = (center.0 * self.scale - layer.width() as f32 / 2.0).round() as i64;
        let y = (center.1 * self.scale - layer.height() as f32 / 2.0).round() as i64;
        self.draw_layer(layer, x, y, mode, alpha);
    }
}

/// Rotate `layer` clockwise about its center, growing it so nothing is cut off.
pub fn rotate_layer(layer: &RgbaImage, degrees: f32) -> RgbaImage {
    let (w, h) = layer.dimensions();
    let diagonal = ((w as f32).hypot(h as f32)).ceil() as u32;
    // Keep the padding symmetric so the center stays put.
    let side_w = diagonal + (diagonal + w) % 2;
    let side_h = diagonal + (diagonal + h) % 2;

    let mut padded = RgbaImage::new(side_w, side_h);
    image::imageops::overlay(
        &mut padded,
        layer,
        ((side_w - w) / 2) as i64,
        ((side_h - h) / 2) as i64,
    );

    rotate_about_center(
        &padded,
        degrees.to_radians(),
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
    )
}
