use image::{GrayImage, Luma, Rgba, RgbaImage};

use crate::render::Typeface;

/// Monospaced face that draws every non-space character as a solid block.
/// Advance is half the font size; blocks cover the lower 80% of the line.
pub(super) struct BlockFace;

pub(super) const ADVANCE: f32 = 0.5;

impl Typeface for BlockFace {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * ADVANCE
    }

    fn rasterize(&self, text: &str, font_size: f32) -> GrayImage {
        let advance = font_size * ADVANCE;
        let width = self.text_width(text, font_size).ceil().max(1.0) as u32;
        let height = font_size.ceil().max(1.0) as u32;
        let mut mask = GrayImage::new(width, height);

        for (i, c) in text.chars().enumerate() {
            if c.is_whitespace() {
                continue;
            }
            let left = (i as f32 * advance + advance * 0.1).round() as u32;
            let right = ((i as f32 + 1.0) * advance - advance * 0.1).round() as u32;
            let top = (height as f32 * 0.2).round() as u32;
            for y in top..height {
                for x in left..right.min(width) {
                    mask.put_pixel(x, y, Luma([255]));
                }
            }
        }
        mask
    }
}

pub(super) fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(color))
}

/// Number of pixels that differ between two same-sized images.
pub(super) fn changed_pixels(a: &RgbaImage, b: &RgbaImage) -> usize {
    a.pixels().zip(b.pixels()).filter(|(p, q)| p != q).count()
}
