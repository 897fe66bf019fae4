#![allow(dead_code)]

use image::{GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
use inkmark::Exporter;
use inkmark::render::{SingleFace, Typeface};
use std::io::Cursor;
use std::sync::Arc;

/// Monospaced face drawing each non-space character as a solid block, so
/// tests don't depend on font files being installed.
pub struct BlockFace;

impl Typeface for BlockFace {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * 0.5
    }

    fn rasterize(&self, text: &str, font_size: f32) -> GrayImage {
        let advance = font_size * 0.5;
        let width = self.text_width(text, font_size).ceil().max(1.0) as u32;
        let height = font_size.ceil().max(1.0) as u32;
        let mut mask = GrayImage::new(width, height);
        for (i, c) in text.chars().enumerate() {
            if c.is_whitespace() {
                continue;
            }
            let left = (i as f32 * advance + advance * 0.1).round() as u32;
            let right = ((i as f32 + 1.0) * advance - advance * 0.1).round() as u32;
            for y in (height / 5)..height {
                for x in left..right.min(width) {
                    mask.put_pixel(x, y, Luma([255]));
                }
            }
        }
        mask
    }
}

pub fn exporter() -> Exporter {
    Exporter::new(Arc::new(SingleFace(Arc::new(BlockFace))))
}

pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn png_data_url(width: u32, height: u32, color: [u8; 4]) -> String {
    inkmark::data_url::encode_data_url("image/png", &png_bytes(width, height, color))
}

pub fn decode(bytes: &[u8]) -> RgbaImage {
    image::load_from_memory(bytes).unwrap().to_rgba8()
}
