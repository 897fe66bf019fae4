use image::{DynamicImage, ImageEncoder, RgbaImage, codecs::jpeg::JpegEncoder};
use tracing::debug;

/// Encode the composited canvas as a baseline JPEG.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    // JPEG doesn't support alpha channel, so convert to RGB
    let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut bytes = Vec::new();

    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder.write_image(
        &rgb_image,
        rgb_image.width(),
        rgb_image.height(),
        image::ExtendedColorType::Rgb8,
    )?;

    debug!(
        "Encoded {}x{} JPEG at quality {}: {} bytes",
        rgb_image.width(),
        rgb_image.height(),
        quality,
        bytes.len()
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_encode_jpeg_roundtrips_dimensions() {
        let image = RgbaImage::from_pixel(32, 16, Rgba([200, 100, 50, 255]));
        let bytes = encode_jpeg(&image, 95).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let image = RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255]));
        assert_eq!(encode_jpeg(&image, 95).unwrap(), encode_jpeg(&image, 95).unwrap());
    }
}
