use image::{RgbaImage, imageops::FilterType};
use resvg::{tiny_skia, usvg};
use tracing::{debug, warn};

use super::canvas::Canvas;
use super::text::{TextLayout, with_alpha};
use crate::data_url::DataUrl;
use crate::error::LogoLoadError;
use crate::watermark::{BlendMode, HorizontalAlign, WatermarkLogo};

const LOGO_SIZE_FACTOR: f32 = 0.05;
pub const MIN_LOGO_SIZE: f32 = 8.0;

/// Gap between the text and a companion logo, in logical pixels.
pub const LOGO_GAP: f32 = 12.0;

/// Logo width in logical pixels for an image `image_width` wide at `size` percent.
pub fn logo_size_for(image_width: f32, size: f32) -> f32 {
    (image_width * size / 100.0 * LOGO_SIZE_FACTOR)
        .round()
        .max(MIN_LOGO_SIZE)
}

/// Decode a logo carried in a data URL. SVG is rasterized at its intrinsic size.
pub fn decode_logo(data_url: &str) -> Result<RgbaImage, LogoLoadError> {
    let parsed = DataUrl::parse(data_url).map_err(LogoLoadError::InvalidDataUrl)?;
    if parsed.is_svg() {
        return rasterize_svg(&parsed.bytes);
    }
    Ok(image::load_from_memory(&parsed.bytes)?.to_rgba8())
}

fn rasterize_svg(data: &[u8]) -> Result<RgbaImage, LogoLoadError> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default())
        .map_err(|e| LogoLoadError::SvgError(e.to_string()))?;
    let size = tree.size().to_int_size();

    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| LogoLoadError::SvgError("Failed to create pixmap".to_string()))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let mut image = RgbaImage::from_raw(size.width(), size.height(), pixmap.take())
        .ok_or_else(|| LogoLoadError::SvgError("Pixmap size mismatch".to_string()))?;
    // tiny-skia hands back premultiplied color.
    for pixel in image.pixels_mut() {
        let a = pixel[3] as u16;
        if a > 0 && a < 255 {
            for c in 0..3 {
                pixel[c] = ((pixel[c] as u16 * 255 + a / 2) / a).min(255) as u8;
            }
        }
    }
    Ok(image)
}

/// Decode every logo concurrently. Results come back in input order.
pub async fn load_logos(data_urls: Vec<String>) -> Vec<Result<RgbaImage, LogoLoadError>> {
    let handles: Vec<_> = data_urls
        .into_iter()
        .map(|url| tokio::task::spawn_blocking(move || decode_logo(&url)))
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(match handle.await {
            Ok(result) => result,
            Err(e) => Err(LogoLoadError::Task(e)),
        });
    }
    results
}

/// Scale `logo` to `width` backing pixels, keeping its aspect ratio.
pub fn fit_logo(logo: &RgbaImage, width: f32) -> RgbaImage {
    let target_w = width.round().max(1.0) as u32;
    let target_h = ((logo.height() as f32 * width / logo.width().max(1) as f32).round() as u32).max(1);
    if (target_w, target_h) == logo.dimensions() {
        return logo.clone();
    }
    image::imageops::resize(logo, target_w, target_h, FilterType::Lanczos3)
}

/// Logical size of a `source`-sized logo after [`fit_logo`] to
/// `width` logical pixels at `scale`.
pub fn fitted_logo_size(source: (u32, u32), width: f32, scale: f32) -> (f32, f32) {
    let backing = width * scale;
    let target_w = backing.round().max(1.0);
    let target_h = (source.1 as f32 * backing / source.0.max(1) as f32)
        .round()
        .max(1.0);
    (target_w / scale, target_h / scale)
}

/// Top-left corner of the legacy logo relative to the text, in logical pixels.
pub fn companion_origin(
    layout: &TextLayout,
    logo_width: f32,
    logo_height: f32,
) -> (f32, f32) {
    let text = layout.bounds();
    let line_center = text.y + text.height / 2.0;
    match layout.decision.horizontal() {
        HorizontalAlign::Right => (
            text.x + text.width + LOGO_GAP,
            line_center - logo_height / 2.0,
        ),
        HorizontalAlign::Left => (
            text.x - LOGO_GAP - logo_width,
            line_center - logo_height / 2.0,
        ),
        HorizontalAlign::Center => (
            text.x + text.width / 2.0 - logo_width / 2.0,
            text.y - LOGO_GAP - logo_height,
        ),
    }
}

/// Draw the single legacy logo next to the text.
pub fn draw_companion_logo(
    canvas: &mut Canvas,
    logo: &RgbaImage,
    layout: &TextLayout,
    size: f32,
    opacity: f32,
) {
    let scale = canvas.scale();
    let width = logo_size_for(canvas.logical_width(), size);
    let fitted = fit_logo(logo, width * scale);
    let height = fitted.height() as f32 / scale;

    let (x, y) = companion_origin(layout, width, height);
    debug!("Drawing companion logo at ({}, {}) width {}", x, y, width);
    canvas.draw_layer(
        &fitted,
        (x * scale).round() as i64,
        (y * scale).round() as i64,
        BlendMode::Normal,
        opacity,
    );
}

/// Draw positioned logos in order, so later entries land on top.
pub fn draw_logos(canvas: &mut Canvas, logos: &[(WatermarkLogo, RgbaImage)]) {
    let scale = canvas.scale();
    for (logo, image) in logos {
        let width = logo_size_for(canvas.logical_width(), logo.size);
        let fitted = fit_logo(image, width * scale);
        let center = (
            logo.position.x * canvas.logical_width(),
            logo.position.y * canvas.logical_height(),
        );
        debug!("Drawing logo {} at {:?} width {}", logo.id, center, width);
        canvas.draw_centered(
            &with_alpha(&fitted, logo.opacity / 100.0),
            center,
            logo.rotation,
            BlendMode::Normal,
            1.0,
        );
    }
}

/// Pair each logo with its decoded image, dropping (and logging) failures.
pub fn keep_decoded(
    logos: &[WatermarkLogo],
    decoded: Vec<Result<RgbaImage, LogoLoadError>>,
) -> Vec<(WatermarkLogo, RgbaImage)> {
    logos
        .iter()
        .zip(decoded)
        .filter_map(|(logo, result)| match result {
            Ok(image) => Some((logo.clone(), image)),
            Err(e) => {
                warn!("Skipping logo {}: {}", logo.id, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_url::encode_data_url;
    use crate::placement::PlacementTarget;
    use crate::watermark::Anchor;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_data_url(color: [u8; 4], width: u32, height: u32) -> String {
        let image = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        encode_data_url("image/png", &bytes)
    }

    #[test]
    fn test_logo_size_floor() {
        assert_eq!(logo_size_for(1000.0, 100.0), 50.0);
        assert_eq!(logo_size_for(100.0, 10.0), MIN_LOGO_SIZE);
    }

    #[test]
    fn test_decode_png_logo() {
        let image = decode_logo(&png_data_url([255, 0, 0, 255], 6, 3)).unwrap();
        assert_eq!(image.dimensions(), (6, 3));
    }

    #[test]
    fn test_decode_svg_logo() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><rect width="20" height="10" fill="#ff0000"/></svg>"##;
        let image = decode_logo(&encode_data_url("image/svg+xml", svg.as_bytes())).unwrap();
        assert_eq!(image.dimensions(), (20, 10));
        assert_eq!(image.get_pixel(10, 5), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_decode_percent_encoded_svg_logo() {
        let url = "data:image/svg+xml,%3Csvg%20xmlns%3D%22http%3A%2F%2Fwww.w3.org%2F2000%2Fsvg%22%20width%3D%2212%22%20height%3D%228%22%3E%3Crect%20width%3D%2212%22%20height%3D%228%22%20fill%3D%22%2300ff00%22%2F%3E%3C%2Fsvg%3E";
        let image = decode_logo(url).unwrap();
        assert_eq!(image.dimensions(), (12, 8));
        assert_eq!(image.get_pixel(6, 4), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        assert!(matches!(
            decode_logo("not a data url"),
            Err(LogoLoadError::InvalidDataUrl(_))
        ));
        assert!(matches!(
            decode_logo(&encode_data_url("image/png", b"garbage")),
            Err(LogoLoadError::DecodeError(_))
        ));
    }

    #[tokio::test]
    async fn test_load_logos_keeps_order_and_failures() {
        let urls = vec![
            png_data_url([0, 0, 255, 255], 2, 2),
            "data:image/png;base64,!!".to_string(),
            png_data_url([0, 255, 0, 255], 4, 4),
        ];
        let results = load_logos(urls).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().dimensions(), (2, 2));
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn test_fit_logo_keeps_aspect() {
        let logo = RgbaImage::new(200, 100);
        assert_eq!(fit_logo(&logo, 50.0).dimensions(), (50, 25));
    }

    #[test]
    fn test_fitted_size_matches_fit_logo() {
        let logo = RgbaImage::new(37, 23);
        for scale in [1.0f32, 1.5, 2.0] {
            let fitted = fit_logo(&logo, 45.0 * scale);
            let (w, h) = fitted_logo_size(logo.dimensions(), 45.0, scale);
            assert!((w * scale - fitted.width() as f32).abs() < 1e-3);
            assert!((h * scale - fitted.height() as f32).abs() < 1e-3);
        }
    }

    #[test]
    fn test_companion_origin_follows_alignment() {
        let right = TextLayout::new(
            PlacementTarget::Anchor(Anchor::BottomRight),
            1000.0,
            1000.0,
            200.0,
            40.0,
        );
        // Text spans x 780..980, y 940..980.
        assert_eq!(companion_origin(&right, 50.0, 20.0), (992.0, 950.0));

        let left = TextLayout::new(
            PlacementTarget::Anchor(Anchor::TopLeft),
            1000.0,
            1000.0,
            200.0,
            40.0,
        );
        // Text spans x 20..220, y 20..60.
        assert_eq!(companion_origin(&left, 50.0, 20.0), (-42.0, 30.0));

        let center = TextLayout::new(
            PlacementTarget::Anchor(Anchor::Center),
            1000.0,
            1000.0,
            200.0,
            40.0,
        );
        // Text spans x 400..600, y 480..520.
        assert_eq!(companion_origin(&center, 50.0, 20.0), (475.0, 448.0));
    }
}
