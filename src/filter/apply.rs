use image::RgbaImage;
use imageproc::filter::gaussian_blur_f32;

use super::{FilterExpression, FilterOp};

type Matrix = [[f32; 3]; 3];

// Luminance coefficients from the Filter Effects specification.
const LUM_R: f32 = 0.213;
const LUM_G: f32 = 0.715;
const LUM_B: f32 = 0.072;

fn saturate_matrix(s: f32) -> Matrix {
    [
        [LUM_R + (1.0 - LUM_R) * s, LUM_G - LUM_G * s, LUM_B - LUM_B * s],
        [LUM_R - LUM_R * s, LUM_G + (1.0 - LUM_G) * s, LUM_B - LUM_B * s],
        [LUM_R - LUM_R * s, LUM_G - LUM_G * s, LUM_B + (1.0 - LUM_B) * s],
    ]
}

fn hue_rotate_matrix(degrees: f32) -> Matrix {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            LUM_R + cos * (1.0 - LUM_R) - sin * LUM_R,
            LUM_G - cos * LUM_G - sin * LUM_G,
            LUM_B - cos * LUM_B + sin * (1.0 - LUM_B),
        ],
        [
            LUM_R - cos * LUM_R + sin * 0.143,
            LUM_G + cos * (1.0 - LUM_G) + sin * 0.140,
            LUM_B - cos * LUM_B - sin * 0.283,
        ],
        [
            LUM_R - cos * LUM_R - sin * (1.0 - LUM_R),
            LUM_G - cos * LUM_G + sin * LUM_G,
            LUM_B + cos * (1.0 - LUM_B) + sin * LUM_B,
        ],
    ]
}

fn sepia_matrix(amount: f32) -> Matrix {
    let k = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.393 + 0.607 * k, 0.769 - 0.769 * k, 0.189 - 0.189 * k],
        [0.349 - 0.349 * k, 0.686 + 0.314 * k, 0.168 - 0.168 * k],
        [0.272 - 0.272 * k, 0.534 - 0.534 * k, 0.131 + 0.869 * k],
    ]
}

fn grayscale_matrix(amount: f32) -> Matrix {
    let k = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.2126 + 0.7874 * k, 0.7152 - 0.7152 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 + 0.2848 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 - 0.7152 * k, 0.0722 + 0.9278 * k],
    ]
}

fn apply_matrix(m: &Matrix, c: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * c[0] + m[0][1] * c[1] + m[0][2] * c[2],
        m[1][0] * c[0] + m[1][1] * c[1] + m[1][2] * c[2],
        m[2][0] * c[0] + m[2][1] * c[1] + m[2][2] * c[2],
    ]
}

/// Per-pixel operation with its matrix precomputed.
enum PixelOp {
    Scale(f32),
    Contrast(f32),
    Matrix(Matrix),
    Invert(f32),
}

impl PixelOp {
    fn from_filter(op: &FilterOp) -> Option<Self> {
        match *op {
            FilterOp::Brightness(v) => Some(PixelOp::Scale(v)),
            FilterOp::Contrast(v) => Some(PixelOp::Contrast(v)),
            FilterOp::Saturate(v) => Some(PixelOp::Matrix(saturate_matrix(v))),
            FilterOp::HueRotate(v) => Some(PixelOp::Matrix(hue_rotate_matrix(v))),
            FilterOp::Sepia(v) => Some(PixelOp::Matrix(sepia_matrix(v))),
            FilterOp::Grayscale(v) => Some(PixelOp::Matrix(grayscale_matrix(v))),
            FilterOp::Invert(v) => Some(PixelOp::Invert(v.clamp(0.0, 1.0))),
            FilterOp::Blur(_) => None,
        }
    }

    fn apply(&self, c: [f32; 3]) -> [f32; 3] {
        let out = match self {
            PixelOp::Scale(k) => [c[0] * k, c[1] * k, c[2] * k],
            PixelOp::Contrast(k) => [
                (c[0] - 0.5) * k + 0.5,
                (c[1] - 0.5) * k + 0.5,
                (c[2] - 0.5) * k + 0.5,
            ],
            PixelOp::Matrix(m) => apply_matrix(m, c),
            PixelOp::Invert(a) => [
                c[0] * (1.0 - a) + (1.0 - c[0]) * a,
                c[1] * (1.0 - a) + (1.0 - c[1]) * a,
                c[2] * (1.0 - a) + (1.0 - c[2]) * a,
            ],
        };
        // Each primitive's output is clamped before the next one runs.
        [
            out[0].clamp(0.0, 1.0),
            out[1].clamp(0.0, 1.0),
            out[2].clamp(0.0, 1.0),
        ]
    }
}

fn apply_pixel_ops(image: &mut RgbaImage, ops: &[PixelOp]) {
    if ops.is_empty() {
        return;
    }
    for pixel in image.pixels_mut() {
        let mut c = [
            pixel[0] as f32 / 255.0,
            pixel[1] as f32 / 255.0,
            pixel[2] as f32 / 255.0,
        ];
        for op in ops {
            c = op.apply(c);
        }
        pixel[0] = (c[0] * 255.0).round() as u8;
        pixel[1] = (c[1] * 255.0).round() as u8;
        pixel[2] = (c[2] * 255.0).round() as u8;
    }
}

/// Apply `expression` to `image` in place, in chain order. Alpha is untouched.
///
/// Runs of per-pixel operations are evaluated in floating point in a single
/// pass. Blur breaks a run because it needs neighbouring pixels.
pub fn apply_filter(image: &mut RgbaImage, expression: &FilterExpression) {
    if expression.is_identity() {
        return;
    }

    let mut pending = Vec::new();
    for op in expression.ops.iter().filter(|op| !op.is_identity()) {
        match PixelOp::from_filter(op) {
            Some(pixel_op) => pending.push(pixel_op),
            None => {
                apply_pixel_ops(image, &pending);
                pending.clear();
                if let FilterOp::Blur(radius) = *op {
                    *image = gaussian_blur_f32(image, radius);
                }
            }
        }
    }
    apply_pixel_ops(image, &pending);
}
