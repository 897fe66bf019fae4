use image::Rgba;

use crate::watermark::BlendMode;

/// Separable blend function `B(cb, cs)` on unit-range channels.
pub fn blend_channel(mode: BlendMode, cb: f32, cs: f32) -> f32 {
    match mode {
        BlendMode::Normal => cs,
        BlendMode::Multiply => cb * cs,
        BlendMode::Screen => screen(cb, cs),
        BlendMode::Overlay => hard_light(cs, cb),
        BlendMode::Darken => cb.min(cs),
        BlendMode::Lighten => cb.max(cs),
        BlendMode::ColorDodge => {
            if cb <= 0.0 {
                0.0
            } else if cs >= 1.0 {
                1.0
            } else {
                (cb / (1.0 - cs)).min(1.0)
            }
        }
        BlendMode::ColorBurn => {
            if cb >= 1.0 {
                1.0
            } else if cs <= 0.0 {
                0.0
            } else {
                1.0 - ((1.0 - cb) / cs).min(1.0)
            }
        }
        BlendMode::HardLight => hard_light(cb, cs),
        BlendMode::SoftLight => {
            if cs <= 0.5 {
                cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
            } else {
                let d = if cb <= 0.25 {
                    ((16.0 * cb - 12.0) * cb + 4.0) * cb
                } else {
                    cb.sqrt()
                };
                cb + (2.0 * cs - 1.0) * (d - cb)
            }
        }
        BlendMode::Difference => (cb - cs).abs(),
        BlendMode::Exclusion => cb + cs - 2.0 * cb * cs,
    }
}

fn screen(cb: f32, cs: f32) -> f32 {
    cb + cs - cb * cs
}

fn hard_light(cb: f32, cs: f32) -> f32 {
    if cs <= 0.5 {
        cb * 2.0 * cs
    } else {
        screen(cb, 2.0 * cs - 1.0)
    }
}

/// Composite a straight-alpha source color (unit range, alpha already scaled
/// by any global alpha) onto `dst` with `mode`, then source-over.
pub fn composite_pixel(dst: Rgba<u8>, src: [f32; 4], mode: BlendMode) -> Rgba<u8> {
    let alpha_s = src[3].clamp(0.0, 1.0);
    if alpha_s <= 0.0 {
        return dst;
    }

    let alpha_b = dst[3] as f32 / 255.0;
    let alpha_o = alpha_s + alpha_b * (1.0 - alpha_s);
    if alpha_o <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let cb = dst[i] as f32 / 255.0;
        let cs = src[i].clamp(0.0, 1.0);
        let mixed = (1.0 - alpha_b) * cs + alpha_b * blend_channel(mode, cb, cs);
        let premultiplied = alpha_s * mixed + alpha_b * cb * (1.0 - alpha_s);
        out[i] = ((premultiplied / alpha_o).clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    out[3] = (alpha_o * 255.0).round() as u8;
    Rgba(out)
}
