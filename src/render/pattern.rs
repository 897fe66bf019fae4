use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, warn};

use super::canvas::Canvas;
use super::logo::LOGO_GAP;
use super::text::Stamp;
use crate::placement::EDGE_MARGIN;
use crate::watermark::PatternMode;

/// Hard cap on repeated units per image.
pub const MAX_PLACEMENTS: usize = 4096;

const DIAGONAL_DEFAULT_ROTATION: f32 = -45.0;
const SCATTER_ROTATION_JITTER: f32 = 15.0;

/// Center and rotation of one repeated unit, in logical pixels and degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TilePlacement {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

/// Logical size of the repeated unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileUnit {
    pub width: f32,
    pub height: f32,
}

/// Footprint of the repeated unit from the text size (`width`, `font_size`)
/// and the fitted legacy logo size. The logo sits [`LOGO_GAP`] to the left of
/// the text and is centered on it vertically.
pub fn pattern_unit(text: Option<(f32, f32)>, logo: Option<(f32, f32)>) -> Option<TileUnit> {
    match (text, logo) {
        (Some((text_width, font_size)), Some((logo_width, logo_height))) => Some(TileUnit {
            width: text_width + LOGO_GAP + logo_width,
            height: font_size.max(logo_height),
        }),
        (Some((width, height)), None) | (None, Some((width, height))) => {
            Some(TileUnit { width, height })
        }
        (None, None) => None,
    }
}

fn steps(extent: f32, step: f32) -> usize {
    (extent / step).ceil().max(1.0) as usize
}

/// Compute where repeated units go. A rotation of zero on the diagonal mode
/// means "unspecified" and becomes -45 degrees.
pub fn tile(
    mode: PatternMode,
    unit: TileUnit,
    spacing: f32,
    rotation: f32,
    canvas_width: f32,
    canvas_height: f32,
) -> Vec<TilePlacement> {
    let spacing = spacing.max(1.0);
    let step_x = (unit.width + spacing).max(1.0);
    let step_y = (unit.height + spacing).max(1.0);

    let placements = match mode {
        PatternMode::None => Vec::new(),
        PatternMode::Tiled => {
            let mut out = Vec::new();
            'rows: for row in 0..steps(canvas_height, step_y) {
                for col in 0..steps(canvas_width, step_x) {
                    out.push(TilePlacement {
                        x: col as f32 * step_x + step_x / 2.0,
                        y: row as f32 * step_y + step_y / 2.0,
                        rotation,
                    });
                    if out.len() > MAX_PLACEMENTS {
                        break 'rows;
                    }
                }
            }
            out
        }
        PatternMode::Diagonal => diagonal(unit, step_x, step_y, rotation, canvas_width, canvas_height),
        PatternMode::Grid => {
            let mut out = Vec::new();
            'rows: for row in 0..steps(canvas_height, spacing) {
                for col in 0..steps(canvas_width, spacing) {
                    out.push(TilePlacement {
                        x: col as f32 * spacing + spacing / 2.0,
                        y: row as f32 * spacing + spacing / 2.0,
                        rotation,
                    });
                    if out.len() > MAX_PLACEMENTS {
                        break 'rows;
                    }
                }
            }
            out
        }
        PatternMode::Scattered => {
            let cols = steps(canvas_width, step_x);
            let mut out = Vec::new();
            'rows: for row in 0..steps(canvas_height, step_y) {
                for col in 0..cols {
                    let mut rng = ChaCha8Rng::seed_from_u64((row * cols + col) as u64);
                    let jitter_x = rng.random_range(-0.5f32..=0.5) * spacing;
                    let jitter_y = rng.random_range(-0.5f32..=0.5) * spacing;
                    let turn =
                        rng.random_range(-SCATTER_ROTATION_JITTER..=SCATTER_ROTATION_JITTER);
                    out.push(TilePlacement {
                        x: col as f32 * step_x + step_x / 2.0 + jitter_x,
                        y: row as f32 * step_y + step_y / 2.0 + jitter_y,
                        rotation: rotation + turn,
                    });
                    if out.len() > MAX_PLACEMENTS {
                        break 'rows;
                    }
                }
            }
            out
        }
        PatternMode::Border => border(unit, step_x, step_y, rotation, canvas_width, canvas_height),
    };

    if placements.len() > MAX_PLACEMENTS {
        warn!(
            "Pattern produced more than {} units, truncating",
            MAX_PLACEMENTS
        );
        return placements.into_iter().take(MAX_PLACEMENTS).collect();
    }
    placements
}

fn diagonal(
    unit: TileUnit,
    step_x: f32,
    step_y: f32,
    rotation: f32,
    canvas_width: f32,
    canvas_height: f32,
) -> Vec<TilePlacement> {
    let angle = if rotation == 0.0 {
        DIAGONAL_DEFAULT_ROTATION
    } else {
        rotation
    };
    let (sin, cos) = angle.to_radians().sin_cos();
    let (cx, cy) = (canvas_width / 2.0, canvas_height / 2.0);
    let reach = canvas_width.hypot(canvas_height) / 2.0 + unit.width.max(unit.height);
    let n_x = (reach / step_x).ceil() as i64;
    let n_y = (reach / step_y).ceil() as i64;
    let margin_x = unit.width / 2.0;
    let margin_y = unit.height / 2.0;

    let mut out = Vec::new();
    for j in -n_y..=n_y {
        for i in -n_x..=n_x {
            let (lx, ly) = (i as f32 * step_x, j as f32 * step_y);
            let x = cx + lx * cos - ly * sin;
            let y = cy + lx * sin + ly * cos;
            if x < -margin_x
                || x > canvas_width + margin_x
                || y < -margin_y
                || y > canvas_height + margin_y
            {
                continue;
            }
            out.push(TilePlacement {
                x,
                y,
                rotation: angle,
            });
            if out.len() > MAX_PLACEMENTS {
                return out;
            }
        }
    }
    out
}

fn border(
    unit: TileUnit,
    step_x: f32,
    step_y: f32,
    rotation: f32,
    canvas_width: f32,
    canvas_height: f32,
) -> Vec<TilePlacement> {
    let left = EDGE_MARGIN + unit.width / 2.0;
    let right = canvas_width - EDGE_MARGIN - unit.width / 2.0;
    let top = EDGE_MARGIN + unit.height / 2.0;
    let bottom = canvas_height - EDGE_MARGIN - unit.height / 2.0;
    let at = |x: f32, y: f32| TilePlacement { x, y, rotation };

    if right < left || bottom < top {
        // Not enough room for a ring, a single centered unit will do.
        return vec![at(canvas_width / 2.0, canvas_height / 2.0)];
    }

    let mut out = Vec::new();
    let mut x = left;
    while x <= right + f32::EPSILON {
        out.push(at(x, top));
        if bottom > top {
            out.push(at(x, bottom));
        }
        x += step_x;
    }

    if right > left {
        let mut y = top + step_y;
        while y < bottom - f32::EPSILON {
            out.push(at(left, y));
            out.push(at(right, y));
            y += step_y;
        }
    }
    out
}

/// Stamp the unit at every placement.
pub fn draw_pattern(canvas: &mut Canvas, stamp: &Stamp, placements: &[TilePlacement]) {
    debug!("Drawing {} pattern unit(s)", placements.len());
    for placement in placements {
        stamp.draw(canvas, (placement.x, placement.y), placement.rotation);
    }
}
