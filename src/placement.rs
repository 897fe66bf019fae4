//! Placement resolver: turns the requested anchor into a final position,
//! steering away from detected faces when adaptive placement is requested.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::faces::FaceRegion;
use crate::watermark::{Anchor, HorizontalAlign, NormalizedPoint, VerticalAlign};

/// Distance from the image edge for anchored text, in logical pixels.
pub const EDGE_MARGIN: f32 = 20.0;

/// Largest face overlap, as a fraction of the image area, that still counts as clear.
pub const COLLISION_THRESHOLD: f32 = 0.005;

/// Rectangle in image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ZoneBox {
    fn intersection_area(&self, face: &FaceRegion) -> f32 {
        let left = self.x.max(face.top_left[0]);
        let top = self.y.max(face.top_left[1]);
        let right = (self.x + self.width).min(face.bottom_right[0]);
        let bottom = (self.y + self.height).min(face.bottom_right[1]);
        (right - left).max(0.0) * (bottom - top).max(0.0)
    }
}

/// The `w/3 × h/3` zone of the 3×3 grid cell named by `anchor`. For corner
/// anchors this is the corner zone used for face-avoidance scoring.
pub fn zone_box(anchor: Anchor, image_width: f32, image_height: f32) -> ZoneBox {
    let width = image_width / 3.0;
    let height = image_height / 3.0;
    let x = match anchor.horizontal() {
        HorizontalAlign::Left => 0.0,
        HorizontalAlign::Center => width,
        HorizontalAlign::Right => image_width - width,
    };
    let y = match anchor.vertical() {
        VerticalAlign::Top => 0.0,
        VerticalAlign::Middle => height,
        VerticalAlign::Bottom => image_height - height,
    };
    ZoneBox {
        x,
        y,
        width,
        height,
    }
}

/// Total area shared between `zone` and every face.
pub fn score_zone(zone: &ZoneBox, faces: &[FaceRegion]) -> f32 {
    faces.iter().map(|face| zone.intersection_area(face)).sum()
}

/// What the final position was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementTarget {
    Anchor(Anchor),
    Custom(NormalizedPoint),
}

/// Decide where the watermark goes.
///
/// A custom point always wins. Otherwise the requested anchor is kept unless
/// adaptive placement is on and its zone overlaps faces by more than
/// [`COLLISION_THRESHOLD`] of the image area, in which case the corner with
/// the least overlap is chosen (first in [`Anchor::CORNERS`] order on ties).
pub fn resolve(
    position: Anchor,
    image_width: f32,
    image_height: f32,
    faces: &[FaceRegion],
    auto_place: bool,
    custom: Option<NormalizedPoint>,
) -> PlacementTarget {
    if let Some(point) = custom {
        return PlacementTarget::Custom(point.clamped());
    }
    if !auto_place || faces.is_empty() {
        return PlacementTarget::Anchor(position);
    }

    let user_score = score_zone(&zone_box(position, image_width, image_height), faces);
    if user_score <= COLLISION_THRESHOLD * image_width * image_height {
        return PlacementTarget::Anchor(position);
    }

    let mut best = Anchor::CORNERS[0];
    let mut best_score = f32::INFINITY;
    for corner in Anchor::CORNERS {
        let score = score_zone(&zone_box(corner, image_width, image_height), faces);
        if score < best_score {
            best = corner;
            best_score = score;
        }
    }

    debug!(
        "Relocating watermark from {} to {} (overlap {} -> {})",
        position.as_str(),
        best.as_str(),
        user_score,
        best_score
    );
    PlacementTarget::Anchor(best)
}

/// A resolved pixel position for the text unit. `x` is the left edge and `y`
/// the bottom edge (text is laid out with a bottom baseline).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementDecision {
    pub x: f32,
    pub y: f32,
    pub target: PlacementTarget,
}

impl PlacementDecision {
    pub fn locate(
        target: PlacementTarget,
        image_width: f32,
        image_height: f32,
        text_width: f32,
        font_size: f32,
    ) -> Self {
        let (x, y) = match target {
            PlacementTarget::Custom(point) => (
                point.x * image_width - text_width / 2.0,
                point.y * image_height + font_size / 2.0,
            ),
            PlacementTarget::Anchor(anchor) => {
                let x = match anchor.horizontal() {
                    HorizontalAlign::Left => EDGE_MARGIN,
                    HorizontalAlign::Center => (image_width - text_width) / 2.0,
                    HorizontalAlign::Right => image_width - EDGE_MARGIN - text_width,
                };
                let y = match anchor.vertical() {
                    VerticalAlign::Top => EDGE_MARGIN + font_size,
                    VerticalAlign::Middle => (image_height + font_size) / 2.0,
                    VerticalAlign::Bottom => image_height - EDGE_MARGIN,
                };
                (x, y)
            }
        };
        Self { x, y, target }
    }

    /// Horizontal alignment that governs where a companion logo goes.
    pub fn horizontal(&self) -> HorizontalAlign {
        match self.target {
            PlacementTarget::Anchor(anchor) => anchor.horizontal(),
            PlacementTarget::Custom(_) => HorizontalAlign::Center,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covering(zone: ZoneBox) -> FaceRegion {
        FaceRegion::new(
            [zone.x, zone.y],
            [zone.x + zone.width, zone.y + zone.height],
        )
    }

    #[test]
    fn test_corner_zones_are_thirds() {
        let zone = zone_box(Anchor::BottomRight, 900.0, 600.0);
        assert_eq!(
            zone,
            ZoneBox {
                x: 600.0,
                y: 400.0,
                width: 300.0,
                height: 200.0
            }
        );
        let zone = zone_box(Anchor::TopLeft, 900.0, 600.0);
        assert_eq!((zone.x, zone.y), (0.0, 0.0));
    }

    #[test]
    fn test_pass_through_without_faces_or_auto() {
        let face = covering(zone_box(Anchor::BottomRight, 1000.0, 1000.0));
        assert_eq!(
            resolve(Anchor::BottomRight, 1000.0, 1000.0, &[], true, None),
            PlacementTarget::Anchor(Anchor::BottomRight)
        );
        assert_eq!(
            resolve(Anchor::BottomRight, 1000.0, 1000.0, &[face], false, None),
            PlacementTarget::Anchor(Anchor::BottomRight)
        );
    }

    #[test]
    fn test_collision_moves_to_clear_corner() {
        let face = covering(zone_box(Anchor::BottomRight, 1000.0, 1000.0));
        let target = resolve(Anchor::BottomRight, 1000.0, 1000.0, &[face], true, None);
        assert_ne!(target, PlacementTarget::Anchor(Anchor::BottomRight));
        // All other corners are clear, so the first in tie order wins.
        assert_eq!(target, PlacementTarget::Anchor(Anchor::TopLeft));
    }

    #[test]
    fn test_small_overlap_keeps_user_position() {
        // 70×70 = 4900 <= 0.005 × 1000 × 1000 = 5000
        let face = FaceRegion::new([930.0, 930.0], [1000.0, 1000.0]);
        assert_eq!(
            resolve(Anchor::BottomRight, 1000.0, 1000.0, &[face], true, None),
            PlacementTarget::Anchor(Anchor::BottomRight)
        );

        // 80×80 = 6400 > 5000
        let face = FaceRegion::new([920.0, 920.0], [1000.0, 1000.0]);
        assert_ne!(
            resolve(Anchor::BottomRight, 1000.0, 1000.0, &[face], true, None),
            PlacementTarget::Anchor(Anchor::BottomRight)
        );
    }

    #[test]
    fn test_least_overlap_corner_wins() {
        let faces = [
            covering(zone_box(Anchor::BottomRight, 900.0, 900.0)),
            covering(zone_box(Anchor::TopLeft, 900.0, 900.0)),
            FaceRegion::new([600.0, 0.0], [700.0, 100.0]),
        ];
        assert_eq!(
            resolve(Anchor::BottomRight, 900.0, 900.0, &faces, true, None),
            PlacementTarget::Anchor(Anchor::BottomLeft)
        );
    }

    #[test]
    fn test_custom_point_bypasses_faces() {
        let face = covering(zone_box(Anchor::BottomRight, 1000.0, 1000.0));
        let point = NormalizedPoint::new(0.9, 0.9);
        assert_eq!(
            resolve(Anchor::BottomRight, 1000.0, 1000.0, &[face], true, Some(point)),
            PlacementTarget::Custom(point)
        );
    }

    #[test]
    fn test_bottom_right_geometry() {
        let decision = PlacementDecision::locate(
            PlacementTarget::Anchor(Anchor::BottomRight),
            1000.0,
            1000.0,
            180.0,
            45.0,
        );
        assert_eq!(decision.x + 180.0, 980.0);
        assert_eq!(decision.y, 980.0);
    }

    #[test]
    fn test_custom_geometry() {
        let decision = PlacementDecision::locate(
            PlacementTarget::Custom(NormalizedPoint::new(0.5, 0.25)),
            800.0,
            600.0,
            100.0,
            20.0,
        );
        assert_eq!(decision.x, 350.0);
        assert_eq!(decision.y, 160.0);
    }

    #[test]
    fn test_top_and_center_geometry() {
        let top_left = PlacementDecision::locate(
            PlacementTarget::Anchor(Anchor::TopLeft),
            800.0,
            600.0,
            100.0,
            30.0,
        );
        assert_eq!((top_left.x, top_left.y), (20.0, 50.0));

        let center = PlacementDecision::locate(
            PlacementTarget::Anchor(Anchor::Center),
            800.0,
            600.0,
            100.0,
            30.0,
        );
        assert_eq!((center.x, center.y), (350.0, 315.0));
    }
}
