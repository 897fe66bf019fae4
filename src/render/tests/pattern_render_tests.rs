use image::Rgba;

use super::support::{BlockFace, changed_pixels, solid};
use crate::placement::PlacementTarget;
use crate::render::{Canvas, Overlay, composite_overlay};
use crate::watermark::{Anchor, HexColor, PatternMode, WatermarkConfig};

const GRAY: [u8; 4] = [128, 128, 128, 255];

fn pattern_config(pattern: PatternMode) -> WatermarkConfig {
    WatermarkConfig {
        text: "AB".to_string(),
        color: Some(HexColor::new(255, 0, 0)),
        opacity: 100.0,
        shadow_intensity: 0.0,
        pattern,
        pattern_spacing: 40.0,
        ..Default::default()
    }
}

fn render(config: &WatermarkConfig, target: PlacementTarget) -> Canvas {
    let mut canvas = Canvas::from_image(&solid(400, 300, GRAY), 1.0);
    composite_overlay(
        &mut canvas,
        &Overlay {
            face: Some(&BlockFace),
            config,
            target,
            brightness: 128.0,
            companion: None,
            logos: &[],
        },
    );
    canvas
}

fn changed_in(canvas: &Canvas, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> bool {
    ys.clone().any(|y| {
        xs.clone()
            .any(|x| canvas.pixels().get_pixel(x, y) != &Rgba(GRAY))
    })
}

#[test]
fn test_tiled_pattern_covers_every_quadrant() {
    let canvas = render(
        &pattern_config(PatternMode::Tiled),
        PlacementTarget::Anchor(Anchor::BottomRight),
    );
    assert!(changed_in(&canvas, 0..200, 0..150));
    assert!(changed_in(&canvas, 200..400, 0..150));
    assert!(changed_in(&canvas, 0..200, 150..300));
    assert!(changed_in(&canvas, 200..400, 150..300));
}

#[test]
fn test_pattern_ignores_placement_target() {
    let config = pattern_config(PatternMode::Grid);
    let a = render(&config, PlacementTarget::Anchor(Anchor::TopLeft));
    let b = render(&config, PlacementTarget::Anchor(Anchor::BottomRight));
    assert_eq!(changed_pixels(a.pixels(), b.pixels()), 0);
}

#[test]
fn test_border_pattern_leaves_center_clear() {
    let canvas = render(
        &pattern_config(PatternMode::Border),
        PlacementTarget::Anchor(Anchor::BottomRight),
    );
    assert!(changed_in(&canvas, 0..400, 0..60));
    assert!(!changed_in(&canvas, 120..280, 100..200));
}

#[test]
fn test_single_placement_when_pattern_is_off() {
    let config = pattern_config(PatternMode::None);
    let canvas = render(&config, PlacementTarget::Anchor(Anchor::BottomRight));
    assert!(changed_in(&canvas, 200..400, 150..300));
    assert!(!changed_in(&canvas, 0..200, 0..150));
}

#[test]
fn test_logo_only_pattern() {
    let config = WatermarkConfig {
        text: String::new(),
        ..pattern_config(PatternMode::Tiled)
    };
    let logo = solid(30, 30, [0, 0, 255, 255]);
    let mut canvas = Canvas::from_image(&solid(400, 300, GRAY), 1.0);
    composite_overlay(
        &mut canvas,
        &Overlay {
            face: Some(&BlockFace),
            config: &config,
            target: PlacementTarget::Anchor(Anchor::BottomRight),
            brightness: 128.0,
            companion: Some(&logo),
            logos: &[],
        },
    );
    assert!(changed_in(&canvas, 0..200, 0..150));
    assert!(changed_in(&canvas, 200..400, 150..300));
}
