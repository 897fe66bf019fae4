use serde::{Deserialize, Serialize};

use super::FilterOp::{self, Blur, Brightness, Contrast, Grayscale, HueRotate, Saturate, Sepia};

/// Curated look presets. Each expands to a fixed chain that runs before the
/// slider-driven operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterPreset {
    #[default]
    None,
    Vivid,
    Warm,
    Cool,
    Vintage,
    Noir,
    Sepia,
    Fade,
    Dramatic,
    GoldenHour,
    Moody,
    Cinematic,
    Pastel,
    Matte,
    Film,
    Polaroid,
    Retro,
    Lomo,
    Crisp,
    Bright,
    Dark,
    Dreamy,
    Sunset,
    Arctic,
    Forest,
    Desert,
    Neon,
    Cyberpunk,
    Bleach,
    HighKeyMono,
}

impl FilterPreset {
    pub const ALL: [FilterPreset; 29] = [
        FilterPreset::Vivid,
        FilterPreset::Warm,
        FilterPreset::Cool,
        FilterPreset::Vintage,
        FilterPreset::Noir,
        FilterPreset::Sepia,
        FilterPreset::Fade,
        FilterPreset::Dramatic,
        FilterPreset::GoldenHour,
        FilterPreset::Moody,
        FilterPreset::Cinematic,
        FilterPreset::Pastel,
        FilterPreset::Matte,
        FilterPreset::Film,
        FilterPreset::Polaroid,
        FilterPreset::Retro,
        FilterPreset::Lomo,
        FilterPreset::Crisp,
        FilterPreset::Bright,
        FilterPreset::Dark,
        FilterPreset::Dreamy,
        FilterPreset::Sunset,
        FilterPreset::Arctic,
        FilterPreset::Forest,
        FilterPreset::Desert,
        FilterPreset::Neon,
        FilterPreset::Cyberpunk,
        FilterPreset::Bleach,
        FilterPreset::HighKeyMono,
    ];

    pub fn ops(&self) -> &'static [FilterOp] {
        match self {
            FilterPreset::None => &[],
            FilterPreset::Vivid => &[Saturate(1.5), Contrast(1.1)],
            FilterPreset::Warm => &[Sepia(0.2), Saturate(1.2), HueRotate(-10.0)],
            FilterPreset::Cool => &[Saturate(0.9), HueRotate(15.0), Brightness(1.05)],
            FilterPreset::Vintage => &[Sepia(0.4), Contrast(1.1), Brightness(0.95), Saturate(0.8)],
            FilterPreset::Noir => &[Grayscale(1.0), Contrast(1.4), Brightness(0.9)],
            FilterPreset::Sepia => &[Sepia(0.8)],
            FilterPreset::Fade => &[Contrast(0.85), Brightness(1.1), Saturate(0.8)],
            FilterPreset::Dramatic => &[Contrast(1.5), Saturate(1.2), Brightness(0.9)],
            FilterPreset::GoldenHour => &[Sepia(0.3), Saturate(1.4), HueRotate(-15.0), Brightness(1.05)],
            FilterPreset::Moody => &[Contrast(1.2), Saturate(0.7), Brightness(0.85)],
            FilterPreset::Cinematic => &[Contrast(1.25), Saturate(0.85), HueRotate(-5.0)],
            FilterPreset::Pastel => &[Saturate(0.6), Brightness(1.15), Contrast(0.9)],
            FilterPreset::Matte => &[Contrast(0.8), Brightness(1.05), Saturate(0.9)],
            FilterPreset::Film => &[Sepia(0.15), Contrast(1.1), Saturate(0.9)],
            FilterPreset::Polaroid => &[Sepia(0.25), Contrast(1.05), Brightness(1.1), Saturate(1.1)],
            FilterPreset::Retro => &[Sepia(0.5), HueRotate(-20.0), Saturate(1.3)],
            FilterPreset::Lomo => &[Contrast(1.4), Saturate(1.3), Brightness(0.95)],
            FilterPreset::Crisp => &[Contrast(1.2), Brightness(1.05), Saturate(1.1)],
            FilterPreset::Bright => &[Brightness(1.2), Contrast(1.05)],
            FilterPreset::Dark => &[Brightness(0.75), Contrast(1.15)],
            FilterPreset::Dreamy => &[Brightness(1.1), Saturate(1.2), Contrast(0.9), Blur(0.5)],
            FilterPreset::Sunset => &[Sepia(0.35), HueRotate(-25.0), Saturate(1.5)],
            FilterPreset::Arctic => &[HueRotate(20.0), Saturate(0.7), Brightness(1.1)],
            FilterPreset::Forest => &[HueRotate(-30.0), Saturate(1.1), Contrast(1.05)],
            FilterPreset::Desert => &[Sepia(0.45), Saturate(1.1), Brightness(1.05)],
            FilterPreset::Neon => &[Saturate(2.0), Contrast(1.3), HueRotate(10.0)],
            FilterPreset::Cyberpunk => &[HueRotate(-60.0), Saturate(1.8), Contrast(1.2)],
            FilterPreset::Bleach => &[Saturate(0.4), Contrast(1.3), Brightness(1.1)],
            FilterPreset::HighKeyMono => &[Grayscale(1.0), Brightness(1.3), Contrast(0.9)],
        }
    }
}
