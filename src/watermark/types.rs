use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::ConfigError;

pub const SIZE_RANGE: (f32, f32) = (10.0, 200.0);
pub const OPACITY_RANGE: (f32, f32) = (0.0, 100.0);
pub const ROTATION_RANGE: (f32, f32) = (-180.0, 180.0);
pub const SHADOW_RANGE: (f32, f32) = (0.0, 100.0);

fn clamp_to(value: f32, (min, max): (f32, f32)) -> f32 {
    if value.is_nan() { min } else { value.clamp(min, max) }
}

/// An opaque sRGB color written as `#RRGGBB` (or `#RGB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const WHITE: HexColor = HexColor::new(255, 255, 255);
    pub const BLACK: HexColor = HexColor::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        let hex = value.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid color '{}'", value));
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return Err(format!("invalid color '{}'", value)),
        };
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|_| format!("invalid color '{}'", value))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Perceived brightness on the 0..255 scale, the same (R+G+B)/3 average used for
    /// background sampling.
    pub fn brightness(&self) -> f32 {
        (self.r as f32 + self.g as f32 + self.b as f32) / 3.0
    }
}

impl TryFrom<String> for HexColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        HexColor::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkStyle {
    #[default]
    ModernGlass,
    NeonGlow,
    ElegantSerif,
    BoldImpact,
    MinimalClean,
    GradientFade,
    StampVintage,
    TechFuturistic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontFamily {
    #[default]
    Inter,
    Playfair,
    Montserrat,
    RobotoSlab,
    Pacifico,
}

impl FontFamily {
    /// File stem used when looking the family up in a font directory.
    pub fn file_stem(&self) -> &'static str {
        match self {
            FontFamily::Inter => "Inter",
            FontFamily::Playfair => "PlayfairDisplay",
            FontFamily::Montserrat => "Montserrat",
            FontFamily::RobotoSlab => "RobotoSlab",
            FontFamily::Pacifico => "Pacifico",
        }
    }

    pub fn css_name(&self) -> &'static str {
        match self {
            FontFamily::Inter => "Inter",
            FontFamily::Playfair => "Playfair Display",
            FontFamily::Montserrat => "Montserrat",
            FontFamily::RobotoSlab => "Roboto Slab",
            FontFamily::Pacifico => "Pacifico",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum FontWeight {
    Regular,
    #[default]
    SemiBold,
    Bold,
    ExtraBold,
}

impl FontWeight {
    pub fn value(&self) -> u16 {
        match self {
            FontWeight::Regular => 400,
            FontWeight::SemiBold => 600,
            FontWeight::Bold => 700,
            FontWeight::ExtraBold => 800,
        }
    }

    pub fn file_suffix(&self) -> &'static str {
        match self {
            FontWeight::Regular => "Regular",
            FontWeight::SemiBold => "SemiBold",
            FontWeight::Bold => "Bold",
            FontWeight::ExtraBold => "ExtraBold",
        }
    }
}

impl TryFrom<u16> for FontWeight {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            400 => Ok(FontWeight::Regular),
            600 => Ok(FontWeight::SemiBold),
            700 => Ok(FontWeight::Bold),
            800 => Ok(FontWeight::ExtraBold),
            other => Err(format!("unsupported font weight {}", other)),
        }
    }
}

impl From<FontWeight> for u16 {
    fn from(weight: FontWeight) -> Self {
        weight.value()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
}

/// One of the nine named placement positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    #[default]
    BottomRight,
}

impl Anchor {
    /// Corner zones in tie-break order.
    pub const CORNERS: [Anchor; 4] = [
        Anchor::TopLeft,
        Anchor::TopRight,
        Anchor::BottomLeft,
        Anchor::BottomRight,
    ];

    pub fn horizontal(&self) -> HorizontalAlign {
        match self {
            Anchor::TopLeft | Anchor::CenterLeft | Anchor::BottomLeft => HorizontalAlign::Left,
            Anchor::TopCenter | Anchor::Center | Anchor::BottomCenter => HorizontalAlign::Center,
            Anchor::TopRight | Anchor::CenterRight | Anchor::BottomRight => HorizontalAlign::Right,
        }
    }

    pub fn vertical(&self) -> VerticalAlign {
        match self {
            Anchor::TopLeft | Anchor::TopCenter | Anchor::TopRight => VerticalAlign::Top,
            Anchor::CenterLeft | Anchor::Center | Anchor::CenterRight => VerticalAlign::Middle,
            Anchor::BottomLeft | Anchor::BottomCenter | Anchor::BottomRight => {
                VerticalAlign::Bottom
            }
        }
    }

    pub fn is_corner(&self) -> bool {
        Anchor::CORNERS.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left",
            Anchor::TopCenter => "top-center",
            Anchor::TopRight => "top-right",
            Anchor::CenterLeft => "center-left",
            Anchor::Center => "center",
            Anchor::CenterRight => "center-right",
            Anchor::BottomLeft => "bottom-left",
            Anchor::BottomCenter => "bottom-center",
            Anchor::BottomRight => "bottom-right",
        }
    }
}

/// Canvas global composite operations supported for the text pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
}

impl BlendMode {
    /// Name of the equivalent canvas `globalCompositeOperation`.
    pub fn composite_operation(&self) -> &'static str {
        match self {
            BlendMode::Normal => "source-over",
            other => other.css_name(),
        }
    }

    /// Name used for the CSS `mix-blend-mode` property.
    pub fn css_name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::ColorDodge => "color-dodge",
            BlendMode::ColorBurn => "color-burn",
            BlendMode::HardLight => "hard-light",
            BlendMode::SoftLight => "soft-light",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternMode {
    #[default]
    None,
    Tiled,
    Diagonal,
    Grid,
    Scattered,
    Border,
}

/// A point expressed as fractions (0..1) of the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
}

impl NormalizedPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn clamped(&self) -> Self {
        Self {
            x: clamp_to(self.x, (0.0, 1.0)),
            y: clamp_to(self.y, (0.0, 1.0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkLogo {
    pub id: String,
    pub data_url: String,
    pub position: NormalizedPoint,
    pub size: f32,
    pub rotation: f32,
    pub opacity: f32,
    pub locked: bool,
}

impl Default for WatermarkLogo {
    fn default() -> Self {
        Self {
            id: String::new(),
            data_url: String::new(),
            position: NormalizedPoint::new(0.85, 0.85),
            size: 100.0,
            rotation: 0.0,
            opacity: 100.0,
            locked: false,
        }
    }
}

/// Partial update for a logo. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoPatch {
    pub data_url: Option<String>,
    pub position: Option<NormalizedPoint>,
    pub size: Option<f32>,
    pub rotation: Option<f32>,
    pub opacity: Option<f32>,
    pub locked: Option<bool>,
}

impl WatermarkLogo {
    /// Returns a new record with `patch` merged over this one. The id never changes.
    pub fn merged(&self, patch: &LogoPatch) -> WatermarkLogo {
        WatermarkLogo {
            id: self.id.clone(),
            data_url: patch.data_url.clone().unwrap_or_else(|| self.data_url.clone()),
            position: patch.position.unwrap_or(self.position),
            size: patch.size.unwrap_or(self.size),
            rotation: patch.rotation.unwrap_or(self.rotation),
            opacity: patch.opacity.unwrap_or(self.opacity),
            locked: patch.locked.unwrap_or(self.locked),
        }
    }

    pub fn normalized(&self) -> WatermarkLogo {
        WatermarkLogo {
            position: self.position.clamped(),
            size: clamp_to(self.size, SIZE_RANGE),
            rotation: clamp_to(self.rotation, ROTATION_RANGE),
            opacity: clamp_to(self.opacity, OPACITY_RANGE),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    pub text: String,
    pub style: WatermarkStyle,
    pub font_family: FontFamily,
    pub font_weight: FontWeight,
    /// Explicit text color. When absent the color follows the background
    /// (if `adaptive_color`) or falls back to white.
    pub color: Option<HexColor>,
    pub adaptive_color: bool,
    pub size: f32,
    pub opacity: f32,
    pub rotation: f32,
    pub position: Anchor,
    /// Overrides `position` and bypasses face avoidance when set.
    pub custom_position: Option<NormalizedPoint>,
    pub ai_placement: bool,
    pub blend_mode: BlendMode,
    pub shadow_intensity: f32,
    pub glow_effect: bool,
    pub stroke_width: Option<f32>,
    pub stroke_color: Option<HexColor>,
    pub pattern: PatternMode,
    pub pattern_spacing: f32,
    pub gradient_from: Option<HexColor>,
    pub gradient_to: Option<HexColor>,
    /// Legacy single logo, laid out relative to the text.
    pub logo_url: Option<String>,
    pub logos: Vec<WatermarkLogo>,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: "© Watermark".to_string(),
            style: WatermarkStyle::ModernGlass,
            font_family: FontFamily::Inter,
            font_weight: FontWeight::SemiBold,
            color: Some(HexColor::WHITE),
            adaptive_color: false,
            size: 100.0,
            opacity: 80.0,
            rotation: 0.0,
            position: Anchor::BottomRight,
            custom_position: None,
            ai_placement: false,
            blend_mode: BlendMode::Normal,
            shadow_intensity: 30.0,
            glow_effect: false,
            stroke_width: None,
            stroke_color: None,
            pattern: PatternMode::None,
            pattern_spacing: 120.0,
            gradient_from: None,
            gradient_to: None,
            logo_url: None,
            logos: Vec::new(),
        }
    }
}

impl WatermarkConfig {
    /// Copy with every numeric field clamped to its declared range.
    pub fn normalized(&self) -> WatermarkConfig {
        WatermarkConfig {
            size: clamp_to(self.size, SIZE_RANGE),
            opacity: clamp_to(self.opacity, OPACITY_RANGE),
            rotation: clamp_to(self.rotation, ROTATION_RANGE),
            shadow_intensity: clamp_to(self.shadow_intensity, SHADOW_RANGE),
            stroke_width: self.stroke_width.map(|w| w.max(0.0)),
            pattern_spacing: if self.pattern_spacing.is_finite() {
                self.pattern_spacing.max(1.0)
            } else {
                1.0
            },
            custom_position: self.custom_position.map(|p| p.clamped()),
            logos: self.logos.iter().map(WatermarkLogo::normalized).collect(),
            ..self.clone()
        }
    }

    /// Checks invariants that clamping cannot repair.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for logo in &self.logos {
            if !seen.insert(logo.id.as_str()) {
                return Err(ConfigError::DuplicateLogoId(logo.id.clone()));
            }
        }
        Ok(())
    }

    pub fn logo(&self, id: &str) -> Option<&WatermarkLogo> {
        self.logos.iter().find(|logo| logo.id == id)
    }

    pub fn has_gradient(&self) -> bool {
        self.gradient_from.is_some() && self.gradient_to.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color_parse() {
        assert_eq!(HexColor::parse("#FFFFFF").unwrap(), HexColor::WHITE);
        assert_eq!(HexColor::parse("#f80").unwrap(), HexColor::new(0xff, 0x88, 0x00));
        assert_eq!(HexColor::parse("3b82f6").unwrap(), HexColor::new(59, 130, 246));
        assert!(HexColor::parse("#12345").is_err());
        assert!(HexColor::parse("#GGGGGG").is_err());
        assert_eq!(HexColor::new(59, 130, 246).to_string(), "#3B82F6");
    }

    #[test]
    fn test_normalized_clamps_ranges() {
        let config = WatermarkConfig {
            size: 500.0,
            opacity: -5.0,
            rotation: 270.0,
            shadow_intensity: f32::NAN,
            pattern_spacing: 0.0,
            logos: vec![WatermarkLogo {
                id: "a".to_string(),
                size: 2.0,
                position: NormalizedPoint::new(1.5, -0.2),
                ..Default::default()
            }],
            ..Default::default()
        };

        let normalized = config.normalized();
        assert_eq!(normalized.size, 200.0);
        assert_eq!(normalized.opacity, 0.0);
        assert_eq!(normalized.rotation, 180.0);
        assert_eq!(normalized.shadow_intensity, 0.0);
        assert_eq!(normalized.pattern_spacing, 1.0);
        assert_eq!(normalized.logos[0].size, 10.0);
        assert_eq!(normalized.logos[0].position, NormalizedPoint::new(1.0, 0.0));
    }

    #[test]
    fn test_validate_rejects_duplicate_logo_ids() {
        let logo = WatermarkLogo {
            id: "logo-1".to_string(),
            ..Default::default()
        };
        let config = WatermarkConfig {
            logos: vec![logo.clone(), logo],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateLogoId(id)) if id == "logo-1"
        ));
    }

    #[test]
    fn test_logo_merge_keeps_id() {
        let logo = WatermarkLogo {
            id: "logo-1".to_string(),
            opacity: 40.0,
            ..Default::default()
        };
        let merged = logo.merged(&LogoPatch {
            size: Some(150.0),
            ..Default::default()
        });
        assert_eq!(merged.id, "logo-1");
        assert_eq!(merged.size, 150.0);
        assert_eq!(merged.opacity, 40.0);
    }

    #[test]
    fn test_config_deserializes_from_toml() {
        let toml = r##"
            text = "© 2024"
            style = "neon-glow"
            font_weight = 700
            color = "#00E5FF"
            position = "top-left"
            blend_mode = "color-dodge"
            pattern = "diagonal"

            [[logos]]
            id = "logo-1"
            data_url = "data:image/png;base64,AAAA"
            position = { x = 0.1, y = 0.2 }
        "##;

        let config: WatermarkConfig = toml_edit::de::from_str(toml).unwrap();
        assert_eq!(config.text, "© 2024");
        assert_eq!(config.style, WatermarkStyle::NeonGlow);
        assert_eq!(config.font_weight, FontWeight::Bold);
        assert_eq!(config.color, Some(HexColor::new(0x00, 0xE5, 0xFF)));
        assert_eq!(config.position, Anchor::TopLeft);
        assert_eq!(config.blend_mode, BlendMode::ColorDodge);
        assert_eq!(config.pattern, PatternMode::Diagonal);
        assert_eq!(config.logos.len(), 1);
        assert_eq!(config.logos[0].opacity, 100.0);
        assert_eq!(config.size, 100.0);
    }

    #[test]
    fn test_anchor_alignment() {
        assert_eq!(Anchor::BottomRight.horizontal(), HorizontalAlign::Right);
        assert_eq!(Anchor::CenterLeft.vertical(), VerticalAlign::Middle);
        assert!(Anchor::TopLeft.is_corner());
        assert!(!Anchor::TopCenter.is_corner());
        assert_eq!(BlendMode::Normal.composite_operation(), "source-over");
        assert_eq!(BlendMode::SoftLight.composite_operation(), "soft-light");
    }
}
