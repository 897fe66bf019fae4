use super::types::{
    Anchor, BlendMode, FontFamily, FontWeight, HexColor, NormalizedPoint, PatternMode,
    WatermarkConfig, WatermarkLogo, WatermarkStyle,
};

/// The look a style family starts from. Applying a style overwrites exactly
/// these fields and nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDefaults {
    pub font_family: FontFamily,
    pub font_weight: FontWeight,
    pub color: HexColor,
    pub opacity: f32,
    pub shadow_intensity: f32,
    pub glow_effect: bool,
    pub blend_mode: BlendMode,
    pub stroke: Option<(f32, HexColor)>,
    pub gradient: Option<(HexColor, HexColor)>,
}

impl WatermarkStyle {
    pub fn defaults(&self) -> StyleDefaults {
        let base = StyleDefaults {
            font_family: FontFamily::Inter,
            font_weight: FontWeight::SemiBold,
            color: HexColor::WHITE,
            opacity: 80.0,
            shadow_intensity: 30.0,
            glow_effect: false,
            blend_mode: BlendMode::Normal,
            stroke: None,
            gradient: None,
        };

        match self {
            WatermarkStyle::ModernGlass => base,
            WatermarkStyle::NeonGlow => StyleDefaults {
                font_family: FontFamily::Montserrat,
                font_weight: FontWeight::Bold,
                color: HexColor::new(0x00, 0xE5, 0xFF),
                opacity: 90.0,
                shadow_intensity: 60.0,
                glow_effect: true,
                blend_mode: BlendMode::Screen,
                ..base
            },
            WatermarkStyle::ElegantSerif => StyleDefaults {
                font_family: FontFamily::Playfair,
                font_weight: FontWeight::Regular,
                opacity: 85.0,
                shadow_intensity: 20.0,
                ..base
            },
            WatermarkStyle::BoldImpact => StyleDefaults {
                font_family: FontFamily::Montserrat,
                font_weight: FontWeight::ExtraBold,
                opacity: 95.0,
                shadow_intensity: 80.0,
                stroke: Some((2.0, HexColor::BLACK)),
                ..base
            },
            WatermarkStyle::MinimalClean => StyleDefaults {
                font_weight: FontWeight::Regular,
                opacity: 70.0,
                shadow_intensity: 0.0,
                ..base
            },
            WatermarkStyle::GradientFade => StyleDefaults {
                font_family: FontFamily::Montserrat,
                font_weight: FontWeight::Bold,
                shadow_intensity: 20.0,
                gradient: Some((HexColor::new(0xFF, 0x6B, 0x6B), HexColor::new(0x4E, 0xCD, 0xC4))),
                ..base
            },
            WatermarkStyle::StampVintage => StyleDefaults {
                font_family: FontFamily::RobotoSlab,
                font_weight: FontWeight::Bold,
                color: HexColor::new(0xB2, 0x22, 0x22),
                opacity: 85.0,
                shadow_intensity: 0.0,
                blend_mode: BlendMode::Multiply,
                stroke: Some((2.0, HexColor::new(0xB2, 0x22, 0x22))),
                ..base
            },
            WatermarkStyle::TechFuturistic => StyleDefaults {
                font_family: FontFamily::Montserrat,
                font_weight: FontWeight::SemiBold,
                color: HexColor::new(0x00, 0xFF, 0x9C),
                opacity: 90.0,
                shadow_intensity: 40.0,
                glow_effect: true,
                blend_mode: BlendMode::Screen,
                ..base
            },
        }
    }
}

impl WatermarkConfig {
    pub fn builder() -> WatermarkConfigBuilder {
        WatermarkConfigBuilder::default()
    }

    /// Switch to `style` and reset the fields that style family controls.
    pub fn apply_style(&mut self, style: WatermarkStyle) {
        let defaults = style.defaults();
        self.style = style;
        self.font_family = defaults.font_family;
        self.font_weight = defaults.font_weight;
        self.color = Some(defaults.color);
        self.opacity = defaults.opacity;
        self.shadow_intensity = defaults.shadow_intensity;
        self.glow_effect = defaults.glow_effect;
        self.blend_mode = defaults.blend_mode;
        self.stroke_width = defaults.stroke.map(|(width, _)| width);
        self.stroke_color = defaults.stroke.map(|(_, color)| color);
        self.gradient_from = defaults.gradient.map(|(from, _)| from);
        self.gradient_to = defaults.gradient.map(|(_, to)| to);
    }
}

/// Builds a config starting from a style family's defaults.
#[derive(Debug, Clone, Default)]
pub struct WatermarkConfigBuilder {
    config: WatermarkConfig,
}

impl WatermarkConfigBuilder {
    pub fn style(mut self, style: WatermarkStyle) -> Self {
        self.config.apply_style(style);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.config.text = text.into();
        self
    }

    pub fn color(mut self, color: HexColor) -> Self {
        self.config.color = Some(color);
        self
    }

    /// Drop the explicit color so the text follows the sampled background.
    pub fn adaptive_color(mut self) -> Self {
        self.config.color = None;
        self.config.adaptive_color = true;
        self
    }

    pub fn size(mut self, size: f32) -> Self {
        self.config.size = size;
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.config.opacity = opacity;
        self
    }

    pub fn rotation(mut self, rotation: f32) -> Self {
        self.config.rotation = rotation;
        self
    }

    pub fn position(mut self, position: Anchor) -> Self {
        self.config.position = position;
        self
    }

    pub fn custom_position(mut self, point: NormalizedPoint) -> Self {
        self.config.custom_position = Some(point);
        self
    }

    pub fn ai_placement(mut self, enabled: bool) -> Self {
        self.config.ai_placement = enabled;
        self
    }

    pub fn blend_mode(mut self, mode: BlendMode) -> Self {
        self.config.blend_mode = mode;
        self
    }

    pub fn shadow(mut self, intensity: f32, glow: bool) -> Self {
        self.config.shadow_intensity = intensity;
        self.config.glow_effect = glow;
        self
    }

    pub fn stroke(mut self, width: f32, color: HexColor) -> Self {
        self.config.stroke_width = Some(width);
        self.config.stroke_color = Some(color);
        self
    }

    pub fn gradient(mut self, from: HexColor, to: HexColor) -> Self {
        self.config.gradient_from = Some(from);
        self.config.gradient_to = Some(to);
        self
    }

    pub fn pattern(mut self, pattern: PatternMode, spacing: f32) -> Self {
        self.config.pattern = pattern;
        self.config.pattern_spacing = spacing;
        self
    }

    pub fn logo_url(mut self, data_url: impl Into<String>) -> Self {
        self.config.logo_url = Some(data_url.into());
        self
    }

    pub fn logo(mut self, logo: WatermarkLogo) -> Self {
        self.config.logos.push(logo);
        self
    }

    pub fn build(self) -> WatermarkConfig {
        self.config
    }
}
