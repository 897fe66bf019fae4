// Watermark configuration model - style families, logos and the edit session
mod session;
mod style;
mod types;

pub use session::{EditSession, GestureDelta};
pub use style::{StyleDefaults, WatermarkConfigBuilder};
pub use types::{
    Anchor, BlendMode, FontFamily, FontWeight, HexColor, HorizontalAlign, LogoPatch,
    NormalizedPoint, PatternMode, VerticalAlign, WatermarkConfig, WatermarkLogo, WatermarkStyle,
};
