//! Scene configuration.
//!
//! [`SceneConfig`] carries everything needed to bring up one grid cell:
//! which model to show, the character ramp luminance maps onto, the effect's
//! sampling resolution, the glyph tint and the animation settings.

use anyhow::Result;

/// Ten-step luminance ramp, darkest glyph first. The default charset.
pub const ASCII_RAMP: &str = " .:-+*=%@#";

/// Block-shading ramp for a denser, mosaic look.
pub const BLOCK_RAMP: &str = " ░▒▓█";

/// All model sources are resolved relative to this repository.
pub const MODEL_BASE_URL: &str = "https://threejs.org/examples/models/gltf/";

/// Per-cell scene settings.
///
/// Construct with [`SceneConfig::new`] and override whatever differs from
/// the defaults:
///
/// ```
/// use ascii_ngin::config::{SceneConfig, BLOCK_RAMP};
///
/// let config = SceneConfig {
///     charset: BLOCK_RAMP.to_string(),
///     animation_speed: 0.5,
///     ..SceneConfig::new("RobotExpressive/RobotExpressive.glb")
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
    /// Model file below [`MODEL_BASE_URL`], e.g. `"Horse.glb"`.
    pub model_source: String,
    /// Luminance-ordered glyphs, darkest first.
    pub charset: String,
    /// Fraction of the cell size the effect samples at, in `(0, 1]`.
    pub resolution: f32,
    /// Glyph tint as RGB.
    pub color: [u8; 3],
    /// Spin the model around Y while rendering.
    pub auto_rotate: bool,
    /// Playback rate multiplier for the model's first animation clip.
    pub animation_speed: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            model_source: String::new(),
            charset: ASCII_RAMP.to_string(),
            resolution: 0.15,
            color: [0x00, 0xff, 0xff],
            auto_rotate: true,
            animation_speed: 1.0,
        }
    }
}

impl SceneConfig {
    pub fn new(model_source: impl Into<String>) -> Self {
        Self {
            model_source: model_source.into(),
            ..Self::default()
        }
    }

    /// Full URL the model is fetched from.
    pub fn model_url(&self) -> String {
        format!("{}{}", MODEL_BASE_URL, self.model_source)
    }

    /// Rejects settings no scene can be built from.
    pub fn validate(&self) -> Result<()> {
        if self.model_source.is_empty() {
            anyhow::bail!("model_source must name a file below the model repository");
        }
        if self.charset.is_empty() {
            anyhow::bail!("charset needs at least one glyph");
        }
        if !(self.resolution > 0.0 && self.resolution <= 1.0) {
            anyhow::bail!("resolution {} is outside (0, 1]", self.resolution);
        }
        if !self.animation_speed.is_finite() || self.animation_speed < 0.0 {
            anyhow::bail!(
                "animation_speed {} must be finite and non-negative",
                self.animation_speed
            );
        }
        Ok(())
    }
}
