//! Configuration file support for notebuf.
//!
//! This module handles loading and validating user settings from the configuration file
//! located at `~/.config/notebuf/config.toml`. Settings cover arena sizing, the attribute
//! defaults every buffer starts from, and the output surface used by `notebuf render`.
//!
//! If no config file exists, sensible defaults are used automatically.

pub mod enums;
pub mod types;

pub use enums::{Backend, ColorSpec};
pub use types::{ArenaConfig, FillConfig, MarkerConfig, PenConfig, RenderConfig, TextConfig};

use crate::draw::{FontDescriptor, FontId, FontTable};
use crate::note::{
    AttribState, FillAttrib, LineAttrib, MarkerAttrib, TextAttrib, normalize_dash,
};
use anyhow::{Context, Result};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure containing all user settings.
///
/// This is the root configuration type that gets deserialized from the TOML file.
/// All fields have sensible defaults and will use those if not specified in the config file.
///
/// # Example TOML
/// ```toml
/// [arena]
/// block_size = 16384
/// growth_factor = 2.0
///
/// [pen]
/// color = "red"
/// width = 4
/// join = "bevel"
/// dash = [6, 3]
///
/// [fill]
/// color = [255, 255, 0]
/// rule = "non-zero"
///
/// [text]
/// font_family = "Sans"
/// font_size = 18.0
///
/// [render]
/// width = 800
/// height = 600
/// backend = "native"
/// ```
#[derive(Debug, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    /// Arena block sizing and memory ceiling
    #[serde(default)]
    pub arena: ArenaConfig,

    /// Default pen (color, width, join, dash)
    #[serde(default)]
    pub pen: PenConfig,

    /// Default brush (color, style, fill rule, edge)
    #[serde(default)]
    pub fill: FillConfig,

    /// Default font and text color
    #[serde(default)]
    pub text: TextConfig,

    /// Default marker pen and fill
    #[serde(default)]
    pub marker: MarkerConfig,

    /// Output surface for the render command
    #[serde(default)]
    pub render: RenderConfig,
}

impl Config {
    /// Validates and clamps all configuration values to acceptable ranges.
    ///
    /// Invalid values are clamped to the nearest valid value and a warning is logged.
    ///
    /// Validated ranges:
    /// - `arena.block_size`: 256 - 67108864
    /// - `arena.growth_factor`: 1.0 - 8.0
    /// - `pen.width`, `marker.width`: 0 - 256
    /// - `text.font_size`: 4.0 - 512.0
    /// - `render.width`, `render.height`: 1 - 16384
    pub fn validate_and_clamp(&mut self) {
        if !(256..=64 * 1024 * 1024).contains(&self.arena.block_size) {
            log::warn!(
                "Invalid arena block_size {}, clamping to 256-67108864 range",
                self.arena.block_size
            );
            self.arena.block_size = self.arena.block_size.clamp(256, 64 * 1024 * 1024);
        }

        if !(1.0..=8.0).contains(&self.arena.growth_factor) {
            log::warn!(
                "Invalid arena growth_factor {:.2}, clamping to 1.0-8.0 range",
                self.arena.growth_factor
            );
            self.arena.growth_factor = if self.arena.growth_factor.is_nan() {
                crate::arena::DEFAULT_GROWTH_FACTOR
            } else {
                self.arena.growth_factor.clamp(1.0, 8.0)
            };
        }

        if self.arena.max_bytes == Some(0) {
            log::warn!("arena max_bytes of 0 would reject every note, removing the limit");
            self.arena.max_bytes = None;
        }

        if self.pen.width > 256 {
            log::warn!("Invalid pen width {}, clamping to 256", self.pen.width);
            self.pen.width = 256;
        }

        if self.pen.dash.contains(&0) {
            log::warn!("Pen dash entries of 0 are raised to 1");
            self.pen.dash = normalize_dash(&self.pen.dash);
        }

        if self.marker.width > 256 {
            log::warn!("Invalid marker width {}, clamping to 256", self.marker.width);
            self.marker.width = 256;
        }

        if !(4.0..=512.0).contains(&self.text.font_size) {
            log::warn!(
                "Invalid font_size {:.1}, clamping to 4.0-512.0 range",
                self.text.font_size
            );
            self.text.font_size = if self.text.font_size.is_nan() {
                16.0
            } else {
                self.text.font_size.clamp(4.0, 512.0)
            };
        }

        // Validate font weight is reasonable
        let valid_weight = matches!(
            self.text.font_weight.to_lowercase().as_str(),
            "normal" | "bold" | "light" | "ultralight" | "heavy" | "ultrabold"
        ) || self
            .text
            .font_weight
            .parse::<u32>()
            .is_ok_and(|w| (100..=900).contains(&w));

        if !valid_weight {
            log::warn!(
                "Invalid font_weight '{}', falling back to 'normal'",
                self.text.font_weight
            );
            self.text.font_weight = "normal".to_string();
        }

        // Validate font style
        if !matches!(
            self.text.font_style.to_lowercase().as_str(),
            "normal" | "italic" | "oblique"
        ) {
            log::warn!(
                "Invalid font_style '{}', falling back to 'normal'",
                self.text.font_style
            );
            self.text.font_style = "normal".to_string();
        }

        if !(1..=16384).contains(&self.render.width) {
            log::warn!(
                "Invalid render width {}, clamping to 1-16384 range",
                self.render.width
            );
            self.render.width = self.render.width.clamp(1, 16384);
        }

        if !(1..=16384).contains(&self.render.height) {
            log::warn!(
                "Invalid render height {}, clamping to 1-16384 range",
                self.render.height
            );
            self.render.height = self.render.height.clamp(1, 16384);
        }
    }

    /// Attribute state and font table every new buffer starts from.
    pub fn attrib_defaults(&self) -> (AttribState, FontTable) {
        let fonts = FontTable::new(FontDescriptor::new(
            self.text.font_family.clone(),
            self.text.font_weight.clone(),
            self.text.font_style.clone(),
            self.text.font_size,
        ));

        let state = AttribState {
            line: LineAttrib {
                width: self.pen.width,
                color: self.pen.color.to_color(),
                join: self.pen.join,
                dash: normalize_dash(&self.pen.dash),
            },
            fill: FillAttrib {
                color: self.fill.color.to_color(),
                style: self.fill.style,
                rule: self.fill.rule,
                draw_edge: self.fill.draw_edge,
            },
            text: TextAttrib {
                font: FontId(0),
                color: self.text.color.to_color(),
                ..TextAttrib::default()
            },
            marker: MarkerAttrib {
                color: self.marker.color.to_color(),
                width: self.marker.width,
                filled: self.marker.filled,
            },
        };
        (state, fonts)
    }

    /// Returns the JSON schema of the configuration file.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }

    /// Returns the path to the configuration file.
    ///
    /// The config file is located at `~/.config/notebuf/config.toml`.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("notebuf");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from the default location, or returns defaults if not found.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The config directory path cannot be determined
    /// - The file exists but cannot be read
    /// - The file exists but contains invalid TOML syntax
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Loads and validates configuration from an explicit path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        // Validate and clamp values to acceptable ranges
        config.validate_and_clamp();

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Saves the current configuration to `path`, creating parent directories.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The config directory cannot be created
    /// - The config cannot be serialized to TOML
    /// - The file cannot be written
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, config_str)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Saves the current configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{BLACK, RED};
    use crate::note::{FillRule, JoinStyle};

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.pen.width, 1);
        assert_eq!(config.arena.block_size, crate::arena::DEFAULT_BLOCK_SIZE);
        assert_eq!(config.render.backend, Backend::Emulated);
    }

    #[test]
    fn sections_parse_into_attribute_defaults() {
        let config: Config = toml::from_str(
            r#"
            [pen]
            color = "red"
            width = 4
            join = "bevel"
            dash = [6, 3]

            [fill]
            rule = "non-zero"

            [text]
            font_family = "Serif"
            font_size = 20.0
            "#,
        )
        .unwrap();
        let (state, fonts) = config.attrib_defaults();
        assert_eq!(state.line.color, RED);
        assert_eq!(state.line.join, JoinStyle::Bevel);
        assert_eq!(state.line.dash, vec![6, 3]);
        assert_eq!(state.fill.rule, FillRule::NonZero);
        assert_eq!(state.text.color, BLACK);
        assert_eq!(fonts.get(FontId(0)).unwrap().to_pango_string(), "Serif 20");
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut config = Config::default();
        config.arena.block_size = 8;
        config.arena.growth_factor = 50.0;
        config.pen.width = 1000;
        config.pen.dash = vec![0, 4];
        config.text.font_weight = "chunky".to_string();
        config.render.width = 0;
        config.validate_and_clamp();

        assert_eq!(config.arena.block_size, 256);
        assert_eq!(config.arena.growth_factor, 8.0);
        assert_eq!(config.pen.width, 256);
        assert_eq!(config.pen.dash, vec![1, 4]);
        assert_eq!(config.text.font_weight, "normal");
        assert_eq!(config.render.width, 1);
    }

    #[test]
    fn save_and_load_round_trip_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.marker.filled = true;
        config.render.backend = Backend::Native;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.marker.filled);
        assert_eq!(loaded.render.backend, Backend::Native);
    }

    #[test]
    fn schema_names_every_section() {
        let schema = serde_json::to_value(Config::json_schema()).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        for section in ["arena", "pen", "fill", "text", "marker", "render"] {
            assert!(properties.contains_key(section), "missing {section}");
        }
    }
}
