//! Configuration type definitions.

use super::enums::{Backend, ColorSpec};
use crate::buffer::ArenaSettings;
use crate::note::{FillRule, FillStyle, JoinStyle};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Arena sizing for every buffer a session opens.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ArenaConfig {
    /// Capacity of the first block in bytes (valid range: 256 - 67108864)
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Each chained block is this many times larger than the last (valid range: 1.0 - 8.0)
    #[serde(default = "default_growth_factor")]
    pub growth_factor: f64,

    /// Optional ceiling on the bytes one buffer may hold; exceeding it
    /// fails the emission with an out-of-memory error
    #[serde(default)]
    pub max_bytes: Option<usize>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            growth_factor: default_growth_factor(),
            max_bytes: None,
        }
    }
}

impl ArenaConfig {
    pub fn settings(&self) -> ArenaSettings {
        ArenaSettings {
            block_size: self.block_size,
            growth_factor: self.growth_factor,
            max_bytes: self.max_bytes,
        }
    }
}

/// Default pen a buffer starts with.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PenConfig {
    /// Pen color - either a named color or an RGB array like `[255, 0, 0]`
    #[serde(default = "default_pen_color")]
    pub color: ColorSpec,

    /// Pen width in device pixels; 0 and 1 draw hairlines (valid range: 0 - 256)
    #[serde(default = "default_pen_width")]
    pub width: u32,

    /// Corner style between wide segments (miter or bevel)
    #[serde(default)]
    pub join: JoinStyle,

    /// Dash pattern as on/off lengths in pixels; empty draws solid lines
    #[serde(default)]
    pub dash: Vec<u32>,
}

impl Default for PenConfig {
    fn default() -> Self {
        Self {
            color: default_pen_color(),
            width: default_pen_width(),
            join: JoinStyle::default(),
            dash: Vec::new(),
        }
    }
}

/// Default brush a buffer starts with.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FillConfig {
    #[serde(default = "default_fill_color")]
    pub color: ColorSpec,

    /// solid or hollow
    #[serde(default)]
    pub style: FillStyle,

    /// even-odd or non-zero
    #[serde(default)]
    pub rule: FillRule,

    /// Outline filled shapes with the current pen
    #[serde(default = "default_draw_edge")]
    pub draw_edge: bool,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            color: default_fill_color(),
            style: FillStyle::default(),
            rule: FillRule::default(),
            draw_edge: default_draw_edge(),
        }
    }
}

/// Default font (font id 0) and text color.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TextConfig {
    /// Font family name for text rendering (e.g., "Sans", "Monospace", "JetBrains Mono")
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Font weight (e.g., "normal", "bold", "light", 400, 700)
    #[serde(default = "default_font_weight")]
    pub font_weight: String,

    /// Font style (e.g., "normal", "italic", "oblique")
    #[serde(default = "default_font_style")]
    pub font_style: String,

    /// Font size in points (valid range: 4.0 - 512.0)
    #[serde(default = "default_font_size")]
    pub font_size: f64,

    #[serde(default = "default_text_color")]
    pub color: ColorSpec,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            font_weight: default_font_weight(),
            font_style: default_font_style(),
            font_size: default_font_size(),
            color: default_text_color(),
        }
    }
}

/// Default marker pen and fill.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MarkerConfig {
    #[serde(default = "default_marker_color")]
    pub color: ColorSpec,

    /// Marker pen width in device pixels (valid range: 0 - 256)
    #[serde(default = "default_pen_width")]
    pub width: u32,

    /// Fill marker shapes with the marker color
    #[serde(default)]
    pub filled: bool,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            color: default_marker_color(),
            width: default_pen_width(),
            filled: false,
        }
    }
}

/// Output settings for the `render` command.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RenderConfig {
    /// Surface width in pixels (valid range: 1 - 16384)
    #[serde(default = "default_surface_width")]
    pub width: i32,

    /// Surface height in pixels (valid range: 1 - 16384)
    #[serde(default = "default_surface_height")]
    pub height: i32,

    /// Color the surface is cleared to before playback
    #[serde(default = "default_background")]
    pub background: ColorSpec,

    /// emulated or native
    #[serde(default)]
    pub backend: Backend,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_surface_width(),
            height: default_surface_height(),
            background: default_background(),
            backend: Backend::default(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_block_size() -> usize {
    crate::arena::DEFAULT_BLOCK_SIZE
}

fn default_growth_factor() -> f64 {
    crate::arena::DEFAULT_GROWTH_FACTOR
}

fn default_pen_color() -> ColorSpec {
    ColorSpec::named("black")
}

fn default_pen_width() -> u32 {
    1
}

fn default_fill_color() -> ColorSpec {
    ColorSpec::named("white")
}

fn default_draw_edge() -> bool {
    true
}

fn default_font_family() -> String {
    "Sans".to_string()
}

fn default_font_weight() -> String {
    "normal".to_string()
}

fn default_font_style() -> String {
    "normal".to_string()
}

fn default_font_size() -> f64 {
    16.0
}

fn default_text_color() -> ColorSpec {
    ColorSpec::named("black")
}

fn default_marker_color() -> ColorSpec {
    ColorSpec::named("black")
}

fn default_surface_width() -> i32 {
    640
}

fn default_surface_height() -> i32 {
    480
}

fn default_background() -> ColorSpec {
    ColorSpec::named("white")
}
