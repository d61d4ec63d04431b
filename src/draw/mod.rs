//! Collaborator types consumed by the command buffer.
//!
//! - [`Color`]: RGBA color representation with predefined color constants
//! - [`FontDescriptor`] and [`FontTable`]: fonts referenced by text notes
//! - [`Bitmap`]: pixels blitted by image notes
//! - [`GlyphProvider`]: turns text into outlines for text notes

pub mod bitmap;
pub mod color;
pub mod font;
pub mod glyph;

pub use bitmap::{Bitmap, ImageError};
pub use color::Color;
pub use font::{FontDescriptor, FontId, FontTable};
#[cfg(feature = "cairo")]
pub use glyph::PangoGlyphs;
pub use glyph::{BoxGlyphs, GlyphProvider, GlyphRun, TextError};

pub use color::{BLACK, BLUE, GREEN, ORANGE, PINK, RED, TRANSPARENT, WHITE, YELLOW};
