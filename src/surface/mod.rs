//! Target surfaces for playback.
//!
//! A [`Surface`] advertises a [`TransformStrategy`]. Explicit surfaces keep
//! no transform: every coordinate they receive is already in device space
//! and [`Surface::set_transform`] is a no-op. Native surfaces keep the matrix
//! installed by `set_transform` and apply it to every coordinate except the
//! pixel address of [`Surface::set_pixel`], which is always device space.
//!
//! - [`RasterSurface`]: software ARGB32 buffer, explicit strategy
//! - [`TraceSurface`]: records calls, either strategy
//! - [`CairoSurface`]: cairo image surface, native strategy (feature `cairo`)

#[cfg(feature = "cairo")]
pub mod native;
pub mod raster;
pub mod trace;

#[cfg(feature = "cairo")]
pub use native::CairoSurface;
pub use raster::RasterSurface;
pub use trace::{TraceOp, TraceSurface};

use crate::draw::{Bitmap, Color};
use crate::note::{FillRule, LineAttrib};
use crate::transform::TransformStrategy;
use kurbo::{Affine, Point};
use thiserror::Error;

/// Errors raised while creating or saving a surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Invalid surface size {width}x{height}")]
    InvalidSize { width: i32, height: i32 },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cairo error: {0}")]
    Cairo(String),
}

/// Drawing target consumed by the playback engine.
pub trait Surface {
    /// Visible size in device pixels.
    fn extent(&self) -> (i32, i32);

    /// How this surface wants coordinates delivered.
    fn strategy(&self) -> TransformStrategy;

    /// Installs the current user-to-device matrix (native surfaces only).
    fn set_transform(&mut self, matrix: Affine);

    /// Paints one device pixel.
    fn set_pixel(&mut self, x: i32, y: i32, color: Color);

    /// Draws a one-pixel-wide line, both endpoints included.
    fn draw_line(&mut self, from: Point, to: Point, color: Color);

    /// Fills a simple polygon without outlining it.
    fn fill_polygon(&mut self, points: &[Point], color: Color, rule: FillRule);

    /// Fills several contours as one shape.
    fn fill_contours(&mut self, contours: &[Vec<Point>], color: Color, rule: FillRule);

    /// Strokes a path with a pen whose width and dashes are in device pixels.
    fn stroke_path(&mut self, points: &[Point], closed: bool, pen: &LineAttrib);

    /// Blits a bitmap; `placement` maps bitmap pixels to surface coordinates.
    fn draw_image(&mut self, bitmap: &Bitmap, placement: Affine);
}
