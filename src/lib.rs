//! Library exports for notebuf, a retained 2D command buffer.
//!
//! Callers record drawing primitives ("notes") into a [`Buffer`] backed by a
//! block [`arena`], then play the buffer back onto a [`surface::Surface`].
//! Playback applies the buffer transform either per point (emulated
//! surfaces) or as a matrix installed on the surface (native surfaces), and
//! reports the region of the surface it modified.

pub mod arena;
pub mod buffer;
pub mod config;
pub mod draw;
pub mod note;
pub mod playback;
pub mod raster;
pub mod scene;
pub mod surface;
pub mod transform;
pub mod util;

pub use buffer::{Buffer, BufferError, Session};
pub use config::Config;
pub use playback::{PlaybackOptions, RenderContext};
pub use scene::Scene;
pub use surface::Surface;
pub use transform::{TransformParams, TransformStrategy};
pub use util::Rect;
