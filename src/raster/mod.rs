//! Styled-line rasterization for surfaces without native pens.
//!
//! - [`dda`]: digital line sampler
//! - [`dash`]: dash patterns and the phase-carrying [`DashCursor`]
//! - [`join`]: miter/bevel corner solver
//! - [`stroke`]: the [`Stroker`] path state machine tying them together

pub mod dash;
pub mod dda;
pub mod join;
pub mod stroke;

pub use dash::{DashCursor, DashPattern};
pub use dda::LineDda;
pub use join::JoinGeometry;
pub use stroke::{StrokeSink, Stroker, stroke_padding};
