//! Buffer-wide coordinate transform.
//!
//! A buffer carries a pivot `P`, a move offset `M`, per-axis scale factors
//! and a rotation angle. Recorded coordinates are mapped to device space by
//!
//! ```text
//! device = T(P + M) · S(sx, sy) · R(θ) · T(-P) · user
//! ```
//!
//! i.e. rotate about the pivot, then scale about the pivot, then move. The
//! explicit strategy performs these steps per point
//! ([`TransformParams::apply_stepwise`]); the native strategy installs the
//! composed matrix ([`TransformParams::matrix`]) on the surface once per pass.

use kurbo::{Affine, Point, Vec2};

/// How a surface receives transformed geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformStrategy {
    /// The surface has no transform; the engine sends device coordinates.
    Explicit,
    /// The surface keeps a matrix; the engine sends recorded coordinates.
    Native,
}

/// Pivot, move, scale and rotation applied to a whole buffer at playback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformParams {
    pub pivot: Point,
    pub offset: Vec2,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Radians, rotating +x toward +y
    pub angle: f64,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            pivot: Point::ORIGIN,
            offset: Vec2::ZERO,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
        }
    }
}

impl TransformParams {
    /// Returns true when the transform maps every point to itself.
    pub fn is_identity(&self) -> bool {
        self.offset == Vec2::ZERO && self.scale_x == 1.0 && self.scale_y == 1.0 && self.angle == 0.0
    }

    /// Composes the single affine matrix used by native surfaces.
    pub fn matrix(&self) -> Affine {
        let pivot = self.pivot.to_vec2();
        Affine::translate(pivot + self.offset)
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
            * Affine::rotate(self.angle)
            * Affine::translate(-pivot)
    }

    /// Maps one point step by step, the way the explicit strategy does.
    pub fn apply_stepwise(&self, point: Point) -> Point {
        let x = point.x - self.pivot.x;
        let y = point.y - self.pivot.y;

        let (sin, cos) = self.angle.sin_cos();
        let rx = x * cos - y * sin;
        let ry = x * sin + y * cos;

        let sx = rx * self.scale_x;
        let sy = ry * self.scale_y;

        Point::new(
            sx + self.pivot.x + self.offset.x,
            sy + self.pivot.y + self.offset.y,
        )
    }
}
