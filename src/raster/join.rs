//! Miter and bevel geometry for the corner between two wide segments.

use crate::note::JoinStyle;
use kurbo::{Point, Vec2};

/// Below this cross product the segments count as collinear and no join is
/// generated.
pub const COLLINEAR_EPSILON: f64 = 0.001;

/// Corner points of a join at vertex `B` for the path `A -> B -> C`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinGeometry {
    /// Join vertex `B`
    pub vertex: Point,
    /// Outer edge of segment `A-B` at `B`
    pub first: Point,
    /// Intersection of the two outer edges
    pub miter: Point,
    /// Outer edge of segment `B-C` at `B`
    pub second: Point,
}

impl JoinGeometry {
    /// Solves the join for pen half-width `r`.
    ///
    /// Returns `None` when either segment has zero length or the segments
    /// are nearly collinear.
    pub fn solve(a: Point, b: Point, c: Point, r: f64) -> Option<Self> {
        let ba = a - b;
        let bc = c - b;
        let ba_len = ba.hypot();
        let bc_len = bc.hypot();
        if ba_len == 0.0 || bc_len == 0.0 {
            return None;
        }

        let u = ba / ba_len;
        let v = bc / bc_len;
        let s = u.cross(v);
        if s.abs() < COLLINEAR_EPSILON {
            return None;
        }

        let miter = b - (u + v) * (r / s.abs());
        let (first, second) = if s > 0.0 {
            (b + Vec2::new(u.y, -u.x) * r, b + Vec2::new(-v.y, v.x) * r)
        } else {
            (b + Vec2::new(-u.y, u.x) * r, b + Vec2::new(v.y, -v.x) * r)
        };

        Some(Self {
            vertex: b,
            first,
            miter,
            second,
        })
    }

    /// Polygon filling the corner, rounded to whole pixels.
    ///
    /// Miter joins give `[B, F, D, E]`, bevel joins `[B, F, E]`.
    pub fn polygon(&self, style: JoinStyle) -> Vec<Point> {
        match style {
            JoinStyle::Miter => vec![
                self.vertex,
                self.first.round(),
                self.miter.round(),
                self.second.round(),
            ],
            JoinStyle::Bevel => vec![self.vertex, self.first.round(), self.second.round()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::SQRT_2;

    #[test]
    fn right_angle_miter_reaches_the_outer_corner() {
        let join = JoinGeometry::solve(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            2.0,
        )
        .unwrap();
        assert_eq!(join.first, Point::new(10.0, -2.0));
        assert_eq!(join.miter, Point::new(12.0, -2.0));
        assert_eq!(join.second, Point::new(12.0, 0.0));
        assert!(((join.miter - join.vertex).hypot() - 2.0 * SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn turning_the_other_way_mirrors_the_join() {
        let join = JoinGeometry::solve(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, -10.0),
            2.0,
        )
        .unwrap();
        assert_eq!(join.first, Point::new(10.0, 2.0));
        assert_eq!(join.miter, Point::new(12.0, 2.0));
        assert_eq!(join.second, Point::new(12.0, 0.0));
    }

    #[test]
    fn collinear_segments_have_no_join() {
        assert!(
            JoinGeometry::solve(
                Point::new(0.0, 0.0),
                Point::new(5.0, 0.0),
                Point::new(9.0, 0.0),
                3.0
            )
            .is_none()
        );
        assert!(
            JoinGeometry::solve(
                Point::new(0.0, 0.0),
                Point::new(0.0, 0.0),
                Point::new(9.0, 1.0),
                3.0
            )
            .is_none()
        );
    }

    #[test]
    fn bevel_drops_the_miter_point() {
        let join = JoinGeometry::solve(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            2.0,
        )
        .unwrap();
        assert_eq!(
            join.polygon(JoinStyle::Bevel),
            vec![
                Point::new(10.0, 0.0),
                Point::new(10.0, -2.0),
                Point::new(12.0, 0.0)
            ]
        );
        assert_eq!(join.polygon(JoinStyle::Miter).len(), 4);
    }
}
