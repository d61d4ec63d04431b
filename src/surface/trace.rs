//! Surface that records every call it receives.

use super::Surface;
use crate::draw::{Bitmap, Color};
use crate::note::{FillRule, LineAttrib};
use crate::transform::TransformStrategy;
use kurbo::{Affine, Point};

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceOp {
    SetTransform(Affine),
    Pixel {
        x: i32,
        y: i32,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
    },
    FillPolygon {
        points: Vec<Point>,
        color: Color,
        rule: FillRule,
    },
    FillContours {
        contours: Vec<Vec<Point>>,
        color: Color,
        rule: FillRule,
    },
    StrokePath {
        points: Vec<Point>,
        closed: bool,
        width: u32,
        dash: Vec<u32>,
    },
    Image {
        width: u32,
        height: u32,
        placement: Affine,
    },
}

/// Records calls instead of drawing; useful for checking what playback sends
/// to a surface under either strategy.
#[derive(Debug, Clone)]
pub struct TraceSurface {
    width: i32,
    height: i32,
    strategy: TransformStrategy,
    ops: Vec<TraceOp>,
}

impl TraceSurface {
    pub fn new(width: i32, height: i32, strategy: TransformStrategy) -> Self {
        Self {
            width,
            height,
            strategy,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[TraceOp] {
        &self.ops
    }

    /// Drops everything recorded so far.
    pub fn take_ops(&mut self) -> Vec<TraceOp> {
        std::mem::take(&mut self.ops)
    }
}

impl Surface for TraceSurface {
    fn extent(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn strategy(&self) -> TransformStrategy {
        self.strategy
    }

    fn set_transform(&mut self, matrix: Affine) {
        if self.strategy == TransformStrategy::Native {
            self.ops.push(TraceOp::SetTransform(matrix));
        }
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.ops.push(TraceOp::Pixel { x, y, color });
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Color) {
        self.ops.push(TraceOp::Line { from, to, color });
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color, rule: FillRule) {
        self.ops.push(TraceOp::FillPolygon {
            points: points.to_vec(),
            color,
            rule,
        });
    }

    fn fill_contours(&mut self, contours: &[Vec<Point>], color: Color, rule: FillRule) {
        self.ops.push(TraceOp::FillContours {
            contours: contours.to_vec(),
            color,
            rule,
        });
    }

    fn stroke_path(&mut self, points: &[Point], closed: bool, pen: &LineAttrib) {
        self.ops.push(TraceOp::StrokePath {
            points: points.to_vec(),
            closed,
            width: pen.width,
            dash: pen.dash.clone(),
        });
    }

    fn draw_image(&mut self, bitmap: &Bitmap, placement: Affine) {
        self.ops.push(TraceOp::Image {
            width: bitmap.width,
            height: bitmap.height,
            placement,
        });
    }
}
