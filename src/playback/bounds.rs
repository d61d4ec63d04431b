//! Modified-region accumulation.

use crate::util::Rect;
use kurbo::Point;

/// Running min/max of every device pixel a playback pass may touch
/// (inclusive min, exclusive max).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    extent: Option<(i32, i32, i32, i32)>,
}

impl Bounds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything registered so far.
    pub fn reset(&mut self) {
        self.extent = None;
    }

    pub fn is_empty(&self) -> bool {
        self.to_rect().is_none()
    }

    fn grow(&mut self, min_x: i32, min_y: i32, max_x: i32, max_y: i32) {
        self.extent = Some(match self.extent {
            None => (min_x, min_y, max_x, max_y),
            Some((x0, y0, x1, y1)) => (x0.min(min_x), y0.min(min_y), x1.max(max_x), y1.max(max_y)),
        });
    }

    /// Grows the bound to cover `[min_x, max_x) x [min_y, max_y)`.
    pub fn include_box(&mut self, min_x: i32, min_y: i32, max_x: i32, max_y: i32) {
        if max_x <= min_x || max_y <= min_y {
            return;
        }
        self.grow(min_x, min_y, max_x, max_y);
    }

    /// Registers a polygon vertex: pixels whose centres fall inside a filled
    /// polygon lie within `floor(min)..ceil(max)` of its vertices.
    pub fn include_point(&mut self, point: Point) {
        if !point.is_finite() {
            return;
        }
        self.grow(
            point.x.floor() as i32,
            point.y.floor() as i32,
            point.x.ceil() as i32,
            point.y.ceil() as i32,
        );
    }

    /// Registers a stroked vertex padded by `padding` pixels on every side.
    pub fn include_padded(&mut self, point: Point, padding: i32) {
        if !point.is_finite() {
            return;
        }
        self.include_box(
            (point.x.floor() as i32).saturating_sub(padding),
            (point.y.floor() as i32).saturating_sub(padding),
            (point.x.ceil() as i32).saturating_add(padding),
            (point.y.ceil() as i32).saturating_add(padding),
        );
    }

    /// Registers a single pixel. Addresses pinned to `i32::MAX` cannot be
    /// represented and are left out; no surface reaches that far.
    pub fn include_pixel(&mut self, x: i32, y: i32) {
        self.include_box(x, y, x.saturating_add(1), y.saturating_add(1));
    }

    /// Grows the bound by `amount` on every side.
    pub fn inflate(&mut self, amount: i32) {
        if let Some((x0, y0, x1, y1)) = self.extent {
            self.extent = Some((
                x0.saturating_sub(amount),
                y0.saturating_sub(amount),
                x1.saturating_add(amount),
                y1.saturating_add(amount),
            ));
        }
    }

    /// The raw bound, possibly extending past the surface.
    pub fn to_rect(&self) -> Option<Rect> {
        let (x0, y0, x1, y1) = self.extent?;
        Rect::from_min_max(x0, y0, x1, y1)
    }

    /// The bound clamped to a `width x height` surface.
    ///
    /// Clamps the min/max extent before building the rectangle, so bounds
    /// wider than `i32::MAX` still clamp correctly.
    pub fn clamped(&self, width: i32, height: i32) -> Option<Rect> {
        let (x0, y0, x1, y1) = self.extent?;
        Rect::from_min_max(
            x0.clamp(0, width),
            y0.clamp(0, height),
            x1.clamp(0, width),
            y1.clamp(0, height),
        )
    }
}
