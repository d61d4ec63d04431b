//! Utility functions for colors and integer rectangles.
//!
//! This module provides:
//! - Name-to-color mapping used by the configuration and scene files
//! - [`Rect`], the integer rectangle returned as a modified region

use crate::draw::{Color, color::*};

// ============================================================================
// Color Mapping
// ============================================================================

/// Maps color name strings to Color values.
///
/// Used by the configuration system and scene files to parse color names.
///
/// # Supported Names (case-insensitive)
/// - "red", "green", "blue", "yellow", "orange", "pink", "white", "black",
///   "transparent"
///
/// # Returns
/// - `Some(Color)` if the name matches a predefined color
/// - `None` if the name is not recognized
pub fn name_to_color(name: &str) -> Option<Color> {
    match name.to_lowercase().as_str() {
        "red" => Some(RED),
        "green" => Some(GREEN),
        "blue" => Some(BLUE),
        "yellow" => Some(YELLOW),
        "orange" => Some(ORANGE),
        "pink" => Some(PINK),
        "white" => Some(WHITE),
        "black" => Some(BLACK),
        "transparent" => Some(TRANSPARENT),
        _ => None,
    }
}

// ============================================================================
// Geometry Utilities
// ============================================================================

/// Axis-aligned integer rectangle (inclusive min, exclusive max).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Creates a new rectangle. Width/height must be positive.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Option<Self> {
        if width <= 0 || height <= 0 {
            None
        } else {
            Some(Self {
                x,
                y,
                width,
                height,
            })
        }
    }

    /// Builds a rectangle from min/max bounds (inclusive min, exclusive max).
    ///
    /// Extents wider than `i32::MAX` saturate.
    pub fn from_min_max(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Option<Self> {
        Self::new(min_x, min_y, span(min_x, max_x), span(min_y, max_y))
    }

    /// Exclusive right edge (saturating).
    pub fn max_x(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge (saturating).
    pub fn max_y(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Expands the rectangle evenly in all directions by `amount`.
    pub fn inflate(&mut self, amount: i32) {
        let (max_x, max_y) = (self.max_x(), self.max_y());
        self.x = self.x.saturating_sub(amount);
        self.y = self.y.saturating_sub(amount);
        self.width = span(self.x, max_x.saturating_add(amount));
        self.height = span(self.y, max_y.saturating_add(amount));
    }

    /// Clamps the rectangle to `[0, width) x [0, height)`.
    ///
    /// Returns `None` when nothing of the rectangle remains visible.
    pub fn clamp_to_bounds(self, width: i32, height: i32) -> Option<Rect> {
        let max_x = self.max_x().clamp(0, width);
        let max_y = self.max_y().clamp(0, height);
        let x = self.x.clamp(0, width);
        let y = self.y.clamp(0, height);
        Rect::from_min_max(x, y, max_x, max_y)
    }

    /// Returns true if the pixel at `(x, y)` lies inside the rectangle.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.max_x() && y >= self.y && y < self.max_y()
    }
}

/// `max - min` computed without overflow, clamped to `0..=i32::MAX`.
fn span(min: i32, max: i32) -> i32 {
    (max as i64 - min as i64).clamp(0, i32::MAX as i64) as i32
}
