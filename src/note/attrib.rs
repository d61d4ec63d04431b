//! Attribute snapshots carried by attribute notes and tracked as current
//! state by buffers and render contexts.

use crate::draw::{BLACK, Color, FontId, TRANSPARENT, WHITE};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How the corner between two wide segments is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum JoinStyle {
    /// Sharp corner reaching the intersection of the offset edges
    #[default]
    Miter,
    /// Flat corner cut between the offset edges
    Bevel,
}

/// Whether closed shapes are painted inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FillStyle {
    #[default]
    Solid,
    /// Interior left untouched
    Hollow,
}

/// Polygon interior test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FillRule {
    #[default]
    EvenOdd,
    NonZero,
}

/// Pen used by outlines and lines.
#[derive(Debug, Clone, PartialEq)]
pub struct LineAttrib {
    /// Width in device pixels; 0 and 1 draw hairlines
    pub width: u32,
    pub color: Color,
    pub join: JoinStyle,
    /// On/off lengths in device pixels; empty means solid
    pub dash: Vec<u32>,
}

impl LineAttrib {
    /// Returns true when the pen is drawn without quad construction.
    pub fn is_thin(&self) -> bool {
        self.width <= 1
    }
}

impl Default for LineAttrib {
    fn default() -> Self {
        Self {
            width: 1,
            color: BLACK,
            join: JoinStyle::Miter,
            dash: Vec::new(),
        }
    }
}

/// Brush used by filled shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillAttrib {
    pub color: Color,
    pub style: FillStyle,
    pub rule: FillRule,
    /// Stroke the outline with the current pen after filling
    pub draw_edge: bool,
}

impl FillAttrib {
    /// Returns true when the interior is painted.
    pub fn paints(&self) -> bool {
        self.style == FillStyle::Solid && self.color.a > 0.0
    }
}

impl Default for FillAttrib {
    fn default() -> Self {
        Self {
            color: WHITE,
            style: FillStyle::Solid,
            rule: FillRule::EvenOdd,
            draw_edge: true,
        }
    }
}

/// Text appearance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextAttrib {
    pub font: FontId,
    pub color: Color,
    /// Horizontal shear applied to glyphs (x += slant * -y)
    pub slant: f64,
    pub h_scale: f64,
    pub v_scale: f64,
    pub underline: bool,
}

impl Default for TextAttrib {
    fn default() -> Self {
        Self {
            font: FontId(0),
            color: BLACK,
            slant: 0.0,
            h_scale: 1.0,
            v_scale: 1.0,
            underline: false,
        }
    }
}

/// Marker appearance, used between begin/end marker brackets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerAttrib {
    pub color: Color,
    pub width: u32,
    pub filled: bool,
}

impl MarkerAttrib {
    /// Pen installed while a marker is drawn.
    pub fn pen(&self) -> LineAttrib {
        LineAttrib {
            width: self.width,
            color: self.color,
            join: JoinStyle::Miter,
            dash: Vec::new(),
        }
    }

    /// Brush installed while a marker is drawn.
    pub fn brush(&self) -> FillAttrib {
        FillAttrib {
            color: if self.filled { self.color } else { TRANSPARENT },
            style: if self.filled {
                FillStyle::Solid
            } else {
                FillStyle::Hollow
            },
            rule: FillRule::NonZero,
            draw_edge: true,
        }
    }
}

impl Default for MarkerAttrib {
    fn default() -> Self {
        Self {
            color: BLACK,
            width: 1,
            filled: false,
        }
    }
}

/// Complete attribute state: what a buffer records against and what a
/// playback pass starts from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttribState {
    pub line: LineAttrib,
    pub fill: FillAttrib,
    pub text: TextAttrib,
    pub marker: MarkerAttrib,
}

/// Raises zero-length dash entries to one pixel.
pub fn normalize_dash(dash: &[u32]) -> Vec<u32> {
    dash.iter().map(|&len| len.max(1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thin_pens_are_width_zero_or_one() {
        let mut pen = LineAttrib::default();
        assert!(pen.is_thin());
        pen.width = 0;
        assert!(pen.is_thin());
        pen.width = 2;
        assert!(!pen.is_thin());
    }

    #[test]
    fn hollow_marker_brush_does_not_paint() {
        let marker = MarkerAttrib {
            color: WHITE,
            width: 2,
            filled: false,
        };
        assert!(!marker.brush().paints());
        assert_eq!(marker.pen().width, 2);

        let filled = MarkerAttrib {
            filled: true,
            ..marker
        };
        assert!(filled.brush().paints());
    }

    #[test]
    fn zero_dash_entries_are_clamped() {
        assert_eq!(normalize_dash(&[0, 3, 0]), vec![1, 3, 1]);
        assert!(normalize_dash(&[]).is_empty());
    }
}
