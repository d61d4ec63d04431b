//! The closed set of drawable records ("notes") stored in a buffer's arena.
//!
//! Each note is one tagged record: the arena header carries the
//! [`NoteKind`] tag and the payload is the little-endian encoding produced by
//! [`codec`]. Variable-length data (point lists, strings, dash arrays and
//! call parameters) lives in separate raw data records referenced by
//! [`Span`].

pub mod attrib;
pub mod codec;

pub use attrib::{
    AttribState, FillAttrib, FillRule, FillStyle, JoinStyle, LineAttrib, MarkerAttrib, TextAttrib,
    normalize_dash,
};
pub use codec::DecodeError;

use crate::arena::{DATA_TAG, Span};
use crate::draw::Color;

/// Record tags. Tag `0` is reserved for raw data records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NoteKind {
    Point = 1,
    MarkerPoint = 2,
    Line = 3,
    PolyEllipse = 4,
    Ellipse = 5,
    Arc = 6,
    PolyChord = 7,
    Chord = 8,
    PolySector = 9,
    Sector = 10,
    MarkerRun = 11,
    Polygon = 12,
    Polyline = 13,
    Image = 14,
    Text = 15,
    PolyText = 16,
    BeginMarker = 17,
    EndMarker = 18,
    LineAttrib = 19,
    FillAttrib = 20,
    TextAttrib = 21,
    MarkerAttrib = 22,
    Call = 23,
}

impl NoteKind {
    /// Maps an arena tag back to a kind. Returns `None` for the data tag and
    /// unknown values.
    pub fn from_tag(tag: u8) -> Option<Self> {
        use NoteKind::*;
        let kind = match tag {
            DATA_TAG => return None,
            1 => Point,
            2 => MarkerPoint,
            3 => Line,
            4 => PolyEllipse,
            5 => Ellipse,
            6 => Arc,
            7 => PolyChord,
            8 => Chord,
            9 => PolySector,
            10 => Sector,
            11 => MarkerRun,
            12 => Polygon,
            13 => Polyline,
            14 => Image,
            15 => Text,
            16 => PolyText,
            17 => BeginMarker,
            18 => EndMarker,
            19 => LineAttrib,
            20 => FillAttrib,
            21 => TextAttrib,
            22 => MarkerAttrib,
            23 => Call,
            _ => return None,
        };
        Some(kind)
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Returns true for kinds whose payload is extended by `add_point`.
    pub fn is_point_list(self) -> bool {
        matches!(
            self,
            NoteKind::MarkerRun | NoteKind::Polygon | NoteKind::Polyline
        )
    }
}

/// Center, radii and angular range of an elliptical shape.
///
/// Angles are radians measured from +x toward +y (device space is y-down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcShape {
    pub x: i32,
    pub y: i32,
    pub rx: u32,
    pub ry: u32,
    pub start: f64,
    pub sweep: f64,
}

impl ArcShape {
    /// A closed ellipse.
    pub fn full(x: i32, y: i32, rx: u32, ry: u32) -> Self {
        Self {
            x,
            y,
            rx,
            ry,
            start: 0.0,
            sweep: std::f64::consts::TAU,
        }
    }

    /// Returns true when nothing would be drawn (zero radius or sweep).
    pub fn is_degenerate(&self) -> bool {
        self.rx == 0 || self.ry == 0 || self.sweep == 0.0 || !self.sweep.is_finite()
    }

    /// Returns true when the sweep covers the whole ellipse.
    pub fn is_full(&self) -> bool {
        self.sweep.abs() >= std::f64::consts::TAU
    }
}

/// Header of a point-list note; the points live in a data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointList {
    /// Capacity fixed when the list was opened
    pub max: u32,
    /// Points stored so far
    pub count: u32,
    /// Close the outline back to the first point
    pub closed: bool,
    /// `max` points of `(i32 x, i32 y)`
    pub points: Span,
}

/// Position, orientation and string of a text note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRun {
    pub x: i32,
    pub y: i32,
    pub angle: f64,
    /// UTF-8 bytes in a data record
    pub text: Span,
    /// Stroke glyph contours instead of filling them
    pub outline: bool,
}

/// One decoded drawable record.
#[derive(Debug, Clone, PartialEq)]
pub enum Note {
    Point {
        x: i32,
        y: i32,
    },
    MarkerPoint {
        x: i32,
        y: i32,
    },
    Line {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
    },
    /// `filled` selects the poly (brush-filled) form.
    Ellipse {
        shape: ArcShape,
        filled: bool,
    },
    Arc {
        shape: ArcShape,
    },
    Chord {
        shape: ArcShape,
        filled: bool,
    },
    Sector {
        shape: ArcShape,
        filled: bool,
    },
    MarkerRun(PointList),
    Polygon(PointList),
    Polyline(PointList),
    Image {
        image: u32,
        x: i32,
        y: i32,
        scale: f64,
    },
    Text(TextRun),
    PolyText {
        run: TextRun,
        margin: f64,
    },
    BeginMarker {
        x: i32,
        y: i32,
        angle: f64,
    },
    EndMarker,
    LineAttrib {
        width: u32,
        color: Color,
        join: JoinStyle,
        /// `u32` entries in a data record; empty for solid pens
        dash: Span,
    },
    FillAttrib(FillAttrib),
    TextAttrib(TextAttrib),
    MarkerAttrib(MarkerAttrib),
    Call {
        func: u32,
        params: Span,
    },
}

impl Note {
    pub fn kind(&self) -> NoteKind {
        match self {
            Note::Point { .. } => NoteKind::Point,
            Note::MarkerPoint { .. } => NoteKind::MarkerPoint,
            Note::Line { .. } => NoteKind::Line,
            Note::Ellipse { filled: true, .. } => NoteKind::PolyEllipse,
            Note::Ellipse { filled: false, .. } => NoteKind::Ellipse,
            Note::Arc { .. } => NoteKind::Arc,
            Note::Chord { filled: true, .. } => NoteKind::PolyChord,
            Note::Chord { filled: false, .. } => NoteKind::Chord,
            Note::Sector { filled: true, .. } => NoteKind::PolySector,
            Note::Sector { filled: false, .. } => NoteKind::Sector,
            Note::MarkerRun(_) => NoteKind::MarkerRun,
            Note::Polygon(_) => NoteKind::Polygon,
            Note::Polyline(_) => NoteKind::Polyline,
            Note::Image { .. } => NoteKind::Image,
            Note::Text(_) => NoteKind::Text,
            Note::PolyText { .. } => NoteKind::PolyText,
            Note::BeginMarker { .. } => NoteKind::BeginMarker,
            Note::EndMarker => NoteKind::EndMarker,
            Note::LineAttrib { .. } => NoteKind::LineAttrib,
            Note::FillAttrib(_) => NoteKind::FillAttrib,
            Note::TextAttrib(_) => NoteKind::TextAttrib,
            Note::MarkerAttrib(_) => NoteKind::MarkerAttrib,
            Note::Call { .. } => NoteKind::Call,
        }
    }

    /// Returns the point-list header for point-list notes.
    pub fn point_list(&self) -> Option<&PointList> {
        match self {
            Note::MarkerRun(list) | Note::Polygon(list) | Note::Polyline(list) => Some(list),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_kinds() {
        for tag in 1..=23u8 {
            let kind = NoteKind::from_tag(tag).expect("tag is assigned");
            assert_eq!(kind.tag(), tag);
        }
        assert_eq!(NoteKind::from_tag(DATA_TAG), None);
        assert_eq!(NoteKind::from_tag(24), None);
    }

    #[test]
    fn filled_flag_selects_poly_kind() {
        let shape = ArcShape::full(0, 0, 4, 4);
        assert_eq!(
            Note::Ellipse {
                shape,
                filled: true
            }
            .kind(),
            NoteKind::PolyEllipse
        );
        assert_eq!(
            Note::Sector {
                shape,
                filled: false
            }
            .kind(),
            NoteKind::Sector
        );
    }

    #[test]
    fn arc_shape_classification() {
        let mut shape = ArcShape::full(0, 0, 3, 2);
        assert!(shape.is_full());
        assert!(!shape.is_degenerate());
        shape.sweep = 0.0;
        assert!(shape.is_degenerate());
        shape.sweep = 1.0;
        shape.rx = 0;
        assert!(shape.is_degenerate());
    }
}
