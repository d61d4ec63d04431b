//! Little-endian payload encoding for notes.
//!
//! # Layout
//!
//! | Kind | Payload |
//! |------|---------|
//! | Point, MarkerPoint | `x i32, y i32` |
//! | Line | `x1 i32, y1 i32, x2 i32, y2 i32` |
//! | (Poly)Ellipse, Arc, (Poly)Chord, (Poly)Sector | `x i32, y i32, rx u32, ry u32, start f64, sweep f64` |
//! | MarkerRun, Polygon, Polyline | `max u32, count u32, closed u8, pad 3, span` |
//! | Image | `image u32, x i32, y i32, pad 4, scale f64` |
//! | Text | `x i32, y i32, angle f64, outline u8, pad 3, span` |
//! | PolyText | Text payload, then `margin f64` |
//! | BeginMarker | `x i32, y i32, angle f64` |
//! | EndMarker | empty |
//! | LineAttrib | `width u32, join u8, pad 3, color, span` |
//! | FillAttrib | `color, style u8, rule u8, draw_edge u8, pad 5` |
//! | TextAttrib | `font u32, underline u8, pad 3, color, slant f64, h_scale f64, v_scale f64` |
//! | MarkerAttrib | `width u32, filled u8, pad 3, color` |
//! | Call | `func u32, pad 4, span` |
//!
//! A `color` is four `f64` (r, g, b, a). A `span` is `block u32, offset u32,
//! len u32, pad 4`.

use super::{
    ArcShape, FillAttrib, FillRule, FillStyle, JoinStyle, MarkerAttrib, Note, NoteKind, PointList,
    TextAttrib, TextRun,
};
use crate::arena::Span;
use crate::draw::{Color, FontId};
use thiserror::Error;

/// Byte offset of the running `count` field inside a point-list payload.
pub const POINT_LIST_COUNT_OFFSET: usize = 4;

/// Bytes per stored point (`x i32, y i32`).
pub const POINT_SIZE: usize = 8;

/// Errors raised while decoding a note payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unknown note tag {0}")]
    UnknownTag(u8),

    #[error("Payload ended early while decoding {kind:?}")]
    UnexpectedEnd { kind: NoteKind },

    #[error("Invalid {field} value {value} in {kind:?} payload")]
    InvalidValue {
        kind: NoteKind,
        field: &'static str,
        value: u8,
    },
}

/// Encodes a note payload.
pub fn encode(note: &Note) -> Vec<u8> {
    let mut w = Writer::default();
    match note {
        Note::Point { x, y } | Note::MarkerPoint { x, y } => {
            w.i32(*x);
            w.i32(*y);
        }
        Note::Line { x1, y1, x2, y2 } => {
            w.i32(*x1);
            w.i32(*y1);
            w.i32(*x2);
            w.i32(*y2);
        }
        Note::Ellipse { shape, .. }
        | Note::Arc { shape }
        | Note::Chord { shape, .. }
        | Note::Sector { shape, .. } => w.arc_shape(shape),
        Note::MarkerRun(list) | Note::Polygon(list) | Note::Polyline(list) => {
            w.u32(list.max);
            w.u32(list.count);
            w.u8(list.closed as u8);
            w.pad(3);
            w.span(list.points);
        }
        Note::Image { image, x, y, scale } => {
            w.u32(*image);
            w.i32(*x);
            w.i32(*y);
            w.pad(4);
            w.f64(*scale);
        }
        Note::Text(run) => w.text_run(run),
        Note::PolyText { run, margin } => {
            w.text_run(run);
            w.f64(*margin);
        }
        Note::BeginMarker { x, y, angle } => {
            w.i32(*x);
            w.i32(*y);
            w.f64(*angle);
        }
        Note::EndMarker => {}
        Note::LineAttrib {
            width,
            color,
            join,
            dash,
        } => {
            w.u32(*width);
            w.u8(match join {
                JoinStyle::Miter => 0,
                JoinStyle::Bevel => 1,
            });
            w.pad(3);
            w.color(color);
            w.span(*dash);
        }
        Note::FillAttrib(fill) => {
            w.color(&fill.color);
            w.u8(match fill.style {
                FillStyle::Solid => 0,
                FillStyle::Hollow => 1,
            });
            w.u8(match fill.rule {
                FillRule::EvenOdd => 0,
                FillRule::NonZero => 1,
            });
            w.u8(fill.draw_edge as u8);
            w.pad(5);
        }
        Note::TextAttrib(text) => {
            w.u32(text.font.0);
            w.u8(text.underline as u8);
            w.pad(3);
            w.color(&text.color);
            w.f64(text.slant);
            w.f64(text.h_scale);
            w.f64(text.v_scale);
        }
        Note::MarkerAttrib(marker) => {
            w.u32(marker.width);
            w.u8(marker.filled as u8);
            w.pad(3);
            w.color(&marker.color);
        }
        Note::Call { func, params } => {
            w.u32(*func);
            w.pad(4);
            w.span(*params);
        }
    }
    w.bytes
}

/// Decodes the payload of a record tagged `tag`.
///
/// # Errors
/// Returns [`DecodeError`] for unknown tags, truncated payloads and
/// out-of-range enum bytes.
pub fn decode(tag: u8, payload: &[u8]) -> Result<Note, DecodeError> {
    let kind = NoteKind::from_tag(tag).ok_or(DecodeError::UnknownTag(tag))?;
    let mut r = Reader {
        bytes: payload,
        pos: 0,
        kind,
    };

    let note = match kind {
        NoteKind::Point => Note::Point {
            x: r.i32()?,
            y: r.i32()?,
        },
        NoteKind::MarkerPoint => Note::MarkerPoint {
            x: r.i32()?,
            y: r.i32()?,
        },
        NoteKind::Line => Note::Line {
            x1: r.i32()?,
            y1: r.i32()?,
            x2: r.i32()?,
            y2: r.i32()?,
        },
        NoteKind::PolyEllipse | NoteKind::Ellipse => Note::Ellipse {
            shape: r.arc_shape()?,
            filled: kind == NoteKind::PolyEllipse,
        },
        NoteKind::Arc => Note::Arc {
            shape: r.arc_shape()?,
        },
        NoteKind::PolyChord | NoteKind::Chord => Note::Chord {
            shape: r.arc_shape()?,
            filled: kind == NoteKind::PolyChord,
        },
        NoteKind::PolySector | NoteKind::Sector => Note::Sector {
            shape: r.arc_shape()?,
            filled: kind == NoteKind::PolySector,
        },
        NoteKind::MarkerRun | NoteKind::Polygon | NoteKind::Polyline => {
            let max = r.u32()?;
            let count = r.u32()?;
            let closed = r.flag("closed")?;
            r.skip(3)?;
            let list = PointList {
                max,
                count: count.min(max),
                closed,
                points: r.span()?,
            };
            match kind {
                NoteKind::MarkerRun => Note::MarkerRun(list),
                NoteKind::Polygon => Note::Polygon(list),
                _ => Note::Polyline(list),
            }
        }
        NoteKind::Image => {
            let image = r.u32()?;
            let x = r.i32()?;
            let y = r.i32()?;
            r.skip(4)?;
            Note::Image {
                image,
                x,
                y,
                scale: r.f64()?,
            }
        }
        NoteKind::Text => Note::Text(r.text_run()?),
        NoteKind::PolyText => Note::PolyText {
            run: r.text_run()?,
            margin: r.f64()?,
        },
        NoteKind::BeginMarker => Note::BeginMarker {
            x: r.i32()?,
            y: r.i32()?,
            angle: r.f64()?,
        },
        NoteKind::EndMarker => Note::EndMarker,
        NoteKind::LineAttrib => {
            let width = r.u32()?;
            let join = match r.u8()? {
                0 => JoinStyle::Miter,
                1 => JoinStyle::Bevel,
                value => return Err(r.invalid("join", value)),
            };
            r.skip(3)?;
            Note::LineAttrib {
                width,
                join,
                color: r.color()?,
                dash: r.span()?,
            }
        }
        NoteKind::FillAttrib => {
            let color = r.color()?;
            let style = match r.u8()? {
                0 => FillStyle::Solid,
                1 => FillStyle::Hollow,
                value => return Err(r.invalid("style", value)),
            };
            let rule = match r.u8()? {
                0 => FillRule::EvenOdd,
                1 => FillRule::NonZero,
                value => return Err(r.invalid("rule", value)),
            };
            let draw_edge = r.flag("draw_edge")?;
            Note::FillAttrib(FillAttrib {
                color,
                style,
                rule,
                draw_edge,
            })
        }
        NoteKind::TextAttrib => {
            let font = FontId(r.u32()?);
            let underline = r.flag("underline")?;
            r.skip(3)?;
            Note::TextAttrib(TextAttrib {
                font,
                underline,
                color: r.color()?,
                slant: r.f64()?,
                h_scale: r.f64()?,
                v_scale: r.f64()?,
            })
        }
        NoteKind::MarkerAttrib => {
            let width = r.u32()?;
            let filled = r.flag("filled")?;
            r.skip(3)?;
            Note::MarkerAttrib(MarkerAttrib {
                width,
                filled,
                color: r.color()?,
            })
        }
        NoteKind::Call => {
            let func = r.u32()?;
            r.skip(4)?;
            Note::Call {
                func,
                params: r.span()?,
            }
        }
    };

    Ok(note)
}

/// Decodes a point-list data record into `count` points.
pub fn decode_points(bytes: &[u8], count: u32) -> Vec<(i32, i32)> {
    bytes
        .chunks_exact(POINT_SIZE)
        .take(count as usize)
        .map(|chunk| {
            (
                i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
                i32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]),
            )
        })
        .collect()
}

/// Encodes one point for in-place storage.
pub fn encode_point(x: i32, y: i32) -> [u8; POINT_SIZE] {
    let mut out = [0u8; POINT_SIZE];
    out[..4].copy_from_slice(&x.to_le_bytes());
    out[4..].copy_from_slice(&y.to_le_bytes());
    out
}

/// Encodes a dash pattern data record.
pub fn encode_dash(dash: &[u32]) -> Vec<u8> {
    dash.iter().flat_map(|len| len.to_le_bytes()).collect()
}

/// Decodes a dash pattern data record.
pub fn decode_dash(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[derive(Default)]
struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    fn u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    fn u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    fn i32(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    fn f64(&mut self, value: f64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    fn pad(&mut self, count: usize) {
        self.bytes.resize(self.bytes.len() + count, 0);
    }

    fn color(&mut self, color: &Color) {
        for channel in [color.r, color.g, color.b, color.a] {
            self.f64(channel);
        }
    }

    fn span(&mut self, span: Span) {
        self.u32(span.block);
        self.u32(span.offset);
        self.u32(span.len);
        self.pad(4);
    }

    fn arc_shape(&mut self, shape: &ArcShape) {
        self.i32(shape.x);
        self.i32(shape.y);
        self.u32(shape.rx);
        self.u32(shape.ry);
        self.f64(shape.start);
        self.f64(shape.sweep);
    }

    fn text_run(&mut self, run: &TextRun) {
        self.i32(run.x);
        self.i32(run.y);
        self.f64(run.angle);
        self.u8(run.outline as u8);
        self.pad(3);
        self.span(run.text);
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    kind: NoteKind,
}

impl<'a> Reader<'a> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let end = self.pos + N;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(DecodeError::UnexpectedEnd { kind: self.kind })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn skip(&mut self, count: usize) -> Result<(), DecodeError> {
        if self.pos + count > self.bytes.len() {
            return Err(DecodeError::UnexpectedEnd { kind: self.kind });
        }
        self.pos += count;
        Ok(())
    }

    fn invalid(&self, field: &'static str, value: u8) -> DecodeError {
        DecodeError::InvalidValue {
            kind: self.kind,
            field,
            value,
        }
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take::<1>()?[0])
    }

    fn flag(&mut self, field: &'static str) -> Result<bool, DecodeError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(self.invalid(field, value)),
        }
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    fn f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.take()?))
    }

    fn color(&mut self) -> Result<Color, DecodeError> {
        Ok(Color {
            r: self.f64()?,
            g: self.f64()?,
            b: self.f64()?,
            a: self.f64()?,
        })
    }

    fn span(&mut self) -> Result<Span, DecodeError> {
        let span = Span {
            block: self.u32()?,
            offset: self.u32()?,
            len: self.u32()?,
        };
        self.skip(4)?;
        Ok(span)
    }

    fn arc_shape(&mut self) -> Result<ArcShape, DecodeError> {
        Ok(ArcShape {
            x: self.i32()?,
            y: self.i32()?,
            rx: self.u32()?,
            ry: self.u32()?,
            start: self.f64()?,
            sweep: self.f64()?,
        })
    }

    fn text_run(&mut self) -> Result<TextRun, DecodeError> {
        let x = self.i32()?;
        let y = self.i32()?;
        let angle = self.f64()?;
        let outline = self.flag("outline")?;
        self.skip(3)?;
        Ok(TextRun {
            x,
            y,
            angle,
            outline,
            text: self.span()?,
        })
    }
}
