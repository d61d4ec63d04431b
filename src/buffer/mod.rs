//! Retained command buffers.
//!
//! A [`Buffer`] records notes into its own [`Arena`] and tracks the
//! attribute state and transform they are recorded against. Buffers are
//! grouped and selected by a [`Session`].

mod session;

pub use session::{ArenaSettings, Session};

use crate::arena::{Arena, ArenaError, DATA_TAG, Span, record_size};
use crate::draw::{Bitmap, Color, FontId, FontTable, ImageError};
use crate::note::codec::{
    self, DecodeError, POINT_LIST_COUNT_OFFSET, POINT_SIZE, decode_points, encode_dash,
    encode_point,
};
use crate::note::{
    ArcShape, AttribState, FillAttrib, FillRule, FillStyle, JoinStyle, MarkerAttrib, Note,
    PointList, TextAttrib, TextRun, normalize_dash,
};
use crate::playback::{self, Bounds, CallFn, PlaybackOptions};
use crate::surface::Surface;
use crate::transform::TransformParams;
use crate::util::Rect;
use kurbo::{Point, Vec2};
use log::{debug, warn};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by buffer and session operations.
#[derive(Debug, Error)]
pub enum BufferError {
    #[error(transparent)]
    Arena(#[from] ArenaError),

    #[error("Buffer is unusable after an allocation failure; clear it first")]
    Poisoned,

    #[error("No polyline, polygon or marker run is open")]
    NothingToExtend,

    #[error("Font {0:?} is not registered")]
    UnknownFont(FontId),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("No buffer with id {0}")]
    UnknownBuffer(u32),

    #[error("No buffer is selected")]
    NoActiveBuffer,

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Point list currently accepting `add_point`.
#[derive(Debug, Clone, Copy)]
struct OpenList {
    /// Payload of the point-list note (holds the running count)
    header: Span,
    /// Point storage
    points: Span,
    max: u32,
    count: u32,
}

/// One display list: notes, recording state and the last modified region.
#[derive(Debug)]
pub struct Buffer {
    id: u32,
    retained: bool,
    arena: Arena,
    defaults: AttribState,
    state: AttribState,
    transform: TransformParams,
    building: Option<OpenList>,
    poisoned: bool,
    fonts: Arc<FontTable>,
    images: Vec<Arc<Bitmap>>,
    calls: Vec<CallFn>,
    bound: Bounds,
    extent: Option<(i32, i32)>,
}

impl Buffer {
    /// Creates a buffer with a default arena, default attributes and the
    /// default font table.
    pub fn new(id: u32, retained: bool) -> Self {
        Self::with_parts(
            id,
            retained,
            Arena::default(),
            AttribState::default(),
            Arc::new(FontTable::default()),
        )
    }

    /// Creates a buffer from explicit parts. `defaults` become both the
    /// recording state and the state every playback pass starts from.
    pub fn with_parts(
        id: u32,
        retained: bool,
        arena: Arena,
        defaults: AttribState,
        fonts: Arc<FontTable>,
    ) -> Self {
        Self {
            id,
            retained,
            arena,
            state: defaults.clone(),
            defaults,
            transform: TransformParams::default(),
            building: None,
            poisoned: false,
            fonts,
            images: Vec::new(),
            calls: Vec::new(),
            bound: Bounds::new(),
            extent: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns true when the buffer survives the end of a frame.
    pub fn is_retained(&self) -> bool {
        self.retained
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Attribute state playback starts from.
    pub fn defaults(&self) -> &AttribState {
        &self.defaults
    }

    /// Attribute state new notes are recorded against.
    pub fn state(&self) -> &AttribState {
        &self.state
    }

    pub fn transform(&self) -> TransformParams {
        self.transform
    }

    pub fn fonts(&self) -> &FontTable {
        &self.fonts
    }

    pub(crate) fn set_fonts(&mut self, fonts: Arc<FontTable>) {
        self.fonts = fonts;
    }

    pub fn images(&self) -> &[Arc<Bitmap>] {
        &self.images
    }

    pub fn calls(&self) -> &[CallFn] {
        &self.calls
    }

    /// Returns true after an allocation failure, until [`Buffer::clear`].
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Returns true while a point list accepts [`Buffer::add_point`].
    pub fn is_building(&self) -> bool {
        self.building.is_some()
    }

    /// Drops every note and restores the default attributes.
    ///
    /// Arena blocks are kept for re-population; the transform is kept too.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.state = self.defaults.clone();
        self.building = None;
        self.poisoned = false;
        self.images.clear();
        self.calls.clear();
        self.bound.reset();
        self.extent = None;
        debug!("Cleared buffer {}", self.id);
    }

    /// Replaces the default attributes. Takes effect for notes recorded
    /// after the next [`Buffer::clear`] and for every later playback pass.
    pub fn set_defaults(&mut self, defaults: AttribState) {
        self.defaults = defaults;
    }

    // ── Transform ──────────────────────────────────────────────────────────

    pub fn set_transform(&mut self, transform: TransformParams) {
        self.transform = transform;
    }

    /// Sets the point rotation and scaling happen about.
    pub fn set_pivot(&mut self, x: f64, y: f64) {
        self.transform.pivot = Point::new(x, y);
    }

    /// Sets the translation applied after rotation and scaling.
    pub fn set_move(&mut self, dx: f64, dy: f64) {
        self.transform.offset = Vec2::new(dx, dy);
    }

    pub fn set_scale(&mut self, scale_x: f64, scale_y: f64) {
        self.transform.scale_x = scale_x;
        self.transform.scale_y = scale_y;
    }

    /// Sets the rotation in radians.
    pub fn set_angle(&mut self, angle: f64) {
        self.transform.angle = angle;
    }

    // ── Recording helpers ─────────────────────────────────────────────────

    /// Fails on poisoned buffers and finishes any open point list.
    fn start_note(&mut self) -> Result<(), BufferError> {
        if self.poisoned {
            return Err(BufferError::Poisoned);
        }
        self.building = None;
        Ok(())
    }

    /// Converts arena failures, poisoning the buffer on exhaustion.
    fn guard<T>(&mut self, result: Result<T, ArenaError>) -> Result<T, BufferError> {
        result.map_err(|err| {
            if matches!(err, ArenaError::OutOfMemory { .. }) {
                warn!("Buffer {} poisoned: {}", self.id, err);
                self.poisoned = true;
            }
            BufferError::from(err)
        })
    }

    fn push(&mut self, note: &Note) -> Result<Span, BufferError> {
        let payload = codec::encode(note);
        let result = self.arena.push_record(note.kind().tag(), &payload);
        self.guard(result)
    }

    /// Copies raw bytes into a data record.
    fn push_bytes(&mut self, bytes: &[u8]) -> Result<Span, BufferError> {
        if bytes.is_empty() {
            return Ok(Span::default());
        }
        let result = self.arena.push_record(DATA_TAG, bytes);
        self.guard(result)
    }

    fn emit(&mut self, note: Note) -> Result<(), BufferError> {
        self.start_note()?;
        self.push(&note).map(drop)
    }

    fn check_font(&self, font: FontId) -> Result<(), BufferError> {
        match self.fonts.get(font) {
            Some(_) => Ok(()),
            None => Err(BufferError::UnknownFont(font)),
        }
    }

    // ── Shapes ─────────────────────────────────────────────────────────────

    /// Sets one pixel in the pen color.
    pub fn point(&mut self, x: i32, y: i32) -> Result<(), BufferError> {
        self.emit(Note::Point { x, y })
    }

    /// Sets one pixel in the marker color.
    pub fn marker_point(&mut self, x: i32, y: i32) -> Result<(), BufferError> {
        self.emit(Note::MarkerPoint { x, y })
    }

    pub fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) -> Result<(), BufferError> {
        self.emit(Note::Line { x1, y1, x2, y2 })
    }

    /// Outlines an ellipse with the current pen.
    pub fn ellipse(&mut self, x: i32, y: i32, rx: u32, ry: u32) -> Result<(), BufferError> {
        self.emit(Note::Ellipse {
            shape: ArcShape::full(x, y, rx, ry),
            filled: false,
        })
    }

    /// Fills an ellipse with the current brush.
    pub fn poly_ellipse(&mut self, x: i32, y: i32, rx: u32, ry: u32) -> Result<(), BufferError> {
        self.emit(Note::Ellipse {
            shape: ArcShape::full(x, y, rx, ry),
            filled: true,
        })
    }

    /// Outlines an elliptical arc. Angles are radians; a sweep of at least
    /// a full turn draws the whole ellipse.
    pub fn arc(
        &mut self,
        x: i32,
        y: i32,
        rx: u32,
        ry: u32,
        start: f64,
        sweep: f64,
    ) -> Result<(), BufferError> {
        self.emit(Note::Arc {
            shape: ArcShape {
                x,
                y,
                rx,
                ry,
                start,
                sweep,
            },
        })
    }

    /// Fills the region bounded by an arc and its chord.
    pub fn poly_arc(
        &mut self,
        x: i32,
        y: i32,
        rx: u32,
        ry: u32,
        start: f64,
        sweep: f64,
    ) -> Result<(), BufferError> {
        self.poly_chord(x, y, rx, ry, start, sweep)
    }

    /// Outlines an arc closed by its chord.
    pub fn chord(
        &mut self,
        x: i32,
        y: i32,
        rx: u32,
        ry: u32,
        start: f64,
        sweep: f64,
    ) -> Result<(), BufferError> {
        self.emit(Note::Chord {
            shape: ArcShape {
                x,
                y,
                rx,
                ry,
                start,
                sweep,
            },
            filled: false,
        })
    }

    pub fn poly_chord(
        &mut self,
        x: i32,
        y: i32,
        rx: u32,
        ry: u32,
        start: f64,
        sweep: f64,
    ) -> Result<(), BufferError> {
        self.emit(Note::Chord {
            shape: ArcShape {
                x,
                y,
                rx,
                ry,
                start,
                sweep,
            },
            filled: true,
        })
    }

    /// Outlines a pie slice.
    pub fn sector(
        &mut self,
        x: i32,
        y: i32,
        rx: u32,
        ry: u32,
        start: f64,
        sweep: f64,
    ) -> Result<(), BufferError> {
        self.emit(Note::Sector {
            shape: ArcShape {
                x,
                y,
                rx,
                ry,
                start,
                sweep,
            },
            filled: false,
        })
    }

    pub fn poly_sector(
        &mut self,
        x: i32,
        y: i32,
        rx: u32,
        ry: u32,
        start: f64,
        sweep: f64,
    ) -> Result<(), BufferError> {
        self.emit(Note::Sector {
            shape: ArcShape {
                x,
                y,
                rx,
                ry,
                start,
                sweep,
            },
            filled: true,
        })
    }

    // ── Point lists ────────────────────────────────────────────────────────

    fn begin_point_list(
        &mut self,
        make: fn(PointList) -> Note,
        max: u32,
        closed: bool,
    ) -> Result<(), BufferError> {
        self.start_note()?;
        let data_len = max as usize * POINT_SIZE;
        let header_len = codec::encode(&make(PointList {
            max,
            count: 0,
            closed,
            points: Span::default(),
        }))
        .len();

        // Keep the point storage and its note in one block.
        let reserved = self
            .arena
            .reserve_or_grow(record_size(data_len) + record_size(header_len));
        self.guard(reserved)?;
        let data = self.arena.push_data(data_len);
        let points = self.guard(data)?;

        let header = self.push(&make(PointList {
            max,
            count: 0,
            closed,
            points,
        }))?;
        self.building = Some(OpenList {
            header,
            points,
            max,
            count: 0,
        });
        Ok(())
    }

    /// Opens a polyline holding at most `max` points.
    pub fn begin_polyline(&mut self, max: u32) -> Result<(), BufferError> {
        self.begin_point_list(Note::Polyline, max, false)
    }

    /// Opens a polygon holding at most `max` points.
    pub fn begin_polygon(&mut self, max: u32) -> Result<(), BufferError> {
        self.begin_point_list(Note::Polygon, max, true)
    }

    /// Opens a marker run holding at most `max` points.
    pub fn begin_marker_run(&mut self, max: u32, closed: bool) -> Result<(), BufferError> {
        self.begin_point_list(Note::MarkerRun, max, closed)
    }

    /// Appends a point to the open point list.
    ///
    /// Points beyond the capacity given when the list was opened are
    /// dropped; returns whether the point was stored.
    pub fn add_point(&mut self, x: i32, y: i32) -> Result<bool, BufferError> {
        if self.poisoned {
            return Err(BufferError::Poisoned);
        }
        let Some(list) = self.building else {
            return Err(BufferError::NothingToExtend);
        };
        if list.count >= list.max {
            debug!(
                "Dropping point ({}, {}): list of buffer {} is full ({} points)",
                x, y, self.id, list.max
            );
            return Ok(false);
        }

        let slot = Span {
            block: list.points.block,
            offset: list.points.offset + list.count * POINT_SIZE as u32,
            len: POINT_SIZE as u32,
        };
        let count_field = Span {
            block: list.header.block,
            offset: list.header.offset + POINT_LIST_COUNT_OFFSET as u32,
            len: 4,
        };
        let count = list.count + 1;
        self.arena
            .get_mut(slot)?
            .copy_from_slice(&encode_point(x, y));
        self.arena
            .get_mut(count_field)?
            .copy_from_slice(&count.to_le_bytes());

        self.building = Some(OpenList { count, ..list });
        Ok(true)
    }

    fn point_list(
        &mut self,
        make: fn(PointList) -> Note,
        points: &[(i32, i32)],
        closed: bool,
    ) -> Result<(), BufferError> {
        self.begin_point_list(make, points.len() as u32, closed)?;
        for &(x, y) in points {
            self.add_point(x, y)?;
        }
        self.building = None;
        Ok(())
    }

    /// Records a complete polyline.
    pub fn polyline(&mut self, points: &[(i32, i32)]) -> Result<(), BufferError> {
        self.point_list(Note::Polyline, points, false)
    }

    /// Records a complete polygon.
    pub fn polygon(&mut self, points: &[(i32, i32)]) -> Result<(), BufferError> {
        self.point_list(Note::Polygon, points, true)
    }

    /// Records a complete marker run.
    pub fn marker_run(&mut self, points: &[(i32, i32)], closed: bool) -> Result<(), BufferError> {
        self.point_list(Note::MarkerRun, points, closed)
    }

    /// Reads the points stored for a point-list note.
    pub fn points(&self, list: &PointList) -> Result<Vec<(i32, i32)>, BufferError> {
        let bytes = self.arena.get(list.points)?;
        Ok(decode_points(bytes, list.count))
    }

    // ── Markers, images, text, calls ──────────────────────────────────────

    /// Opens a marker frame anchored at `(x, y)` and rotated by `angle`.
    pub fn begin_marker(&mut self, x: i32, y: i32, angle: f64) -> Result<(), BufferError> {
        self.emit(Note::BeginMarker { x, y, angle })
    }

    pub fn end_marker(&mut self) -> Result<(), BufferError> {
        self.emit(Note::EndMarker)
    }

    /// Blits `bitmap` centred on `(x, y)`, scaled by `scale`.
    pub fn image(
        &mut self,
        bitmap: Arc<Bitmap>,
        x: i32,
        y: i32,
        scale: f64,
    ) -> Result<(), BufferError> {
        self.start_note()?;
        let image = self.images.len() as u32;
        self.push(&Note::Image { image, x, y, scale })?;
        self.images.push(bitmap);
        Ok(())
    }

    /// Loads a PNG and records it as an image note. Load failures are
    /// reported here, not at playback.
    pub fn image_file(&mut self, path: &Path, x: i32, y: i32, scale: f64) -> Result<(), BufferError> {
        let bitmap = Bitmap::load_png(path)?;
        self.image(Arc::new(bitmap), x, y, scale)
    }

    fn push_text(&mut self, text: &str, make: impl FnOnce(Span) -> Note) -> Result<(), BufferError> {
        self.start_note()?;
        self.check_font(self.state.text.font)?;
        let span = self.push_bytes(text.as_bytes())?;
        self.push(&make(span)).map(drop)
    }

    /// Draws `text` with its baseline starting at `(x, y)`, rotated by
    /// `angle` radians. `outline` strokes the glyphs instead of filling them.
    pub fn text(
        &mut self,
        x: i32,
        y: i32,
        angle: f64,
        text: &str,
        outline: bool,
    ) -> Result<(), BufferError> {
        self.push_text(text, |span| {
            Note::Text(TextRun {
                x,
                y,
                angle,
                text: span,
                outline,
            })
        })
    }

    /// Draws text inside a frame box drawn with the current brush; the box
    /// is inflated by `margin` times half the text height.
    pub fn poly_text(
        &mut self,
        x: i32,
        y: i32,
        angle: f64,
        margin: f64,
        text: &str,
        outline: bool,
    ) -> Result<(), BufferError> {
        self.push_text(text, |span| Note::PolyText {
            run: TextRun {
                x,
                y,
                angle,
                text: span,
                outline,
            },
            margin,
        })
    }

    /// Records a generic callback invoked with `params` at playback.
    pub fn call(&mut self, func: CallFn, params: &[u8]) -> Result<(), BufferError> {
        self.start_note()?;
        let params = self.push_bytes(params)?;
        let index = self.calls.len() as u32;
        self.push(&Note::Call {
            func: index,
            params,
        })?;
        self.calls.push(func);
        Ok(())
    }

    // ── Attributes ─────────────────────────────────────────────────────────

    fn emit_line_attrib(&mut self) -> Result<(), BufferError> {
        self.start_note()?;
        let line = self.state.line.clone();
        let dash = self.push_bytes(&encode_dash(&line.dash))?;
        self.push(&Note::LineAttrib {
            width: line.width,
            color: line.color,
            join: line.join,
            dash,
        })
        .map(drop)
    }

    /// Changes the pen. `dash` gives on/off lengths in device pixels;
    /// `None` or an empty slice draws solid lines.
    pub fn set_line_attrib(
        &mut self,
        width: u32,
        color: Color,
        dash: Option<&[u32]>,
    ) -> Result<(), BufferError> {
        if self.poisoned {
            return Err(BufferError::Poisoned);
        }
        self.state.line.width = width;
        self.state.line.color = color;
        self.state.line.dash = normalize_dash(dash.unwrap_or_default());
        self.emit_line_attrib()
    }

    pub fn set_line_join(&mut self, join: JoinStyle) -> Result<(), BufferError> {
        if self.poisoned {
            return Err(BufferError::Poisoned);
        }
        self.state.line.join = join;
        self.emit_line_attrib()
    }

    fn emit_fill_attrib(&mut self, fill: FillAttrib) -> Result<(), BufferError> {
        self.start_note()?;
        self.state.fill = fill;
        self.push(&Note::FillAttrib(fill)).map(drop)
    }

    /// Changes the brush. `draw_edge` outlines filled shapes with the pen.
    pub fn set_fill_attrib(
        &mut self,
        color: Color,
        style: FillStyle,
        draw_edge: bool,
    ) -> Result<(), BufferError> {
        self.emit_fill_attrib(FillAttrib {
            color,
            style,
            draw_edge,
            ..self.state.fill
        })
    }

    pub fn set_fill_rule(&mut self, rule: FillRule) -> Result<(), BufferError> {
        self.emit_fill_attrib(FillAttrib {
            rule,
            ..self.state.fill
        })
    }

    /// Changes the text attributes; `font` must be registered.
    pub fn set_text_attrib(
        &mut self,
        font: FontId,
        color: Color,
        slant: f64,
        h_scale: f64,
        v_scale: f64,
        underline: bool,
    ) -> Result<(), BufferError> {
        self.start_note()?;
        self.check_font(font)?;
        let text = TextAttrib {
            font,
            color,
            slant,
            h_scale,
            v_scale,
            underline,
        };
        self.push(&Note::TextAttrib(text))?;
        self.state.text = text;
        Ok(())
    }

    /// Changes the pen and fill used inside marker brackets.
    pub fn set_marker_attrib(
        &mut self,
        color: Color,
        width: u32,
        filled: bool,
    ) -> Result<(), BufferError> {
        self.start_note()?;
        let marker = MarkerAttrib {
            color,
            width,
            filled,
        };
        self.push(&Note::MarkerAttrib(marker))?;
        self.state.marker = marker;
        Ok(())
    }

    // ── Inspection and playback ───────────────────────────────────────────

    /// Decodes the recorded notes in order, skipping data records.
    pub fn notes(&self) -> impl Iterator<Item = Result<Note, BufferError>> + '_ {
        self.arena.records().filter_map(|record| match record {
            Ok(record) if record.tag == DATA_TAG => None,
            Ok(record) => Some(codec::decode(record.tag, record.payload).map_err(BufferError::from)),
            Err(err) => Some(Err(err.into())),
        })
    }

    /// Plays the buffer onto `surface` and returns the modified region
    /// clamped to the surface, or `None` when nothing was drawn.
    pub fn play(
        &mut self,
        surface: &mut dyn Surface,
        options: &PlaybackOptions<'_>,
    ) -> Option<Rect> {
        let bound = playback::play(self, surface, options);
        self.bound = bound;
        self.extent = Some(surface.extent());
        self.modified_region()
    }

    /// Region modified by the last playback pass, clamped to its surface.
    pub fn modified_region(&self) -> Option<Rect> {
        let (width, height) = self.extent?;
        self.bound.clamped(width, height)
    }

    /// Unclamped bound of the last playback pass.
    pub fn modified_bound(&self) -> Option<Rect> {
        self.bound.to_rect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{BLACK, RED};
    use crate::surface::{TraceOp, TraceSurface};
    use crate::transform::TransformStrategy;

    fn notes(buffer: &Buffer) -> Vec<Note> {
        buffer.notes().map(|note| note.unwrap()).collect()
    }

    #[test]
    fn records_notes_in_order() {
        let mut buffer = Buffer::new(1, false);
        buffer.point(1, 2).unwrap();
        buffer.line(0, 0, 5, 5).unwrap();
        buffer.set_marker_attrib(RED, 3, true).unwrap();

        let notes = notes(&buffer);
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[0], Note::Point { x: 1, y: 2 });
        assert_eq!(
            notes[2],
            Note::MarkerAttrib(MarkerAttrib {
                color: RED,
                width: 3,
                filled: true
            })
        );
        assert_eq!(buffer.state().marker.width, 3);
    }

    #[test]
    fn point_list_drops_points_past_capacity() {
        let mut buffer = Buffer::new(1, false);
        buffer.begin_polygon(2).unwrap();
        assert!(buffer.add_point(0, 0).unwrap());
        assert!(buffer.add_point(4, 0).unwrap());
        assert!(!buffer.add_point(4, 4).unwrap());

        let notes = notes(&buffer);
        let Note::Polygon(list) = &notes[0] else {
            panic!("expected a polygon, got {:?}", notes[0]);
        };
        assert_eq!((list.max, list.count), (2, 2));
        assert_eq!(buffer.points(list).unwrap(), vec![(0, 0), (4, 0)]);
    }

    #[test]
    fn other_notes_finish_the_open_list() {
        let mut buffer = Buffer::new(1, false);
        assert!(matches!(
            buffer.add_point(1, 1),
            Err(BufferError::NothingToExtend)
        ));
        buffer.begin_polyline(4).unwrap();
        buffer.point(9, 9).unwrap();
        assert!(!buffer.is_building());
        assert!(matches!(
            buffer.add_point(1, 1),
            Err(BufferError::NothingToExtend)
        ));
    }

    #[test]
    fn exhaustion_poisons_until_cleared() {
        let arena = Arena::with_config(64, 2.0, Some(64));
        let mut buffer = Buffer::with_parts(
            3,
            true,
            arena,
            AttribState::default(),
            Arc::new(FontTable::default()),
        );
        buffer.point(0, 0).unwrap();
        let err = buffer.begin_polyline(100).unwrap_err();
        assert!(matches!(err, BufferError::Arena(ArenaError::OutOfMemory { .. })));
        assert!(buffer.is_poisoned());
        assert!(matches!(buffer.point(1, 1), Err(BufferError::Poisoned)));

        buffer.clear();
        assert!(!buffer.is_poisoned());
        buffer.point(1, 1).unwrap();
    }

    #[test]
    fn unknown_fonts_are_rejected_at_emission() {
        let mut buffer = Buffer::new(1, false);
        let err = buffer
            .set_text_attrib(FontId(5), BLACK, 0.0, 1.0, 1.0, false)
            .unwrap_err();
        assert!(matches!(err, BufferError::UnknownFont(FontId(5))));
        assert!(buffer.notes().next().is_none());
        buffer.text(0, 10, 0.0, "ok", false).unwrap();
    }

    #[test]
    fn dash_patterns_are_normalized_and_stored() {
        let mut buffer = Buffer::new(1, false);
        buffer.set_line_attrib(4, RED, Some(&[6, 0])).unwrap();
        assert_eq!(buffer.state().line.dash, vec![6, 1]);
        let notes = notes(&buffer);
        let Note::LineAttrib { dash, .. } = notes[0] else {
            panic!("expected a line attribute");
        };
        assert_eq!(
            codec::decode_dash(buffer.arena().get(dash).unwrap()),
            vec![6, 1]
        );
    }

    #[test]
    fn clear_restores_defaults_but_keeps_the_transform() {
        let mut buffer = Buffer::new(1, true);
        buffer.set_scale(2.0, 2.0);
        buffer.set_line_attrib(9, RED, None).unwrap();
        buffer.clear();
        assert!(buffer.arena().is_empty());
        assert_eq!(buffer.state(), buffer.defaults());
        assert_eq!(buffer.transform().scale_x, 2.0);
    }

    #[test]
    fn play_reports_the_clamped_region() {
        let mut buffer = Buffer::new(1, false);
        buffer.point(3, 4).unwrap();
        let mut surface = TraceSurface::new(10, 10, TransformStrategy::Explicit);
        let region = buffer.play(&mut surface, &PlaybackOptions::default());
        assert_eq!(region, Rect::new(3, 4, 1, 1));
        assert_eq!(
            surface.ops(),
            &[TraceOp::Pixel {
                x: 3,
                y: 4,
                color: BLACK
            }]
        );
    }

    #[test]
    fn calls_receive_their_parameters() {
        fn mark(ctx: &mut crate::playback::RenderContext<'_>, params: &[u8]) {
            let x = params[0] as f64;
            ctx.draw_pixel(Point::new(x, 0.0), RED);
        }

        let mut buffer = Buffer::new(1, false);
        buffer.call(mark, &[6]).unwrap();
        let mut surface = TraceSurface::new(10, 10, TransformStrategy::Explicit);
        buffer.play(&mut surface, &PlaybackOptions::default());
        assert_eq!(
            surface.ops(),
            &[TraceOp::Pixel {
                x: 6,
                y: 0,
                color: RED
            }]
        );
        assert_eq!(buffer.modified_region(), Rect::new(6, 0, 1, 1));
    }
}
