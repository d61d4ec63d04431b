//! Per-note rendering and the state threaded through a playback pass.

use super::bounds::Bounds;
use crate::arena::{Arena, Span};
use crate::buffer::Buffer;
use crate::draw::{Bitmap, Color, FontTable, GlyphProvider};
use crate::note::codec::{decode_dash, decode_points};
use crate::note::{
    ArcShape, AttribState, FillAttrib, FillRule, JoinStyle, LineAttrib, Note, PointList, TextRun,
    normalize_dash,
};
use crate::raster::{StrokeSink, Stroker};
use crate::surface::Surface;
use crate::transform::{TransformParams, TransformStrategy};
use kurbo::{Affine, Point};
use log::{debug, warn};
use std::f64::consts::{PI, TAU};
use std::sync::Arc;

/// Generic drawing callback stored in a buffer's call table.
///
/// Receives the live render context and the parameter bytes copied into the
/// arena when the call was recorded.
pub type CallFn = fn(&mut RenderContext<'_>, &[u8]);

/// Arcs and ellipses get one vertex per degree of sweep.
const ARC_STEP: f64 = PI / 180.0;

/// Underline offset below the baseline, relative to the descent.
const UNDERLINE_OFFSET: f64 = 0.3;

/// Underline thickness relative to the ascent.
const UNDERLINE_THICKNESS: f64 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArcForm {
    Ellipse,
    Arc,
    Chord,
    Sector,
}

/// State saved by a begin-marker note.
#[derive(Debug, Clone)]
struct SavedFrame {
    matrix: Affine,
    line: LineAttrib,
    fill: FillAttrib,
}

/// Everything a note needs while it is rendered.
///
/// Holds the target surface, the arena the notes live in, the buffer
/// transform, the current attribute state and the modified-region bound.
/// Generic callbacks ([`CallFn`]) receive it and draw through the same
/// helpers as the built-in notes, so their output is registered too.
pub struct RenderContext<'a> {
    surface: &'a mut dyn Surface,
    arena: &'a Arena,
    glyphs: &'a dyn GlyphProvider,
    fonts: &'a FontTable,
    images: &'a [Arc<Bitmap>],
    calls: &'a [CallFn],
    strategy: TransformStrategy,
    params: TransformParams,
    matrix: Affine,
    state: AttribState,
    markers: Vec<SavedFrame>,
    bounds: Bounds,
}

impl<'a> RenderContext<'a> {
    pub(super) fn new(
        surface: &'a mut dyn Surface,
        buffer: &'a Buffer,
        glyphs: &'a dyn GlyphProvider,
    ) -> Self {
        let strategy = surface.strategy();
        let params = buffer.transform();
        Self {
            surface,
            arena: buffer.arena(),
            glyphs,
            fonts: buffer.fonts(),
            images: buffer.images(),
            calls: buffer.calls(),
            strategy,
            params,
            matrix: params.matrix(),
            state: buffer.defaults().clone(),
            markers: Vec::new(),
            bounds: Bounds::new(),
        }
    }

    pub(super) fn finish(self) -> Bounds {
        if !self.markers.is_empty() {
            debug!("{} marker bracket(s) left open at end of pass", self.markers.len());
        }
        self.bounds
    }

    pub fn strategy(&self) -> TransformStrategy {
        self.strategy
    }

    /// Attribute state at this point of the pass.
    pub fn state(&self) -> &AttribState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AttribState {
        &mut self.state
    }

    /// Current user-to-device matrix (buffer transform or marker frame).
    pub fn matrix(&self) -> Affine {
        self.matrix
    }

    /// Bound accumulated so far.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Maps a point in the current frame to device space.
    ///
    /// Outside marker brackets the buffer transform is applied step by step;
    /// inside them the marker frame matrix is used.
    pub fn to_device(&self, point: Point) -> Point {
        if !self.markers.is_empty() {
            self.matrix * point
        } else if self.params.is_identity() {
            point
        } else {
            self.params.apply_stepwise(point)
        }
    }

    /// Paints the device pixel under `point`.
    pub fn draw_pixel(&mut self, point: Point, color: Color) {
        let device = self.to_device(point).round();
        let (x, y) = (device.x as i32, device.y as i32);
        self.surface.set_pixel(x, y, color);
        self.bounds.include_pixel(x, y);
    }

    /// Strokes a path given in the current frame with `pen`.
    pub fn draw_path(&mut self, points: &[Point], closed: bool, pen: &LineAttrib) {
        if points.is_empty() {
            return;
        }
        let device: Vec<Point> = points.iter().map(|&p| self.to_device(p)).collect();
        match self.strategy {
            TransformStrategy::Explicit => {
                let mut sink = DeviceSink {
                    surface: Some(&mut *self.surface),
                    color: pen.color,
                    bounds: &mut self.bounds,
                };
                Stroker::new(pen).stroke_points(&device, closed, &mut sink);
            }
            TransformStrategy::Native => {
                self.surface.stroke_path(points, closed, pen);
                // Solid walk over the device path registers every vertex and join
                let mut sink = DeviceSink {
                    surface: None,
                    color: pen.color,
                    bounds: &mut self.bounds,
                };
                Stroker::with_style(pen.width, pen.join, None).stroke_points(
                    &device,
                    closed,
                    &mut sink,
                );
            }
        }
    }

    /// Fills a polygon given in the current frame.
    pub fn fill_path(&mut self, points: &[Point], color: Color, rule: FillRule) {
        if points.len() < 3 {
            return;
        }
        let device: Vec<Point> = points.iter().map(|&p| self.to_device(p)).collect();
        for &point in &device {
            self.bounds.include_point(point);
        }
        match self.strategy {
            TransformStrategy::Explicit => self.surface.fill_polygon(&device, color, rule),
            TransformStrategy::Native => self.surface.fill_polygon(points, color, rule),
        }
    }

    /// Fills several contours given in the current frame as one shape.
    pub fn fill_contours(&mut self, contours: &[Vec<Point>], color: Color, rule: FillRule) {
        let device: Vec<Vec<Point>> = contours
            .iter()
            .map(|contour| contour.iter().map(|&p| self.to_device(p)).collect())
            .collect();
        for &point in device.iter().flatten() {
            self.bounds.include_point(point);
        }
        match self.strategy {
            TransformStrategy::Explicit => self.surface.fill_contours(&device, color, rule),
            TransformStrategy::Native => self.surface.fill_contours(contours, color, rule),
        }
    }

    pub(super) fn render(&mut self, note: &Note) {
        match note {
            Note::Point { x, y } => {
                let color = self.state.line.color;
                self.draw_pixel(point(*x, *y), color);
            }
            Note::MarkerPoint { x, y } => {
                let color = self.state.marker.color;
                self.draw_pixel(point(*x, *y), color);
            }
            Note::Line { x1, y1, x2, y2 } => {
                let pen = self.state.line.clone();
                self.draw_path(&[point(*x1, *y1), point(*x2, *y2)], false, &pen);
            }
            Note::Ellipse { shape, filled } => self.draw_arc_shape(shape, ArcForm::Ellipse, *filled),
            Note::Arc { shape } => self.draw_arc_shape(shape, ArcForm::Arc, false),
            Note::Chord { shape, filled } => self.draw_arc_shape(shape, ArcForm::Chord, *filled),
            Note::Sector { shape, filled } => self.draw_arc_shape(shape, ArcForm::Sector, *filled),
            Note::MarkerRun(list) => {
                let points = self.points(list);
                let marker = self.state.marker;
                if marker.filled {
                    self.fill_path(&points, marker.color, FillRule::NonZero);
                } else {
                    self.draw_path(&points, list.closed, &marker.pen());
                }
            }
            Note::Polygon(list) => {
                let points = self.points(list);
                self.draw_filled(&points);
            }
            Note::Polyline(list) => {
                let mut points = self.points(list);
                let mut closed = list.closed;
                if points.len() > 2 && points.first() == points.last() {
                    points.pop();
                    closed = true;
                }
                let pen = self.state.line.clone();
                self.draw_path(&points, closed, &pen);
            }
            Note::Image { image, x, y, scale } => self.draw_image(*image, *x, *y, *scale),
            Note::Text(run) => self.draw_text(run, None),
            Note::PolyText { run, margin } => self.draw_text(run, Some(*margin)),
            Note::BeginMarker { x, y, angle } => self.begin_marker(point(*x, *y), *angle),
            Note::EndMarker => self.end_marker(),
            Note::LineAttrib {
                width,
                color,
                join,
                dash,
            } => {
                let dash = self.read(*dash).map(decode_dash).unwrap_or_default();
                self.state.line = LineAttrib {
                    width: *width,
                    color: *color,
                    join: *join,
                    dash: normalize_dash(&dash),
                };
            }
            Note::FillAttrib(fill) => self.state.fill = *fill,
            Note::TextAttrib(text) => self.state.text = *text,
            Note::MarkerAttrib(marker) => self.state.marker = *marker,
            Note::Call { func, params } => self.call(*func, *params),
        }
    }

    /// Reads a data span, logging and returning `None` when it is invalid.
    fn read(&self, span: Span) -> Option<&'a [u8]> {
        if span.is_empty() {
            return Some(&[]);
        }
        let arena = self.arena;
        match arena.get(span) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                warn!("Skipping note data: {}", err);
                None
            }
        }
    }

    fn points(&self, list: &PointList) -> Vec<Point> {
        self.read(list.points)
            .map(|bytes| {
                decode_points(bytes, list.count)
                    .into_iter()
                    .map(|(x, y)| point(x, y))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fills with the current brush, then outlines with the current pen when
    /// the brush asks for an edge.
    fn draw_filled(&mut self, points: &[Point]) {
        let fill = self.state.fill;
        if fill.paints() {
            self.fill_path(points, fill.color, fill.rule);
        }
        if fill.draw_edge {
            let pen = self.state.line.clone();
            self.draw_path(points, true, &pen);
        }
    }

    fn draw_arc_shape(&mut self, shape: &ArcShape, form: ArcForm, filled: bool) {
        if shape.is_degenerate() {
            return;
        }
        let mut points = arc_points(shape);
        let closed = if shape.is_full() {
            true
        } else {
            match form {
                ArcForm::Ellipse | ArcForm::Chord => true,
                ArcForm::Arc => false,
                ArcForm::Sector => {
                    points.insert(0, point(shape.x, shape.y));
                    true
                }
            }
        };

        let pen = LineAttrib {
            join: JoinStyle::Bevel,
            ..self.state.line.clone()
        };
        if !filled {
            self.draw_path(&points, closed, &pen);
            return;
        }

        let fill = self.state.fill;
        if fill.paints() {
            self.fill_path(&points, fill.color, fill.rule);
        }
        if fill.draw_edge {
            self.draw_path(&points, closed, &pen);
        }
    }

    fn draw_image(&mut self, image: u32, x: i32, y: i32, scale: f64) {
        let images = self.images;
        let Some(bitmap) = images.get(image as usize) else {
            warn!("Image note references unknown image {}", image);
            return;
        };
        let (w, h) = (bitmap.width as f64, bitmap.height as f64);
        let placement = Affine::translate((x as f64, y as f64))
            * Affine::scale(scale)
            * Affine::translate((-w / 2.0, -h / 2.0));
        let device = self.matrix * placement;

        for corner in [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)] {
            self.bounds.include_point(device * Point::new(corner.0, corner.1));
        }
        match self.strategy {
            TransformStrategy::Explicit => self.surface.draw_image(bitmap, device),
            TransformStrategy::Native => self.surface.draw_image(bitmap, placement),
        }
    }

    fn draw_text(&mut self, run: &TextRun, margin: Option<f64>) {
        let attrib = self.state.text;
        let fonts = self.fonts;
        let Some(font) = fonts.get(attrib.font) else {
            warn!("Text note uses unknown font {:?}", attrib.font);
            return;
        };
        let Some(bytes) = self.read(run.text) else {
            return;
        };
        let text = match std::str::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => {
                warn!("Text note holds invalid UTF-8: {}", err);
                return;
            }
        };
        let glyphs = match self.glyphs.outline(font, text) {
            Ok(glyphs) => glyphs,
            Err(err) => {
                warn!("Skipping text note: {}", err);
                return;
            }
        };

        let local = Affine::translate((run.x as f64, run.y as f64))
            * Affine::rotate(run.angle)
            * Affine::new([1.0, 0.0, -attrib.slant, 1.0, 0.0, 0.0])
            * Affine::scale_non_uniform(attrib.h_scale, attrib.v_scale);

        if let Some(margin) = margin {
            let pad = margin * glyphs.height() / 2.0;
            let frame = map_points(
                local,
                &rect_points(
                    -pad,
                    -glyphs.ascent - pad,
                    glyphs.advance + pad,
                    glyphs.descent + pad,
                ),
            );
            self.draw_filled(&frame);
        }

        let contours: Vec<Vec<Point>> = glyphs
            .contours
            .iter()
            .map(|contour| map_points(local, contour))
            .collect();
        if run.outline {
            let pen = LineAttrib {
                width: 1,
                color: attrib.color,
                ..LineAttrib::default()
            };
            for contour in &contours {
                self.draw_path(contour, true, &pen);
            }
        } else {
            self.fill_contours(&contours, attrib.color, FillRule::NonZero);
        }

        if attrib.underline && glyphs.advance > 0.0 {
            let top = glyphs.descent * UNDERLINE_OFFSET;
            let thickness = (glyphs.ascent * UNDERLINE_THICKNESS).max(1.0);
            let bar = map_points(local, &rect_points(0.0, top, glyphs.advance, top + thickness));
            self.fill_path(&bar, attrib.color, FillRule::NonZero);
        }
    }

    fn begin_marker(&mut self, anchor: Point, angle: f64) {
        let anchor = self.to_device(anchor);
        self.markers.push(SavedFrame {
            matrix: self.matrix,
            line: self.state.line.clone(),
            fill: self.state.fill,
        });
        self.matrix = Affine::translate(anchor.to_vec2()) * Affine::rotate(angle);
        self.state.line = self.state.marker.pen();
        self.state.fill = self.state.marker.brush();
        if self.strategy == TransformStrategy::Native {
            self.surface.set_transform(self.matrix);
        }
    }

    fn end_marker(&mut self) {
        let Some(saved) = self.markers.pop() else {
            warn!("End-marker note without a matching begin-marker");
            return;
        };
        self.matrix = saved.matrix;
        self.state.line = saved.line;
        self.state.fill = saved.fill;
        if self.strategy == TransformStrategy::Native {
            self.surface.set_transform(self.matrix);
        }
    }

    fn call(&mut self, func: u32, params: Span) {
        let calls = self.calls;
        let Some(callback) = calls.get(func as usize) else {
            warn!("Call note references unknown function {}", func);
            return;
        };
        if let Some(bytes) = self.read(params) {
            callback(self, bytes);
        }
    }
}

/// Tessellates the arc of `shape`; full sweeps omit the duplicate end point.
fn arc_points(shape: &ArcShape) -> Vec<Point> {
    let sweep = shape.sweep.clamp(-TAU, TAU);
    let steps = ((sweep.abs() / ARC_STEP).ceil() as usize).max(1);
    let count = if shape.is_full() { steps } else { steps + 1 };
    let (cx, cy) = (shape.x as f64, shape.y as f64);
    let (rx, ry) = (shape.rx as f64, shape.ry as f64);

    (0..count)
        .map(|i| {
            let angle = shape.start + sweep * i as f64 / steps as f64;
            let (sin, cos) = angle.sin_cos();
            Point::new(cx + rx * cos, cy + ry * sin)
        })
        .collect()
}

fn map_points(affine: Affine, points: &[Point]) -> Vec<Point> {
    points.iter().map(|&p| affine * p).collect()
}

fn rect_points(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point> {
    vec![
        Point::new(x0, y0),
        Point::new(x1, y0),
        Point::new(x1, y1),
        Point::new(x0, y1),
    ]
}

fn point(x: i32, y: i32) -> Point {
    Point::new(x as f64, y as f64)
}

/// Forwards stroker output to a surface (when present) and registers it.
struct DeviceSink<'s, 'a> {
    surface: Option<&'s mut (dyn Surface + 'a)>,
    color: Color,
    bounds: &'s mut Bounds,
}

impl StrokeSink for DeviceSink<'_, '_> {
    fn fill(&mut self, polygon: &[Point]) {
        for &point in polygon {
            self.bounds.include_point(point);
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.fill_polygon(polygon, self.color, FillRule::NonZero);
        }
    }

    fn hairline(&mut self, from: Point, to: Point) {
        if let Some(surface) = self.surface.as_mut() {
            surface.draw_line(from, to, self.color);
        }
    }

    fn pixels(&mut self, pixels: &[(i32, i32)]) {
        for &(x, y) in pixels {
            self.bounds.include_pixel(x, y);
            if let Some(surface) = self.surface.as_mut() {
                surface.set_pixel(x, y, self.color);
            }
        }
    }

    fn vertex(&mut self, point: Point, padding: i32) {
        self.bounds.include_padded(point, padding);
    }

    fn clip(&self) -> Option<kurbo::Rect> {
        let (width, height) = self.surface.as_ref()?.extent();
        Some(kurbo::Rect::new(0.0, 0.0, width as f64, height as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_arc_has_a_vertex_per_degree() {
        let shape = ArcShape {
            x: 0,
            y: 0,
            rx: 10,
            ry: 10,
            start: 0.0,
            sweep: PI / 2.0,
        };
        let points = arc_points(&shape);
        assert_eq!(points.len(), 91);
        assert!((points[0] - Point::new(10.0, 0.0)).hypot() < 1e-9);
        assert!((points[90] - Point::new(0.0, 10.0)).hypot() < 1e-9);
    }

    #[test]
    fn full_ellipse_does_not_repeat_its_start() {
        let points = arc_points(&ArcShape::full(5, 5, 4, 2));
        assert_eq!(points.len(), 360);
        assert!((points[0] - Point::new(9.0, 5.0)).hypot() < 1e-9);
    }

    #[test]
    fn oversized_sweeps_are_clamped() {
        let shape = ArcShape {
            sweep: 3.0 * TAU,
            ..ArcShape::full(0, 0, 3, 3)
        };
        assert_eq!(arc_points(&shape).len(), 360);
    }
}
