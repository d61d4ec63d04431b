//! Path state machine for styled lines in device space.
//!
//! [`Stroker`] turns `move_to` / `line_to` / `close` calls into pixel-level
//! primitives pushed into a [`StrokeSink`]:
//!
//! - thin pens (width 0 or 1) become hairlines, or runs of pixels when dashed;
//! - wide solid pens become one quad per segment;
//! - wide dashed pens walk both long edges of the segment quad with a
//!   [`LineDda`](super::dda::LineDda) in lock-step and emit one quad slice per drawn dash;
//! - a miter or bevel join is filled at every vertex reached while the pen
//!   is drawing, including the first vertex when the path closes.
//!
//! All points are rounded to whole device pixels on entry. Dashed walks are
//! limited to the sink's clip, with the dash phase carried through the
//! parts left out.

use super::dash::{DashCursor, DashPattern};
use super::dda::{LineDda, visible_steps};
use super::join::JoinGeometry;
use crate::note::{JoinStyle, LineAttrib};
use kurbo::{Point, Vec2};

/// Receiver of the primitives produced by a [`Stroker`].
pub trait StrokeSink {
    /// Fills a quad slice or join polygon with the pen color.
    fn fill(&mut self, polygon: &[Point]);

    /// Draws a one-pixel line, both endpoints included.
    fn hairline(&mut self, from: Point, to: Point);

    /// Sets individual pixels (dashed hairlines).
    fn pixels(&mut self, pixels: &[(i32, i32)]);

    /// Grows the modified region around a path vertex.
    fn vertex(&mut self, point: Point, padding: i32);

    /// Device area worth sampling; `None` samples everything.
    fn clip(&self) -> Option<kurbo::Rect> {
        None
    }
}

/// Padding applied around stroked vertices: half the pen width, at least one.
pub fn stroke_padding(width: u32) -> i32 {
    let padding = (width as f64 / 2.0).ceil() as i32;
    padding.max(1)
}

/// Styled-line path builder.
#[derive(Debug, Clone)]
pub struct Stroker {
    width: u32,
    join: JoinStyle,
    dash: Option<DashPattern>,
    cursor: DashCursor,
    started: bool,
    start: Point,
    close_to: Point,
    a: Point,
    b: Point,
    first_end: Option<Point>,
    join_pending: bool,
}

impl Stroker {
    pub fn new(pen: &LineAttrib) -> Self {
        Self::with_style(pen.width, pen.join, DashPattern::new(&pen.dash))
    }

    pub fn with_style(width: u32, join: JoinStyle, dash: Option<DashPattern>) -> Self {
        Self {
            width,
            join,
            dash,
            cursor: DashCursor::new(),
            started: false,
            start: Point::ORIGIN,
            close_to: Point::ORIGIN,
            a: Point::ORIGIN,
            b: Point::ORIGIN,
            first_end: None,
            join_pending: false,
        }
    }

    /// Current dash cursor.
    pub fn cursor(&self) -> DashCursor {
        self.cursor
    }

    fn is_thin(&self) -> bool {
        self.width <= 1
    }

    fn half_width(&self) -> f64 {
        self.width as f64 / 2.0
    }

    /// Starts a new sub-path and resets the dash phase.
    pub fn move_to(&mut self, point: Point, sink: &mut dyn StrokeSink) {
        let point = point.round();
        sink.vertex(point, stroke_padding(self.width));

        self.started = true;
        self.start = point;
        self.close_to = point;
        self.a = point;
        self.b = point;
        self.first_end = None;
        self.join_pending = false;
        self.cursor.reset();
    }

    /// Draws a segment from the current point. Zero-length segments are
    /// ignored; returns whether anything was drawn.
    pub fn line_to(&mut self, point: Point, sink: &mut dyn StrokeSink) -> bool {
        if !self.started {
            self.move_to(point, sink);
            return false;
        }
        let point = point.round();
        if point == self.start {
            return false;
        }
        sink.vertex(point, stroke_padding(self.width));

        if self.is_thin() {
            match self.dash.clone() {
                None => sink.hairline(self.start, point),
                Some(pattern) => self.dashed_hairline(point, &pattern, sink),
            }
            self.start = point;
            return true;
        }

        let boundary = match self.dash.clone() {
            None => {
                self.solid_quad(point, sink);
                false
            }
            Some(pattern) => self.dashed_quads(point, &pattern, sink),
        };

        self.a = self.b;
        self.b = self.start;
        self.start = point;

        if self.first_end.is_none() {
            self.first_end = Some(point);
        }

        if self.join_pending {
            self.fill_join(self.a, self.b, self.start, sink);
        }
        self.join_pending = self.cursor.drawing && !boundary;
        true
    }

    /// Closes the sub-path back to its first point, joining at both ends.
    pub fn close(&mut self, sink: &mut dyn StrokeSink) {
        if !self.started || self.start == self.close_to {
            return;
        }
        let last = self.start;
        let first = self.close_to;

        if !self.line_to(first, sink) || self.is_thin() || !self.cursor.drawing {
            return;
        }
        if let Some(first_end) = self.first_end {
            self.fill_join(last, first, first_end, sink);
        }
    }

    /// Strokes a whole point list.
    pub fn stroke_points(&mut self, points: &[Point], closed: bool, sink: &mut dyn StrokeSink) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.move_to(*first, sink);
        for point in rest {
            self.line_to(*point, sink);
        }
        if closed {
            self.close(sink);
        }
    }

    fn fill_join(&self, a: Point, b: Point, c: Point, sink: &mut dyn StrokeSink) {
        if let Some(join) = JoinGeometry::solve(a, b, c, self.half_width()) {
            sink.fill(&join.polygon(self.join));
        }
    }

    /// Offset from the centre line to the left long edge of a segment.
    fn edge_offset(&self, to: Point) -> Vec2 {
        let d = to - self.start;
        let factor = self.half_width() / d.hypot();
        Vec2::new(d.y * factor, -d.x * factor)
    }

    fn solid_quad(&self, to: Point, sink: &mut dyn StrokeSink) {
        let offset = self.edge_offset(to);
        sink.fill(&[
            (self.start + offset).round(),
            (to + offset).round(),
            (to - offset).round(),
            (self.start - offset).round(),
        ]);
    }

    fn dashed_quads(&mut self, to: Point, pattern: &DashPattern, sink: &mut dyn StrokeSink) -> bool {
        let offset = self.edge_offset(to);
        let left = Edge::new(pixel(self.start + offset), pixel(to + offset));
        let right = Edge::new(pixel(self.start - offset), pixel(to - offset));

        // Both edges share the shorter step count; the last sample of each
        // is its true end point.
        let steps = left.dda.steps().min(right.dda.steps());
        let margin = self.half_width() + 1.0;
        let visible = match sink.clip() {
            Some(clip) => visible_steps(self.start, to, steps, clip.inflate(margin, margin)),
            None => Some((0, steps)),
        };

        let (cursor, boundary) = self.cursor.advance_within(pattern, steps, visible, |i, j| {
            sink.fill(&[
                left.at(i, steps),
                left.at(j, steps),
                right.at(j, steps),
                right.at(i, steps),
            ]);
        });
        self.cursor = cursor;
        boundary
    }

    fn dashed_hairline(&mut self, to: Point, pattern: &DashPattern, sink: &mut dyn StrokeSink) {
        let dda = LineDda::new(pixel(self.start), pixel(to));
        let steps = dda.steps();
        let visible = match sink.clip() {
            Some(clip) => visible_steps(self.start, to, steps, clip),
            None => Some((0, steps)),
        };
        let (cursor, _) = self.cursor.advance_within(pattern, steps, visible, |i, j| {
            let run: Vec<(i32, i32)> = (i..j).map(|k| dda.sample(k)).collect();
            sink.pixels(&run);
        });
        self.cursor = cursor;
    }
}

/// One long edge of a dashed segment, cut to the shared step count.
struct Edge {
    dda: LineDda,
    end: (i32, i32),
}

impl Edge {
    fn new(from: (i32, i32), to: (i32, i32)) -> Self {
        Self {
            dda: LineDda::new(from, to),
            end: to,
        }
    }

    fn at(&self, i: usize, steps: usize) -> Point {
        if i >= steps {
            point(self.end)
        } else {
            point(self.dda.sample(i))
        }
    }
}

fn pixel(point: Point) -> (i32, i32) {
    (point.x.round() as i32, point.y.round() as i32)
}

fn point(pixel: (i32, i32)) -> Point {
    Point::new(pixel.0 as f64, pixel.1 as f64)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Records everything a stroker emits.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSink {
        pub fills: Vec<Vec<Point>>,
        pub hairlines: Vec<(Point, Point)>,
        pub pixels: Vec<(i32, i32)>,
        pub vertices: Vec<(Point, i32)>,
        pub clip: Option<kurbo::Rect>,
    }

    impl StrokeSink for RecordingSink {
        fn fill(&mut self, polygon: &[Point]) {
            self.fills.push(polygon.to_vec());
        }

        fn hairline(&mut self, from: Point, to: Point) {
            self.hairlines.push((from, to));
        }

        fn pixels(&mut self, pixels: &[(i32, i32)]) {
            self.pixels.extend_from_slice(pixels);
        }

        fn vertex(&mut self, point: Point, padding: i32) {
            self.vertices.push((point, padding));
        }

        fn clip(&self) -> Option<kurbo::Rect> {
            self.clip
        }
    }

    fn pen(width: u32, dash: &[u32]) -> LineAttrib {
        LineAttrib {
            width,
            dash: dash.to_vec(),
            ..LineAttrib::default()
        }
    }

    fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn padding_is_half_width_rounded_up() {
        assert_eq!(stroke_padding(0), 1);
        assert_eq!(stroke_padding(1), 1);
        assert_eq!(stroke_padding(3), 2);
        assert_eq!(stroke_padding(4), 2);
    }

    #[test]
    fn solid_wide_polyline_emits_quads_and_a_join() {
        let mut sink = RecordingSink::default();
        let mut stroker = Stroker::new(&pen(4, &[]));
        stroker.stroke_points(
            &pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]),
            false,
            &mut sink,
        );

        assert_eq!(sink.fills.len(), 3);
        assert_eq!(
            sink.fills[0],
            pts(&[(0.0, -2.0), (10.0, -2.0), (10.0, 2.0), (0.0, 2.0)])
        );
        assert_eq!(
            sink.fills[2],
            pts(&[(10.0, 0.0), (10.0, -2.0), (12.0, -2.0), (12.0, 0.0)])
        );
    }

    #[test]
    fn dashed_polyline_continues_the_pattern_around_the_corner() {
        let mut sink = RecordingSink::default();
        let mut stroker = Stroker::new(&pen(4, &[6, 3]));
        stroker.stroke_points(
            &pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]),
            false,
            &mut sink,
        );

        let quads: Vec<_> = sink.fills.iter().filter(|f| f.len() == 4).collect();
        // Horizontal leg: [0,6] and [9,10]; vertical leg: [0,5] and [8,10];
        // plus the miter join at (10, 0).
        assert_eq!(quads.len(), 5);
        assert_eq!(quads[0][0], Point::new(0.0, -2.0));
        assert_eq!(quads[0][1], Point::new(6.0, -2.0));
        assert_eq!(quads[1][0], Point::new(9.0, -2.0));
        assert_eq!(quads[1][1], Point::new(10.0, -2.0));
        assert_eq!(quads[2][0], Point::new(12.0, 0.0));
        assert_eq!(quads[2][1], Point::new(12.0, 5.0));
        assert_eq!(quads[3][0], Point::new(12.0, 8.0));
        assert_eq!(quads[3][1], Point::new(12.0, 10.0));
        assert_eq!(quads[4][0], Point::new(10.0, 0.0));
        assert_eq!(quads[4][2], Point::new(12.0, -2.0));
        assert_eq!(stroker.cursor().remaining, 4);
    }

    #[test]
    fn move_to_resets_the_dash_phase() {
        let mut sink = RecordingSink::default();
        let mut stroker = Stroker::new(&pen(4, &[6, 3]));
        stroker.move_to(Point::new(0.0, 0.0), &mut sink);
        stroker.line_to(Point::new(7.0, 0.0), &mut sink);
        assert!(!stroker.cursor().drawing);

        stroker.move_to(Point::new(0.0, 20.0), &mut sink);
        assert_eq!(stroker.cursor(), DashCursor::new());
    }

    #[test]
    fn zero_length_segments_draw_nothing() {
        let mut sink = RecordingSink::default();
        let mut stroker = Stroker::new(&pen(6, &[]));
        stroker.move_to(Point::new(3.0, 3.0), &mut sink);
        assert!(!stroker.line_to(Point::new(3.2, 2.9), &mut sink));
        assert!(sink.fills.is_empty());
    }

    #[test]
    fn thin_pens_draw_hairlines_without_joins() {
        let mut sink = RecordingSink::default();
        let mut stroker = Stroker::new(&pen(1, &[]));
        stroker.stroke_points(
            &pts(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)]),
            true,
            &mut sink,
        );
        assert_eq!(sink.hairlines.len(), 3);
        assert!(sink.fills.is_empty());
    }

    #[test]
    fn thin_dashed_pen_sets_pixels_in_drawing_phases() {
        let mut sink = RecordingSink::default();
        let mut stroker = Stroker::new(&pen(0, &[2, 2]));
        stroker.stroke_points(&pts(&[(0.0, 0.0), (8.0, 0.0)]), false, &mut sink);
        assert_eq!(sink.pixels, vec![(0, 0), (1, 0), (4, 0), (5, 0)]);
    }

    #[test]
    fn closing_joins_at_the_first_vertex() {
        let mut sink = RecordingSink::default();
        let mut stroker = Stroker::new(&pen(4, &[]));
        stroker.stroke_points(
            &pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]),
            true,
            &mut sink,
        );
        let vertices = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let joins: Vec<_> = sink
            .fills
            .iter()
            .filter(|fill| vertices.contains(&fill[0]))
            .collect();
        assert_eq!(sink.fills.len(), 8);
        assert_eq!(joins.len(), 4);

        let first_vertex = joins
            .iter()
            .find(|fill| fill[0] == Point::new(0.0, 0.0))
            .expect("join at the first vertex");
        assert!(first_vertex.contains(&Point::new(-2.0, -2.0)));
    }

    #[test]
    fn far_dashes_are_clipped_without_losing_the_phase() {
        let clip = kurbo::Rect::new(0.0, 0.0, 64.0, 64.0);
        let mut clipped = RecordingSink {
            clip: Some(clip),
            ..RecordingSink::default()
        };
        let mut stroker = Stroker::new(&pen(4, &[6, 3]));
        stroker.stroke_points(
            &pts(&[(-18_000_000.0, 5.0), (20_000_000.0, 5.0)]),
            false,
            &mut clipped,
        );
        assert!(clipped.fills.len() < 20, "{} fills", clipped.fills.len());
        assert!(clipped.fills.iter().any(|quad| quad.iter().all(|p| p.x >= 0.0 && p.x <= 64.0)));

        // Both walks start a whole number of periods left of the origin, so
        // the dashes near it must coincide.
        let mut reference = RecordingSink::default();
        let mut short = Stroker::new(&pen(4, &[6, 3]));
        short.stroke_points(&pts(&[(-999.0, 5.0), (999.0, 5.0)]), false, &mut reference);
        let near = |fills: &[Vec<Point>]| -> Vec<Vec<Point>> {
            fills
                .iter()
                .filter(|quad| quad.iter().all(|p| (-2.0..=60.0).contains(&p.x)))
                .cloned()
                .collect()
        };
        assert!(!near(&reference.fills).is_empty());
        assert_eq!(near(&clipped.fills), near(&reference.fills));
    }

    #[test]
    fn offscreen_dashed_hairline_sets_no_pixels() {
        let mut sink = RecordingSink {
            clip: Some(kurbo::Rect::new(0.0, 0.0, 16.0, 16.0)),
            ..RecordingSink::default()
        };
        let mut stroker = Stroker::new(&pen(1, &[2, 2]));
        stroker.stroke_points(&pts(&[(0.0, -40.0), (5_000_000.0, -40.0)]), false, &mut sink);
        assert!(sink.pixels.is_empty());
        assert_eq!(stroker.cursor().remaining, 0);
        assert!(stroker.cursor().drawing);
    }
}
