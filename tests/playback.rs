use kurbo::{Affine, Point};
use notebuf::draw::{BLUE, Bitmap, Color, FontId, GREEN, RED};
use notebuf::note::{FillRule, FillStyle, JoinStyle, Note};
use notebuf::playback::PlaybackOptions;
use notebuf::raster::JoinGeometry;
use notebuf::surface::{RasterSurface, TraceOp, TraceSurface};
use notebuf::{Buffer, Rect, Session, TransformParams, TransformStrategy};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_6, SQRT_2};
use std::sync::Arc;

fn record_corner(buffer: &mut Buffer) {
    buffer.set_line_attrib(4, RED, Some(&[6, 3])).unwrap();
    buffer.polyline(&[(0, 0), (10, 0), (10, 10)]).unwrap();
}

fn record_mixed(buffer: &mut Buffer) {
    buffer.set_line_attrib(5, RED, None).unwrap();
    buffer.line(3, 4, 40, 17).unwrap();
    buffer.set_fill_attrib(GREEN, FillStyle::Solid, true).unwrap();
    buffer.polygon(&[(10, 30), (30, 25), (35, 45), (12, 50)]).unwrap();
    buffer.set_line_attrib(1, BLUE, Some(&[3, 2])).unwrap();
    buffer.ellipse(50, 50, 9, 5).unwrap();
    buffer.poly_sector(20, 60, 8, 8, 0.3, 2.0).unwrap();
    buffer.point(60, 5).unwrap();
    buffer.text(5, 70, 0.2, "notes", false).unwrap();
}

fn record_marker_bracket(buffer: &mut Buffer) {
    buffer.set_move(10.0, 0.0);
    buffer.set_line_attrib(3, RED, Some(&[2, 2])).unwrap();
    buffer.set_fill_attrib(GREEN, FillStyle::Solid, false).unwrap();
    buffer.set_marker_attrib(BLUE, 2, false).unwrap();
    buffer.begin_marker(5, 5, FRAC_PI_2).unwrap();
    buffer.line(0, 0, 4, 0).unwrap();
    buffer.end_marker().unwrap();
    buffer.line(0, 0, 4, 0).unwrap();
    buffer.polygon(&[(0, 20), (4, 20), (4, 24)]).unwrap();
}

fn fills(ops: &[TraceOp]) -> Vec<(Color, Vec<Point>)> {
    ops.iter()
        .filter_map(|op| match op {
            TraceOp::FillPolygon { points, color, .. } => Some((*color, points.clone())),
            _ => None,
        })
        .collect()
}

fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
    raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

#[test]
fn scenario_dashed_corner_reports_padded_region() {
    let mut session = Session::default();
    record_corner(session.open_buffer(7, true));

    let mut surface = TraceSurface::new(64, 64, TransformStrategy::Explicit);
    let region = session
        .play(7, &mut surface, &PlaybackOptions::default())
        .unwrap();

    let buffer = session.buffer(7).unwrap();
    assert_eq!(buffer.modified_bound(), Rect::from_min_max(-2, -2, 12, 12));
    assert_eq!(region, Rect::from_min_max(0, 0, 12, 12));

    // Dash spans drawn along the horizontal leg, by x extent
    let mut spans: Vec<(f64, f64)> = surface
        .ops()
        .iter()
        .filter_map(|op| match op {
            TraceOp::FillPolygon { points, .. }
                if points.len() == 4
                    && points.iter().all(|p| (-2.0..=2.0).contains(&p.y))
                    && points.iter().all(|p| p.x <= 10.0) =>
            {
                let min = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
                let max = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
                Some((min, max))
            }
            _ => None,
        })
        .collect();
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));
    assert_eq!(spans, vec![(0.0, 6.0), (9.0, 10.0)]);

    let drawn = |x: i32| {
        let centre = x as f64 + 0.5;
        spans.iter().any(|&(a, b)| centre >= a && centre < b)
    };
    let flips = (1..10).filter(|&x| drawn(x) != drawn(x - 1)).count();
    assert_eq!(flips, 2);
}

#[test]
fn every_touched_pixel_lies_inside_the_modified_region() {
    let mut buffer = Buffer::new(1, true);
    buffer.set_pivot(32.0, 32.0);
    buffer.set_angle(FRAC_PI_6);
    buffer.set_scale(1.25, 0.8);
    record_mixed(&mut buffer);

    let mut surface = RasterSurface::new(96, 96).unwrap();
    let region = buffer
        .play(&mut surface, &PlaybackOptions::default())
        .expect("something was drawn");

    let touched = surface.touched();
    assert!(!touched.is_empty());
    for (x, y) in touched {
        assert!(
            region.contains(x, y),
            "pixel ({x}, {y}) outside region {region:?}"
        );
    }
}

#[test]
fn dash_phase_carries_across_vertices() {
    let mut buffer = Buffer::new(1, true);
    buffer.set_line_attrib(1, RED, Some(&[2, 2])).unwrap();
    buffer.polyline(&[(0, 0), (3, 0), (3, 4)]).unwrap();

    let mut surface = RasterSurface::new(8, 8).unwrap();
    buffer.play(&mut surface, &PlaybackOptions::default());

    // The off phase begun on the first leg swallows the corner pixel.
    assert_eq!(surface.touched(), vec![(0, 0), (1, 0), (3, 1), (3, 2)]);
}

#[test]
fn stepwise_and_matrix_transforms_agree() {
    let params = TransformParams {
        pivot: Point::new(20.0, 20.0),
        offset: kurbo::Vec2::new(5.0, -3.0),
        scale_x: 2.0,
        scale_y: 0.5,
        angle: FRAC_PI_6,
    };
    let matrix = params.matrix();
    for &(x, y) in &[(0.0, 0.0), (20.0, 20.0), (-7.5, 13.0), (100.0, -40.0)] {
        let p = Point::new(x, y);
        assert!((params.apply_stepwise(p) - matrix * p).hypot() < 1e-9);
    }

    // Rotation about the pivot, then the move
    let quarter = TransformParams {
        pivot: Point::new(10.0, 10.0),
        angle: FRAC_PI_2,
        ..TransformParams::default()
    };
    let p = quarter.apply_stepwise(Point::new(20.0, 10.0));
    assert!((p - Point::new(10.0, 20.0)).hypot() < 1e-9);
}

#[test]
fn native_playback_matches_explicit_bound_plus_antialias_margin() {
    let mut buffer = Buffer::new(1, true);
    buffer.set_pivot(20.0, 20.0);
    buffer.set_move(5.0, 0.0);
    buffer.set_scale(2.0, 2.0);
    buffer.set_angle(FRAC_PI_6);
    buffer.set_line_attrib(3, RED, None).unwrap();
    buffer.line(0, 0, 30, 5).unwrap();
    buffer.polygon(&[(5, 5), (25, 8), (15, 30)]).unwrap();

    let mut explicit = TraceSurface::new(200, 200, TransformStrategy::Explicit);
    buffer.play(&mut explicit, &PlaybackOptions::default());
    let mut expected = buffer.modified_bound().expect("explicit bound");
    expected.inflate(1);

    let mut native = TraceSurface::new(200, 200, TransformStrategy::Native);
    buffer.play(&mut native, &PlaybackOptions::default());
    assert_eq!(buffer.modified_bound(), Some(expected));

    let ops = native.ops();
    assert_eq!(ops.first(), Some(&TraceOp::SetTransform(buffer.transform().matrix())));
    assert_eq!(ops.last(), Some(&TraceOp::SetTransform(Affine::IDENTITY)));
    // Native surfaces receive recorded coordinates
    assert!(ops.iter().any(|op| matches!(
        op,
        TraceOp::StrokePath { points, width: 3, .. }
            if points == &vec![Point::new(0.0, 0.0), Point::new(30.0, 5.0)]
    )));
}

#[test]
fn clearing_and_rerecording_reproduces_the_same_pass() {
    let mut session = Session::default();
    record_corner(session.open_buffer(2, true));
    let mut surface = RasterSurface::new(32, 32).unwrap();
    let first = session
        .play(2, &mut surface, &PlaybackOptions::default())
        .unwrap();
    let first_pixels = surface.pixels().to_vec();
    let blocks = session.buffer(2).unwrap().arena().block_count();

    session.clear_buffer(2).unwrap();
    assert!(session.buffer(2).unwrap().arena().is_empty());
    assert_eq!(session.buffer(2).unwrap().modified_region(), None);
    let mut blank = RasterSurface::new(32, 32).unwrap();
    assert_eq!(
        session
            .play(2, &mut blank, &PlaybackOptions::default())
            .unwrap(),
        None
    );
    assert!(blank.touched().is_empty());

    record_corner(session.buffer_mut(2).unwrap());
    surface.clear();
    let second = session
        .play(2, &mut surface, &PlaybackOptions::default())
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(surface.pixels(), first_pixels.as_slice());
    assert_eq!(session.buffer(2).unwrap().arena().block_count(), blocks);
}

#[test]
fn point_lists_drop_points_past_their_capacity() {
    let mut buffer = Buffer::new(1, true);
    buffer.begin_polygon(3).unwrap();
    assert!(buffer.add_point(0, 0).unwrap());
    assert!(buffer.add_point(10, 0).unwrap());
    assert!(buffer.add_point(10, 10).unwrap());
    assert!(!buffer.add_point(0, 10).unwrap());

    let notes: Vec<Note> = buffer.notes().map(Result::unwrap).collect();
    let [Note::Polygon(list)] = notes.as_slice() else {
        panic!("expected one polygon, got {notes:?}");
    };
    assert_eq!(list.count, 3);
    assert_eq!(
        buffer.points(list).unwrap(),
        vec![(0, 0), (10, 0), (10, 10)]
    );
}

#[test]
fn right_angle_miter_lies_on_the_external_bisector() {
    let r = 3.0;
    let join = JoinGeometry::solve(
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Point::new(10.0, 10.0),
        r,
    )
    .expect("corner join");

    let arm = join.miter - join.vertex;
    assert!((arm.hypot() - r * SQRT_2).abs() < 1e-9);
    // External bisector of the corner points away from both segments
    let bisector = kurbo::Vec2::new(1.0, -1.0) / SQRT_2;
    assert!((arm.normalize() - bisector).hypot() < 1e-9);

    // Mirrored corner gives the mirrored miter
    let mirrored = JoinGeometry::solve(
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Point::new(10.0, -10.0),
        r,
    )
    .expect("corner join");
    assert!((mirrored.miter - Point::new(join.miter.x, -join.miter.y)).hypot() < 1e-9);
}

#[test]
fn bevel_joins_skip_the_miter_point() {
    let join = JoinGeometry::solve(
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Point::new(10.0, 10.0),
        2.0,
    )
    .expect("corner join");
    let bevel = join.polygon(JoinStyle::Bevel);
    let miter = join.polygon(JoinStyle::Miter);
    assert_eq!(bevel.len(), 3);
    assert_eq!(miter.len(), 4);
    assert!(!bevel.contains(&Point::new(12.0, -2.0)));
    assert!(miter.contains(&Point::new(12.0, -2.0)));
}

#[test]
fn marker_bracket_rotates_about_its_device_anchor_and_restores_state() {
    let mut buffer = Buffer::new(1, true);
    record_marker_bracket(&mut buffer);

    let mut surface = TraceSurface::new(64, 64, TransformStrategy::Explicit);
    buffer.play(&mut surface, &PlaybackOptions::default());
    let fills = fills(surface.ops());

    // Marker line: rotated a quarter turn about (15, 5), drawn with the marker pen
    assert_eq!(
        fills[0],
        (BLUE, pts(&[(16.0, 5.0), (16.0, 9.0), (14.0, 9.0), (14.0, 5.0)]))
    );

    // Pen and transform restored after the bracket
    let dashes = &fills[1..fills.len() - 1];
    assert!(!dashes.is_empty());
    for (color, quad) in dashes {
        assert_eq!(*color, RED);
        assert!(quad.iter().all(|p| (10.0..=14.0).contains(&p.x) && p.y.abs() <= 2.0));
    }

    // Brush restored too
    assert_eq!(
        fills.last(),
        Some(&(GREEN, pts(&[(10.0, 20.0), (14.0, 20.0), (14.0, 24.0)])))
    );
}

#[test]
fn native_marker_bracket_reissues_the_surface_transform() {
    let mut buffer = Buffer::new(1, true);
    record_marker_bracket(&mut buffer);

    let mut surface = TraceSurface::new(64, 64, TransformStrategy::Native);
    buffer.play(&mut surface, &PlaybackOptions::default());
    let ops = surface.ops();

    let transforms: Vec<Affine> = ops
        .iter()
        .filter_map(|op| match op {
            TraceOp::SetTransform(matrix) => Some(*matrix),
            _ => None,
        })
        .collect();
    let buffer_matrix = buffer.transform().matrix();
    assert_eq!(
        transforms,
        vec![
            buffer_matrix,
            Affine::translate((15.0, 5.0)) * Affine::rotate(FRAC_PI_2),
            buffer_matrix,
            Affine::IDENTITY,
        ]
    );

    let strokes: Vec<(u32, Vec<u32>)> = ops
        .iter()
        .filter_map(|op| match op {
            TraceOp::StrokePath { points, width, dash, .. } => {
                assert_eq!(points, &pts(&[(0.0, 0.0), (4.0, 0.0)]));
                Some((*width, dash.clone()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(strokes, vec![(2, vec![]), (3, vec![2, 2])]);

    assert!(ops.iter().any(|op| matches!(
        op,
        TraceOp::FillPolygon { color, rule: FillRule::EvenOdd, .. } if *color == GREEN
    )));
}

#[test]
fn poly_text_frame_grows_with_its_margin() {
    let bound_for = |margin: f64| {
        let mut buffer = Buffer::new(1, true);
        buffer.set_fill_attrib(GREEN, FillStyle::Solid, false).unwrap();
        buffer.poly_text(10, 30, 0.0, margin, "ab", false).unwrap();
        let mut surface = TraceSurface::new(100, 100, TransformStrategy::Explicit);
        buffer.play(&mut surface, &PlaybackOptions::default());

        // The frame is filled with the brush before the glyphs
        let frame = fills(surface.ops());
        assert_eq!(frame.len(), 1);
        assert_eq!(frame[0].0, GREEN);
        assert!(matches!(
            surface.ops().last(),
            Some(TraceOp::FillContours { .. })
        ));
        buffer.modified_bound()
    };

    // Box glyphs at 16px: advance 9.6 per character, ascent 12.8, descent 3.2
    assert_eq!(bound_for(0.0), Rect::from_min_max(10, 17, 30, 34));
    // margin 1 pads by half the 16px line height on every side
    assert_eq!(bound_for(1.0), Rect::from_min_max(2, 9, 38, 42));
}

#[test]
fn images_are_centred_on_their_anchor_and_scaled() {
    let bitmap = Arc::new(Bitmap::solid(4, 2, RED.to_argb32()).unwrap());
    let local = Affine::translate((20.0, 10.0)) * Affine::scale(2.0) * Affine::translate((-2.0, -1.0));

    let mut buffer = Buffer::new(1, true);
    buffer.image(bitmap.clone(), 20, 10, 2.0).unwrap();
    let mut surface = RasterSurface::new(40, 40).unwrap();
    let region = buffer
        .play(&mut surface, &PlaybackOptions::default())
        .expect("image drawn");
    assert_eq!(region, Rect::new(16, 8, 8, 4).unwrap());
    let touched = surface.touched();
    assert_eq!(touched.len(), 32);
    assert!(touched.iter().all(|&(x, y)| region.contains(x, y)));

    // Corners are registered through the buffer transform
    let mut moved = Buffer::new(2, true);
    moved.set_move(5.0, 5.0);
    moved.image(bitmap, 20, 10, 2.0).unwrap();

    let mut explicit = TraceSurface::new(40, 40, TransformStrategy::Explicit);
    moved.play(&mut explicit, &PlaybackOptions::default());
    assert_eq!(moved.modified_bound(), Rect::from_min_max(21, 13, 29, 17));
    assert_eq!(
        explicit.ops(),
        &[TraceOp::Image {
            width: 4,
            height: 2,
            placement: moved.transform().matrix() * local,
        }]
    );

    let mut native = TraceSurface::new(40, 40, TransformStrategy::Native);
    moved.play(&mut native, &PlaybackOptions::default());
    assert_eq!(moved.modified_bound(), Rect::from_min_max(20, 12, 30, 18));
    assert!(native.ops().contains(&TraceOp::Image {
        width: 4,
        height: 2,
        placement: local,
    }));
}

#[test]
fn underline_bar_sits_below_the_baseline() {
    let bound_for = |underline: bool| {
        let mut buffer = Buffer::new(1, true);
        buffer
            .set_text_attrib(FontId(0), BLUE, 0.0, 1.0, 1.0, underline)
            .unwrap();
        buffer.text(10, 30, 0.0, "ab", false).unwrap();
        let mut surface = TraceSurface::new(100, 100, TransformStrategy::Explicit);
        buffer.play(&mut surface, &PlaybackOptions::default());
        (buffer.modified_bound(), fills(surface.ops()))
    };

    let (plain, bars) = bound_for(false);
    assert!(bars.is_empty());
    assert_eq!(plain, Rect::from_min_max(11, 18, 28, 30));

    let (underlined, bars) = bound_for(true);
    assert_eq!(bars.len(), 1);
    let (color, bar) = &bars[0];
    assert_eq!(*color, BLUE);
    assert_eq!(bar.len(), 4);
    assert!(bar.iter().all(|p| p.y > 30.0 && p.y < 32.0));
    assert!(bar.iter().all(|p| p.x >= 10.0 && p.x < 29.3));
    assert_eq!(underlined, Rect::from_min_max(10, 18, 30, 32));
}

#[test]
fn far_away_geometry_saturates_the_region_instead_of_overflowing() {
    let mut scaled = Buffer::new(1, true);
    scaled.set_scale(1e10, 1e10);
    scaled.point(1, 1).unwrap();
    let mut surface = RasterSurface::new(16, 16).unwrap();
    assert_eq!(scaled.play(&mut surface, &PlaybackOptions::default()), None);
    assert!(surface.touched().is_empty());

    let mut corner = Buffer::new(2, true);
    corner.point(i32::MAX, 0).unwrap();
    assert_eq!(corner.play(&mut surface, &PlaybackOptions::default()), None);

    let mut long = Buffer::new(3, true);
    long.set_line_attrib(4, RED, None).unwrap();
    long.line(0, 0, i32::MAX, 0).unwrap();
    let mut surface = RasterSurface::new(64, 64).unwrap();
    let region = long
        .play(&mut surface, &PlaybackOptions::default())
        .expect("line crosses the surface");
    assert_eq!(region, Rect::new(0, 0, 64, 2).unwrap());
    let touched = surface.touched();
    assert_eq!(touched.len(), 128);
    assert!(touched.iter().all(|&(x, y)| region.contains(x, y)));
}

#[test]
fn long_offscreen_dashes_emit_only_visible_slices() {
    let mut buffer = Buffer::new(1, true);
    buffer.set_line_attrib(4, RED, Some(&[6, 3])).unwrap();
    buffer.line(-20_000_000, 5, 20_000_000, 5).unwrap();

    let mut surface = TraceSurface::new(64, 64, TransformStrategy::Explicit);
    let region = buffer.play(&mut surface, &PlaybackOptions::default());
    assert_eq!(region, Rect::new(0, 3, 64, 4));

    let slices = fills(surface.ops());
    assert!(!slices.is_empty());
    assert!(slices.len() < 20, "{} slices", slices.len());
}
