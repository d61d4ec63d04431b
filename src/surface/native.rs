//! Cairo image surface with a native transform.

use super::{Surface, SurfaceError};
use crate::draw::{Bitmap, Color};
use crate::note::{FillRule, JoinStyle, LineAttrib};
use crate::transform::TransformStrategy;
use kurbo::{Affine, Point};
use std::path::Path;

fn to_cairo_matrix(matrix: Affine) -> cairo::Matrix {
    let [a, b, c, d, e, f] = matrix.as_coeffs();
    cairo::Matrix::new(a, b, c, d, e, f)
}

fn to_cairo_rule(rule: FillRule) -> cairo::FillRule {
    match rule {
        FillRule::EvenOdd => cairo::FillRule::EvenOdd,
        FillRule::NonZero => cairo::FillRule::Winding,
    }
}

/// ARGB32 image surface drawn through cairo.
///
/// The matrix installed with [`Surface::set_transform`] becomes the cairo
/// CTM. Paths are built under it, but pens are always stroked in device
/// pixels, and [`Surface::set_pixel`] always addresses device pixels.
pub struct CairoSurface {
    surface: cairo::ImageSurface,
    ctx: cairo::Context,
}

impl CairoSurface {
    pub fn new(width: i32, height: i32) -> Result<Self, SurfaceError> {
        if width <= 0 || height <= 0 {
            return Err(SurfaceError::InvalidSize { width, height });
        }
        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, width, height)
            .map_err(|err| SurfaceError::Cairo(err.to_string()))?;
        let ctx =
            cairo::Context::new(&surface).map_err(|err| SurfaceError::Cairo(err.to_string()))?;
        // Whole-pixel coverage keeps the output inside the modified region
        ctx.set_antialias(cairo::Antialias::None);
        Ok(Self { surface, ctx })
    }

    /// Paints the whole surface with `color`, ignoring the transform.
    pub fn fill_background(&mut self, color: Color) {
        self.ctx.save().ok();
        self.ctx.identity_matrix();
        self.ctx.set_source_rgba(color.r, color.g, color.b, color.a);
        self.ctx.set_operator(cairo::Operator::Source);
        let _ = self.ctx.paint();
        self.ctx.restore().ok();
    }

    pub fn write_png(&self, path: &Path) -> Result<(), SurfaceError> {
        self.surface.flush();
        let mut file = std::fs::File::create(path).map_err(|source| SurfaceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.surface
            .write_to_png(&mut file)
            .map_err(|err| SurfaceError::Cairo(err.to_string()))
    }

    fn set_source(&self, color: Color) {
        self.ctx.set_source_rgba(color.r, color.g, color.b, color.a);
    }

    fn trace_path(&self, points: &[Point], closed: bool) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.ctx.move_to(first.x, first.y);
        for point in rest {
            self.ctx.line_to(point.x, point.y);
        }
        if closed {
            self.ctx.close_path();
        }
    }

    /// Strokes the current path in device pixels and clears it.
    fn stroke_device(&self, width: f64, dash: &[u32], join: JoinStyle, cap: cairo::LineCap) {
        self.ctx.save().ok();
        self.ctx.identity_matrix();
        self.ctx.set_line_width(width);
        let dashes: Vec<f64> = dash.iter().map(|&d| d as f64).collect();
        self.ctx.set_dash(&dashes, 0.0);
        self.ctx.set_line_join(match join {
            JoinStyle::Miter => cairo::LineJoin::Miter,
            JoinStyle::Bevel => cairo::LineJoin::Bevel,
        });
        self.ctx.set_line_cap(cap);
        let _ = self.ctx.stroke();
        self.ctx.restore().ok();
    }
}

impl Surface for CairoSurface {
    fn extent(&self) -> (i32, i32) {
        (self.surface.width(), self.surface.height())
    }

    fn strategy(&self) -> TransformStrategy {
        TransformStrategy::Native
    }

    fn set_transform(&mut self, matrix: Affine) {
        self.ctx.set_matrix(to_cairo_matrix(matrix));
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.ctx.save().ok();
        self.ctx.identity_matrix();
        self.set_source(color);
        self.ctx.rectangle(x as f64, y as f64, 1.0, 1.0);
        let _ = self.ctx.fill();
        self.ctx.restore().ok();
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Color) {
        self.set_source(color);
        self.trace_path(&[from, to], false);
        self.stroke_device(1.0, &[], JoinStyle::Miter, cairo::LineCap::Square);
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color, rule: FillRule) {
        if points.len() < 3 {
            return;
        }
        self.set_source(color);
        self.ctx.set_fill_rule(to_cairo_rule(rule));
        self.trace_path(points, true);
        let _ = self.ctx.fill();
    }

    fn fill_contours(&mut self, contours: &[Vec<Point>], color: Color, rule: FillRule) {
        self.set_source(color);
        self.ctx.set_fill_rule(to_cairo_rule(rule));
        for contour in contours.iter().filter(|c| c.len() >= 3) {
            self.trace_path(contour, true);
        }
        let _ = self.ctx.fill();
    }

    fn stroke_path(&mut self, points: &[Point], closed: bool, pen: &LineAttrib) {
        if points.len() < 2 {
            return;
        }
        self.set_source(pen.color);
        self.trace_path(points, closed);
        self.stroke_device(
            pen.width.max(1) as f64,
            &pen.dash,
            pen.join,
            cairo::LineCap::Butt,
        );
    }

    fn draw_image(&mut self, bitmap: &Bitmap, placement: Affine) {
        let data: Vec<u8> = bitmap
            .pixels
            .iter()
            .flat_map(|pixel| pixel.to_ne_bytes())
            .collect();
        let Ok(image) = cairo::ImageSurface::create_for_data(
            data,
            cairo::Format::ARgb32,
            bitmap.width as i32,
            bitmap.height as i32,
            bitmap.width as i32 * 4,
        ) else {
            log::warn!(
                "Failed to wrap {}x{} bitmap for cairo",
                bitmap.width,
                bitmap.height
            );
            return;
        };

        self.ctx.save().ok();
        self.ctx.transform(to_cairo_matrix(placement));
        if self.ctx.set_source_surface(&image, 0.0, 0.0).is_ok() {
            self.ctx.source().set_filter(cairo::Filter::Nearest);
            let _ = self.ctx.paint();
        }
        self.ctx.restore().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_surfaces() {
        assert!(matches!(
            CairoSurface::new(3, 0),
            Err(SurfaceError::InvalidSize { .. })
        ));
    }

    #[test]
    fn keeps_the_installed_transform() {
        let mut surface = CairoSurface::new(8, 8).unwrap();
        surface.set_transform(Affine::translate((2.0, 3.0)));
        assert_eq!(surface.strategy(), TransformStrategy::Native);
        assert_eq!(surface.extent(), (8, 8));
        let matrix = surface.ctx.matrix();
        assert_eq!((matrix.x0(), matrix.y0()), (2.0, 3.0));
    }

    #[test]
    fn writes_png() {
        let mut surface = CairoSurface::new(4, 4).unwrap();
        surface.set_pixel(1, 1, crate::draw::RED);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        surface.write_png(&path).unwrap();
        assert!(path.exists());
    }
}
