//! Software ARGB32 surface without a transform (explicit strategy).

use super::{Surface, SurfaceError};
use crate::draw::color::blend_over;
use crate::draw::{Bitmap, Color, TRANSPARENT};
use crate::note::{FillRule, LineAttrib};
use crate::raster::dda::{LineDda, visible_steps};
use crate::raster::{StrokeSink, Stroker};
use crate::transform::TransformStrategy;
use kurbo::{Affine, Point};
use std::io::Write;
use std::path::Path;

/// In-memory pixel buffer.
///
/// Polygons are filled by scanline conversion sampling pixel centres;
/// hairlines use the same digital line as the dashed rasterizer.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    width: i32,
    height: i32,
    background: u32,
    pixels: Vec<u32>,
}

impl RasterSurface {
    /// Creates a transparent surface.
    pub fn new(width: i32, height: i32) -> Result<Self, SurfaceError> {
        Self::with_background(width, height, TRANSPARENT)
    }

    /// Creates a surface filled with `background`.
    pub fn with_background(width: i32, height: i32, background: Color) -> Result<Self, SurfaceError> {
        if width <= 0 || height <= 0 {
            return Err(SurfaceError::InvalidSize { width, height });
        }
        let background = background.to_argb32();
        Ok(Self {
            width,
            height,
            background,
            pixels: vec![background; width as usize * height as usize],
        })
    }

    /// Restores every pixel to the background.
    pub fn clear(&mut self) {
        self.pixels.fill(self.background);
    }

    /// Returns the ARGB32 pixel at `(x, y)`.
    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Device pixels that no longer hold the background value.
    pub fn touched(&self) -> Vec<(i32, i32)> {
        let mut touched = Vec::new();
        for (i, &pixel) in self.pixels.iter().enumerate() {
            if pixel != self.background {
                let i = i as i32;
                touched.push((i % self.width, i / self.width));
            }
        }
        touched
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            None
        } else {
            Some(y as usize * self.width as usize + x as usize)
        }
    }

    fn clip(&self) -> kurbo::Rect {
        kurbo::Rect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }

    fn blend(&mut self, x: i32, y: i32, argb: u32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = blend_over(argb, self.pixels[i]);
        }
    }

    /// Scanline fill of every contour at once.
    fn fill_edges(&mut self, contours: &[&[Point]], argb: u32, rule: FillRule) {
        let mut edges = Vec::new();
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for contour in contours {
            if contour.len() < 3 {
                continue;
            }
            for (i, &a) in contour.iter().enumerate() {
                let b = contour[(i + 1) % contour.len()];
                if !a.is_finite() || !b.is_finite() || a.y == b.y {
                    continue;
                }
                min_y = min_y.min(a.y.min(b.y));
                max_y = max_y.max(a.y.max(b.y));
                edges.push((a, b));
            }
        }
        if edges.is_empty() {
            return;
        }

        let first_row = (min_y.floor() as i32).max(0);
        let last_row = (max_y.ceil() as i32).min(self.height);
        let mut crossings: Vec<(f64, i32)> = Vec::new();

        for y in first_row..last_row {
            let yc = y as f64 + 0.5;
            crossings.clear();
            for &(a, b) in &edges {
                let (top, bottom, winding) = if a.y < b.y { (a, b, 1) } else { (b, a, -1) };
                if top.y <= yc && bottom.y > yc {
                    let x = top.x + (yc - top.y) * (bottom.x - top.x) / (bottom.y - top.y);
                    crossings.push((x, winding));
                }
            }
            crossings.sort_by(|l, r| l.0.total_cmp(&r.0));

            let mut winding = 0;
            let mut span_start = 0.0;
            for (i, &(x, dir)) in crossings.iter().enumerate() {
                let inside_before = match rule {
                    FillRule::EvenOdd => i % 2 == 1,
                    FillRule::NonZero => winding != 0,
                };
                winding += dir;
                let inside_after = match rule {
                    FillRule::EvenOdd => i % 2 == 0,
                    FillRule::NonZero => winding != 0,
                };
                if !inside_before && inside_after {
                    span_start = x;
                } else if inside_before && !inside_after {
                    self.fill_span(y, span_start, x, argb);
                }
            }
        }
    }

    /// Paints the pixels of row `y` whose centres lie in `[left, right)`.
    fn fill_span(&mut self, y: i32, left: f64, right: f64, argb: u32) {
        let start = ((left - 0.5).ceil() as i32).max(0);
        let end = ((right - 0.5).ceil() as i32).min(self.width);
        for x in start..end {
            self.blend(x, y, argb);
        }
    }

    /// Writes the surface as a binary PPM (premultiplied channels).
    pub fn write_ppm(&self, path: &Path) -> Result<(), SurfaceError> {
        let io_err = |source| SurfaceError::Io {
            path: path.display().to_string(),
            source,
        };
        let mut out = Vec::with_capacity(self.pixels.len() * 3 + 32);
        write!(out, "P6\n{} {}\n255\n", self.width, self.height).map_err(io_err)?;
        for &pixel in &self.pixels {
            out.push((pixel >> 16) as u8);
            out.push((pixel >> 8) as u8);
            out.push(pixel as u8);
        }
        std::fs::write(path, out).map_err(io_err)
    }

    /// Writes the surface as a PNG.
    #[cfg(feature = "cairo")]
    pub fn write_png(&self, path: &Path) -> Result<(), SurfaceError> {
        let data: Vec<u8> = self
            .pixels
            .iter()
            .flat_map(|pixel| pixel.to_ne_bytes())
            .collect();
        let surface = cairo::ImageSurface::create_for_data(
            data,
            cairo::Format::ARgb32,
            self.width,
            self.height,
            self.width * 4,
        )
        .map_err(|err| SurfaceError::Cairo(err.to_string()))?;

        let mut file = std::fs::File::create(path).map_err(|source| SurfaceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        surface
            .write_to_png(&mut file)
            .map_err(|err| SurfaceError::Cairo(err.to_string()))
    }
}

impl Surface for RasterSurface {
    fn extent(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn strategy(&self) -> TransformStrategy {
        TransformStrategy::Explicit
    }

    fn set_transform(&mut self, _matrix: Affine) {}

    fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.blend(x, y, color.to_argb32());
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Color) {
        let argb = color.to_argb32();
        let dda = LineDda::new(
            (from.x.round() as i32, from.y.round() as i32),
            (to.x.round() as i32, to.y.round() as i32),
        );
        let Some((lo, hi)) = visible_steps(from.round(), to.round(), dda.steps(), self.clip()) else {
            return;
        };
        for i in lo..=hi {
            let (x, y) = dda.sample(i);
            self.blend(x, y, argb);
        }
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color, rule: FillRule) {
        self.fill_edges(&[points], color.to_argb32(), rule);
    }

    fn fill_contours(&mut self, contours: &[Vec<Point>], color: Color, rule: FillRule) {
        let contours: Vec<&[Point]> = contours.iter().map(Vec::as_slice).collect();
        self.fill_edges(&contours, color.to_argb32(), rule);
    }

    fn stroke_path(&mut self, points: &[Point], closed: bool, pen: &LineAttrib) {
        let mut sink = PaintSink {
            surface: self,
            color: pen.color,
        };
        Stroker::new(pen).stroke_points(points, closed, &mut sink);
    }

    fn draw_image(&mut self, bitmap: &Bitmap, placement: Affine) {
        if placement.determinant().abs() < 1e-12 {
            return;
        }
        let (w, h) = (bitmap.width as f64, bitmap.height as f64);
        let corners = [
            placement * Point::new(0.0, 0.0),
            placement * Point::new(w, 0.0),
            placement * Point::new(w, h),
            placement * Point::new(0.0, h),
        ];
        let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        let inverse = placement.inverse();
        let x0 = (min_x.floor() as i32).max(0);
        let y0 = (min_y.floor() as i32).max(0);
        let x1 = (max_x.ceil() as i32).min(self.width);
        let y1 = (max_y.ceil() as i32).min(self.height);

        for y in y0..y1 {
            for x in x0..x1 {
                let src = inverse * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if let Some(pixel) = bitmap.pixel(src.x.floor() as i64, src.y.floor() as i64) {
                    self.blend(x, y, pixel);
                }
            }
        }
    }
}

/// Paints stroker output straight into a raster surface.
struct PaintSink<'a> {
    surface: &'a mut RasterSurface,
    color: Color,
}

impl StrokeSink for PaintSink<'_> {
    fn fill(&mut self, polygon: &[Point]) {
        self.surface
            .fill_polygon(polygon, self.color, FillRule::NonZero);
    }

    fn hairline(&mut self, from: Point, to: Point) {
        self.surface.draw_line(from, to, self.color);
    }

    fn pixels(&mut self, pixels: &[(i32, i32)]) {
        for &(x, y) in pixels {
            self.surface.set_pixel(x, y, self.color);
        }
    }

    fn vertex(&mut self, _point: Point, _padding: i32) {}

    fn clip(&self) -> Option<kurbo::Rect> {
        Some(self.surface.clip())
    }
}
