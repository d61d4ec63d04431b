//! Glyph outline providers used by text notes.
//!
//! A provider turns a string into flattened contours in *text space*: the
//! origin sits on the baseline at the start of the run, x grows along the
//! run and y grows downward.

use super::FontDescriptor;
use kurbo::Point;
use thiserror::Error;

/// Errors raised while producing glyph outlines.
#[derive(Debug, Error)]
pub enum TextError {
    #[error("Font '{0}' is not available")]
    FontUnavailable(String),

    #[error("Glyph outline extraction failed: {0}")]
    Outline(String),
}

/// Flattened outline of a text run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphRun {
    /// Closed polygons, filled with the non-zero rule
    pub contours: Vec<Vec<Point>>,
    /// Horizontal advance of the whole run
    pub advance: f64,
    /// Distance from the baseline to the top of the line box
    pub ascent: f64,
    /// Distance from the baseline to the bottom of the line box
    pub descent: f64,
}

impl GlyphRun {
    /// Line box height (ascent plus descent).
    pub fn height(&self) -> f64 {
        self.ascent + self.descent
    }
}

/// Source of glyph outlines for text rendering.
pub trait GlyphProvider {
    /// Returns the outline of `text` set in `font`.
    fn outline(&self, font: &FontDescriptor, text: &str) -> Result<GlyphRun, TextError>;
}

/// Renders every visible character as a solid box.
///
/// Deterministic and dependency-free; used when no font machinery is
/// available and by tests that need predictable text geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxGlyphs;

impl BoxGlyphs {
    const ADVANCE: f64 = 0.6;
    const ASCENT: f64 = 0.8;
    const DESCENT: f64 = 0.2;
    const INK_HEIGHT: f64 = 0.7;
}

impl GlyphProvider for BoxGlyphs {
    fn outline(&self, font: &FontDescriptor, text: &str) -> Result<GlyphRun, TextError> {
        if !font.size.is_finite() || font.size <= 0.0 {
            return Err(TextError::FontUnavailable(font.to_pango_string()));
        }
        let size = font.size;
        let advance = Self::ADVANCE * size;
        let mut contours = Vec::new();
        let mut pen_x = 0.0;

        for ch in text.chars() {
            if !ch.is_whitespace() {
                let left = pen_x + 0.1 * size;
                let right = pen_x + advance - 0.1 * size;
                let top = -Self::INK_HEIGHT * size;
                contours.push(vec![
                    Point::new(left, top),
                    Point::new(right, top),
                    Point::new(right, 0.0),
                    Point::new(left, 0.0),
                ]);
            }
            pen_x += advance;
        }

        Ok(GlyphRun {
            contours,
            advance: pen_x,
            ascent: Self::ASCENT * size,
            descent: Self::DESCENT * size,
        })
    }
}

/// Pango-backed glyph outlines.
#[cfg(feature = "cairo")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PangoGlyphs;

#[cfg(feature = "cairo")]
impl GlyphProvider for PangoGlyphs {
    fn outline(&self, font: &FontDescriptor, text: &str) -> Result<GlyphRun, TextError> {
        // A tiny image surface is enough; only the path is kept.
        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, 1, 1)
            .map_err(|err| TextError::Outline(err.to_string()))?;
        let ctx = cairo::Context::new(&surface).map_err(|err| TextError::Outline(err.to_string()))?;

        let layout = pangocairo::functions::create_layout(&ctx);
        let font_desc = pango::FontDescription::from_string(&font.to_pango_string());
        layout.set_font_description(Some(&font_desc));
        layout.set_text(text);

        let scale = pango::SCALE as f64;
        let baseline = layout.baseline() as f64 / scale;
        let (_ink_rect, logical_rect) = layout.extents();
        let advance = logical_rect.width() as f64 / scale;
        let height = logical_rect.height() as f64 / scale;

        ctx.move_to(0.0, -baseline);
        pangocairo::functions::layout_path(&ctx, &layout);
        let path = ctx
            .copy_path_flat()
            .map_err(|err| TextError::Outline(err.to_string()))?;

        let mut contours = Vec::new();
        let mut current: Vec<Point> = Vec::new();
        for segment in path.iter() {
            match segment {
                cairo::PathSegment::MoveTo((x, y)) => {
                    if current.len() > 2 {
                        contours.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push(Point::new(x, y));
                }
                cairo::PathSegment::LineTo((x, y)) => current.push(Point::new(x, y)),
                cairo::PathSegment::CurveTo(_, _, (x, y)) => current.push(Point::new(x, y)),
                cairo::PathSegment::ClosePath => {
                    if current.len() > 2 {
                        contours.push(std::mem::take(&mut current));
                    }
                    current.clear();
                }
            }
        }
        if current.len() > 2 {
            contours.push(current);
        }

        Ok(GlyphRun {
            contours,
            advance,
            ascent: baseline,
            descent: (height - baseline).max(0.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_glyphs_skip_whitespace() {
        let font = FontDescriptor::default();
        let run = BoxGlyphs.outline(&font, "a b").unwrap();
        assert_eq!(run.contours.len(), 2);
        assert!((run.advance - 3.0 * 0.6 * font.size).abs() < 1e-9);
        assert!((run.height() - font.size).abs() < 1e-9);
    }

    #[test]
    fn box_glyphs_sit_on_the_baseline() {
        let font = FontDescriptor::default();
        let run = BoxGlyphs.outline(&font, "x").unwrap();
        let contour = &run.contours[0];
        assert!(contour.iter().all(|p| p.y <= 0.0));
        assert!(contour.iter().any(|p| p.y < 0.0));
    }

    #[test]
    fn box_glyphs_reject_degenerate_sizes() {
        let mut font = FontDescriptor::default();
        font.size = 0.0;
        assert!(BoxGlyphs.outline(&font, "x").is_err());
    }
}
