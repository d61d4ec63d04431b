//! In-memory bitmaps used by image notes.

use std::path::Path;
use thiserror::Error;

/// Errors raised while loading an image for an image note.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Failed to open image {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },

    #[error("Image loading requires the `cairo` feature")]
    Unsupported,
}

/// Premultiplied ARGB32 pixels, row-major, no row padding.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl Bitmap {
    /// Creates a bitmap from raw pixels.
    ///
    /// # Errors
    /// Returns [`ImageError::Empty`] for zero-sized images and
    /// [`ImageError::Decode`] when `pixels` does not match the dimensions.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::Empty { width, height });
        }
        if pixels.len() != width as usize * height as usize {
            return Err(ImageError::Decode(format!(
                "expected {} pixels, got {}",
                width as usize * height as usize,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Creates a bitmap filled with one pixel value.
    pub fn solid(width: u32, height: u32, pixel: u32) -> Result<Self, ImageError> {
        Self::from_pixels(width, height, vec![pixel; width as usize * height as usize])
    }

    /// Returns the pixel at `(x, y)`, or `None` outside the bitmap.
    pub fn pixel(&self, x: i64, y: i64) -> Option<u32> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Loads a PNG file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or decoded.
    #[cfg(feature = "cairo")]
    pub fn load_png(path: &Path) -> Result<Self, ImageError> {
        let mut file = std::fs::File::open(path).map_err(|source| ImageError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let mut surface = cairo::ImageSurface::create_from_png(&mut file)
            .map_err(|err| ImageError::Decode(err.to_string()))?;

        let width = surface.width().max(0) as u32;
        let height = surface.height().max(0) as u32;
        let stride = surface.stride().max(0) as usize;
        let opaque = surface.format() == cairo::Format::Rgb24;

        surface.flush();
        let data = surface
            .data()
            .map_err(|err| ImageError::Decode(err.to_string()))?;

        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for row in 0..height as usize {
            for col in 0..width as usize {
                let i = row * stride + col * 4;
                let pixel = u32::from_ne_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
                pixels.push(if opaque { pixel | 0xff00_0000 } else { pixel });
            }
        }

        Self::from_pixels(width, height, pixels)
    }

    /// Loads a PNG file.
    #[cfg(not(feature = "cairo"))]
    pub fn load_png(_path: &Path) -> Result<Self, ImageError> {
        Err(ImageError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_bitmaps_are_rejected() {
        assert!(matches!(
            Bitmap::solid(0, 4, 0xffffffff),
            Err(ImageError::Empty { .. })
        ));
    }

    #[test]
    fn pixel_lookup_is_bounds_checked() {
        let bitmap = Bitmap::from_pixels(2, 1, vec![1, 2]).unwrap();
        assert_eq!(bitmap.pixel(1, 0), Some(2));
        assert_eq!(bitmap.pixel(2, 0), None);
        assert_eq!(bitmap.pixel(-1, 0), None);
    }

    #[test]
    fn missing_png_reports_open_failure() {
        let err = Bitmap::load_png(Path::new("/definitely/not/here.png")).unwrap_err();
        #[cfg(feature = "cairo")]
        assert!(matches!(err, ImageError::Open { .. }));
        #[cfg(not(feature = "cairo"))]
        assert!(matches!(err, ImageError::Unsupported));
    }
}
