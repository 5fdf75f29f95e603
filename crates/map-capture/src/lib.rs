use anyhow::{bail, Context, Result};
use base64::Engine;
use image::{Rgba, RgbaImage};
use map_data::REFERENCE_WIDTH;
use std::io::Cursor;

pub mod cache;
pub mod footprint;
pub mod source;

pub use cache::{CacheStatus, ImageCache, TieredCache};
pub use footprint::{extract_region, Footprint};
pub use source::{FileFetcher, ImageFetcher, ImageLoader, MemoryFetcher};

/// Ratio between an actual image and the reference frame.
/// Applied uniformly to both axes; there is no separate vertical scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageScale(f64);

impl ImageScale {
    /// Scale for an image of the given pixel width
    pub fn from_width(width: u32) -> Result<Self> {
        if width == 0 {
            bail!("Image has zero width, cannot derive a scale factor");
        }
        Ok(Self(width as f64 / REFERENCE_WIDTH))
    }

    pub fn of(image: &RgbaImage) -> Result<Self> {
        Self::from_width(image.width())
    }

    pub fn factor(self) -> f64 {
        self.0
    }

    /// Map one reference-frame length to pixels, truncating toward zero.
    pub fn scale(self, value: f64) -> i32 {
        (value * self.0) as i32
    }

    /// Map a reference-frame point to pixel coordinates.
    pub fn point(self, x: f64, y: f64) -> (i32, i32) {
        (self.scale(x), self.scale(y))
    }
}

/// Read a single pixel, failing for coordinates outside the image.
pub fn pixel_at(image: &RgbaImage, (x, y): (i32, i32)) -> Result<Rgba<u8>> {
    if x < 0 || y < 0 || x as u32 >= image.width() || y as u32 >= image.height() {
        bail!(
            "Pixel ({}, {}) outside {}x{} image",
            x,
            y,
            image.width(),
            image.height()
        );
    }
    Ok(*image.get_pixel(x as u32, y as u32))
}

/// Encode an image as PNG bytes
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .context("Failed to encode PNG")?;
    Ok(buffer.into_inner())
}

/// Encode an image as base64 PNG, the form crops are handed back to callers in
pub fn encode_png_base64(image: &RgbaImage) -> Result<String> {
    let png = encode_png(image)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(png))
}
