// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Raster image container and pixel-domain primitives.
//!
//! [`RasterImage`] is the fully materialized RGB8 buffer every request works
//! on. Container decode (any format the `image` crate understands) and encode
//! (JPEG or PNG) live here so the watermark layer never touches file bytes.
//!
//! Submodules:
//! - [`color`]: RGB ↔ YCbCr float planes with block read/write helpers.
//! - [`dct`]: orthonormal N×N block DCT used as the embedding domain.

pub mod color;
pub mod dct;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use serde::{Deserialize, Serialize};

use crate::watermark::error::WatermarkError;

/// Number of interleaved channels in a [`RasterImage`].
pub const RGB_CHANNELS: usize = 3;

/// Default JPEG quality for watermarked output.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageShape {
    pub width: u32,
    pub height: u32,
}

impl ImageShape {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Container format used when writing a watermarked image back to bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum OutputFormat {
    /// Baseline JPEG at the given quality (1–100).
    Jpeg { quality: u8 },
    /// Lossless PNG.
    Png,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Jpeg { quality: DEFAULT_JPEG_QUALITY }
    }
}

/// An RGB8 pixel buffer, row-major and interleaved.
///
/// Owned by a single request; nothing in the crate keeps a reference to it
/// after the call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    /// Wrap an interleaved RGB8 buffer.
    ///
    /// # Errors
    /// [`WatermarkError::InvalidRaster`] if the buffer length is not
    /// `width * height * 3`.
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, WatermarkError> {
        let expected = width as usize * height as usize * RGB_CHANNELS;
        if pixels.len() != expected {
            return Err(WatermarkError::InvalidRaster { expected, actual: pixels.len() });
        }
        Ok(Self { width, height, pixels })
    }

    /// Decode container bytes (JPEG, PNG, BMP, ...) into an RGB8 raster.
    ///
    /// Grayscale and alpha inputs are converted to RGB; alpha is dropped.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WatermarkError> {
        let decoded = image::load_from_memory(bytes).map_err(WatermarkError::InvalidImage)?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Self { width, height, pixels: rgb.into_raw() })
    }

    /// Encode the raster into container bytes.
    pub fn encode(&self, format: OutputFormat) -> Result<Vec<u8>, WatermarkError> {
        let mut out = Vec::new();
        match format {
            OutputFormat::Jpeg { quality } => {
                JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
                    .write_image(&self.pixels, self.width, self.height, ColorType::Rgb8)
                    .map_err(WatermarkError::EncodeFailed)?;
            }
            OutputFormat::Png => {
                PngEncoder::new(&mut out)
                    .write_image(&self.pixels, self.width, self.height, ColorType::Rgb8)
                    .map_err(WatermarkError::EncodeFailed)?;
            }
        }
        Ok(out)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn shape(&self) -> ImageShape {
        ImageShape::new(self.width, self.height)
    }

    /// Number of interleaved channels (always 3).
    pub fn channels(&self) -> usize {
        RGB_CHANNELS
    }

    /// Raw interleaved RGB8 bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel at `(x, y)` as `[r, g, b]`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * self.width as usize + x as usize) * RGB_CHANNELS;
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RasterImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push((x * 255 / width.max(1)) as u8);
                pixels.push((y * 255 / height.max(1)) as u8);
                pixels.push(128);
            }
        }
        RasterImage::from_rgb(width, height, pixels).unwrap()
    }

    #[test]
    fn from_rgb_rejects_wrong_length() {
        let result = RasterImage::from_rgb(4, 4, vec![0u8; 10]);
        assert!(matches!(result, Err(WatermarkError::InvalidRaster { expected: 48, actual: 10 })));
    }

    #[test]
    fn png_roundtrip_is_lossless() {
        let img = gradient(33, 17);
        let bytes = img.encode(OutputFormat::Png).unwrap();
        let back = RasterImage::from_bytes(&bytes).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn jpeg_roundtrip_keeps_dimensions() {
        let img = gradient(64, 48);
        let bytes = img.encode(OutputFormat::Jpeg { quality: 90 }).unwrap();
        let back = RasterImage::from_bytes(&bytes).unwrap();
        assert_eq!(back.shape(), ImageShape::new(64, 48));
        // Smooth gradient should survive q90 closely.
        let max_diff = img
            .pixels()
            .iter()
            .zip(back.pixels())
            .map(|(&a, &b)| (a as i16 - b as i16).abs())
            .max()
            .unwrap();
        assert!(max_diff < 16, "max_diff={max_diff}");
    }

    #[test]
    fn garbage_bytes_are_invalid_image() {
        let result = RasterImage::from_bytes(b"definitely not an image");
        assert!(matches!(result, Err(WatermarkError::InvalidImage(_))));
    }

    #[test]
    fn pixel_accessor() {
        let img = gradient(10, 10);
        assert_eq!(img.pixel(0, 0), [0, 0, 128]);
        assert_eq!(img.channels(), 3);
    }
}
