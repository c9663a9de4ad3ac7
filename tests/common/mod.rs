// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Synthetic test images.

#![allow(dead_code)]

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageEncoder, Rgb, RgbImage};
use phasm_watermark::{OutputFormat, RasterImage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A photo-like RGB image: smooth gradients, some structure and mild
/// noise, all in the mid-tones.
pub fn synthetic_photo(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let noise: Vec<f64> = (0..width * height).map(|_| rng.gen_range(-6.0..6.0)).collect();
    RgbImage::from_fn(width, height, |x, y| {
        let fx = x as f64 / width as f64;
        let fy = y as f64 / height as f64;
        let wave = 18.0 * (x as f64 * 0.09).sin() * (y as f64 * 0.05).cos();
        let n = noise[(y * width + x) as usize];
        let r = 70.0 + 90.0 * fx + wave + n;
        let g = 80.0 + 70.0 * fy - wave * 0.5 + n;
        let b = 150.0 - 60.0 * fx * fy + wave * 0.3 - n;
        Rgb([r.clamp(30.0, 225.0) as u8, g.clamp(30.0, 225.0) as u8, b.clamp(30.0, 225.0) as u8])
    })
}

/// [`synthetic_photo`] as PNG bytes.
pub fn photo_png(width: u32, height: u32, seed: u64) -> Vec<u8> {
    to_png(synthetic_photo(width, height, seed))
}

/// Single-colour grey image, e.g. pure white (255) or pure black (0).
pub fn flat_png(width: u32, height: u32, value: u8) -> Vec<u8> {
    to_png(RgbImage::from_pixel(width, height, Rgb([value; 3])))
}

/// Black glyph-like strokes on a white page, in 16-pixel text lines.
pub fn text_page(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let line = y % 16;
        let glyph = x % 8;
        let stroke = glyph < 2 || line < 5 || line >= 9 || (x / 8 + y / 16) % 3 == 0;
        if (3..11).contains(&line) && glyph < 6 && stroke {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
}

/// [`text_page`] as PNG bytes.
pub fn page_png(width: u32, height: u32) -> Vec<u8> {
    to_png(text_page(width, height))
}

fn to_png(img: RgbImage) -> Vec<u8> {
    let (width, height) = img.dimensions();
    RasterImage::from_rgb(width, height, img.into_raw()).unwrap().encode(OutputFormat::Png).unwrap()
}

/// Decode `bytes` and re-encode them as JPEG at `quality`.
pub fn recompress_jpeg(bytes: &[u8], quality: u8) -> Vec<u8> {
    let rgb = image::load_from_memory(bytes).unwrap().to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .unwrap();
    out
}

/// Reproducible message of exactly `len` bytes.
pub fn generate_message(len: usize) -> String {
    const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789 ";
    (0..len).map(|i| CHARS[i % CHARS.len()] as char).collect()
}
