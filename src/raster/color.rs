// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! RGB ↔ YCbCr conversion into floating-point planes.
//!
//! Uses the full-range JFIF (BT.601) matrices, the same ones a JPEG encoder
//! applies, so luma/chroma changes made here map onto the planes a later
//! recompression will quantize. The forward and inverse matrices are inverse
//! to within 1e-5, so pixels in untouched blocks round back to their
//! original values.

use super::{RasterImage, RGB_CHANNELS};

/// Channel index of luma in [`YccPlanes`].
pub const LUMA: usize = 0;

/// Mid-gray. Maps to itself in every YCbCr plane.
const MID: f64 = 128.0;

/// A single row-major `f64` image plane.
#[derive(Debug, Clone)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Plane {
    /// Create a plane initialized to zero.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, data: vec![0.0; width * height] }
    }

    /// Copy the `n`×`n` block at block row `br`, block column `bc` into a
    /// row-major buffer.
    pub fn read_block(&self, br: usize, bc: usize, n: usize) -> Vec<f64> {
        debug_assert!((br + 1) * n <= self.height && (bc + 1) * n <= self.width);
        let mut block = Vec::with_capacity(n * n);
        for row in 0..n {
            let start = (br * n + row) * self.width + bc * n;
            block.extend_from_slice(&self.data[start..start + n]);
        }
        block
    }

    /// Write a row-major `n`×`n` block back at (`br`, `bc`).
    pub fn write_block(&mut self, br: usize, bc: usize, n: usize, block: &[f64]) {
        debug_assert_eq!(block.len(), n * n);
        for row in 0..n {
            let start = (br * n + row) * self.width + bc * n;
            self.data[start..start + n].copy_from_slice(&block[row * n..(row + 1) * n]);
        }
    }
}

/// Y, Cb, Cr planes of one image.
#[derive(Debug, Clone)]
pub struct YccPlanes {
    planes: [Plane; 3],
}

fn rgb_to_ycc(r: f64, g: f64, b: f64) -> [f64; 3] {
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let cb = -0.168_736 * r - 0.331_264 * g + 0.5 * b + 128.0;
    let cr = 0.5 * r - 0.418_688 * g - 0.081_312 * b + 128.0;
    [y, cb, cr]
}

fn ycc_to_rgb(y: f64, cb: f64, cr: f64) -> [f64; 3] {
    let cb = cb - 128.0;
    let cr = cr - 128.0;
    let r = y + 1.402 * cr;
    let g = y - 0.344_136 * cb - 0.714_136 * cr;
    let b = y + 1.772 * cb;
    [r, g, b]
}

impl YccPlanes {
    /// Split an RGB raster into Y, Cb and Cr planes.
    pub fn from_raster(img: &RasterImage) -> Self {
        let width = img.width() as usize;
        let height = img.height() as usize;
        let mut planes = [Plane::new(width, height), Plane::new(width, height), Plane::new(width, height)];

        for (i, px) in img.pixels().chunks_exact(RGB_CHANNELS).enumerate() {
            let ycc = rgb_to_ycc(px[0] as f64, px[1] as f64, px[2] as f64);
            for ch in 0..3 {
                planes[ch].data[i] = ycc[ch];
            }
        }

        Self { planes }
    }

    /// Merge the planes back into an RGB raster, rounding and clamping to
    /// `[0, 255]`.
    pub fn to_raster(&self) -> RasterImage {
        let width = self.planes[LUMA].width;
        let height = self.planes[LUMA].height;
        let mut pixels = Vec::with_capacity(width * height * RGB_CHANNELS);

        for i in 0..width * height {
            let rgb = ycc_to_rgb(self.planes[0].data[i], self.planes[1].data[i], self.planes[2].data[i]);
            for v in rgb {
                pixels.push(v.round().clamp(0.0, 255.0) as u8);
            }
        }

        RasterImage { width: width as u32, height: height as u32, pixels }
    }

    pub fn plane(&self, channel: usize) -> &Plane {
        &self.planes[channel]
    }

    pub fn plane_mut(&mut self, channel: usize) -> &mut Plane {
        &mut self.planes[channel]
    }

    /// Pull the `n`×`n` block at (`br`, `bc`) toward mid-gray in all three
    /// planes until every RGB sample lies at least `headroom` inside
    /// `[0, 255]`.
    ///
    /// Mid-gray is a fixed point of the colour transform, so scaling the
    /// YCbCr deviations scales the RGB deviations by the same factor.
    /// Returns that factor; `1.0` means the block already had room.
    pub fn contract_block(&mut self, br: usize, bc: usize, n: usize, headroom: f64) -> f64 {
        let limit = (MID - 1.0 - headroom).max(0.0);
        let [y, cb, cr] = &self.planes;
        let (y, cb, cr) = (y.read_block(br, bc, n), cb.read_block(br, bc, n), cr.read_block(br, bc, n));

        let peak = (0..n * n)
            .flat_map(|i| ycc_to_rgb(y[i], cb[i], cr[i]))
            .fold(0.0f64, |acc, v| acc.max((v - MID).abs()));
        if peak <= limit {
            return 1.0;
        }

        let alpha = limit / peak;
        for plane in &mut self.planes {
            let block: Vec<f64> = plane.read_block(br, bc, n).iter().map(|&v| MID + alpha * (v - MID)).collect();
            plane.write_block(br, bc, n, &block);
        }
        alpha
    }
}
