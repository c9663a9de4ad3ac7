// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Orthonormal N×N block DCT-II and its inverse.
//!
//! For N = 8 the coefficients are on the same scale as JPEG's FDCT output,
//! so a JPEG quantization step of `q` perturbs each coefficient by at most
//! `q / 2`. Blocks are transformed independently; the cosine table is built
//! once per [`BlockDct`] and shared read-only across worker threads.

/// Precomputed separable DCT of a fixed block size.
#[derive(Debug, Clone)]
pub struct BlockDct {
    n: usize,
    /// `cos[u * n + x] = cos((2x + 1) u π / 2n)`
    cos: Vec<f64>,
    /// `C(0) = sqrt(1/n)`, `C(u>0) = sqrt(2/n)`
    norm: Vec<f64>,
}

impl BlockDct {
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "block size must be positive");
        let mut cos = vec![0.0f64; n * n];
        for u in 0..n {
            for x in 0..n {
                cos[u * n + x] =
                    ((2 * x + 1) as f64 * u as f64 * std::f64::consts::PI / (2 * n) as f64).cos();
            }
        }
        let mut norm = vec![(2.0 / n as f64).sqrt(); n];
        norm[0] = (1.0 / n as f64).sqrt();
        Self { n, cos, norm }
    }

    /// Block edge length.
    pub fn size(&self) -> usize {
        self.n
    }

    /// Forward transform: row-major pixels → row-major coefficients
    /// (`index = v * n + u`, vertical frequency first).
    pub fn forward(&self, pixels: &[f64]) -> Vec<f64> {
        let n = self.n;
        debug_assert_eq!(pixels.len(), n * n);

        // Rows.
        let mut temp = vec![0.0f64; n * n];
        for row in 0..n {
            for u in 0..n {
                let mut sum = 0.0;
                for x in 0..n {
                    sum += pixels[row * n + x] * self.cos[u * n + x];
                }
                temp[row * n + u] = self.norm[u] * sum;
            }
        }

        // Columns.
        let mut coeffs = vec![0.0f64; n * n];
        for col in 0..n {
            for v in 0..n {
                let mut sum = 0.0;
                for y in 0..n {
                    sum += temp[y * n + col] * self.cos[v * n + y];
                }
                coeffs[v * n + col] = self.norm[v] * sum;
            }
        }
        coeffs
    }

    /// Inverse transform: row-major coefficients → row-major pixels.
    pub fn inverse(&self, coeffs: &[f64]) -> Vec<f64> {
        let n = self.n;
        debug_assert_eq!(coeffs.len(), n * n);

        // Columns.
        let mut temp = vec![0.0f64; n * n];
        for col in 0..n {
            for y in 0..n {
                let mut sum = 0.0;
                for v in 0..n {
                    sum += self.norm[v] * coeffs[v * n + col] * self.cos[v * n + y];
                }
                temp[y * n + col] = sum;
            }
        }

        // Rows.
        let mut pixels = vec![0.0f64; n * n];
        for row in 0..n {
            for x in 0..n {
                let mut sum = 0.0;
                for u in 0..n {
                    sum += self.norm[u] * temp[row * n + u] * self.cos[u * n + x];
                }
                pixels[row * n + x] = sum;
            }
        }
        pixels
    }
}
