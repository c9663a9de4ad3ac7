// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! STDM (Spread Transform Dither Modulation) on one DCT block.
//!
//! A slot carries one bit. The [`SPREAD_LEN`] lowest-frequency AC
//! coefficients of the block (the embedding band) are projected onto the
//! slot's spreading vector, and the projection is quantized onto one of two
//! interleaved lattices:
//!
//! - bit 0: `{ n * step }`
//! - bit 1: `{ (n + 1/2) * step }`
//!
//! Extraction measures the distance to both lattices. Any perturbation of
//! the projection smaller than `step / 4` leaves the bit intact, so `step`
//! is the robustness/distortion knob: the worst-case change to the
//! projection is `step / 2`, spread over `SPREAD_LEN` coefficients.
//!
//! For 8×8 blocks the band covers zigzag positions 1..=8, which JPEG quantizes
//! with its finest AC steps. At the default step of 28 the decision margin is
//! 7, well above the ≈2 standard deviation of projection noise introduced by
//! quality-75 recompression.

use super::spreading::SPREAD_LEN;

/// Default QIM step on luma projections.
pub const DEFAULT_STEP: f64 = 28.0;

/// Default chroma step as a fraction of the luma step.
pub const DEFAULT_CHROMA_RATIO: f64 = 0.5;

/// Coefficient indices (`v * n + u`) of the embedding band for an `n`×`n`
/// block: the first `SPREAD_LEN` AC positions ordered by anti-diagonal
/// (`u + v`), then by row.
pub fn embedding_band(n: usize) -> [usize; SPREAD_LEN] {
    debug_assert!(n * n > SPREAD_LEN, "block too small for the embedding band");
    let mut band = [0usize; SPREAD_LEN];
    let mut filled = 0;
    'diag: for d in 1..2 * n - 1 {
        for v in 0..=d {
            let u = d - v;
            if v >= n || u >= n {
                continue;
            }
            band[filled] = v * n + u;
            filled += 1;
            if filled == SPREAD_LEN {
                break 'diag;
            }
        }
    }
    band
}

/// Step used for `channel` (0 = luma, 1–2 = chroma).
pub fn channel_step(step: f64, chroma_ratio: f64, channel: usize) -> f64 {
    if channel == 0 {
        step
    } else {
        step * chroma_ratio
    }
}

fn project(coeffs: &[f64], band: &[usize; SPREAD_LEN], v: &[f64; SPREAD_LEN]) -> f64 {
    band.iter().zip(v.iter()).map(|(&idx, &vi)| coeffs[idx] * vi).sum()
}

/// Embed `bit` into the band of `coeffs` (a full block, modified in place).
pub fn stdm_embed(
    coeffs: &mut [f64],
    band: &[usize; SPREAD_LEN],
    v: &[f64; SPREAD_LEN],
    bit: u8,
    step: f64,
) {
    debug_assert!(bit <= 1);
    let p = project(coeffs, band, v);
    let dp = quantize_for_bit(p, step, bit) - p;
    for (&idx, &vi) in band.iter().zip(v.iter()) {
        coeffs[idx] += dp * vi;
    }
}

/// Quantize `p` to the nearest point of the lattice for `bit`.
fn quantize_for_bit(p: f64, step: f64, bit: u8) -> f64 {
    if bit == 0 {
        (p / step).round() * step
    } else {
        ((p / step - 0.5).round() + 0.5) * step
    }
}

/// Soft extraction: log-likelihood ratio of the slot's bit.
///
/// Positive favours bit 0, negative favours bit 1; the magnitude (at most
/// `step / 2`) is the confidence.
pub fn stdm_extract_soft(coeffs: &[f64], band: &[usize; SPREAD_LEN], v: &[f64; SPREAD_LEN], step: f64) -> f64 {
    let p = project(coeffs, band, v);
    let d0 = (p - quantize_for_bit(p, step, 0)).abs();
    let d1 = (p - quantize_for_bit(p, step, 1)).abs();
    d1 - d0
}

/// Hard decision from an LLR.
pub fn llr_to_bit(llr: f64) -> u8 {
    if llr >= 0.0 {
        0
    } else {
        1
    }
}
