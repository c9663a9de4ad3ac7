// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Repetition coding with soft majority voting.
//!
//! Short payloads leave most slots unused. Instead of wasting them, the
//! scrambled bit stream is laid out `r` times back to back and extraction
//! sums the per-slot LLRs of every copy before deciding. `r` depends only on
//! the payload bit count and the slot count, so both sides compute it
//! without extra metadata.

/// Compute the repetition factor from payload bit count and slot count.
///
/// Forces `r` to be odd (for clean majority voting) unless `r < 2`.
/// Caps at 255.
pub fn compute_r(bit_count: usize, num_slots: usize) -> usize {
    if bit_count == 0 {
        return 1;
    }
    let r = (num_slots / bit_count).min(255);
    if r >= 3 {
        // r is the floor, so rounding an even r up never fits.
        if r % 2 == 1 { r } else { r - 1 }
    } else {
        1
    }
}

/// Lay out `r` copies of `bits` back to back. Copy `j` of bit `i` sits at
/// position `j * bits.len() + i`.
pub fn repetition_encode(bits: &[u8], r: usize) -> Vec<u8> {
    let mut output = Vec::with_capacity(bits.len() * r);
    for _ in 0..r {
        output.extend_from_slice(bits);
    }
    output
}

/// Signal quality of a soft vote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepetitionQuality {
    /// Average |summed LLR| / r over all bit positions. A clean,
    /// unrecompressed image reads `step / 2` (luma-only) here.
    pub avg_abs_llr_per_copy: f64,
    /// Fraction of individual copies that disagree with the voted bit.
    pub copy_disagreement: f64,
}

/// Soft majority voting across `llrs.len() / bit_count` copies.
///
/// Positive total → bit 0, negative → bit 1. Returns exactly `bit_count`
/// bits.
pub fn repetition_decode_soft(llrs: &[f64], bit_count: usize) -> (Vec<u8>, RepetitionQuality) {
    if bit_count == 0 {
        return (Vec::new(), RepetitionQuality { avg_abs_llr_per_copy: 0.0, copy_disagreement: 0.0 });
    }

    let r = (llrs.len() / bit_count).max(1);
    let mut voted = Vec::with_capacity(bit_count);
    let mut sum_abs = 0.0;
    let mut disagreements = 0usize;
    let mut copies_seen = 0usize;

    for i in 0..bit_count {
        let copies = (0..r).filter_map(|copy| llrs.get(copy * bit_count + i));
        let total: f64 = copies.clone().sum();
        let bit = if total >= 0.0 { 0u8 } else { 1u8 };
        for &llr in copies {
            copies_seen += 1;
            if (llr >= 0.0) != (bit == 0) {
                disagreements += 1;
            }
        }
        sum_abs += total.abs() / r as f64;
        voted.push(bit);
    }

    let quality = RepetitionQuality {
        avg_abs_llr_per_copy: sum_abs / bit_count as f64,
        copy_disagreement: if copies_seen == 0 { 0.0 } else { disagreements as f64 / copies_seen as f64 },
    };
    (voted, quality)
}
