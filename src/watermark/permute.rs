// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Keyed slot selection and bit scrambling.
//!
//! [`locations`] draws an ordered, duplicate-free subset of slots with a
//! partial Fisher-Yates shuffle driven by a ChaCha20 PRNG seeded from
//! `password_img`. [`scramble`] / [`unscramble`] XOR the bits with a
//! ChaCha20 keystream seeded from `password_wm` and reorder them with a
//! second shuffle from the same stream.
//!
//! # Cross-platform portability
//!
//! Shuffles call `gen_range` with `u32` bounds (not `usize`) so 32-bit and
//! 64-bit targets consume the same amount of PRNG output and produce
//! identical orders.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use super::capacity::{SlotCoord, SlotGrid};
use super::error::WatermarkError;
use super::keys::{derive_placement_key, derive_scramble_key, split_placement_key};

/// Ordered embedding locations, one per embedded bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitLocationMap {
    coords: Vec<SlotCoord>,
}

impl BitLocationMap {
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn as_slice(&self) -> &[SlotCoord] {
        &self.coords
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SlotCoord> {
        self.coords.iter()
    }
}

/// Select `n` distinct slots of `grid` in an order determined by
/// `password_img`.
///
/// # Errors
/// [`WatermarkError::CapacityExceeded`] if `n` exceeds the slot count.
pub fn locations(password_img: i64, n: usize, grid: &SlotGrid) -> Result<BitLocationMap, WatermarkError> {
    let key = derive_placement_key(password_img);
    let (perm_seed, _) = split_placement_key(&key);
    locations_from_seed(&perm_seed, n, grid)
}

/// [`locations`] with an already-derived permutation seed.
pub fn locations_from_seed(seed: &[u8; 32], n: usize, grid: &SlotGrid) -> Result<BitLocationMap, WatermarkError> {
    let total = grid.total();
    if n > total {
        return Err(WatermarkError::CapacityExceeded { bits: n, capacity: total });
    }
    debug_assert!(total <= u32::MAX as usize);

    let mut indices: Vec<usize> = (0..total).collect();
    let mut rng = ChaCha20Rng::from_seed(*seed);
    // Partial forward Fisher-Yates: after step i, indices[..=i] is a uniform
    // random ordered sample.
    for i in 0..n.min(total.saturating_sub(1)) {
        let j = rng.gen_range(i as u32..total as u32) as usize;
        indices.swap(i, j);
    }

    let coords = indices[..n].iter().map(|&flat| grid.coord(flat)).collect();
    Ok(BitLocationMap { coords })
}

/// Keystream mask and reorder permutation for `n` bits.
fn scramble_schedule(password_wm: i64, n: usize) -> (Vec<u8>, Vec<usize>) {
    let key = derive_scramble_key(password_wm);
    let mut rng = ChaCha20Rng::from_seed(*key);

    let mut mask = vec![0u8; (n + 7) / 8];
    rng.fill_bytes(&mut mask);

    let mut order: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = rng.gen_range(0..=(i as u32)) as usize;
        order.swap(i, j);
    }
    (mask, order)
}

fn mask_bit(mask: &[u8], i: usize) -> u8 {
    (mask[i / 8] >> (7 - i % 8)) & 1
}

/// Scramble payload bits with `password_wm`.
pub fn scramble(password_wm: i64, bits: &[u8]) -> Vec<u8> {
    let (mask, order) = scramble_schedule(password_wm, bits.len());
    order.iter().map(|&src| (bits[src] & 1) ^ mask_bit(&mask, src)).collect()
}

/// Inverse of [`scramble`] for the same `password_wm`.
pub fn unscramble(password_wm: i64, bits: &[u8]) -> Vec<u8> {
    let (mask, order) = scramble_schedule(password_wm, bits.len());
    let mut out = vec![0u8; bits.len()];
    for (pos, &dst) in order.iter().enumerate() {
        out[dst] = (bits[pos] & 1) ^ mask_bit(&mask, dst);
    }
    out
}
