// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Spreading vector generation for STDM embedding.
//!
//! Every slot gets its own unit-norm pseudo-random vector of length
//! [`SPREAD_LEN`]. The vector is drawn from a ChaCha20 stream selected by the
//! slot's flat index, so it depends only on the key and the slot position,
//! never on the order slots are visited in. That keeps block processing
//! order-independent and safe to parallelize.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Number of DCT coefficients per slot (spreading vector length).
pub const SPREAD_LEN: usize = 8;

/// Spreading vector for the slot with flat index `slot`.
pub fn spreading_vector(seed: &[u8; 32], slot: usize) -> [f64; SPREAD_LEN] {
    let mut rng = ChaCha20Rng::from_seed(*seed);
    rng.set_stream(slot as u64);

    let mut v = [0.0f64; SPREAD_LEN];
    for val in v.iter_mut() {
        *val = rng.gen_range(-1.0..1.0);
    }

    let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 1e-10 {
        for val in v.iter_mut() {
            *val /= norm;
        }
    } else {
        v = [0.0; SPREAD_LEN];
        v[0] = 1.0;
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_are_unit_norm() {
        for slot in 0..100 {
            let v = spreading_vector(&[42u8; 32], slot);
            let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-10, "slot {slot} has norm {norm}");
        }
    }

    #[test]
    fn deterministic_per_slot() {
        let a = spreading_vector(&[7u8; 32], 1234);
        let b = spreading_vector(&[7u8; 32], 1234);
        for (ea, eb) in a.iter().zip(b.iter()) {
            assert_eq!(ea.to_bits(), eb.to_bits());
        }
    }

    #[test]
    fn slots_and_seeds_differ() {
        let a = spreading_vector(&[1u8; 32], 0);
        assert_ne!(a, spreading_vector(&[1u8; 32], 1));
        assert_ne!(a, spreading_vector(&[2u8; 32], 0));
    }
}
