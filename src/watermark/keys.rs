// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Key pair and deterministic seed derivation.
//!
//! A watermark is controlled by two independent integers:
//!
//! - `password_img` decides **where** bits go: it seeds the slot permutation
//!   and the per-slot spreading vectors.
//! - `password_wm` decides **how** bit values are scrambled before embedding.
//!
//! Each integer is stretched with Argon2id under its own fixed salt into
//! ChaCha20 seeds. The salts differ, so equal integers still produce
//! unrelated streams. Everything here is a pure function of its input;
//! nothing is cached between calls.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Fixed salt for the placement key (slot permutation + spreading vectors).
const PLACEMENT_SALT: &[u8; 16] = b"phasm-wm-place1\0";

/// Fixed salt for the bit scrambling key.
const SCRAMBLE_SALT: &[u8; 16] = b"phasm-wm-scrmb1\0";

/// Argon2 memory cost in KiB. The inputs are integers, so the KDF only has
/// to whiten them; a small cost keeps per-request latency low.
const KDF_MEMORY_KIB: u32 = 1024;

/// Argon2 pass count.
const KDF_ITERATIONS: u32 = 1;

/// The two integer passwords of one embed/extract pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyPair {
    /// Selects embedding locations.
    pub password_img: i64,
    /// Scrambles bit values.
    pub password_wm: i64,
}

impl KeyPair {
    pub fn new(password_img: i64, password_wm: i64) -> Self {
        Self { password_img, password_wm }
    }
}

fn derive(password: i64, salt: &[u8], out: &mut [u8]) {
    let params = Params::new(KDF_MEMORY_KIB, KDF_ITERATIONS, 1, Some(out.len()))
        .expect("constant Argon2 parameters are valid");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(&password.to_be_bytes(), salt, out)
        .expect("Argon2 seed derivation should not fail");
}

/// Derive the placement key from `password_img`.
///
/// Returns a 64-byte buffer: first 32 bytes = permutation seed, last 32 bytes
/// = spreading seed.
pub fn derive_placement_key(password_img: i64) -> Zeroizing<[u8; 64]> {
    let mut output = Zeroizing::new([0u8; 64]);
    derive(password_img, PLACEMENT_SALT, &mut *output);
    output
}

/// Derive the 32-byte scrambling seed from `password_wm`.
pub fn derive_scramble_key(password_wm: i64) -> Zeroizing<[u8; 32]> {
    let mut output = Zeroizing::new([0u8; 32]);
    derive(password_wm, SCRAMBLE_SALT, &mut *output);
    output
}

/// Split a placement key into (permutation seed, spreading seed).
pub fn split_placement_key(key: &[u8; 64]) -> ([u8; 32], [u8; 32]) {
    let mut perm = [0u8; 32];
    let mut spread = [0u8; 32];
    perm.copy_from_slice(&key[..32]);
    spread.copy_from_slice(&key[32..]);
    (perm, spread)
}
