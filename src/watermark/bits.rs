// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Text ↔ bit sequence conversion and fixed-length framing.
//!
//! Text is always UTF-8 and every length is counted in bytes, so multi-byte
//! characters are sized correctly for capacity checks.
//!
//! Two modes:
//!
//! - [`BitMode::Exact`]: the bit sequence is exactly the text bytes.
//! - [`BitMode::Padded`]: the text is framed to a fixed `max_bytes` payload.
//!   With [`PadFraming::LengthPrefix`] the frame is
//!
//!   ```text
//!   [2 bytes ] text length (big-endian u16)
//!   [N bytes ] text
//!   [M bytes ] zero padding up to max_bytes
//!   ```
//!
//!   and stripping never depends on the text content. With
//!   [`PadFraming::Sentinel`] the text is right-padded with the sentinel byte
//!   and trailing sentinels are stripped on decode; text containing the
//!   sentinel is rejected up front.
//!
//! Decoding is lossy UTF-8: bits recovered with the wrong keys still decode
//! to *some* string.

use serde::{Deserialize, Serialize};

use super::error::WatermarkError;

/// Size of the length prefix in [`PadFraming::LengthPrefix`] frames.
pub const LENGTH_PREFIX_BYTES: usize = 2;

/// Largest `max_bytes` a length prefix can describe.
pub const MAX_PREFIXED_BYTES: usize = u16::MAX as usize;

/// How a padded frame marks where the text ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadFraming {
    /// Explicit big-endian u16 length ahead of the text.
    LengthPrefix,
    /// Pad with this byte; trailing copies are stripped on decode.
    Sentinel(u8),
}

impl Default for PadFraming {
    fn default() -> Self {
        Self::LengthPrefix
    }
}

/// Bit framing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitMode {
    Exact,
    Padded { max_bytes: usize, framing: PadFraming },
}

impl BitMode {
    /// Fixed frame length in bits, or `None` in exact mode.
    pub fn fixed_bits(&self) -> Option<usize> {
        match *self {
            Self::Exact => None,
            Self::Padded { max_bytes, framing } => Some(frame_bytes(max_bytes, framing) * 8),
        }
    }
}

fn frame_bytes(max_bytes: usize, framing: PadFraming) -> usize {
    match framing {
        PadFraming::LengthPrefix => LENGTH_PREFIX_BYTES + max_bytes,
        PadFraming::Sentinel(_) => max_bytes,
    }
}

/// One request's watermark text in all its forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkPayload {
    text: String,
    bytes: Vec<u8>,
    bits: Vec<u8>,
}

impl WatermarkPayload {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// UTF-8 encoding of the text (unframed).
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Framed bit sequence, MSB first, one bit per element.
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }
}

/// Encode `text` into a bit sequence.
///
/// # Errors
/// - [`WatermarkError::MessageTooLong`] if a padded mode's `max_bytes` is
///   exceeded.
/// - [`WatermarkError::SentinelInMessage`] if sentinel framing is used and
///   the text contains the sentinel byte.
pub fn encode(text: &str, mode: BitMode) -> Result<WatermarkPayload, WatermarkError> {
    let bytes = text.as_bytes().to_vec();

    let framed = match mode {
        BitMode::Exact => bytes.clone(),
        BitMode::Padded { max_bytes, framing } => {
            if bytes.len() > max_bytes {
                return Err(WatermarkError::MessageTooLong { bytes: bytes.len(), max: max_bytes });
            }
            let mut frame = Vec::with_capacity(frame_bytes(max_bytes, framing));
            match framing {
                PadFraming::LengthPrefix => {
                    // max_bytes <= u16::MAX is enforced by config validation.
                    frame.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
                    frame.extend_from_slice(&bytes);
                    frame.resize(LENGTH_PREFIX_BYTES + max_bytes, 0);
                }
                PadFraming::Sentinel(s) => {
                    if bytes.contains(&s) {
                        return Err(WatermarkError::SentinelInMessage(s));
                    }
                    frame.extend_from_slice(&bytes);
                    frame.resize(max_bytes, s);
                }
            }
            frame
        }
    };

    Ok(WatermarkPayload { text: text.to_owned(), bits: bytes_to_bits(&framed), bytes })
}

/// Decode a bit sequence produced by [`encode`] with the same mode.
///
/// # Errors
/// [`WatermarkError::BitCountMismatch`] if the number of bits is not a whole
/// number of bytes, or does not equal the fixed frame size in padded mode.
pub fn decode(bits: &[u8], mode: BitMode) -> Result<String, WatermarkError> {
    if bits.len() % 8 != 0 {
        return Err(WatermarkError::BitCountMismatch {
            expected: bits.len() / 8 * 8,
            actual: bits.len(),
        });
    }
    if let Some(expected) = mode.fixed_bits() {
        if bits.len() != expected {
            return Err(WatermarkError::BitCountMismatch { expected, actual: bits.len() });
        }
    }

    let bytes = bits_to_bytes(bits);
    let text_bytes = match mode {
        BitMode::Exact => &bytes[..],
        BitMode::Padded { max_bytes, framing: PadFraming::LengthPrefix } => {
            let declared = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
            // A mismatched key yields an arbitrary prefix; clamp, don't fail.
            let len = declared.min(max_bytes);
            &bytes[LENGTH_PREFIX_BYTES..LENGTH_PREFIX_BYTES + len]
        }
        BitMode::Padded { framing: PadFraming::Sentinel(s), .. } => {
            let end = bytes.iter().rposition(|&b| b != s).map_or(0, |i| i + 1);
            &bytes[..end]
        }
    };

    Ok(String::from_utf8_lossy(text_bytes).into_owned())
}

/// Convert bytes to a bit vector (MSB first within each byte).
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for bit_pos in (0..8).rev() {
            bits.push((byte >> bit_pos) & 1);
        }
    }
    bits
}

/// Convert a bit vector (MSB first) back to bytes.
/// Pads the last byte with zero bits if `bits.len()` is not a multiple of 8.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity((bits.len() + 7) / 8);
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            byte |= (bit & 1) << (7 - i);
        }
        bytes.push(byte);
    }
    bytes
}
