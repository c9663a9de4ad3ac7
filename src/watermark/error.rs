// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for the watermark pipeline.
//!
//! [`WatermarkError`] covers every failure from container decode through
//! bit recovery. [`ErrorKind`] folds the variants into the four categories
//! callers dispatch on.
//!
//! Extraction with the wrong key pair is not an error: it yields a
//! meaningless string.

use core::fmt;

/// Coarse failure category surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Image bytes could not be turned into a raster buffer.
    Input,
    /// Request parameters were rejected before any transform work.
    Validation,
    /// The payload does not fit the image.
    Capacity,
    /// Internal inconsistency during embed or extract.
    Codec,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Input => "input",
            Self::Validation => "validation",
            Self::Capacity => "capacity",
            Self::Codec => "codec",
        };
        f.write_str(s)
    }
}

/// Errors that can occur during watermark embedding or extraction.
#[derive(Debug)]
pub enum WatermarkError {
    /// The input bytes could not be decoded as an image.
    InvalidImage(image::ImageError),
    /// A raw pixel buffer does not match its declared dimensions.
    InvalidRaster { expected: usize, actual: usize },
    /// The watermark text exceeds the configured maximum (in bytes).
    MessageTooLong { bytes: usize, max: usize },
    /// The watermark text contains the padding sentinel byte.
    SentinelInMessage(u8),
    /// The active length strategy needs metadata the caller did not supply.
    MissingLength,
    /// The supplied length metadata is malformed or of the wrong kind.
    InvalidLength(&'static str),
    /// The configuration is not usable.
    InvalidConfig(String),
    /// The payload needs more bit slots than the image offers.
    CapacityExceeded { bits: usize, capacity: usize },
    /// The recovered bit count disagrees with the expected framing.
    BitCountMismatch { expected: usize, actual: usize },
    /// The embedded raster does not read back as the payload, even after
    /// re-embedding the blocks that clipped.
    EmbedUnverified { flipped: usize, bits: usize },
    /// The watermarked raster could not be encoded.
    EncodeFailed(image::ImageError),
}

impl WatermarkError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidImage(_) | Self::InvalidRaster { .. } => ErrorKind::Input,
            Self::MessageTooLong { .. }
            | Self::SentinelInMessage(_)
            | Self::MissingLength
            | Self::InvalidLength(_)
            | Self::InvalidConfig(_) => ErrorKind::Validation,
            Self::CapacityExceeded { .. } => ErrorKind::Capacity,
            Self::BitCountMismatch { .. } | Self::EmbedUnverified { .. } | Self::EncodeFailed(_) => ErrorKind::Codec,
        }
    }
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidImage(e) => write!(f, "invalid image: {e}"),
            Self::InvalidRaster { expected, actual } => {
                write!(f, "raster buffer has {actual} bytes, expected {expected}")
            }
            Self::MessageTooLong { bytes, max } => {
                write!(f, "watermark text is {bytes} bytes, maximum is {max}")
            }
            Self::SentinelInMessage(b) => {
                write!(f, "watermark text contains the padding byte 0x{b:02X}")
            }
            Self::MissingLength => write!(f, "length metadata is required for extraction"),
            Self::InvalidLength(msg) => write!(f, "invalid length metadata: {msg}"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::CapacityExceeded { bits, capacity } => {
                write!(f, "payload needs {bits} bits but the image holds {capacity}")
            }
            Self::BitCountMismatch { expected, actual } => {
                write!(f, "recovered {actual} bits, expected {expected}")
            }
            Self::EmbedUnverified { flipped, bits } => {
                write!(f, "embedded watermark does not verify: {flipped} of {bits} bits read back wrong")
            }
            Self::EncodeFailed(e) => write!(f, "failed to encode watermarked image: {e}"),
        }
    }
}

impl std::error::Error for WatermarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidImage(e) | Self::EncodeFailed(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(WatermarkError::MessageTooLong { bytes: 70, max: 64 }.kind(), ErrorKind::Validation);
        assert_eq!(WatermarkError::CapacityExceeded { bits: 9, capacity: 8 }.kind(), ErrorKind::Capacity);
        assert_eq!(WatermarkError::BitCountMismatch { expected: 8, actual: 7 }.kind(), ErrorKind::Codec);
        assert_eq!(WatermarkError::InvalidRaster { expected: 3, actual: 2 }.kind(), ErrorKind::Input);
        assert_eq!(WatermarkError::MissingLength.kind(), ErrorKind::Validation);
        assert_eq!(WatermarkError::EmbedUnverified { flipped: 1, bits: 8 }.kind(), ErrorKind::Codec);
    }

    #[test]
    fn display_mentions_numbers() {
        let msg = WatermarkError::CapacityExceeded { bits: 100, capacity: 42 }.to_string();
        assert!(msg.contains("100") && msg.contains("42"), "{msg}");
        assert_eq!(ErrorKind::Capacity.to_string(), "capacity");
    }
}
