// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Length protocol: how extraction learns how many bits to read.
//!
//! Nothing in the image records the payload length, so one of three
//! strategies is fixed per deployment:
//!
//! - [`LengthStrategy::Explicit`]: the extractor already knows the text
//!   length and passes it in as [`LengthMeta::TextBytes`],
//!   [`LengthMeta::Chars`] or [`LengthMeta::Bits`].
//! - [`LengthStrategy::Echoed`]: embedding returns [`LengthMeta::Bits`]
//!   and the caller stores it and hands it back on extraction.
//! - [`LengthStrategy::FixedPadding`]: every payload is framed to the same
//!   size, so no metadata travels at all.

use serde::{Deserialize, Serialize};

use super::bits::{self, BitMode, PadFraming, WatermarkPayload};
use super::error::WatermarkError;

/// Default fixed payload size in bytes.
pub const DEFAULT_MAX_BYTES: usize = 64;

/// Length metadata exchanged between embed and extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthMeta {
    /// No metadata (fixed padding).
    #[default]
    None,
    /// Text length in UTF-8 bytes.
    TextBytes(usize),
    /// Text length in characters (Unicode scalar values). Explicit
    /// strategy only; see [`LengthProtocol::candidate_bits`].
    Chars(usize),
    /// Payload length in bits.
    Bits(usize),
}

/// Strategy for communicating the payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LengthStrategy {
    Explicit,
    Echoed,
    FixedPadding {
        max_bytes: usize,
        #[serde(default)]
        framing: PadFraming,
    },
}

impl Default for LengthStrategy {
    fn default() -> Self {
        Self::FixedPadding { max_bytes: DEFAULT_MAX_BYTES, framing: PadFraming::LengthPrefix }
    }
}

/// Applies one [`LengthStrategy`] to both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthProtocol {
    strategy: LengthStrategy,
}

impl LengthProtocol {
    pub fn new(strategy: LengthStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> LengthStrategy {
        self.strategy
    }

    /// Bit framing used by this strategy.
    pub fn bit_mode(&self) -> BitMode {
        match self.strategy {
            LengthStrategy::Explicit | LengthStrategy::Echoed => BitMode::Exact,
            LengthStrategy::FixedPadding { max_bytes, framing } => BitMode::Padded { max_bytes, framing },
        }
    }

    /// Encode `text` and produce the metadata to hand back to the caller.
    pub fn prepare(&self, text: &str) -> Result<(WatermarkPayload, LengthMeta), WatermarkError> {
        let payload = bits::encode(text, self.bit_mode())?;
        let meta = match self.strategy {
            LengthStrategy::Echoed => LengthMeta::Bits(payload.bit_len()),
            LengthStrategy::Explicit | LengthStrategy::FixedPadding { .. } => LengthMeta::None,
        };
        Ok((payload, meta))
    }

    /// Number of bits to extract, given the caller's metadata.
    ///
    /// # Errors
    /// - [`WatermarkError::MissingLength`] if the strategy needs metadata and
    ///   got [`LengthMeta::None`].
    /// - [`WatermarkError::InvalidLength`] for metadata of the wrong kind.
    /// - [`WatermarkError::BitCountMismatch`] for a bit count that is not a
    ///   whole number of bytes.
    pub fn expected_bits(&self, meta: &LengthMeta) -> Result<usize, WatermarkError> {
        let bit_count = match (self.strategy, *meta) {
            (LengthStrategy::Explicit, LengthMeta::TextBytes(bytes)) => {
                bytes.checked_mul(8).ok_or(WatermarkError::InvalidLength("text length overflows"))?
            }
            (LengthStrategy::Explicit | LengthStrategy::Echoed, LengthMeta::Bits(bits)) => bits,
            (LengthStrategy::Explicit, LengthMeta::Chars(_)) => {
                return Err(WatermarkError::InvalidLength("a character count has no single bit count"));
            }
            (LengthStrategy::Explicit | LengthStrategy::Echoed, LengthMeta::None) => {
                return Err(WatermarkError::MissingLength);
            }
            (LengthStrategy::Echoed, LengthMeta::TextBytes(_) | LengthMeta::Chars(_)) => {
                return Err(WatermarkError::InvalidLength("echoed strategy expects a bit count"));
            }
            (LengthStrategy::FixedPadding { .. }, LengthMeta::None) => {
                return self.bit_mode().fixed_bits().ok_or(WatermarkError::MissingLength);
            }
            (LengthStrategy::FixedPadding { .. }, _) => {
                return Err(WatermarkError::InvalidLength("fixed padding takes no length metadata"));
            }
        };
        if bit_count % 8 != 0 {
            return Err(WatermarkError::BitCountMismatch { expected: (bit_count + 7) / 8 * 8, actual: bit_count });
        }
        Ok(bit_count)
    }

    /// Bit counts to try on extraction, shortest first.
    ///
    /// Exactly one for every metadata kind except [`LengthMeta::Chars`]:
    /// `n` characters take between `n` and `4n` UTF-8 bytes, so each of
    /// those byte lengths is a candidate and [`LengthProtocol::confirms`]
    /// picks the first that decodes to exactly `n` characters. For short
    /// non-ASCII text a wrong candidate can pass that check by chance;
    /// prefer [`LengthMeta::TextBytes`] when the byte length is known.
    pub fn candidate_bits(&self, meta: &LengthMeta) -> Result<Vec<usize>, WatermarkError> {
        match (self.strategy, *meta) {
            (LengthStrategy::Explicit, LengthMeta::Chars(chars)) => {
                let longest = chars.checked_mul(4 * 8).ok_or(WatermarkError::InvalidLength("text length overflows"))?;
                Ok((chars * 8..=longest).step_by(8).collect())
            }
            _ => Ok(vec![self.expected_bits(meta)?]),
        }
    }

    /// Whether `bits` read under `meta` look like the text the caller
    /// described. Only character counts can be checked; everything else
    /// is accepted.
    pub fn confirms(&self, meta: &LengthMeta, bits: &[u8]) -> bool {
        match *meta {
            LengthMeta::Chars(chars) => {
                std::str::from_utf8(&bits::bits_to_bytes(bits)).map_or(false, |text| text.chars().count() == chars)
            }
            _ => true,
        }
    }

    /// Decode extracted bits back to text.
    pub fn recover(&self, bits: &[u8]) -> Result<String, WatermarkError> {
        bits::decode(bits, self.bit_mode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(protocol: LengthProtocol, text: &str, meta: Option<LengthMeta>) -> String {
        let (payload, echoed) = protocol.prepare(text).unwrap();
        let meta = meta.unwrap_or(echoed);
        let n = protocol.expected_bits(&meta).unwrap();
        assert_eq!(n, payload.bit_len());
        protocol.recover(payload.bits()).unwrap()
    }

    #[test]
    fn explicit_with_text_bytes() {
        let p = LengthProtocol::new(LengthStrategy::Explicit);
        assert_eq!(roundtrip(p, "hello", Some(LengthMeta::TextBytes(5))), "hello");
        assert_eq!(roundtrip(p, "héllo", Some(LengthMeta::TextBytes(6))), "héllo");
        assert_eq!(roundtrip(p, "hi", Some(LengthMeta::Bits(16))), "hi");
    }

    #[test]
    fn explicit_emits_no_metadata() {
        let p = LengthProtocol::new(LengthStrategy::Explicit);
        let (_, meta) = p.prepare("abc").unwrap();
        assert_eq!(meta, LengthMeta::None);
    }

    #[test]
    fn explicit_requires_metadata() {
        let p = LengthProtocol::new(LengthStrategy::Explicit);
        assert!(matches!(p.expected_bits(&LengthMeta::None), Err(WatermarkError::MissingLength)));
    }

    #[test]
    fn echoed_returns_bit_count() {
        let p = LengthProtocol::new(LengthStrategy::Echoed);
        let (payload, meta) = p.prepare("watermark").unwrap();
        assert_eq!(meta, LengthMeta::Bits(72));
        assert_eq!(payload.bit_len(), 72);
        assert_eq!(roundtrip(p, "watermark", None), "watermark");
    }

    #[test]
    fn echoed_rejects_other_metadata() {
        let p = LengthProtocol::new(LengthStrategy::Echoed);
        assert!(matches!(p.expected_bits(&LengthMeta::None), Err(WatermarkError::MissingLength)));
        assert!(matches!(p.expected_bits(&LengthMeta::TextBytes(3)), Err(WatermarkError::InvalidLength(_))));
        assert!(matches!(
            p.expected_bits(&LengthMeta::Bits(13)),
            Err(WatermarkError::BitCountMismatch { expected: 16, actual: 13 })
        ));
    }

    #[test]
    fn fixed_padding_needs_nothing() {
        let p = LengthProtocol::new(LengthStrategy::default());
        assert_eq!(p.expected_bits(&LengthMeta::None).unwrap(), (2 + 64) * 8);
        assert_eq!(roundtrip(p, "hello", None), "hello");
        assert_eq!(roundtrip(p, "", None), "");
        assert!(matches!(p.expected_bits(&LengthMeta::Bits(8)), Err(WatermarkError::InvalidLength(_))));
    }

    #[test]
    fn fixed_padding_sentinel() {
        let p = LengthProtocol::new(LengthStrategy::FixedPadding { max_bytes: 16, framing: PadFraming::Sentinel(b'#') });
        assert_eq!(p.expected_bits(&LengthMeta::None).unwrap(), 128);
        assert_eq!(roundtrip(p, "tag-01", None), "tag-01");
        assert!(matches!(p.prepare("a#b"), Err(WatermarkError::SentinelInMessage(b'#'))));
    }

    #[test]
    fn fixed_padding_too_long() {
        let p = LengthProtocol::new(LengthStrategy::FixedPadding { max_bytes: 4, framing: PadFraming::LengthPrefix });
        assert!(matches!(p.prepare("hello"), Err(WatermarkError::MessageTooLong { bytes: 5, max: 4 })));
    }

    #[test]
    fn chars_try_every_utf8_length() {
        let p = LengthProtocol::new(LengthStrategy::Explicit);
        assert_eq!(p.candidate_bits(&LengthMeta::Chars(2)).unwrap(), vec![16, 24, 32, 40, 48, 56, 64]);
        assert_eq!(p.candidate_bits(&LengthMeta::Chars(0)).unwrap(), vec![0]);
        assert_eq!(p.candidate_bits(&LengthMeta::TextBytes(3)).unwrap(), vec![24]);
        assert!(matches!(p.expected_bits(&LengthMeta::Chars(2)), Err(WatermarkError::InvalidLength(_))));
    }

    #[test]
    fn chars_confirmed_against_decoded_text() {
        let p = LengthProtocol::new(LengthStrategy::Explicit);
        let (payload, _) = p.prepare("héllo").unwrap();
        assert!(p.confirms(&LengthMeta::Chars(5), payload.bits()));
        assert!(!p.confirms(&LengthMeta::Chars(6), payload.bits()));
        assert!(!p.confirms(&LengthMeta::Chars(2), &payload.bits()[..16]), "cut inside é");
        assert!(p.confirms(&LengthMeta::TextBytes(6), payload.bits()));
    }

    #[test]
    fn chars_only_for_explicit() {
        let echoed = LengthProtocol::new(LengthStrategy::Echoed);
        assert!(matches!(echoed.candidate_bits(&LengthMeta::Chars(3)), Err(WatermarkError::InvalidLength(_))));
        let fixed = LengthProtocol::new(LengthStrategy::default());
        assert!(matches!(fixed.candidate_bits(&LengthMeta::Chars(3)), Err(WatermarkError::InvalidLength(_))));
    }

    #[test]
    fn strategy_serde_tags() {
        let json = serde_json::to_string(&LengthStrategy::default()).unwrap();
        assert_eq!(json, r#"{"mode":"fixed_padding","max_bytes":64,"framing":"length_prefix"}"#);
        let meta: LengthMeta = serde_json::from_str(r#"{"bits":40}"#).unwrap();
        assert_eq!(meta, LengthMeta::Bits(40));
        assert_eq!(serde_json::to_string(&LengthMeta::Chars(7)).unwrap(), r#"{"chars":7}"#);
    }
}
