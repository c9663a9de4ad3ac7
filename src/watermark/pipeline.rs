// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Request pipeline over encoded image bytes.
//!
//! [`Watermarker`] ties the length protocol to a [`WatermarkEngine`] and
//! runs every request through [`RequestTracker`]. Checks run cheapest
//! first: text framing and length metadata before the image is decoded,
//! capacity before any transform.

use crate::raster::RasterImage;

use super::capacity::check_fits;
use super::config::WatermarkConfig;
use super::engine::{DctQimEngine, WatermarkEngine};
use super::error::WatermarkError;
use super::keys::KeyPair;
use super::protocol::{LengthMeta, LengthProtocol, LengthStrategy};
use super::state::{Operation, RequestTracker};

/// Result of a successful embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedOutput {
    /// Watermarked image in the configured container.
    pub image: Vec<u8>,
    /// Length metadata for the caller to keep ([`LengthMeta::None`] unless
    /// the strategy is echoed).
    pub length: LengthMeta,
    /// Payload bits embedded (before repetition).
    pub bit_len: usize,
}

/// Capacity of one image under the active configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityInfo {
    pub width: u32,
    pub height: u32,
    /// Embeddable payload bits.
    pub slots: usize,
    /// Longest text (UTF-8 bytes) that fits. Zero when a fixed frame does
    /// not fit at all.
    pub max_text_bytes: usize,
}

/// Embeds and extracts text watermarks with one fixed configuration.
#[derive(Debug, Clone)]
pub struct Watermarker<E = DctQimEngine> {
    config: WatermarkConfig,
    protocol: LengthProtocol,
    engine: E,
}

impl Watermarker<DctQimEngine> {
    /// Watermarker with the block-DCT engine described by `config`.
    pub fn new(config: WatermarkConfig) -> Result<Self, WatermarkError> {
        let engine = DctQimEngine::from_config(&config);
        Self::with_engine(config, engine)
    }
}

impl Default for Watermarker<DctQimEngine> {
    fn default() -> Self {
        let config = WatermarkConfig::default();
        Self {
            protocol: LengthProtocol::new(config.length_strategy),
            engine: DctQimEngine::from_config(&config),
            config,
        }
    }
}

impl<E: WatermarkEngine> Watermarker<E> {
    /// Watermarker over a custom engine. Only the length strategy and
    /// output container of `config` apply to it.
    pub fn with_engine(config: WatermarkConfig, engine: E) -> Result<Self, WatermarkError> {
        config.validate()?;
        Ok(Self { protocol: LengthProtocol::new(config.length_strategy), config, engine })
    }

    pub fn config(&self) -> &WatermarkConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Embed `text` into the image in `image_bytes`.
    ///
    /// # Errors
    /// Validation errors for the text come first, then
    /// [`WatermarkError::InvalidImage`], then
    /// [`WatermarkError::CapacityExceeded`]. The engine may still fail with
    /// a codec error such as [`WatermarkError::EmbedUnverified`].
    pub fn embed(&self, image_bytes: &[u8], text: &str, keys: &KeyPair) -> Result<EmbedOutput, WatermarkError> {
        let mut tracker = RequestTracker::new(Operation::Embed);
        tracker.validate();
        let (payload, length) = tracker.check(self.protocol.prepare(text))?;
        let image = tracker.check(RasterImage::from_bytes(image_bytes))?;
        let capacity = self.engine.capacity(image.shape());
        log::debug!("payload {} bits, capacity {} slots", payload.bit_len(), capacity);
        tracker.check(check_fits(payload.bit_len(), capacity))?;

        tracker.transform();
        let marked = tracker.check(self.engine.embed(&image, payload.bits(), keys))?;
        let encoded = tracker.check(marked.encode(self.config.output))?;
        tracker.done();

        log::info!(
            "embedded {} bytes ({} bits) into {}x{} image",
            payload.bytes().len(),
            payload.bit_len(),
            image.width(),
            image.height()
        );
        Ok(EmbedOutput { image: encoded, length, bit_len: payload.bit_len() })
    }

    /// Extract the text embedded in `image_bytes`.
    ///
    /// `length` must match what the active strategy expects: the text
    /// length for explicit, the echoed bit count for echoed, nothing for
    /// fixed padding. Wrong keys are not detected and yield some other
    /// string.
    ///
    /// A [`LengthMeta::Chars`] count is resolved by extracting every UTF-8
    /// byte length it allows, shortest first, and keeping the first that
    /// decodes to that many characters. If none does, the shortest is
    /// returned.
    pub fn extract(&self, image_bytes: &[u8], keys: &KeyPair, length: &LengthMeta) -> Result<String, WatermarkError> {
        let mut tracker = RequestTracker::new(Operation::Extract);
        tracker.validate();
        let candidates = tracker.check(self.protocol.candidate_bits(length))?;
        let image = tracker.check(RasterImage::from_bytes(image_bytes))?;
        let capacity = self.engine.capacity(image.shape());
        tracker.check(check_fits(candidates.first().copied().unwrap_or(0), capacity))?;

        tracker.transform();
        let mut recovered: Option<Vec<u8>> = None;
        for &bit_count in candidates.iter().take_while(|&&bit_count| bit_count <= capacity) {
            let bits = tracker.check(self.engine.extract(&image, bit_count, keys))?;
            if self.protocol.confirms(length, &bits) {
                recovered = Some(bits);
                break;
            }
            recovered.get_or_insert(bits);
        }
        let bits = recovered.unwrap_or_default();
        let text = tracker.check(self.protocol.recover(&bits))?;
        tracker.done();

        log::info!("extracted {} bits from {}x{} image", bits.len(), image.width(), image.height());
        Ok(text)
    }

    /// Report the capacity of the image in `image_bytes`.
    pub fn capacity(&self, image_bytes: &[u8]) -> Result<CapacityInfo, WatermarkError> {
        let image = RasterImage::from_bytes(image_bytes)?;
        let slots = self.engine.capacity(image.shape());
        let max_text_bytes = match self.protocol.strategy() {
            LengthStrategy::Explicit | LengthStrategy::Echoed => slots / 8,
            LengthStrategy::FixedPadding { max_bytes, .. } => match self.protocol.bit_mode().fixed_bits() {
                Some(frame_bits) if frame_bits <= slots => max_bytes,
                _ => 0,
            },
        };
        Ok(CapacityInfo { width: image.width(), height: image.height(), slots, max_text_bytes })
    }
}
