// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Watermarker configuration.
//!
//! One [`WatermarkConfig`] describes a deployment: the length strategy, the
//! transform parameters and the output container. Embed and extract must run
//! with the same configuration; nothing in the image records it.

use serde::{Deserialize, Serialize};

use crate::raster::OutputFormat;

use super::bits::{PadFraming, MAX_PREFIXED_BYTES};
use super::embedding::{DEFAULT_CHROMA_RATIO, DEFAULT_STEP};
use super::error::WatermarkError;
use super::protocol::LengthStrategy;

/// Default DCT block edge length.
pub const DEFAULT_BLOCK_SIZE: usize = 8;

/// Supported DCT block edge lengths.
pub const SUPPORTED_BLOCK_SIZES: [usize; 3] = [4, 8, 16];

/// Which YCbCr planes carry slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSet {
    /// Luma only.
    Luma,
    /// Luma and both chroma planes.
    #[default]
    All,
}

impl ChannelSet {
    pub fn count(self) -> usize {
        match self {
            Self::Luma => 1,
            Self::All => 3,
        }
    }
}

/// Complete watermarker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    /// How extraction learns the payload bit length.
    pub length_strategy: LengthStrategy,
    /// DCT block edge length (4, 8 or 16).
    pub block_size: usize,
    /// QIM step on luma projections. Larger survives harsher recompression
    /// and distorts more.
    pub step: f64,
    /// Chroma step as a fraction of `step`.
    pub chroma_ratio: f64,
    /// Planes used for embedding.
    pub channels: ChannelSet,
    /// Container for the watermarked image.
    pub output: OutputFormat,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            length_strategy: LengthStrategy::default(),
            block_size: DEFAULT_BLOCK_SIZE,
            step: DEFAULT_STEP,
            chroma_ratio: DEFAULT_CHROMA_RATIO,
            channels: ChannelSet::default(),
            output: OutputFormat::default(),
        }
    }
}

impl WatermarkConfig {
    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, WatermarkError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| WatermarkError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the codec cannot run with.
    pub fn validate(&self) -> Result<(), WatermarkError> {
        if !SUPPORTED_BLOCK_SIZES.contains(&self.block_size) {
            return Err(WatermarkError::InvalidConfig(format!(
                "block_size must be one of {SUPPORTED_BLOCK_SIZES:?}, got {}",
                self.block_size
            )));
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(WatermarkError::InvalidConfig(format!("step must be positive, got {}", self.step)));
        }
        if !self.chroma_ratio.is_finite() || self.chroma_ratio <= 0.0 || self.chroma_ratio > 2.0 {
            return Err(WatermarkError::InvalidConfig(format!(
                "chroma_ratio must be in (0, 2], got {}",
                self.chroma_ratio
            )));
        }
        if let LengthStrategy::FixedPadding { max_bytes, framing } = self.length_strategy {
            if max_bytes == 0 {
                return Err(WatermarkError::InvalidConfig("max_bytes must be at least 1".into()));
            }
            if framing == PadFraming::LengthPrefix && max_bytes > MAX_PREFIXED_BYTES {
                return Err(WatermarkError::InvalidConfig(format!(
                    "max_bytes {max_bytes} exceeds the length prefix limit {MAX_PREFIXED_BYTES}"
                )));
            }
        }
        if let OutputFormat::Jpeg { quality } = self.output {
            if !(1..=100).contains(&quality) {
                return Err(WatermarkError::InvalidConfig(format!("JPEG quality must be 1-100, got {quality}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = WatermarkConfig::default();
        config.validate().unwrap();
        assert_eq!(config.block_size, 8);
        assert_eq!(
            config.length_strategy,
            LengthStrategy::FixedPadding { max_bytes: 64, framing: PadFraming::LengthPrefix }
        );
        assert_eq!(config.output, OutputFormat::Jpeg { quality: 95 });
    }

    #[test]
    fn rejects_bad_block_size() {
        let config = WatermarkConfig { block_size: 6, ..Default::default() };
        assert!(matches!(config.validate(), Err(WatermarkError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_bad_step() {
        for step in [0.0, -1.0, f64::NAN] {
            let config = WatermarkConfig { step, ..Default::default() };
            assert!(config.validate().is_err(), "step={step}");
        }
    }

    #[test]
    fn rejects_oversized_prefix() {
        let config = WatermarkConfig {
            length_strategy: LengthStrategy::FixedPadding {
                max_bytes: 70_000,
                framing: PadFraming::LengthPrefix,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let sentinel = WatermarkConfig {
            length_strategy: LengthStrategy::FixedPadding { max_bytes: 70_000, framing: PadFraming::Sentinel(0) },
            ..Default::default()
        };
        assert!(sentinel.validate().is_ok());
    }

    #[test]
    fn json_partial_uses_defaults() {
        let config = WatermarkConfig::from_json(r#"{ "block_size": 4, "length_strategy": { "mode": "echoed" } }"#).unwrap();
        assert_eq!(config.block_size, 4);
        assert_eq!(config.length_strategy, LengthStrategy::Echoed);
        assert_eq!(config.step, DEFAULT_STEP);
    }

    #[test]
    fn json_fixed_padding_with_sentinel() {
        let json = r#"{
            "length_strategy": { "mode": "fixed_padding", "max_bytes": 32, "framing": { "sentinel": 35 } },
            "output": { "format": "png" },
            "channels": "luma"
        }"#;
        let config = WatermarkConfig::from_json(json).unwrap();
        assert_eq!(
            config.length_strategy,
            LengthStrategy::FixedPadding { max_bytes: 32, framing: PadFraming::Sentinel(b'#') }
        );
        assert_eq!(config.output, OutputFormat::Png);
        assert_eq!(config.channels, ChannelSet::Luma);
    }

    #[test]
    fn json_roundtrip() {
        let config = WatermarkConfig { step: 40.0, ..Default::default() };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(WatermarkConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn json_errors_are_config_errors() {
        let result = WatermarkConfig::from_json("{ not json");
        assert!(matches!(result, Err(WatermarkError::InvalidConfig(_))));
        let result = WatermarkConfig::from_json(r#"{ "block_size": 5 }"#);
        assert!(matches!(result, Err(WatermarkError::InvalidConfig(_))));
    }
}
