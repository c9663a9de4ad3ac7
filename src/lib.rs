// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # phasm-watermark
//!
//! Blind text watermarking for raster images. A short UTF-8 text is hidden
//! in the block-DCT domain of an image under two integer passwords and can
//! be read back from the watermarked image alone:
//!
//! - `password_img` chooses which blocks carry the bits.
//! - `password_wm` scrambles the bit values.
//!
//! Each bit is embedded with STDM (Spread Transform Dither Modulation) on a
//! low-frequency coefficient band and repeated across spare blocks, so the
//! mark survives JPEG recompression at quality 75 and above.
//!
//! There is no authentication: extracting with the wrong passwords returns
//! a meaningless string, not an error.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use phasm_watermark::{embed_watermark, extract_watermark};
//!
//! let photo = std::fs::read("photo.png").unwrap();
//! let marked = embed_watermark(&photo, "owner: alice", 1234, 5678).unwrap();
//! let text = extract_watermark(&marked, 1234, 5678).unwrap();
//! assert_eq!(text, "owner: alice");
//! ```

pub mod raster;
pub mod watermark;

pub use raster::{ImageShape, OutputFormat, RasterImage};
pub use watermark::bits::PadFraming;
pub use watermark::{CapacityInfo, ChannelSet, DctQimEngine, EmbedOutput, WatermarkConfig, WatermarkEngine, Watermarker};
pub use watermark::{ErrorKind, KeyPair, LengthMeta, LengthStrategy, WatermarkError};

/// Embed `text` with the default configuration (64-byte fixed frame with a
/// length prefix, JPEG quality 95 output).
pub fn embed_watermark(
    image_bytes: &[u8],
    text: &str,
    password_img: i64,
    password_wm: i64,
) -> Result<Vec<u8>, WatermarkError> {
    let keys = KeyPair::new(password_img, password_wm);
    Watermarker::default().embed(image_bytes, text, &keys).map(|out| out.image)
}

/// Extract text embedded by [`embed_watermark`].
pub fn extract_watermark(image_bytes: &[u8], password_img: i64, password_wm: i64) -> Result<String, WatermarkError> {
    let keys = KeyPair::new(password_img, password_wm);
    Watermarker::default().extract(image_bytes, &keys, &LengthMeta::None)
}
