// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Blind text watermarking.
//!
//! The layers, bottom-up:
//!
//! - [`bits`]: text to framed bit sequence and back.
//! - [`keys`]: the `(password_img, password_wm)` pair and Argon2id seeds.
//! - [`permute`]: keyed slot selection and bit scrambling.
//! - [`capacity`]: slot grid and capacity checks.
//! - [`spreading`], [`embedding`], [`repetition`]: per-slot STDM and the
//!   soft-voted repetition code on top of it.
//! - [`engine`]: the [`WatermarkEngine`] trait and the block-DCT engine.
//! - [`protocol`]: how extraction learns the payload length.
//! - [`pipeline`]: the [`Watermarker`] façade over encoded image bytes.
//!
//! No layer keeps state between calls. Every request re-derives its keys
//! from the two integers.

pub mod bits;
pub mod capacity;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod keys;
pub mod permute;
mod pipeline;
pub mod protocol;
pub mod repetition;
pub mod spreading;
pub mod state;

pub use config::{ChannelSet, WatermarkConfig};
pub use engine::{DctQimEngine, WatermarkEngine};
pub use error::{ErrorKind, WatermarkError};
pub use keys::KeyPair;
pub use pipeline::{CapacityInfo, EmbedOutput, Watermarker};
pub use protocol::{LengthMeta, LengthProtocol, LengthStrategy};
