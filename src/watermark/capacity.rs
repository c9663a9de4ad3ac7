// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Embedding capacity.
//!
//! One payload bit occupies one slot: a single non-overlapping
//! `block_size`×`block_size` block in one channel plane. Partial blocks at
//! the right and bottom edges are never used. Capacity is therefore a pure
//! function of image dimensions, block size and channel count.

use crate::raster::ImageShape;

use super::error::WatermarkError;

/// A slot coordinate: one block in one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotCoord {
    pub channel: usize,
    pub block_row: usize,
    pub block_col: usize,
}

/// The grid of embeddable slots for one image shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGrid {
    blocks_wide: usize,
    blocks_tall: usize,
    channels: usize,
}

impl SlotGrid {
    pub fn new(shape: ImageShape, block_size: usize, channels: usize) -> Self {
        debug_assert!(block_size > 0);
        Self {
            blocks_wide: shape.width as usize / block_size,
            blocks_tall: shape.height as usize / block_size,
            channels,
        }
    }

    /// Total number of slots (= capacity in bits).
    pub fn total(&self) -> usize {
        self.blocks_wide * self.blocks_tall * self.channels
    }

    /// Flat index of a slot: channel-major, then block-raster order.
    pub fn flat_index(&self, coord: SlotCoord) -> usize {
        (coord.channel * self.blocks_tall + coord.block_row) * self.blocks_wide + coord.block_col
    }

    /// Inverse of [`SlotGrid::flat_index`].
    pub fn coord(&self, flat: usize) -> SlotCoord {
        debug_assert!(flat < self.total());
        let per_channel = self.blocks_wide * self.blocks_tall;
        let channel = flat / per_channel;
        let rem = flat % per_channel;
        SlotCoord {
            channel,
            block_row: rem / self.blocks_wide,
            block_col: rem % self.blocks_wide,
        }
    }
}

/// Maximum number of payload bits embeddable in an image of `shape`.
pub fn capacity(shape: ImageShape, block_size: usize, channels: usize) -> usize {
    SlotGrid::new(shape, block_size, channels).total()
}

/// Check that `bits` payload bits fit a grid of `capacity` slots.
///
/// `bits == capacity` fits.
pub fn check_fits(bits: usize, capacity: usize) -> Result<(), WatermarkError> {
    if bits > capacity {
        return Err(WatermarkError::CapacityExceeded { bits, capacity });
    }
    Ok(())
}
