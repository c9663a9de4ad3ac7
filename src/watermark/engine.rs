// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Transform-domain embedder.
//!
//! [`WatermarkEngine`] is the seam between the request pipeline and the
//! signal processing. The pipeline hands it a decoded raster and a framed
//! bit sequence; the engine owns everything from scrambling to pixel
//! write-back.
//!
//! [`DctQimEngine`] embed flow:
//! 1. Scramble the bits with `password_wm`.
//! 2. Repeat the scrambled bits `r` times to fill spare slots.
//! 3. Pick `r * n` slots with `password_img`.
//! 4. For every slot: DCT the block, STDM-embed one bit, inverse DCT.
//! 5. Write blocks back and convert YCbCr to RGB.
//! 6. Settle: re-read the clamped raster, give blocks that lost their bit
//!    to clipping room toward mid-gray and embed them again.
//! 7. Verify that the final raster votes back to the scrambled bits.
//!
//! Extraction mirrors steps 1-5 with soft LLRs and a majority vote before
//! unscrambling. Block work runs on rayon when the `parallel` feature is
//! enabled; results are collected in slot order and written back
//! sequentially, so the output is identical either way.

use std::collections::BTreeSet;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::raster::color::YccPlanes;
use crate::raster::dct::BlockDct;
use crate::raster::{ImageShape, RasterImage};

use super::capacity::{check_fits, SlotCoord, SlotGrid};
use super::config::{ChannelSet, WatermarkConfig};
use super::embedding::{channel_step, embedding_band, stdm_embed, stdm_extract_soft};
use super::error::WatermarkError;
use super::keys::{derive_placement_key, split_placement_key, KeyPair};
use super::permute::{locations_from_seed, scramble, unscramble};
use super::repetition::{compute_r, repetition_decode_soft, repetition_encode};
use super::spreading::{spreading_vector, SPREAD_LEN};

/// Re-embed passes after the first clamp.
const SETTLE_ROUNDS: usize = 4;

/// Largest |Cb|/|Cr| → RGB gain of the JFIF matrix (Cb into blue).
const CHROMA_RGB_GAIN: f64 = 1.772;

/// Embeds and extracts a bit sequence in a raster image.
pub trait WatermarkEngine {
    /// Number of bit slots an image of `shape` offers.
    fn capacity(&self, shape: ImageShape) -> usize;

    /// Embed `bits` (one bit per element) into a copy of `image`.
    fn embed(&self, image: &RasterImage, bits: &[u8], keys: &KeyPair) -> Result<RasterImage, WatermarkError>;

    /// Recover `bit_count` bits from `image`.
    ///
    /// Wrong keys are not detected; they yield arbitrary bits.
    fn extract(&self, image: &RasterImage, bit_count: usize, keys: &KeyPair) -> Result<Vec<u8>, WatermarkError>;
}

/// Keyed slot layout shared by embed and extract.
struct Placement {
    grid: SlotGrid,
    slots: Vec<SlotCoord>,
    spread_seed: [u8; 32],
    band: [usize; SPREAD_LEN],
}

/// Block-DCT STDM engine.
#[derive(Debug, Clone)]
pub struct DctQimEngine {
    dct: BlockDct,
    step: f64,
    chroma_ratio: f64,
    channels: ChannelSet,
}

impl DctQimEngine {
    pub fn new(block_size: usize, step: f64, chroma_ratio: f64, channels: ChannelSet) -> Self {
        Self { dct: BlockDct::new(block_size), step, chroma_ratio, channels }
    }

    pub fn from_config(config: &WatermarkConfig) -> Self {
        Self::new(config.block_size, config.step, config.chroma_ratio, config.channels)
    }

    fn grid(&self, shape: ImageShape) -> SlotGrid {
        SlotGrid::new(shape, self.dct.size(), self.channels.count())
    }

    /// Slot order and spreading seed for `n` slots.
    fn placement(&self, password_img: i64, n: usize, grid: SlotGrid) -> Result<Placement, WatermarkError> {
        let key = derive_placement_key(password_img);
        let (perm_seed, spread_seed) = split_placement_key(&key);
        let map = locations_from_seed(&perm_seed, n, &grid)?;
        Ok(Placement { grid, slots: map.as_slice().to_vec(), spread_seed, band: embedding_band(self.dct.size()) })
    }

    fn slot_step(&self, coord: &SlotCoord) -> f64 {
        channel_step(self.step, self.chroma_ratio, coord.channel)
    }

    /// Worst-case RGB change one embed can cause in a block.
    ///
    /// A unit spreading vector over orthonormal basis functions moves a
    /// pixel by at most `sqrt(SPREAD_LEN) * 2 / n` per unit of projection,
    /// and the projection moves by at most half a step. Luma reaches RGB
    /// unscaled, chroma through the JFIF gains.
    fn clip_headroom(&self) -> f64 {
        let peak = (SPREAD_LEN as f64).sqrt() * 2.0 / self.dct.size() as f64;
        let luma = self.step / 2.0 * peak;
        match self.channels {
            ChannelSet::Luma => luma,
            ChannelSet::All => luma + CHROMA_RGB_GAIN * self.step * self.chroma_ratio / 2.0 * peak,
        }
    }

    /// New pixel block for one slot carrying `bit`.
    fn embed_slot(&self, planes: &YccPlanes, placement: &Placement, coord: &SlotCoord, bit: u8) -> Vec<f64> {
        let n = self.dct.size();
        let block = planes.plane(coord.channel).read_block(coord.block_row, coord.block_col, n);
        let mut coeffs = self.dct.forward(&block);
        let v = spreading_vector(&placement.spread_seed, placement.grid.flat_index(*coord));
        stdm_embed(&mut coeffs, &placement.band, &v, bit, self.slot_step(coord));
        self.dct.inverse(&coeffs)
    }

    fn slot_llr(&self, planes: &YccPlanes, placement: &Placement, coord: &SlotCoord) -> f64 {
        let block = planes.plane(coord.channel).read_block(coord.block_row, coord.block_col, self.dct.size());
        let coeffs = self.dct.forward(&block);
        let v = spreading_vector(&placement.spread_seed, placement.grid.flat_index(*coord));
        stdm_extract_soft(&coeffs, &placement.band, &v, self.slot_step(coord))
    }

    /// Embed `stream[i]` into `placement.slots[i]` for every `i` in `jobs`.
    fn embed_slots(&self, planes: &mut YccPlanes, placement: &Placement, stream: &[u8], jobs: &[usize]) {
        let n = self.dct.size();
        let source: &YccPlanes = planes;
        let embed_job = |&i: &usize| self.embed_slot(source, placement, &placement.slots[i], stream[i]);

        #[cfg(feature = "parallel")]
        let blocks: Vec<Vec<f64>> = jobs.par_iter().map(embed_job).collect();
        #[cfg(not(feature = "parallel"))]
        let blocks: Vec<Vec<f64>> = jobs.iter().map(embed_job).collect();

        for (&i, block) in jobs.iter().zip(&blocks) {
            let coord = placement.slots[i];
            planes.plane_mut(coord.channel).write_block(coord.block_row, coord.block_col, n, block);
        }
    }

    /// Soft LLR of every placed slot, in slot order.
    fn slot_llrs(&self, planes: &YccPlanes, placement: &Placement) -> Vec<f64> {
        let slot_llr = |coord: &SlotCoord| self.slot_llr(planes, placement, coord);

        #[cfg(feature = "parallel")]
        let llrs: Vec<f64> = placement.slots.par_iter().map(slot_llr).collect();
        #[cfg(not(feature = "parallel"))]
        let llrs: Vec<f64> = placement.slots.iter().map(slot_llr).collect();
        llrs
    }

    /// Block positions whose slot no longer holds its bit with margin.
    fn clipped_blocks(&self, llrs: &[f64], placement: &Placement, stream: &[u8]) -> BTreeSet<(usize, usize)> {
        placement
            .slots
            .iter()
            .zip(llrs)
            .zip(stream)
            .filter(|&((coord, &llr), &bit)| {
                let held = if bit == 0 { llr } else { -llr };
                held < self.slot_step(coord) / 4.0
            })
            .map(|((coord, _), _)| (coord.block_row, coord.block_col))
            .collect()
    }

    /// Clamp the embedded planes to RGB and repair what clamping broke.
    ///
    /// Each round re-reads the rounded, clamped raster. Blocks with a weak
    /// or flipped slot are contracted toward mid-gray by just enough for a
    /// worst-case embed to stay in range, then every slot in them is
    /// embedded again.
    fn settle(&self, mut planes: YccPlanes, placement: &Placement, stream: &[u8]) -> RasterImage {
        let n = self.dct.size();
        let headroom = self.clip_headroom();
        let mut marked = planes.to_raster();

        for round in 1..=SETTLE_ROUNDS {
            let settled = YccPlanes::from_raster(&marked);
            let clipped = self.clipped_blocks(&self.slot_llrs(&settled, placement), placement, stream);
            if clipped.is_empty() {
                break;
            }
            log::debug!("settle round {}: re-embedding {} clipped blocks", round, clipped.len());

            planes = settled;
            for &(br, bc) in &clipped {
                planes.contract_block(br, bc, n, headroom);
            }
            let jobs: Vec<usize> = (0..placement.slots.len())
                .filter(|&i| clipped.contains(&(placement.slots[i].block_row, placement.slots[i].block_col)))
                .collect();
            self.embed_slots(&mut planes, placement, stream, &jobs);
            marked = planes.to_raster();
        }
        marked
    }
}

impl Default for DctQimEngine {
    fn default() -> Self {
        Self::from_config(&WatermarkConfig::default())
    }
}

impl WatermarkEngine for DctQimEngine {
    fn capacity(&self, shape: ImageShape) -> usize {
        self.grid(shape).total()
    }

    /// # Errors
    /// [`WatermarkError::EmbedUnverified`] if the clamped result does not
    /// read back as `bits`.
    fn embed(&self, image: &RasterImage, bits: &[u8], keys: &KeyPair) -> Result<RasterImage, WatermarkError> {
        let grid = self.grid(image.shape());
        check_fits(bits.len(), grid.total())?;

        let scrambled = scramble(keys.password_wm, bits);
        let r = compute_r(bits.len(), grid.total());
        let stream = repetition_encode(&scrambled, r);
        let placement = self.placement(keys.password_img, stream.len(), grid)?;
        log::debug!(
            "embedding {} bits x{} into {} of {} slots ({}x{} blocks)",
            bits.len(),
            r,
            placement.slots.len(),
            grid.total(),
            self.dct.size(),
            self.dct.size()
        );

        let mut planes = YccPlanes::from_raster(image);
        let all: Vec<usize> = (0..stream.len()).collect();
        self.embed_slots(&mut planes, &placement, &stream, &all);
        let marked = self.settle(planes, &placement, &stream);

        let llrs = self.slot_llrs(&YccPlanes::from_raster(&marked), &placement);
        let (voted, _) = repetition_decode_soft(&llrs, bits.len());
        let flipped = voted.iter().zip(&scrambled).filter(|(a, b)| a != b).count();
        if flipped > 0 {
            return Err(WatermarkError::EmbedUnverified { flipped, bits: bits.len() });
        }
        Ok(marked)
    }

    fn extract(&self, image: &RasterImage, bit_count: usize, keys: &KeyPair) -> Result<Vec<u8>, WatermarkError> {
        let grid = self.grid(image.shape());
        check_fits(bit_count, grid.total())?;

        let r = compute_r(bit_count, grid.total());
        let placement = self.placement(keys.password_img, bit_count * r, grid)?;
        let llrs = self.slot_llrs(&YccPlanes::from_raster(image), &placement);

        let (voted, quality) = repetition_decode_soft(&llrs, bit_count);
        log::debug!(
            "extracted {} bits x{}: avg |llr| {:.2}, copy disagreement {:.3}",
            bit_count,
            r,
            quality.avg_abs_llr_per_copy,
            quality.copy_disagreement
        );
        Ok(unscramble(keys.password_wm, &voted))
    }
}
