// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Payloads exactly at capacity embed; one byte more is a capacity error.

mod common;

use common::{generate_message, photo_png, synthetic_photo};
use phasm_watermark::{
    DctQimEngine, ErrorKind, KeyPair, LengthMeta, LengthStrategy, OutputFormat, PadFraming, RasterImage,
    WatermarkConfig, WatermarkEngine, WatermarkError, Watermarker,
};

// 64×48 at 8×8 over three planes: 8 * 6 * 3 = 144 slots = 18 bytes.
const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;
const SLOTS: usize = 144;

fn watermarker(strategy: LengthStrategy) -> Watermarker {
    Watermarker::new(WatermarkConfig { length_strategy: strategy, output: OutputFormat::Png, ..Default::default() })
        .unwrap()
}

#[test]
fn reported_capacity() {
    let info = watermarker(LengthStrategy::Echoed).capacity(&photo_png(WIDTH, HEIGHT, 1)).unwrap();
    assert_eq!(info.slots, SLOTS);
    assert_eq!(info.max_text_bytes, SLOTS / 8);
}

#[test]
fn exact_capacity_succeeds() {
    let wm = watermarker(LengthStrategy::Echoed);
    let cover = photo_png(WIDTH, HEIGHT, 2);
    let keys = KeyPair::new(31, 41);
    let message = generate_message(SLOTS / 8);
    let out = wm.embed(&cover, &message, &keys).unwrap();
    assert_eq!(out.bit_len, SLOTS);
    assert_eq!(wm.extract(&out.image, &keys, &out.length).unwrap(), message);
}

#[test]
fn one_byte_over_fails() {
    let wm = watermarker(LengthStrategy::Echoed);
    let cover = photo_png(WIDTH, HEIGHT, 3);
    let err = wm.embed(&cover, &generate_message(SLOTS / 8 + 1), &KeyPair::new(31, 41)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Capacity);
    assert!(matches!(err, WatermarkError::CapacityExceeded { bits: 152, capacity: 144 }));
}

#[test]
fn extract_over_capacity_fails() {
    let wm = watermarker(LengthStrategy::Explicit);
    let cover = photo_png(WIDTH, HEIGHT, 4);
    let err = wm.extract(&cover, &KeyPair::new(1, 1), &LengthMeta::TextBytes(19)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Capacity);
}

#[test]
fn fixed_frame_at_capacity() {
    // Length prefix (2 bytes) + 16 bytes = 144 bits.
    let fits = watermarker(LengthStrategy::FixedPadding { max_bytes: 16, framing: PadFraming::LengthPrefix });
    let cover = photo_png(WIDTH, HEIGHT, 5);
    let keys = KeyPair::new(5, 5);
    let out = fits.embed(&cover, "short", &keys).unwrap();
    assert_eq!(fits.extract(&out.image, &keys, &LengthMeta::None).unwrap(), "short");

    let too_big = watermarker(LengthStrategy::FixedPadding { max_bytes: 17, framing: PadFraming::LengthPrefix });
    assert_eq!(too_big.embed(&cover, "short", &keys).unwrap_err().kind(), ErrorKind::Capacity);
    assert_eq!(too_big.capacity(&cover).unwrap().max_text_bytes, 0);
}

#[test]
fn engine_bit_boundary() {
    let img = synthetic_photo(WIDTH, HEIGHT, 6);
    let raster = RasterImage::from_rgb(WIDTH, HEIGHT, img.into_raw()).unwrap();
    let engine = DctQimEngine::default();
    let keys = KeyPair::new(8, 9);
    let bits: Vec<u8> = (0..SLOTS).map(|i| (i % 3 == 0) as u8).collect();

    let marked = engine.embed(&raster, &bits, &keys).unwrap();
    assert_eq!(engine.extract(&marked, SLOTS, &keys).unwrap(), bits);

    let mut over = bits.clone();
    over.push(1);
    assert!(matches!(
        engine.embed(&raster, &over, &keys),
        Err(WatermarkError::CapacityExceeded { bits: 145, capacity: 144 })
    ));
}

#[test]
fn tiny_image_has_no_capacity() {
    let wm = watermarker(LengthStrategy::Echoed);
    let cover = photo_png(7, 7, 7);
    assert_eq!(wm.capacity(&cover).unwrap().slots, 0);
    assert_eq!(wm.embed(&cover, "a", &KeyPair::new(1, 2)).unwrap_err().kind(), ErrorKind::Capacity);
    let out = wm.embed(&cover, "", &KeyPair::new(1, 2)).unwrap();
    assert_eq!(wm.extract(&out.image, &KeyPair::new(1, 2), &out.length).unwrap(), "");
}
