// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Container layout tests: read produced files back segment by segment.

use baseline_jpeg::jpeg::frame::FrameHeader;
use baseline_jpeg::jpeg::marker::{entropy_data, read_segments, ScanHeader, DHT, DQT, SOF0, SOS};
use baseline_jpeg::jpeg::huffman::LengthLimit;
use baseline_jpeg::jpeg::tables::{
    parse_dht, parse_dqt, HuffmanSpec, HuffmanTableSet, STD_CHROMA_QUANT, STD_LUMA_QUANT,
};
use baseline_jpeg::jpeg::zigzag::ZigzagPath;
use baseline_jpeg::{encode, EncodeOptions, JpegError, PixelGrid, QuantTable};

fn noise_image(width: usize, height: usize, seed: u32) -> Vec<u8> {
    // xorshift32
    let mut state = seed.max(1);
    (0..width * height * 3)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

fn quant_tables(jpeg: &[u8]) -> Vec<(u8, QuantTable)> {
    let path = ZigzagPath::for_block_size(8);
    let (segments, _) = read_segments(jpeg).unwrap();
    segments
        .iter()
        .filter(|s| s.marker == DQT)
        .flat_map(|s| parse_dqt(&s.data, &path).unwrap())
        .collect()
}

fn huffman_tables(jpeg: &[u8]) -> Vec<HuffmanSpec> {
    let (segments, _) = read_segments(jpeg).unwrap();
    segments
        .iter()
        .filter(|s| s.marker == DHT)
        .flat_map(|s| parse_dht(&s.data).unwrap())
        .collect()
}

/// The code-space check libjpeg runs when it loads a DHT: after each length
/// the next free code must still fit, so no all-ones code is in use.
fn libjpeg_accepts(spec: &HuffmanSpec) -> bool {
    let mut code = 0u32;
    for length in 1..=16 {
        code += spec.bits[length - 1] as u32;
        if code >= 1 << length {
            return false;
        }
        code <<= 1;
    }
    true
}

#[test]
fn standard_layout_reads_back() {
    let data = noise_image(32, 16, 7);
    let grid = PixelGrid::new(&data, 32, 16).unwrap();
    let jpeg = encode(&grid, &EncodeOptions::standard()).unwrap();
    let (segments, _) = read_segments(&jpeg).unwrap();

    assert_eq!(quant_tables(&jpeg), vec![(0, STD_LUMA_QUANT.clone()), (1, STD_CHROMA_QUANT.clone())]);

    let sof = segments.iter().find(|s| s.marker == SOF0).unwrap();
    assert_eq!(FrameHeader::parse(&sof.data).unwrap(), FrameHeader::baseline(32, 16).unwrap());

    let dht: Vec<_> = segments
        .iter()
        .filter(|s| s.marker == DHT)
        .flat_map(|s| parse_dht(&s.data).unwrap())
        .collect();
    let standard = HuffmanTableSet::standard();
    let expected: Vec<_> = standard.in_dht_order().into_iter().cloned().collect();
    assert_eq!(dht, expected);

    let sos = segments.iter().find(|s| s.marker == SOS).unwrap();
    assert_eq!(ScanHeader::parse(&sos.data).unwrap(), ScanHeader::baseline());
    assert_eq!(sos.data, vec![3, 1, 0x00, 2, 0x11, 3, 0x11, 0x00, 0x3F, 0x00]);
}

#[test]
fn adaptive_tables_read_back() {
    let data = noise_image(64, 64, 99);
    let grid = PixelGrid::new(&data, 64, 64).unwrap();
    let jpeg = encode(&grid, &EncodeOptions::adaptive_quantization(1.0)).unwrap();
    let tables = quant_tables(&jpeg);
    assert_eq!(tables.len(), 2);
    for (_, table) in &tables {
        assert!(table.values().iter().all(|&v| (5..512).contains(&v)));
    }
}

#[test]
fn flat_image_uses_16bit_quantization() {
    // All AC samples are zero, so every AC divisor reaches 511.
    let data = vec![90u8; 16 * 16 * 3];
    let grid = PixelGrid::new(&data, 16, 16).unwrap();
    let jpeg = encode(&grid, &EncodeOptions::adaptive_quantization(1.0)).unwrap();
    let (segments, _) = read_segments(&jpeg).unwrap();
    let dqt: Vec<_> = segments.iter().filter(|s| s.marker == DQT).collect();
    assert_eq!(dqt[0].data[0], 0x10);
    assert_eq!(dqt[1].data[0], 0x11);
    assert_eq!(dqt[0].data.len(), 1 + 128);
    let tables = quant_tables(&jpeg);
    assert_eq!(tables[0].1.values()[63], 511);
}

#[test]
fn entropy_stream_is_stuffed() {
    let data = noise_image(64, 64, 12345);
    let grid = PixelGrid::new(&data, 64, 64).unwrap();
    for options in [EncodeOptions::standard(), EncodeOptions::adaptive_huffman()] {
        let jpeg = encode(&grid, &options).unwrap();
        let entropy = entropy_data(&jpeg).unwrap();
        assert!(!entropy.is_empty());
        let mut i = 0;
        while i < entropy.len() {
            if entropy[i] == 0xFF {
                assert_eq!(entropy.get(i + 1), Some(&0x00), "unstuffed 0xFF at {i}");
                i += 2;
            } else {
                i += 1;
            }
        }
    }
}

#[test]
fn adaptive_huffman_is_not_larger() {
    // Mostly flat image with a few edges: a heavily skewed symbol distribution.
    let (w, h) = (128, 128);
    let mut data = vec![200u8; w * h * 3];
    for y in 40..48 {
        for x in 0..w {
            let i = (y * w + x) * 3;
            data[i..i + 3].copy_from_slice(&[20, 40, 160]);
        }
    }
    let grid = PixelGrid::new(&data, w, h).unwrap();
    let standard = encode(&grid, &EncodeOptions::standard()).unwrap();
    let adaptive = encode(&grid, &EncodeOptions::adaptive_huffman()).unwrap();
    assert!(
        adaptive.len() <= standard.len(),
        "adaptive {} > standard {}",
        adaptive.len(),
        standard.len()
    );
}

#[test]
fn adaptive_huffman_tables_load_in_libjpeg() {
    let mut flat = vec![128u8; 64 * 64 * 3];
    flat[..300].fill(0);
    for (data, (w, h)) in [
        (noise_image(32, 32, 5), (32, 32)),
        (noise_image(64, 48, 77), (64, 48)),
        (flat, (64, 64)),
    ] {
        let grid = PixelGrid::new(&data, w, h).unwrap();
        for limit in [LengthLimit::Clamp, LengthLimit::Rebalance] {
            let options = EncodeOptions::adaptive_huffman().with_length_limit(limit);
            let jpeg = match encode(&grid, &options) {
                Ok(jpeg) => jpeg,
                Err(JpegError::HuffmanCodeOverflow { .. }) if limit == LengthLimit::Clamp => continue,
                Err(e) => panic!("{e}"),
            };
            let tables = huffman_tables(&jpeg);
            assert_eq!(tables.len(), 4);
            for spec in &tables {
                assert!(
                    libjpeg_accepts(spec),
                    "DHT {:02X} bits {:?} in {w}x{h}",
                    spec.tc_th(),
                    spec.bits
                );
            }
        }
    }
}

#[test]
fn standard_huffman_tables_load_in_libjpeg() {
    let standard = HuffmanTableSet::standard();
    assert!(standard.in_dht_order().into_iter().all(libjpeg_accepts));
}
