// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Stage-by-stage run of a single flat tile through the encoder pipeline.

use baseline_jpeg::jpeg::color::{rgb_to_ycbcr, Channel, ChannelClass, ColorPlanes};
use baseline_jpeg::jpeg::dct::BlockTransform;
use baseline_jpeg::jpeg::error::Result;
use baseline_jpeg::jpeg::huffman::extend_sign;
use baseline_jpeg::jpeg::quant::quantize_grid;
use baseline_jpeg::jpeg::scan::{to_scan_order, tokenize_scan, SymbolSink, EOB, ZRL};
use baseline_jpeg::jpeg::tables::TableClass;
use baseline_jpeg::jpeg::zigzag::ZigzagPath;
use baseline_jpeg::{DctGrid, PixelGrid, QuantTable};

#[derive(Default)]
struct Recorder(Vec<(TableClass, ChannelClass, u8, u32, u8)>);

impl SymbolSink for Recorder {
    fn emit(&mut self, class: TableClass, channel: ChannelClass, symbol: u8, bits: u32, size: u8) -> Result<()> {
        self.0.push((class, channel, symbol, bits, size));
        Ok(())
    }
}

fn scan_grids(rgb: [u8; 3]) -> [DctGrid; 3] {
    let data: Vec<u8> = rgb.iter().copied().cycle().take(64 * 3).collect();
    let grid = PixelGrid::new(&data, 8, 8).unwrap();
    let planes = ColorPlanes::from_grid(&grid, 8, 8);
    let transform = BlockTransform::new(8);
    let unit = QuantTable::new([1; 64]).unwrap();
    let path = ZigzagPath::for_block_size(8);
    Channel::ALL.map(|channel| {
        let raw = transform.transform_plane(planes.plane(channel), 8, 8);
        let quantized = quantize_grid(&raw, &unit).unwrap();
        to_scan_order(&quantized, &path).unwrap()
    })
}

#[test]
fn flat_tile_is_dc_only() {
    let rgb = [200, 100, 50];
    let color = rgb_to_ycbcr(rgb[0], rgb[1], rgb[2]);
    let expected_dc = [color.y, color.cb, color.cr].map(|v| (8.0 * (v - 128.0)).round() as i32);
    // Y = 128.7, Cb = 91.25, Cr = 175.45
    assert_eq!(expected_dc, [6, -294, 380]);

    let grids = scan_grids(rgb);
    for (grid, &dc) in grids.iter().zip(&expected_dc) {
        assert_eq!(grid.total_blocks(), 1);
        let block = grid.block(0);
        assert_eq!(block[0], dc);
        assert!(block[1..].iter().all(|&c| c == 0), "{block:?}");
    }

    let mut sink = Recorder::default();
    tokenize_scan(&grids, &mut sink).unwrap();
    // Per channel: DC, ZRL x3 (48 zeros), EOB (15 zeros).
    assert_eq!(sink.0.len(), 3 * 5);

    for (tokens, (channel, &dc)) in sink.0.chunks(5).zip(Channel::ALL.iter().zip(&expected_dc)) {
        let (class, table, size, bits, extra) = tokens[0];
        assert_eq!(class, TableClass::Dc);
        assert_eq!(table, channel.class());
        assert_eq!(size, extra);
        // First block: predictor is 0, so the difference is the value itself.
        assert_eq!(extend_sign(bits as u16, size), dc);

        let ac: Vec<u8> = tokens[1..]
            .iter()
            .inspect(|t| assert_eq!((t.0, t.1, t.3, t.4), (TableClass::Ac, channel.class(), 0, 0)))
            .map(|t| t.2)
            .collect();
        assert_eq!(ac, vec![ZRL, ZRL, ZRL, EOB]);
    }
    assert_eq!(sink.0.iter().filter(|t| t.0 == TableClass::Ac && t.2 == EOB).count(), 3);
}

#[test]
fn gray_tile_has_zero_dc() {
    // Y = 0.919 * 119 + 16 = 125.361, chroma stays at 128.
    let grids = scan_grids([119, 119, 119]);
    assert_eq!(grids[0].block(0)[0], (8.0f64 * (125.361 - 128.0)).round() as i32);
    assert_eq!(grids[1].block(0)[0], 0);
    assert_eq!(grids[2].block(0)[0], 0);
    for grid in &grids {
        assert!(grid.block(0)[1..].iter().all(|&c| c == 0));
    }
}
