// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Scan tokenization and entropy coding.
//!
//! Blocks are visited in raster tile order and, within a tile, in component
//! order Y, Cb, Cr. Each block becomes a DC difference token followed by
//! run-length AC tokens. The same walk feeds either a [`CountingSink`]
//! (histograms for adaptive tables) or a [`CodingSink`] (Huffman codes into
//! a [`BitWriter`]).

use super::bitio::BitWriter;
use super::color::{Channel, ChannelClass};
use super::dct::DctGrid;
use super::error::{JpegError, Result};
use super::huffman::{build_huffman_spec, encode_value, HuffmanEncodeTable, LengthLimit, SymbolHistogram};
use super::tables::{HuffmanTableSet, TableClass};
use super::zigzag::ZigzagPath;

/// End of block.
pub const EOB: u8 = 0x00;
/// Sixteen zeros.
pub const ZRL: u8 = 0xF0;

/// Receiver of (symbol, additional bits) tokens.
pub trait SymbolSink {
    /// `bits` holds the low `size` additional bits; `size` is 0 when there
    /// are none.
    fn emit(&mut self, class: TableClass, channel: ChannelClass, symbol: u8, bits: u32, size: u8) -> Result<()>;
}

/// Histograms for luma DC/AC and chroma DC/AC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistogramSet {
    luma_dc: SymbolHistogram,
    luma_ac: SymbolHistogram,
    chroma_dc: SymbolHistogram,
    chroma_ac: SymbolHistogram,
}

impl HistogramSet {
    pub fn get(&self, class: TableClass, channel: ChannelClass) -> &SymbolHistogram {
        match (class, channel) {
            (TableClass::Dc, ChannelClass::Luma) => &self.luma_dc,
            (TableClass::Ac, ChannelClass::Luma) => &self.luma_ac,
            (TableClass::Dc, ChannelClass::Chroma) => &self.chroma_dc,
            (TableClass::Ac, ChannelClass::Chroma) => &self.chroma_ac,
        }
    }

    pub fn get_mut(&mut self, class: TableClass, channel: ChannelClass) -> &mut SymbolHistogram {
        match (class, channel) {
            (TableClass::Dc, ChannelClass::Luma) => &mut self.luma_dc,
            (TableClass::Ac, ChannelClass::Luma) => &mut self.luma_ac,
            (TableClass::Dc, ChannelClass::Chroma) => &mut self.chroma_dc,
            (TableClass::Ac, ChannelClass::Chroma) => &mut self.chroma_ac,
        }
    }

    /// Build one adaptive table per histogram.
    pub fn build_tables(&self, limit: LengthLimit) -> HuffmanTableSet {
        let build = |class, channel: ChannelClass| {
            build_huffman_spec(class, channel.table_id(), self.get(class, channel), limit)
        };
        HuffmanTableSet {
            luma_dc: build(TableClass::Dc, ChannelClass::Luma),
            luma_ac: build(TableClass::Ac, ChannelClass::Luma),
            chroma_dc: build(TableClass::Dc, ChannelClass::Chroma),
            chroma_ac: build(TableClass::Ac, ChannelClass::Chroma),
        }
    }
}

/// Counts symbols; additional bits are ignored.
#[derive(Debug, Default)]
pub struct CountingSink {
    histograms: HistogramSet,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_histograms(self) -> HistogramSet {
        self.histograms
    }
}

impl SymbolSink for CountingSink {
    fn emit(&mut self, class: TableClass, channel: ChannelClass, symbol: u8, _bits: u32, _size: u8) -> Result<()> {
        self.histograms.get_mut(class, channel).add(symbol);
        Ok(())
    }
}

/// Writes the canonical code of each symbol followed by its additional bits.
pub struct CodingSink {
    luma_dc: HuffmanEncodeTable,
    luma_ac: HuffmanEncodeTable,
    chroma_dc: HuffmanEncodeTable,
    chroma_ac: HuffmanEncodeTable,
    writer: BitWriter,
}

impl CodingSink {
    pub fn new(tables: &HuffmanTableSet) -> Result<Self> {
        Ok(Self {
            luma_dc: HuffmanEncodeTable::build(&tables.luma_dc)?,
            luma_ac: HuffmanEncodeTable::build(&tables.luma_ac)?,
            chroma_dc: HuffmanEncodeTable::build(&tables.chroma_dc)?,
            chroma_ac: HuffmanEncodeTable::build(&tables.chroma_ac)?,
            writer: BitWriter::new(),
        })
    }

    fn table(&self, class: TableClass, channel: ChannelClass) -> &HuffmanEncodeTable {
        match (class, channel) {
            (TableClass::Dc, ChannelClass::Luma) => &self.luma_dc,
            (TableClass::Ac, ChannelClass::Luma) => &self.luma_ac,
            (TableClass::Dc, ChannelClass::Chroma) => &self.chroma_dc,
            (TableClass::Ac, ChannelClass::Chroma) => &self.chroma_ac,
        }
    }

    /// Pad, stuff and return the entropy-coded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.writer.finish()
    }
}

impl SymbolSink for CodingSink {
    fn emit(&mut self, class: TableClass, channel: ChannelClass, symbol: u8, bits: u32, size: u8) -> Result<()> {
        let (code, len) = self.table(class, channel).encode(symbol)?;
        self.writer.write_bits(code as u32, len);
        if size > 0 {
            self.writer.write_bits(bits, size);
        }
        Ok(())
    }
}

/// Reorder every block of a natural-order grid into scan order.
pub fn to_scan_order(grid: &DctGrid, path: &ZigzagPath) -> Result<DctGrid> {
    if path.len() != grid.block_len() {
        return Err(JpegError::InvalidInput("zigzag path does not match block size"));
    }
    Ok(grid.map_blocks(|src, dst| {
        for (d, ni) in dst.iter_mut().zip(path.natural_indices()) {
            *d = src[ni];
        }
    }))
}

/// Emit the tokens of one scan-order block.
///
/// `pred` is the previous DC value of the same channel and is updated.
/// A ZRL is emitted each time the zero run reaches 16. EOB follows only if
/// the block ends with a partial run.
pub fn tokenize_block<S: SymbolSink>(zz: &[i32], pred: &mut i32, channel: ChannelClass, sink: &mut S) -> Result<()> {
    let diff = zz[0] - *pred;
    *pred = zz[0];
    let (bits, size) = encode_value(diff);
    sink.emit(TableClass::Dc, channel, size, bits, size)?;

    let mut run = 0u8;
    for &coeff in &zz[1..] {
        if coeff == 0 {
            run += 1;
            if run == 16 {
                sink.emit(TableClass::Ac, channel, ZRL, 0, 0)?;
                run = 0;
            }
            continue;
        }
        let (bits, size) = encode_value(coeff);
        sink.emit(TableClass::Ac, channel, (run << 4) | size, bits, size)?;
        run = 0;
    }
    if run > 0 {
        sink.emit(TableClass::Ac, channel, EOB, 0, 0)?;
    }
    Ok(())
}

/// Tokenize the three scan-order grids (Y, Cb, Cr) in raster tile order.
pub fn tokenize_scan<S: SymbolSink>(grids: &[DctGrid; 3], sink: &mut S) -> Result<()> {
    let total = grids[0].total_blocks();
    if grids.iter().any(|g| g.total_blocks() != total) {
        return Err(JpegError::InvalidInput("component grids differ in size"));
    }

    let mut preds = [0i32; 3];
    for index in 0..total {
        for channel in Channel::ALL {
            let c = channel as usize;
            tokenize_block(grids[c].block(index), &mut preds[c], channel.class(), sink)?;
        }
    }
    Ok(())
}
