// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Huffman table construction and canonical coding.
//!
//! Adaptive tables are built from a 256-bin [`SymbolHistogram`] by repeatedly
//! merging the two lowest-frequency nodes into an owned binary tree. Leaf
//! depth becomes the code length. Symbols are listed by ascending length and,
//! within a length, in left-first tree order, which is exactly the DHT
//! payload layout. Canonical codes are then assigned per ITU-T T.81 Annex C.
//!
//! The tree always carries one reserved leaf that is merged first, so it sits
//! at the deepest level and takes the slot of the all-ones code. Dropping it
//! leaves every real symbol at its own depth with no all-ones code, which
//! decoders such as libjpeg require.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::bitio::BitReader;
use super::error::{JpegError, Result};
use super::tables::{HuffmanSpec, TableClass};

/// Longest code length a JPEG Huffman table can declare.
pub const MAX_CODE_LENGTH: usize = 16;

/// Symbol frequency counters for one Huffman table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolHistogram {
    counts: [u64; 256],
}

impl Default for SymbolHistogram {
    fn default() -> Self {
        Self { counts: [0; 256] }
    }
}

impl SymbolHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(&mut self, symbol: u8) {
        self.counts[symbol as usize] += 1;
    }

    pub fn count(&self, symbol: u8) -> u64 {
        self.counts[symbol as usize]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Symbols with a nonzero count, in ascending symbol order.
    pub fn used_symbols(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 0)
            .map(|(s, &c)| (s as u8, c))
    }
}

/// What to do when the tree is deeper than 16 levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthLimit {
    /// Cap every length at 16. Canonical assignment fails if the capped
    /// lengths no longer fit.
    #[default]
    Clamp,
    /// Redistribute lengths with the Annex K.3 `Adjust_BITS` procedure.
    Rebalance,
}

/// Owned Huffman tree node.
#[derive(Debug)]
enum Node {
    Leaf { symbol: u8 },
    /// Placeholder for the all-ones code.
    Reserved,
    Internal { left: Box<Node>, right: Box<Node> },
}

impl Node {
    /// (symbol, depth) pairs in left-first preorder; `None` is the reserved leaf.
    fn leaf_depths(&self) -> Vec<(Option<u8>, usize)> {
        let mut out = Vec::new();
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            match node {
                Node::Leaf { symbol } => out.push((Some(*symbol), depth)),
                Node::Reserved => out.push((None, depth)),
                Node::Internal { left, right } => {
                    stack.push((right.as_ref(), depth + 1));
                    stack.push((left.as_ref(), depth + 1));
                }
            }
        }
        out
    }
}

/// Merge the two lowest-frequency nodes until one tree remains.
///
/// Ties are broken by creation order: the reserved leaf (count 0) first, then
/// leaves in ascending symbol order, merged nodes after them. The first node
/// popped becomes the left child. Returns `None` for an empty histogram.
fn build_tree(histogram: &SymbolHistogram) -> Option<Node> {
    if histogram.used_symbols().next().is_none() {
        return None;
    }
    let mut nodes: Vec<Option<Node>> = vec![Some(Node::Reserved)];
    let mut heap = BinaryHeap::new();
    heap.push(Reverse((0u64, 0usize)));

    for (symbol, count) in histogram.used_symbols() {
        heap.push(Reverse((count, nodes.len())));
        nodes.push(Some(Node::Leaf { symbol }));
    }

    while heap.len() > 1 {
        let (Some(Reverse((fa, a))), Some(Reverse((fb, b)))) = (heap.pop(), heap.pop()) else {
            break;
        };
        let (Some(left), Some(right)) = (nodes[a].take(), nodes[b].take()) else {
            break;
        };
        heap.push(Reverse((fa + fb, nodes.len())));
        nodes.push(Some(Node::Internal {
            left: Box::new(left),
            right: Box::new(right),
        }));
    }

    let Reverse((_, root)) = heap.pop()?;
    nodes[root].take()
}

/// Build a DHT table from observed symbol frequencies.
///
/// An empty histogram gives all-zero counts and no symbols. A single used
/// symbol gets a 1-bit code.
pub fn build_huffman_spec(
    class: TableClass,
    id: u8,
    histogram: &SymbolHistogram,
    limit: LengthLimit,
) -> HuffmanSpec {
    let mut spec = HuffmanSpec {
        class: class as u8,
        id,
        bits: [0; 16],
        huffval: Vec::new(),
    };

    let Some(root) = build_tree(histogram) else {
        return spec;
    };

    // The reserved leaf pairs with any lone symbol, so every depth is >= 1.
    let depths = root.leaf_depths();
    let max_depth = depths.iter().map(|&(_, d)| d).max().unwrap_or(0);

    let mut counts = vec![0u32; max_depth.max(MAX_CODE_LENGTH) + 1];
    for &(_, depth) in &depths {
        counts[depth] += 1;
    }

    if max_depth > MAX_CODE_LENGTH {
        match limit {
            LengthLimit::Clamp => {
                let excess: u32 = counts[MAX_CODE_LENGTH + 1..].iter().sum();
                tracing::warn!(
                    max_depth,
                    excess,
                    "Huffman code lengths clamped to {MAX_CODE_LENGTH}"
                );
                counts[MAX_CODE_LENGTH] += excess;
                counts.truncate(MAX_CODE_LENGTH + 1);
            }
            LengthLimit::Rebalance => adjust_bits(&mut counts),
        }
    }

    // The reserved leaf is one of the longest codes; drop it there.
    if let Some(longest) = counts.iter().rposition(|&c| c > 0) {
        counts[longest] -= 1;
    }

    // Stable: keeps tree order within each length.
    let mut leaves: Vec<(u8, usize)> = depths
        .into_iter()
        .filter_map(|(symbol, depth)| symbol.map(|s| (s, depth)))
        .collect();
    leaves.sort_by_key(|&(_, depth)| depth);

    for (len, &count) in counts.iter().enumerate().skip(1).take(MAX_CODE_LENGTH) {
        debug_assert!(count <= u8::MAX as u32);
        spec.bits[len - 1] = count as u8;
    }
    spec.huffval = leaves.into_iter().map(|(s, _)| s).collect();
    spec
}

/// Annex K.3 `Adjust_BITS`: move codes longer than 16 bits up the tree.
///
/// Each step removes a pair of codes at the deepest level, moves one code up
/// a level and splits a shorter code into two, which keeps the Kraft sum.
fn adjust_bits(counts: &mut Vec<u32>) {
    let mut i = counts.len() - 1;
    while i > MAX_CODE_LENGTH {
        while counts[i] > 0 {
            let mut j = i - 2;
            while j > 0 && counts[j] == 0 {
                j -= 1;
            }
            debug_assert!(j > 0, "Adjust_BITS found no shorter code to split");
            if j == 0 {
                counts[MAX_CODE_LENGTH] += counts[i];
                counts[i] = 0;
                break;
            }
            counts[i] -= 2;
            counts[i - 1] += 1;
            counts[j + 1] += 2;
            counts[j] -= 1;
        }
        i -= 1;
    }
    counts.truncate(MAX_CODE_LENGTH + 1);
}

/// Huffman encode table: maps symbol → (code_bits, code_length).
#[derive(Debug, Clone)]
pub struct HuffmanEncodeTable {
    /// For each of the 256 possible symbols: (code, length).
    /// Length 0 means the symbol is not in the table.
    table: [(u16, u8); 256],
}

impl HuffmanEncodeTable {
    /// Assign canonical codes: consecutive codes within a length, shifted
    /// left by one between lengths.
    ///
    /// The all-ones code of every length stays unused (T.81 Annex C); a
    /// table that needs it fails with [`JpegError::HuffmanCodeOverflow`],
    /// matching the check libjpeg applies when loading a DHT.
    pub fn build(spec: &HuffmanSpec) -> Result<Self> {
        let mut table = [(0u16, 0u8); 256];
        let mut code: u32 = 0;
        let mut symbols = spec.huffval.iter();

        for length in 1..=16u8 {
            let count = spec.bits[(length - 1) as usize] as usize;
            for _ in 0..count {
                let &symbol = symbols
                    .next()
                    .ok_or(JpegError::InvalidMarkerData("DHT symbol count mismatch"))?;
                if code >= 1u32 << length {
                    return Err(JpegError::HuffmanCodeOverflow { length });
                }
                table[symbol as usize] = (code as u16, length);
                code += 1;
            }
            if code >= 1u32 << length {
                return Err(JpegError::HuffmanCodeOverflow { length });
            }
            code <<= 1;
        }

        Ok(Self { table })
    }

    /// Encode a symbol: returns (code_bits, code_length).
    pub fn encode(&self, symbol: u8) -> Result<(u16, u8)> {
        let (code, len) = self.table[symbol as usize];
        if len == 0 {
            Err(JpegError::MissingHuffmanCode { symbol })
        } else {
            Ok((code, len))
        }
    }

    /// Code length of a symbol, 0 if absent.
    pub fn code_length(&self, symbol: u8) -> u8 {
        self.table[symbol as usize].1
    }
}

/// Bit-serial canonical decoder (Annex F.2.2.3), used to read codes back.
#[derive(Debug, Clone)]
pub struct HuffmanDecodeTable {
    /// Largest code of each length, -1 if the length is unused.
    maxcode: [i32; 17],
    mincode: [i32; 17],
    /// Index into `huffval` of the first symbol of each length.
    valptr: [usize; 17],
    huffval: Vec<u8>,
}

impl HuffmanDecodeTable {
    pub fn build(spec: &HuffmanSpec) -> Result<Self> {
        if spec.symbol_count() > spec.huffval.len() {
            return Err(JpegError::InvalidMarkerData("DHT symbol count mismatch"));
        }
        let mut maxcode = [-1i32; 17];
        let mut mincode = [0i32; 17];
        let mut valptr = [0usize; 17];
        let mut code: i32 = 0;
        let mut k = 0usize;

        for length in 1..=16usize {
            let count = spec.bits[length - 1] as usize;
            if count > 0 {
                valptr[length] = k;
                mincode[length] = code;
                code += count as i32;
                k += count;
                maxcode[length] = code - 1;
            }
            code <<= 1;
        }

        Ok(Self {
            maxcode,
            mincode,
            valptr,
            huffval: spec.huffval.clone(),
        })
    }

    /// Decode one symbol.
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<u8> {
        let mut code = reader.read_bit()? as i32;
        let mut length = 1usize;
        while code > self.maxcode[length] {
            length += 1;
            if length > MAX_CODE_LENGTH {
                return Err(JpegError::InvalidMarkerData("invalid Huffman code"));
            }
            code = (code << 1) | reader.read_bit()? as i32;
        }
        let idx = self.valptr[length] + (code - self.mincode[length]) as usize;
        Ok(self.huffval[idx])
    }
}

/// VLI category: number of magnitude bits needed for `value` (0 for 0).
#[inline]
pub fn category(value: i32) -> u8 {
    (32 - value.unsigned_abs().leading_zeros()) as u8
}

/// Encode a signed value into JPEG "additional bits" representation.
/// Returns (magnitude_bits, category/size).
pub fn encode_value(value: i32) -> (u32, u8) {
    let size = category(value);
    if size == 0 {
        return (0, 0);
    }
    let bits = if value > 0 {
        value as u32
    } else {
        // For negative values, JPEG uses one's complement
        (value - 1) as u32
    };
    (bits & ((1u32 << size) - 1), size)
}

/// Extend a signed value from its JPEG "additional bits" representation.
///
/// Per ITU-T T.81 Table F.1: if the high bit is 0, the value is negative.
pub fn extend_sign(value: u16, bits: u8) -> i32 {
    if bits == 0 {
        return 0;
    }
    let half = 1i32 << (bits - 1);
    if (value as i32) < half {
        value as i32 - (1i32 << bits) + 1
    } else {
        value as i32
    }
}
