// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Coefficient quantization and per-image quantization table search.
//!
//! The adaptive table picks, for each frequency position, the largest divisor
//! whose mean truncation error over the whole image stays below a weighted
//! budget. Luma is searched over the Y blocks; chroma pools Cb and Cr.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::color::ChannelClass;
use super::dct::{DctGrid, QuantTable};
use super::error::{JpegError, Result};

/// Smallest divisor the search can return.
pub const MIN_DIVISOR: u16 = 5;
/// Exclusive upper bound of the search.
pub const MAX_DIVISOR: u16 = 512;

/// Per-position error weights for luma, natural order.
pub const LUMA_ERROR_WEIGHTS: [f32; 64] = [
    7.5, 3.487, 2.801, 3.9, 5.082, 5.796, 6.218, 4.759,
    4.158, 3.454, 3.635, 4.306, 4.994, 7.525, 6.061, 4.77,
    3.926, 3.556, 4.133, 5.433, 6.355, 7.268, 6.096, 4.643,
    3.757, 4.334, 5.244, 6.218, 7.975, 7.534, 5.717, 4.378,
    4.416, 5.07, 7.171, 8.629, 8.28, 7.322, 5.461, 4.066,
    5.238, 6.696, 7.962, 8.005, 7.566, 6.343, 4.885, 3.521,
    6.999, 7.303, 7.069, 6.611, 6.095, 5.15, 4.119, 3.085,
    5.731, 5.486, 5.33, 4.753, 4.339, 3.913, 3.263, 2.628,
];

/// Per-position error weights for chroma, natural order.
pub const CHROMA_ERROR_WEIGHTS: [f32; 64] = [
    8.063, 3.821, 3.019, 2.782, 2.283, 2.041, 1.861, 1.687,
    4.325, 3.354, 2.839, 2.582, 2.154, 2.077, 1.75, 1.526,
    3.624, 3.092, 3.018, 2.485, 2.08, 2.01, 1.728, 1.488,
    3.566, 3.069, 2.653, 2.367, 2.158, 1.928, 1.632, 1.418,
    2.865, 2.546, 2.399, 2.286, 2.075, 1.861, 1.58, 1.386,
    2.48, 2.316, 2.218, 2.095, 1.935, 1.719, 1.479, 1.243,
    2.208, 2.05, 1.943, 1.826, 1.717, 1.555, 1.344, 1.155,
    1.937, 1.684, 1.648, 1.527, 1.45, 1.353, 1.217, 1.075,
];

fn error_weights(class: ChannelClass) -> &'static [f32; 64] {
    match class {
        ChannelClass::Luma => &LUMA_ERROR_WEIGHTS,
        ChannelClass::Chroma => &CHROMA_ERROR_WEIGHTS,
    }
}

/// Divide each coefficient by the table entry at the same natural position,
/// truncating toward zero.
pub fn quantize_block(coeffs: &[i32], table: &QuantTable, out: &mut [i32]) {
    debug_assert_eq!(coeffs.len(), 64);
    for ((o, &c), &q) in out.iter_mut().zip(coeffs).zip(table.values()) {
        *o = c / q as i32;
    }
}

/// Quantize every block of a raw DCT grid into a fresh grid.
pub fn quantize_grid(grid: &DctGrid, table: &QuantTable) -> Result<DctGrid> {
    if grid.block_len() != 64 {
        return Err(JpegError::InvalidQuantTable("quantization requires 8x8 blocks"));
    }
    Ok(grid.map_blocks(|src, dst| quantize_block(src, table, dst)))
}

/// Unquantized DCT values grouped by natural position.
#[derive(Debug, Clone)]
pub struct PositionSamples {
    positions: Vec<Vec<i32>>,
}

impl PositionSamples {
    /// Pool the coefficients of all blocks of the given grids.
    ///
    /// All grids must share the same block size.
    pub fn gather(grids: &[&DctGrid]) -> Self {
        let block_len = grids.first().map_or(64, |g| g.block_len());
        let total: usize = grids.iter().map(|g| g.total_blocks()).sum();
        let mut positions: Vec<Vec<i32>> = (0..block_len).map(|_| Vec::with_capacity(total)).collect();

        for grid in grids {
            debug_assert_eq!(grid.block_len(), block_len);
            for block in grid.blocks() {
                for (samples, &c) in positions.iter_mut().zip(block) {
                    samples.push(c);
                }
            }
        }

        Self { positions }
    }

    /// Number of positions (N²).
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Samples at one natural position.
    pub fn at(&self, pos: usize) -> &[i32] {
        &self.positions[pos]
    }
}

/// Mean absolute truncation error of dividing `samples` by `divisor`.
fn mean_truncation_error(samples: &[i32], divisor: i32) -> f64 {
    let sum: u64 = samples
        .iter()
        .map(|&c| (c - (c / divisor) * divisor).unsigned_abs() as u64)
        .sum();
    // 0/0 is NaN for an empty set, which never passes the budget check.
    sum as f64 / samples.len() as f64
}

/// Largest divisor in [MIN_DIVISOR, MAX_DIVISOR) whose error stays under `budget`.
fn search_divisor(samples: &[i32], budget: f32) -> u16 {
    let mut lo = MIN_DIVISOR as i32;
    let mut hi = MAX_DIVISOR as i32;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if mean_truncation_error(samples, mid) < budget as f64 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo as u16
}

/// Search a quantization table for one channel class.
///
/// `scale` multiplies the fixed per-position error weights; larger values
/// allow coarser divisors. Positions with no samples get [`MIN_DIVISOR`].
pub fn adapt_table(samples: &PositionSamples, scale: f32, class: ChannelClass) -> Result<QuantTable> {
    if samples.len() != 64 {
        return Err(JpegError::InvalidQuantTable("table search requires 8x8 blocks"));
    }
    let weights = error_weights(class);

    #[cfg(feature = "parallel")]
    let divisors: Vec<u16> = (0..64usize)
        .into_par_iter()
        .map(|pos| search_divisor(samples.at(pos), scale * weights[pos]))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let divisors: Vec<u16> = (0..64usize)
        .map(|pos| search_divisor(samples.at(pos), scale * weights[pos]))
        .collect();

    let mut values = [0u16; 64];
    values.copy_from_slice(&divisors);
    tracing::trace!(?class, scale, ?values, "adapted quantization table");
    QuantTable::new(values)
}
