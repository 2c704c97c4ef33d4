// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Forward DCT, coefficient storage and quantization tables.
//!
//! Provides [`BlockTransform`] (separable DCT-II over `N × N` tiles),
//! [`DctGrid`] for storing per-tile coefficients in block-raster order, and
//! [`QuantTable`] for the 64-entry quantization matrices.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::error::{JpegError, Result};

/// Quantization table: 64 positive values in natural (row-major) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantTable {
    /// Quantization values, indexed by row * 8 + col.
    values: [u16; 64],
}

impl QuantTable {
    /// Build a table, rejecting zero entries.
    pub fn new(values: [u16; 64]) -> Result<Self> {
        if values.iter().any(|&v| v == 0) {
            return Err(JpegError::InvalidQuantTable("entries must be positive"));
        }
        Ok(Self { values })
    }

    /// Compile-time checked constructor for the built-in tables.
    pub const fn from_const(values: [u16; 64]) -> Self {
        let mut i = 0;
        while i < 64 {
            assert!(values[i] > 0, "quantization entries must be positive");
            i += 1;
        }
        Self { values }
    }

    pub fn values(&self) -> &[u16; 64] {
        &self.values
    }

    /// Whether every entry fits the 8-bit DQT precision.
    pub fn fits_8bit(&self) -> bool {
        self.values.iter().all(|&v| v <= 255)
    }
}

/// Grid of per-tile coefficients for one image component.
///
/// Tiles are stored in block-raster order. Within a tile, the `N²`
/// coefficients are in whatever order the producing stage uses: natural
/// row-major after the DCT and quantizer, scan order after zigzag reordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DctGrid {
    block_size: usize,
    /// Number of tiles horizontally.
    blocks_wide: usize,
    /// Number of tiles vertically.
    blocks_tall: usize,
    /// Flat storage: blocks_tall * blocks_wide * N² coefficients.
    coeffs: Vec<i32>,
}

impl DctGrid {
    /// Create a new grid initialized to zero.
    pub fn new(block_size: usize, blocks_wide: usize, blocks_tall: usize) -> Self {
        Self {
            block_size,
            blocks_wide,
            blocks_tall,
            coeffs: vec![0; blocks_wide * blocks_tall * block_size * block_size],
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn blocks_wide(&self) -> usize {
        self.blocks_wide
    }

    pub fn blocks_tall(&self) -> usize {
        self.blocks_tall
    }

    /// Total number of tiles.
    pub fn total_blocks(&self) -> usize {
        self.blocks_wide * self.blocks_tall
    }

    /// Coefficients per tile.
    pub fn block_len(&self) -> usize {
        self.block_size * self.block_size
    }

    /// Tile at raster index `index`.
    pub fn block(&self, index: usize) -> &[i32] {
        let len = self.block_len();
        &self.coeffs[index * len..(index + 1) * len]
    }

    /// Mutable tile at raster index `index`.
    pub fn block_mut(&mut self, index: usize) -> &mut [i32] {
        let len = self.block_len();
        &mut self.coeffs[index * len..(index + 1) * len]
    }

    /// Tiles in raster order.
    pub fn blocks(&self) -> impl Iterator<Item = &[i32]> {
        self.coeffs.chunks_exact(self.block_len())
    }

    /// Raw mutable access to all coefficients.
    ///
    /// Layout: `total_blocks * N²` contiguous values in block-raster order.
    /// Used by parallel processing (Rayon `par_chunks_mut`).
    pub fn coeffs_mut(&mut self) -> &mut [i32] {
        &mut self.coeffs
    }

    /// New grid of the same shape with `f` applied to every tile.
    pub fn map_blocks<F>(&self, f: F) -> DctGrid
    where
        F: Fn(&[i32], &mut [i32]) + Sync + Send,
    {
        let mut out = DctGrid::new(self.block_size, self.blocks_wide, self.blocks_tall);
        let len = self.block_len();

        #[cfg(feature = "parallel")]
        out.coeffs
            .par_chunks_mut(len)
            .zip(self.coeffs.par_chunks(len))
            .for_each(|(dst, src)| f(src, dst));

        #[cfg(not(feature = "parallel"))]
        out.coeffs
            .chunks_mut(len)
            .zip(self.coeffs.chunks(len))
            .for_each(|(dst, src)| f(src, dst));

        out
    }
}

/// Separable forward DCT-II for `N × N` tiles.
///
/// `cos[k * N + x] = cos((2x + 1) k π / 2N)`, scale α(0) = √(1/N),
/// α(k > 0) = √(2/N).
#[derive(Debug, Clone)]
pub struct BlockTransform {
    n: usize,
    cos: Vec<f64>,
    alpha: Vec<f64>,
}

impl BlockTransform {
    pub fn new(block_size: usize) -> Self {
        assert!(block_size > 0, "block size must be positive");
        let n = block_size;
        let mut cos = vec![0.0f64; n * n];
        for k in 0..n {
            for x in 0..n {
                cos[k * n + x] =
                    ((2 * x + 1) as f64 * k as f64 * std::f64::consts::PI / (2 * n) as f64).cos();
            }
        }
        let alpha = (0..n)
            .map(|k| if k == 0 { (1.0 / n as f64).sqrt() } else { (2.0 / n as f64).sqrt() })
            .collect();
        Self { n, cos, alpha }
    }

    pub fn block_size(&self) -> usize {
        self.n
    }

    /// Transform one tile of samples (natural order, unshifted) into rounded
    /// coefficients (natural order).
    pub fn forward(&self, samples: &[f64]) -> Vec<i32> {
        let mut out = vec![0i32; self.n * self.n];
        self.forward_into(samples, &mut out);
        out
    }

    /// Like [`forward`](Self::forward), writing into `out`.
    pub fn forward_into(&self, samples: &[f64], out: &mut [i32]) {
        let n = self.n;
        debug_assert_eq!(samples.len(), n * n);
        debug_assert_eq!(out.len(), n * n);

        // Pass 1: along each row, level-shifted.
        let mut temp = vec![0.0f64; n * n];
        for row in 0..n {
            for u in 0..n {
                let mut sum = 0.0;
                for x in 0..n {
                    sum += (samples[row * n + x] - 128.0) * self.cos[u * n + x];
                }
                temp[row * n + u] = self.alpha[u] * sum;
            }
        }

        // Pass 2: along each column.
        for col in 0..n {
            for v in 0..n {
                let mut sum = 0.0;
                for y in 0..n {
                    sum += temp[y * n + col] * self.cos[v * n + y];
                }
                // f64::round rounds half away from zero.
                out[v * n + col] = (self.alpha[v] * sum).round() as i32;
            }
        }
    }

    /// Transform every tile of a row-major plane (`width`, `height` multiples
    /// of N) into a grid in raster tile order.
    pub fn transform_plane(&self, plane: &[f64], width: usize, height: usize) -> DctGrid {
        let n = self.n;
        debug_assert!(width % n == 0 && height % n == 0);
        debug_assert_eq!(plane.len(), width * height);
        let blocks_wide = width / n;
        let mut grid = DctGrid::new(n, blocks_wide, height / n);

        let process_block = |(index, out): (usize, &mut [i32])| {
            let br = index / blocks_wide;
            let bc = index % blocks_wide;
            let mut samples = vec![0.0f64; n * n];
            for row in 0..n {
                let start = (br * n + row) * width + bc * n;
                samples[row * n..(row + 1) * n].copy_from_slice(&plane[start..start + n]);
            }
            self.forward_into(&samples, out);
        };

        #[cfg(feature = "parallel")]
        grid.coeffs_mut().par_chunks_mut(n * n).enumerate().for_each(process_block);
        #[cfg(not(feature = "parallel"))]
        grid.coeffs_mut().chunks_mut(n * n).enumerate().for_each(process_block);

        grid
    }
}
