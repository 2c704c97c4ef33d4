// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Zigzag scan order for square coefficient blocks.
//!
//! [`ZigzagPath`] computes the diagonal traversal for any block size and is
//! cached per size, so every tile (and the DQT writer) shares one permutation.
//! The constant tables below are the familiar 8×8 instance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// Maps zigzag index (0–63) to natural row-major index (0–63).
pub const ZIGZAG_TO_NATURAL: [usize; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// Maps natural row-major index (0–63) to zigzag index (0–63).
///
/// Inverse of [`ZIGZAG_TO_NATURAL`].
pub const NATURAL_TO_ZIGZAG: [usize; 64] = {
    let mut table = [0usize; 64];
    let mut i = 0;
    while i < 64 {
        table[ZIGZAG_TO_NATURAL[i]] = i;
        i += 1;
    }
    table
};

static PATHS: OnceLock<Mutex<HashMap<usize, Arc<ZigzagPath>>>> = OnceLock::new();

/// Diagonal traversal of an `n × n` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZigzagPath {
    block_size: usize,
    /// `positions[k]` = (row, col) visited at scan index k.
    positions: Vec<(usize, usize)>,
}

impl ZigzagPath {
    /// Walk the block diagonally, starting at (0,0) moving up-right.
    ///
    /// On reaching an edge the walk takes a single orthogonal step (right or
    /// down, depending on which edge and the current direction), flips the
    /// diagonal direction and carries on until all `n²` cells are visited.
    pub fn new(block_size: usize) -> Self {
        assert!(block_size > 0, "block size must be positive");
        let n = block_size;
        let total = n * n;
        let last = n - 1;
        let mut positions = Vec::with_capacity(total);

        let (mut row, mut col) = (0usize, 0usize);
        let mut up = true;
        let mut turned = false;

        while positions.len() < total {
            positions.push((row, col));
            if positions.len() == total {
                break;
            }

            let on_edge = row == 0 || col == 0 || row == last || col == last;
            if on_edge && !turned {
                if up {
                    if col == last { row += 1 } else { col += 1 }
                } else if row == last {
                    col += 1;
                } else {
                    row += 1;
                }
                up = !up;
                turned = true;
                continue;
            }

            turned = false;
            if up {
                row -= 1;
                col += 1;
            } else {
                row += 1;
                col -= 1;
            }
        }

        Self { block_size, positions }
    }

    /// Shared path for `block_size`, computed on first use.
    pub fn for_block_size(block_size: usize) -> Arc<ZigzagPath> {
        let cache = PATHS.get_or_init(|| Mutex::new(HashMap::new()));
        let mut guard = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard
            .entry(block_size)
            .or_insert_with(|| Arc::new(ZigzagPath::new(block_size)))
            .clone()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// (row, col) positions in scan order.
    pub fn positions(&self) -> &[(usize, usize)] {
        &self.positions
    }

    /// Natural (row-major) index visited at each scan index.
    pub fn natural_indices(&self) -> impl Iterator<Item = usize> + '_ {
        let n = self.block_size;
        self.positions.iter().map(move |&(r, c)| r * n + c)
    }

    /// Reorder a natural-order block into scan order.
    pub fn reorder<T: Copy>(&self, natural: &[T]) -> Vec<T> {
        debug_assert_eq!(natural.len(), self.len());
        self.natural_indices().map(|ni| natural[ni]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        for i in 0..64 {
            assert_eq!(NATURAL_TO_ZIGZAG[ZIGZAG_TO_NATURAL[i]], i);
            assert_eq!(ZIGZAG_TO_NATURAL[NATURAL_TO_ZIGZAG[i]], i);
        }
    }

    #[test]
    fn computed_path_matches_table() {
        let path = ZigzagPath::new(8);
        let computed: Vec<usize> = path.natural_indices().collect();
        assert_eq!(computed, ZIGZAG_TO_NATURAL.to_vec());
    }

    #[test]
    fn small_blocks() {
        assert_eq!(ZigzagPath::new(1).positions(), &[(0, 0)]);
        assert_eq!(ZigzagPath::new(2).positions(), &[(0, 0), (0, 1), (1, 0), (1, 1)]);
        let three: Vec<usize> = ZigzagPath::new(3).natural_indices().collect();
        assert_eq!(three, vec![0, 1, 3, 6, 4, 2, 5, 7, 8]);
    }

    #[test]
    fn cached_path_is_shared() {
        let a = ZigzagPath::for_block_size(8);
        let b = ZigzagPath::for_block_size(8);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn reorder_block() {
        let natural: Vec<i32> = (0..64).collect();
        let zz = ZigzagPath::for_block_size(8).reorder(&natural);
        for (k, &v) in zz.iter().enumerate() {
            assert_eq!(v as usize, ZIGZAG_TO_NATURAL[k]);
        }
    }
}
