// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Input pixel grid.
//!
//! [`PixelGrid`] is a validated, borrowed view of an RGB-interleaved,
//! row-major buffer. The encoder only processes the largest sub-grid whose
//! sides are multiples of the block size; the rest is dropped, not padded.

use super::error::{JpegError, Result};

/// Borrowed RGB raster, 3 bytes per pixel.
#[derive(Debug, Clone, Copy)]
pub struct PixelGrid<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
}

impl<'a> PixelGrid<'a> {
    /// Validate the buffer against the dimensions.
    ///
    /// Fails with [`JpegError::InvalidInput`] for zero dimensions or a buffer
    /// shorter than `width * height * 3`. Extra trailing bytes are ignored.
    pub fn new(data: &'a [u8], width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(JpegError::InvalidInput("width and height must be positive"));
        }
        let needed = width
            .checked_mul(height)
            .and_then(|p| p.checked_mul(3))
            .ok_or(JpegError::InvalidInput("image dimensions overflow"))?;
        if data.len() < needed {
            return Err(JpegError::InvalidInput("pixel buffer smaller than width * height * 3"));
        }
        Ok(Self {
            data: &data[..needed],
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// RGB triples of one row, left to right.
    pub fn row(&self, row: usize) -> impl Iterator<Item = [u8; 3]> + 'a {
        let stride = self.width * 3;
        let data: &'a [u8] = self.data;
        data[row * stride..(row + 1) * stride]
            .chunks_exact(3)
            .map(|px| [px[0], px[1], px[2]])
    }

    /// RGB triple at (row, col).
    pub fn get(&self, row: usize, col: usize) -> [u8; 3] {
        let i = (row * self.width + col) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Dimensions of the encodable region: each side rounded down to a
    /// multiple of `block_size`.
    pub fn cropped_dimensions(&self, block_size: usize) -> (usize, usize) {
        (
            self.width - self.width % block_size,
            self.height - self.height % block_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimensions() {
        let data = [0u8; 12];
        assert!(matches!(PixelGrid::new(&data, 0, 4), Err(JpegError::InvalidInput(_))));
        assert!(matches!(PixelGrid::new(&data, 4, 0), Err(JpegError::InvalidInput(_))));
    }

    #[test]
    fn rejects_short_buffer() {
        let data = [0u8; 11];
        assert!(matches!(PixelGrid::new(&data, 2, 2), Err(JpegError::InvalidInput(_))));
    }

    #[test]
    fn accepts_longer_buffer() {
        let data = [7u8; 20];
        let grid = PixelGrid::new(&data, 2, 2).unwrap();
        assert_eq!(grid.row(1).count(), 2);
    }

    #[test]
    fn row_and_get_agree() {
        let data: Vec<u8> = (0..24).collect();
        let grid = PixelGrid::new(&data, 4, 2).unwrap();
        let row: Vec<[u8; 3]> = grid.row(1).collect();
        assert_eq!(row[2], grid.get(1, 2));
        assert_eq!(row[2], [18, 19, 20]);
    }

    #[test]
    fn crop_to_block_multiple() {
        let data = vec![0u8; 21 * 10 * 3];
        let grid = PixelGrid::new(&data, 21, 10).unwrap();
        assert_eq!(grid.cropped_dimensions(8), (16, 8));
    }
}
