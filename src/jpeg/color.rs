// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! RGB to YCbCr conversion.
//!
//! The conversion is a fixed linear map with +16 / +128 offsets. Results are
//! not clamped: later stages see whatever the matrix produces.

use super::pixels::PixelGrid;

/// Real-valued luma/chroma triple for one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YCbCr {
    pub y: f64,
    pub cb: f64,
    pub cr: f64,
}

/// Convert one RGB sample.
#[inline]
pub fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> YCbCr {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    YCbCr {
        y: 0.257 * r + 0.564 * g + 0.098 * b + 16.0,
        cb: -0.148 * r - 0.291 * g + 0.439 * b + 128.0,
        cr: 0.439 * r - 0.368 * g - 0.071 * b + 128.0,
    }
}

/// Channel index within the fixed three-component scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Y = 0,
    Cb = 1,
    Cr = 2,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Y, Channel::Cb, Channel::Cr];

    /// Which table set (luma or chroma) the channel uses.
    pub fn class(self) -> ChannelClass {
        match self {
            Channel::Y => ChannelClass::Luma,
            Channel::Cb | Channel::Cr => ChannelClass::Chroma,
        }
    }
}

/// Table class shared by channels: luma uses id 0, chroma id 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelClass {
    Luma = 0,
    Chroma = 1,
}

impl ChannelClass {
    pub fn table_id(self) -> u8 {
        self as u8
    }
}

/// Y, Cb and Cr planes of the cropped image, row-major.
#[derive(Debug, Clone)]
pub struct ColorPlanes {
    width: usize,
    height: usize,
    planes: [Vec<f64>; 3],
}

impl ColorPlanes {
    /// Convert the top-left `width × height` region of `grid`.
    pub fn from_grid(grid: &PixelGrid<'_>, width: usize, height: usize) -> Self {
        debug_assert!(width <= grid.width() && height <= grid.height());
        let size = width * height;
        let mut y = Vec::with_capacity(size);
        let mut cb = Vec::with_capacity(size);
        let mut cr = Vec::with_capacity(size);

        for row in 0..height {
            for [r, g, b] in grid.row(row).take(width) {
                let px = rgb_to_ycbcr(r, g, b);
                y.push(px.y);
                cb.push(px.cb);
                cr.push(px.cr);
            }
        }

        Self {
            width,
            height,
            planes: [y, cb, cr],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn plane(&self, channel: Channel) -> &[f64] {
        &self.planes[channel as usize]
    }

    /// Color triple at (row, col).
    #[cfg(test)]
    pub fn get(&self, row: usize, col: usize) -> YCbCr {
        let i = row * self.width + col;
        YCbCr {
            y: self.planes[0][i],
            cb: self.planes[1][i],
            cr: self.planes[2][i],
        }
    }
}
