// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Netpbm PPM loader (P6 binary and P3 ASCII).
//!
//! Only 8-bit images (maxval 1–255) are accepted. Samples are passed through
//! unscaled, whatever the maxval.

use std::path::Path;

use crate::jpeg::error::{JpegError, Result};
use crate::jpeg::pixels::PixelGrid;

/// A decoded PPM raster, RGB interleaved, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PpmImage {
    width: usize,
    height: usize,
    maxval: u16,
    data: Vec<u8>,
}

/// Header tokenizer that skips whitespace and `#` comments.
struct Header<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Header<'a> {
    fn skip_space(&mut self) {
        while let Some(&b) = self.data.get(self.pos) {
            if b == b'#' {
                while self.data.get(self.pos).is_some_and(|&c| c != b'\n' && c != b'\r') {
                    self.pos += 1;
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn token(&mut self) -> Result<&'a [u8]> {
        self.skip_space();
        let start = self.pos;
        while self
            .data
            .get(self.pos)
            .is_some_and(|&b| !b.is_ascii_whitespace() && b != b'#')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(JpegError::InvalidPpm("unexpected end of header".into()));
        }
        let data = self.data;
        Ok(&data[start..self.pos])
    }

    fn number(&mut self, what: &str) -> Result<usize> {
        let tok = self.token()?;
        std::str::from_utf8(tok)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| JpegError::InvalidPpm(format!("invalid {what}")))
    }
}

impl PpmImage {
    /// Parse a PPM file held in memory.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut header = Header { data: bytes, pos: 0 };
        let binary = match header.token()? {
            b"P6" => true,
            b"P3" => false,
            other => {
                return Err(JpegError::InvalidPpm(format!(
                    "unsupported magic {:?}",
                    String::from_utf8_lossy(other)
                )))
            }
        };
        let width = header.number("width")?;
        let height = header.number("height")?;
        let maxval = header.number("maxval")?;
        if width == 0 || height == 0 {
            return Err(JpegError::InvalidPpm(format!("empty image {width}x{height}")));
        }
        if !(1..=255).contains(&maxval) {
            return Err(JpegError::InvalidPpm(format!("unsupported maxval {maxval}")));
        }
        let len = width
            .checked_mul(height)
            .and_then(|p| p.checked_mul(3))
            .ok_or_else(|| JpegError::InvalidPpm("image too large".into()))?;

        let data = if binary {
            // Exactly one whitespace byte separates the header from the raster.
            let start = header.pos + 1;
            bytes
                .get(start..start + len)
                .ok_or_else(|| JpegError::InvalidPpm("truncated raster".into()))?
                .to_vec()
        } else {
            let mut data = Vec::with_capacity(len);
            for _ in 0..len {
                let v = header.number("sample")?;
                if v > maxval {
                    return Err(JpegError::InvalidPpm(format!("sample {v} exceeds maxval {maxval}")));
                }
                data.push(v as u8);
            }
            data
        };

        tracing::debug!(width, height, maxval, binary, "parsed PPM");
        Ok(Self {
            width,
            height,
            maxval: maxval as u16,
            data,
        })
    }

    /// Read and parse a PPM file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn maxval(&self) -> u16 {
        self.maxval
    }

    /// Raw RGB bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Borrow the raster as an encoder input.
    pub fn pixels(&self) -> Result<PixelGrid<'_>> {
        PixelGrid::new(&self.data, self.width, self.height)
    }
}
