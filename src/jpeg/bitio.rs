// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Bit-level I/O for JPEG entropy-coded data.
//!
//! [`BitWriter`] packs bits MSB-first into an unstuffed accumulator and
//! applies byte-stuffing (0xFF -> 0xFF 0x00) only when the stream is
//! finished. [`BitReader`] undoes the stuffing and reads codes back, which is
//! how the canonical codes and VLI suffixes are verified.

use super::error::{JpegError, Result};

/// Bit accumulator for the entropy-coded segment.
///
/// Bytes are kept unstuffed; `free_bits` counts the unused low bits (0–7) of
/// the trailing byte.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    bytes: Vec<u8>,
    free_bits: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        if self.free_bits == 0 {
            self.bytes.push(0);
            self.free_bits = 8;
        }
        self.free_bits -= 1;
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 1 << self.free_bits;
            }
        }
    }

    /// Write the low `count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u32, count: u8) {
        debug_assert!(count <= 32);
        for i in (0..count).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
    }

    /// Total bits written so far.
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 - self.free_bits as usize
    }

    /// Free bits remaining in the trailing byte (0–7).
    pub fn free_bits(&self) -> u8 {
        self.free_bits
    }

    /// The unstuffed accumulator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Pad the trailing byte with 1-bits and return the byte-stuffed stream.
    pub fn finish(mut self) -> Vec<u8> {
        if self.free_bits > 0 {
            if let Some(last) = self.bytes.last_mut() {
                *last |= (1u8 << self.free_bits) - 1;
            }
            self.free_bits = 0;
        }
        stuff_bytes(&self.bytes)
    }
}

/// Insert 0x00 after every 0xFF byte.
pub fn stuff_bytes(data: &[u8]) -> Vec<u8> {
    let extra = data.iter().filter(|&&b| b == 0xFF).count();
    let mut out = Vec::with_capacity(data.len() + extra);
    for &byte in data {
        out.push(byte);
        if byte == 0xFF {
            out.push(0x00);
        }
    }
    out
}

/// Bit-level reader over byte-stuffed entropy-coded data.
///
/// Bits are read MSB-first from a 32-bit internal buffer. A stuffed
/// 0xFF 0x00 pair yields a single 0xFF byte; any other byte after 0xFF is
/// treated as a marker and ends the data.
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Bit buffer, MSB-aligned. Valid bits are in the low `bits_left` positions.
    buf: u32,
    bits_left: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            buf: 0,
            bits_left: 0,
        }
    }

    /// Read `count` bits (1–16) and return them right-aligned.
    pub fn read_bits(&mut self, count: u8) -> Result<u16> {
        debug_assert!((1..=16).contains(&count));
        while self.bits_left < count {
            self.fill_byte()?;
        }
        self.bits_left -= count;
        let val = (self.buf >> self.bits_left) & ((1u32 << count) - 1);
        Ok(val as u16)
    }

    /// Read one bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Current byte position in the underlying data.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn fill_byte(&mut self) -> Result<()> {
        let byte = *self.data.get(self.pos).ok_or(JpegError::UnexpectedEof)?;
        self.pos += 1;

        if byte == 0xFF {
            match self.data.get(self.pos) {
                Some(0x00) => self.pos += 1,
                Some(_) => return Err(JpegError::InvalidMarkerData("marker inside entropy data")),
                None => return Err(JpegError::UnexpectedEof),
            }
        }

        self.buf = (self.buf << 8) | byte as u32;
        self.bits_left += 8;
        Ok(())
    }
}
