// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for JPEG encoding.

use thiserror::Error;

/// Errors that can occur while encoding an image or reading back a container.
#[derive(Debug, Error)]
pub enum JpegError {
    /// The pixel buffer does not satisfy the loader contract.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// The image has no complete 8×8 tile to encode.
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Image width in pixels.
        width: usize,
        /// Image height in pixels.
        height: usize,
    },
    /// A quantization table entry is zero or the table has the wrong size.
    #[error("invalid quantization table: {0}")]
    InvalidQuantTable(&'static str),
    /// The coding pass emitted a symbol that has no code in its table.
    #[error("Huffman table missing code for symbol 0x{symbol:02X}")]
    MissingHuffmanCode {
        /// The symbol without a code.
        symbol: u8,
    },
    /// Clamped code lengths no longer fit in the canonical code space.
    #[error("Huffman code space overflow at length {length}")]
    HuffmanCodeOverflow {
        /// First code length whose codes overflowed.
        length: u8,
    },
    /// A marker segment has invalid or inconsistent length/content.
    #[error("invalid marker data: {0}")]
    InvalidMarkerData(&'static str),
    /// Input data is too short or truncated.
    #[error("unexpected end of JPEG data")]
    UnexpectedEof,
    /// The raster file could not be parsed.
    #[error("invalid PPM: {0}")]
    InvalidPpm(String),
    /// Writing to the output sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, JpegError>;
