// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # baseline-jpeg
//!
//! Baseline sequential JPEG encoder for RGB rasters. Three presets are
//! provided:
//!
//! - **Standard**: Annex K quantization and Huffman tables.
//! - **Adaptive quantization**: a per-image table that keeps the mean
//!   truncation error of each frequency under a weighted budget.
//!   Divisors above 255 are stored as a 16-bit DQT, which strict baseline
//!   decoders may refuse.
//! - **Adaptive Huffman**: Huffman tables built from the image's own symbol
//!   statistics.
//!
//! Parallel stages use rayon behind the default `parallel` feature. Progress
//! is reported through `tracing` events; no subscriber is installed.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use baseline_jpeg::{encode, EncodeOptions, PpmImage};
//!
//! let ppm = PpmImage::open("photo.ppm").unwrap();
//! let jpeg = encode(&ppm.pixels().unwrap(), &EncodeOptions::adaptive_huffman()).unwrap();
//! std::fs::write("photo.jpg", jpeg).unwrap();
//! ```

pub mod jpeg;
pub mod ppm;

pub use jpeg::error::{JpegError, Result as JpegResult};
pub use jpeg::dct::{DctGrid, QuantTable};
pub use jpeg::huffman::LengthLimit;
pub use jpeg::pixels::PixelGrid;
pub use jpeg::{encode, encode_to_writer, encode_variants};
pub use jpeg::{EncodeOptions, HuffmanTables, Quantization, Variant, VariantSet};
pub use jpeg::{BLOCK_SIZE, DEFAULT_ADAPTIVE_SCALE};
pub use ppm::PpmImage;
