// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Baseline sequential JPEG encoder.
//!
//! Turns an RGB pixel grid into a complete JPEG byte stream:
//!
//! 1. Crop to whole 8×8 tiles and convert to unclamped YCbCr.
//! 2. Forward DCT per tile and channel.
//! 3. Quantize with the standard tables or a table searched for this image.
//! 4. Reorder to zigzag scan order.
//! 5. Tokenize (DC differences, AC run lengths), optionally counting symbols
//!    first to build image-specific Huffman tables.
//! 6. Pack the codes with byte stuffing and wrap them in SOI/DQT/SOF0/DHT/SOS/EOI.
//!
//! Supports:
//! - Baseline sequential DCT (SOF0), 8-bit samples
//! - Three components with 1×1 sampling (no chroma subsampling)
//! - Standard or adaptive quantization tables (16-bit DQT when needed)
//! - Standard or adaptive Huffman tables
//!
//! Adaptive quantization may produce divisors above 255, which are written
//! with 16-bit precision (Pq = 1). T.81 only allows 8-bit tables in baseline
//! frames, so strict decoders may reject such files; lenient ones such as
//! libjpeg accept them.
//!
//! Does NOT support:
//! - Progressive, arithmetic or lossless coding
//! - Restart markers and metadata segments (APPn, COM)

pub mod bitio;
pub mod color;
pub mod dct;
pub mod error;
pub mod frame;
pub mod huffman;
pub mod marker;
pub mod pixels;
pub mod quant;
pub mod scan;
pub mod tables;
pub mod zigzag;

use std::io::Write;

use color::{Channel, ChannelClass, ColorPlanes};
use dct::{BlockTransform, DctGrid, QuantTable};
use error::{JpegError, Result};
use frame::FrameHeader;
use huffman::LengthLimit;
use marker::{ContainerWriter, ScanHeader};
use pixels::PixelGrid;
use quant::PositionSamples;
use scan::{CodingSink, CountingSink};
use tables::HuffmanTableSet;
use zigzag::ZigzagPath;

/// Tile side length used by the encoder.
pub const BLOCK_SIZE: usize = 8;

/// Error budget multiplier used by [`Variant::AdaptiveQuantization`].
pub const DEFAULT_ADAPTIVE_SCALE: f32 = 1.0;

/// Where the quantization tables come from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Quantization {
    /// Annex K tables.
    #[default]
    Standard,
    /// Per-image search; `scale` multiplies the per-position error budget.
    Adaptive { scale: f32 },
}

/// Where the Huffman tables come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HuffmanTables {
    /// Annex K tables.
    #[default]
    Standard,
    /// Built from this image's symbol statistics.
    Adaptive,
}

/// Encoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EncodeOptions {
    pub quantization: Quantization,
    pub huffman: HuffmanTables,
    /// Only used with [`HuffmanTables::Adaptive`].
    pub length_limit: LengthLimit,
}

impl EncodeOptions {
    /// Standard quantization and Huffman tables.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Searched quantization tables with standard Huffman tables.
    pub fn adaptive_quantization(scale: f32) -> Self {
        Self::default().with_quantization(Quantization::Adaptive { scale })
    }

    /// Standard quantization tables with image-specific Huffman tables.
    pub fn adaptive_huffman() -> Self {
        Self::default().with_huffman(HuffmanTables::Adaptive)
    }

    pub fn with_quantization(mut self, quantization: Quantization) -> Self {
        self.quantization = quantization;
        self
    }

    pub fn with_huffman(mut self, huffman: HuffmanTables) -> Self {
        self.huffman = huffman;
        self
    }

    pub fn with_length_limit(mut self, length_limit: LengthLimit) -> Self {
        self.length_limit = length_limit;
        self
    }
}

/// The three presets produced by [`encode_variants`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Standard,
    AdaptiveQuantization,
    AdaptiveHuffman,
}

impl Variant {
    pub const ALL: [Variant; 3] = [
        Variant::Standard,
        Variant::AdaptiveQuantization,
        Variant::AdaptiveHuffman,
    ];

    /// Short name, suitable as a file name suffix.
    pub fn name(self) -> &'static str {
        match self {
            Variant::Standard => "normal",
            Variant::AdaptiveQuantization => "dqt",
            Variant::AdaptiveHuffman => "dht",
        }
    }

    /// Options for this variant; `scale` applies to adaptive quantization.
    pub fn options(self, scale: f32) -> EncodeOptions {
        match self {
            Variant::Standard => EncodeOptions::standard(),
            Variant::AdaptiveQuantization => EncodeOptions::adaptive_quantization(scale),
            Variant::AdaptiveHuffman => EncodeOptions::adaptive_huffman(),
        }
    }
}

/// Encoded outputs of all three variants of one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSet {
    pub standard: Vec<u8>,
    pub adaptive_quantization: Vec<u8>,
    pub adaptive_huffman: Vec<u8>,
}

impl VariantSet {
    pub fn get(&self, variant: Variant) -> &[u8] {
        match variant {
            Variant::Standard => &self.standard,
            Variant::AdaptiveQuantization => &self.adaptive_quantization,
            Variant::AdaptiveHuffman => &self.adaptive_huffman,
        }
    }

    /// Byte size of each variant, in [`Variant::ALL`] order.
    pub fn sizes(&self) -> [(Variant, usize); 3] {
        Variant::ALL.map(|v| (v, self.get(v).len()))
    }
}

/// Unquantized DCT coefficients of an image, shared by all variants.
struct TransformedImage {
    frame: FrameHeader,
    /// Y, Cb, Cr in natural coefficient order.
    raw: [DctGrid; 3],
}

impl TransformedImage {
    fn new(grid: &PixelGrid<'_>) -> Result<Self> {
        let (width, height) = grid.cropped_dimensions(BLOCK_SIZE);
        if width == 0 || height == 0 {
            return Err(JpegError::InvalidDimensions {
                width: grid.width(),
                height: grid.height(),
            });
        }
        let frame = FrameHeader::baseline(width, height)?;
        tracing::debug!(
            width = grid.width(),
            height = grid.height(),
            cropped_width = width,
            cropped_height = height,
            "converting to YCbCr"
        );

        let planes = ColorPlanes::from_grid(grid, width, height);
        let transform = BlockTransform::new(BLOCK_SIZE);
        let raw = Channel::ALL.map(|ch| transform.transform_plane(planes.plane(ch), width, height));
        tracing::debug!(blocks = raw[0].total_blocks(), "forward DCT done");

        Ok(Self { frame, raw })
    }

    fn quant_tables(&self, quantization: Quantization) -> Result<[QuantTable; 2]> {
        match quantization {
            Quantization::Standard => Ok([
                tables::standard_quant_table(ChannelClass::Luma).clone(),
                tables::standard_quant_table(ChannelClass::Chroma).clone(),
            ]),
            Quantization::Adaptive { scale } => {
                let luma = PositionSamples::gather(&[&self.raw[0]]);
                let chroma = PositionSamples::gather(&[&self.raw[1], &self.raw[2]]);
                let tables = [
                    quant::adapt_table(&luma, scale, ChannelClass::Luma)?,
                    quant::adapt_table(&chroma, scale, ChannelClass::Chroma)?,
                ];
                tracing::debug!(scale, "adapted quantization tables");
                Ok(tables)
            }
        }
    }

    fn encode_to<W: Write>(&self, options: &EncodeOptions, writer: W) -> Result<usize> {
        let path = ZigzagPath::for_block_size(BLOCK_SIZE);
        let quant = self.quant_tables(options.quantization)?;

        let mut scan_grids = Vec::with_capacity(3);
        for ch in Channel::ALL {
            let table = &quant[ch.class() as usize];
            let quantized = quant::quantize_grid(&self.raw[ch as usize], table)?;
            scan_grids.push(scan::to_scan_order(&quantized, &path)?);
        }
        let scan_grids: [DctGrid; 3] = scan_grids
            .try_into()
            .map_err(|_| JpegError::InvalidInput("expected three components"))?;

        let huffman = match options.huffman {
            HuffmanTables::Standard => HuffmanTableSet::standard(),
            HuffmanTables::Adaptive => {
                let mut counter = CountingSink::new();
                scan::tokenize_scan(&scan_grids, &mut counter)?;
                let tables = counter.into_histograms().build_tables(options.length_limit);
                tracing::debug!(limit = ?options.length_limit, "built adaptive Huffman tables");
                tables
            }
        };

        let mut coder = CodingSink::new(&huffman)?;
        scan::tokenize_scan(&scan_grids, &mut coder)?;
        let entropy = coder.finish();
        tracing::debug!(bytes = entropy.len(), "entropy coding done");

        let mut out = ContainerWriter::new(writer);
        out.write_soi()?;
        for class in [ChannelClass::Luma, ChannelClass::Chroma] {
            out.write_dqt(class.table_id(), &quant[class as usize], &path)?;
        }
        out.write_sof0(&self.frame)?;
        for spec in huffman.in_dht_order() {
            out.write_dht(spec)?;
        }
        out.write_sos(&ScanHeader::baseline())?;
        out.write_entropy(&entropy)?;
        out.write_eoi()?;

        tracing::debug!(bytes = out.bytes_written(), "JPEG written");
        Ok(out.bytes_written())
    }
}

/// Encode a pixel grid into a JPEG byte vector.
pub fn encode(grid: &PixelGrid<'_>, options: &EncodeOptions) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encode_to_writer(grid, options, &mut out)?;
    Ok(out)
}

/// Encode a pixel grid into any byte sink. Returns the number of bytes written.
///
/// Nothing is written until every stage before the container has succeeded.
pub fn encode_to_writer<W: Write>(grid: &PixelGrid<'_>, options: &EncodeOptions, writer: W) -> Result<usize> {
    TransformedImage::new(grid)?.encode_to(options, writer)
}

/// Encode all three [`Variant`]s of one image.
///
/// The DCT is computed once; the variants are then encoded concurrently when
/// the `parallel` feature is enabled.
pub fn encode_variants(grid: &PixelGrid<'_>, scale: f32) -> Result<VariantSet> {
    let image = TransformedImage::new(grid)?;
    let run = |variant: Variant| -> Result<Vec<u8>> {
        let mut out = Vec::new();
        image.encode_to(&variant.options(scale), &mut out)?;
        Ok(out)
    };

    #[cfg(feature = "parallel")]
    let (standard, (adaptive_quantization, adaptive_huffman)) = rayon::join(
        || run(Variant::Standard),
        || {
            rayon::join(
                || run(Variant::AdaptiveQuantization),
                || run(Variant::AdaptiveHuffman),
            )
        },
    );
    #[cfg(not(feature = "parallel"))]
    let (standard, (adaptive_quantization, adaptive_huffman)) = (
        run(Variant::Standard),
        (run(Variant::AdaptiveQuantization), run(Variant::AdaptiveHuffman)),
    );

    Ok(VariantSet {
        standard: standard?,
        adaptive_quantization: adaptive_quantization?,
        adaptive_huffman: adaptive_huffman?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::marker::{entropy_data, read_segments, DHT, DQT, EOI, SOF0, SOI, SOS};

    fn gradient(width: usize, height: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                data.push((x * 255 / width.max(1)) as u8);
                data.push((y * 255 / height.max(1)) as u8);
                data.push(((x + y) * 7 % 256) as u8);
            }
        }
        data
    }

    #[test]
    fn options_presets() {
        assert_eq!(EncodeOptions::default(), EncodeOptions::standard());
        let q = EncodeOptions::adaptive_quantization(2.0);
        assert_eq!(q.quantization, Quantization::Adaptive { scale: 2.0 });
        assert_eq!(q.huffman, HuffmanTables::Standard);
        let h = EncodeOptions::adaptive_huffman().with_length_limit(LengthLimit::Rebalance);
        assert_eq!(h.huffman, HuffmanTables::Adaptive);
        assert_eq!(h.quantization, Quantization::Standard);
        assert_eq!(h.length_limit, LengthLimit::Rebalance);
    }

    #[test]
    fn segment_order() {
        let data = gradient(16, 16);
        let grid = PixelGrid::new(&data, 16, 16).unwrap();
        let jpeg = encode(&grid, &EncodeOptions::standard()).unwrap();
        let (segments, _) = read_segments(&jpeg).unwrap();
        let markers: Vec<u8> = segments.iter().map(|s| s.marker).collect();
        assert_eq!(markers, vec![SOI, DQT, DQT, SOF0, DHT, DHT, DHT, DHT, SOS]);
        let dht_ids: Vec<u8> = segments.iter().filter(|s| s.marker == DHT).map(|s| s.data[0]).collect();
        assert_eq!(dht_ids, vec![0x10, 0x11, 0x00, 0x01]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, EOI]);
    }

    #[test]
    fn too_small_image_is_rejected() {
        let data = gradient(7, 20);
        let grid = PixelGrid::new(&data, 7, 20).unwrap();
        assert!(matches!(
            encode(&grid, &EncodeOptions::standard()),
            Err(JpegError::InvalidDimensions { width: 7, height: 20 })
        ));
    }

    #[test]
    fn frame_uses_cropped_size() {
        let data = gradient(21, 10);
        let grid = PixelGrid::new(&data, 21, 10).unwrap();
        let jpeg = encode(&grid, &EncodeOptions::standard()).unwrap();
        let (segments, _) = read_segments(&jpeg).unwrap();
        let sof = segments.iter().find(|s| s.marker == SOF0).unwrap();
        let frame = FrameHeader::parse(&sof.data).unwrap();
        assert_eq!((frame.width, frame.height), (16, 8));
    }

    #[test]
    fn writer_and_vec_agree() {
        let data = gradient(24, 16);
        let grid = PixelGrid::new(&data, 24, 16).unwrap();
        let options = EncodeOptions::adaptive_huffman();
        let a = encode(&grid, &options).unwrap();
        let mut b = Vec::new();
        let written = encode_to_writer(&grid, &options, &mut b).unwrap();
        assert_eq!(a, b);
        assert_eq!(written, b.len());
    }

    #[test]
    fn variants_match_single_encodes() {
        let data = gradient(32, 24);
        let grid = PixelGrid::new(&data, 32, 24).unwrap();
        let set = encode_variants(&grid, DEFAULT_ADAPTIVE_SCALE).unwrap();
        for variant in Variant::ALL {
            let single = encode(&grid, &variant.options(DEFAULT_ADAPTIVE_SCALE)).unwrap();
            assert_eq!(set.get(variant), single.as_slice(), "{}", variant.name());
        }
        let sizes = set.sizes();
        assert_eq!(sizes[0], (Variant::Standard, set.standard.len()));
    }

    #[test]
    fn entropy_data_is_stuffed() {
        let data = gradient(64, 64);
        let grid = PixelGrid::new(&data, 64, 64).unwrap();
        let jpeg = encode(&grid, &EncodeOptions::standard()).unwrap();
        let entropy = entropy_data(&jpeg).unwrap();
        for (i, &b) in entropy.iter().enumerate() {
            if b == 0xFF {
                assert_eq!(entropy.get(i + 1), Some(&0x00));
            }
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let data = gradient(40, 40);
        let grid = PixelGrid::new(&data, 40, 40).unwrap();
        let options = EncodeOptions::adaptive_quantization(1.5);
        assert_eq!(encode(&grid, &options).unwrap(), encode(&grid, &options).unwrap());
    }
}
