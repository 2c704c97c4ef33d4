// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Quantization and Huffman table data and DQT/DHT payloads.
//!
//! Holds the standard tables from ITU-T T.81 Annex K, the [`HuffmanSpec`]
//! type (the exact DHT payload shape), and serialization of DQT/DHT segment
//! bodies. The parsers exist to read produced files back.

use super::color::ChannelClass;
use super::dct::QuantTable;
use super::error::{JpegError, Result};
use super::zigzag::ZigzagPath;

/// Standard luminance quantization table (Annex K, Table K.1), natural order.
pub static STD_LUMA_QUANT: QuantTable = QuantTable::from_const([
    16, 11, 10, 16, 24, 40, 51, 61,
    12, 12, 14, 19, 26, 58, 60, 55,
    14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62,
    18, 22, 37, 56, 68, 109, 103, 77,
    24, 35, 55, 64, 81, 104, 113, 92,
    49, 64, 78, 87, 103, 121, 120, 101,
    72, 92, 95, 98, 112, 100, 103, 99,
]);

/// Standard chrominance quantization table (Annex K, Table K.2), natural order.
pub static STD_CHROMA_QUANT: QuantTable = QuantTable::from_const([
    17, 18, 24, 47, 99, 99, 99, 99,
    18, 21, 26, 66, 99, 99, 99, 99,
    24, 26, 56, 99, 99, 99, 99, 99,
    47, 66, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
]);

/// Standard quantization table for a channel class.
pub fn standard_quant_table(class: ChannelClass) -> &'static QuantTable {
    match class {
        ChannelClass::Luma => &STD_LUMA_QUANT,
        ChannelClass::Chroma => &STD_CHROMA_QUANT,
    }
}

/// Huffman table class nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableClass {
    Dc = 0,
    Ac = 1,
}

/// Huffman table specification: length counts plus symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanSpec {
    /// Table class: 0 = DC, 1 = AC.
    pub class: u8,
    /// Table ID (0–3).
    pub id: u8,
    /// Number of codes of each length (1–16).
    pub bits: [u8; 16],
    /// Symbol values in order of increasing code length.
    pub huffval: Vec<u8>,
}

impl HuffmanSpec {
    /// The standard Annex K table for (class, channel class).
    pub fn standard(class: TableClass, channel: ChannelClass) -> Self {
        let (bits, vals) = match (class, channel) {
            (TableClass::Dc, ChannelClass::Luma) => (&STD_LUMA_DC_BITS, &STD_LUMA_DC_VALUES[..]),
            (TableClass::Dc, ChannelClass::Chroma) => (&STD_CHROMA_DC_BITS, &STD_CHROMA_DC_VALUES[..]),
            (TableClass::Ac, ChannelClass::Luma) => (&STD_LUMA_AC_BITS, &STD_LUMA_AC_VALUES[..]),
            (TableClass::Ac, ChannelClass::Chroma) => (&STD_CHROMA_AC_BITS, &STD_CHROMA_AC_VALUES[..]),
        };
        Self {
            class: class as u8,
            id: channel.table_id(),
            bits: *bits,
            huffval: vals.to_vec(),
        }
    }

    /// Number of symbols declared by the length counts.
    pub fn symbol_count(&self) -> usize {
        self.bits.iter().map(|&b| b as usize).sum()
    }

    /// Class/id byte as written in the DHT segment.
    pub fn tc_th(&self) -> u8 {
        (self.class << 4) | (self.id & 0x0F)
    }
}

/// The four Huffman tables of one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTableSet {
    pub luma_dc: HuffmanSpec,
    pub luma_ac: HuffmanSpec,
    pub chroma_dc: HuffmanSpec,
    pub chroma_ac: HuffmanSpec,
}

impl HuffmanTableSet {
    /// The Annex K tables.
    pub fn standard() -> Self {
        Self {
            luma_dc: HuffmanSpec::standard(TableClass::Dc, ChannelClass::Luma),
            luma_ac: HuffmanSpec::standard(TableClass::Ac, ChannelClass::Luma),
            chroma_dc: HuffmanSpec::standard(TableClass::Dc, ChannelClass::Chroma),
            chroma_ac: HuffmanSpec::standard(TableClass::Ac, ChannelClass::Chroma),
        }
    }

    pub fn get(&self, class: TableClass, channel: ChannelClass) -> &HuffmanSpec {
        match (class, channel) {
            (TableClass::Dc, ChannelClass::Luma) => &self.luma_dc,
            (TableClass::Ac, ChannelClass::Luma) => &self.luma_ac,
            (TableClass::Dc, ChannelClass::Chroma) => &self.chroma_dc,
            (TableClass::Ac, ChannelClass::Chroma) => &self.chroma_ac,
        }
    }

    /// Tables in DHT segment order: AC luma, AC chroma, DC luma, DC chroma.
    pub fn in_dht_order(&self) -> [&HuffmanSpec; 4] {
        [&self.luma_ac, &self.chroma_ac, &self.luma_dc, &self.chroma_dc]
    }
}

const STD_LUMA_DC_BITS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
const STD_LUMA_DC_VALUES: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

const STD_CHROMA_DC_BITS: [u8; 16] = [0, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0];
const STD_CHROMA_DC_VALUES: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

const STD_LUMA_AC_BITS: [u8; 16] = [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7d];
const STD_LUMA_AC_VALUES: [u8; 162] = [
    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61, 0x07,
    0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08, 0x23, 0x42, 0xb1, 0xc1, 0x15, 0x52, 0xd1, 0xf0,
    0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x25, 0x26, 0x27, 0x28,
    0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49,
    0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69,
    0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
    0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7,
    0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5,
    0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe1, 0xe2,
    0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

const STD_CHROMA_AC_BITS: [u8; 16] = [0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 0x77];
const STD_CHROMA_AC_VALUES: [u8; 162] = [
    0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21, 0x31, 0x06, 0x12, 0x41, 0x51, 0x07, 0x61, 0x71,
    0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91, 0xa1, 0xb1, 0xc1, 0x09, 0x23, 0x33, 0x52, 0xf0,
    0x15, 0x62, 0x72, 0xd1, 0x0a, 0x16, 0x24, 0x34, 0xe1, 0x25, 0xf1, 0x17, 0x18, 0x19, 0x1a, 0x26,
    0x27, 0x28, 0x29, 0x2a, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48,
    0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68,
    0x69, 0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87,
    0x88, 0x89, 0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5,
    0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3,
    0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda,
    0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

/// Build a DQT segment body (without marker and length) for one table.
///
/// Values are written in zigzag order. 8-bit precision is used when every
/// entry fits, 16-bit (Pq = 1) otherwise.
pub fn dqt_payload(table_id: u8, qt: &QuantTable, path: &ZigzagPath) -> Vec<u8> {
    debug_assert_eq!(path.len(), 64);
    let precision = if qt.fits_8bit() { 0u8 } else { 1u8 };
    let mut out = Vec::with_capacity(1 + 64 * (precision as usize + 1));
    out.push((precision << 4) | (table_id & 0x0F));

    for ni in path.natural_indices() {
        let v = qt.values()[ni];
        if precision == 0 {
            out.push(v as u8);
        } else {
            out.extend_from_slice(&v.to_be_bytes());
        }
    }
    out
}

/// Parse a DQT marker segment body (after the 2-byte length).
///
/// Returns a list of (table_id, QuantTable) pairs. A single DQT segment
/// can contain multiple tables.
pub fn parse_dqt(data: &[u8], path: &ZigzagPath) -> Result<Vec<(u8, QuantTable)>> {
    let mut tables = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let pq_tq = data[pos];
        pos += 1;
        let precision = pq_tq >> 4;
        let table_id = pq_tq & 0x0F;
        if table_id > 3 {
            return Err(JpegError::InvalidMarkerData("DQT table id out of range"));
        }

        let width = match precision {
            0 => 1,
            1 => 2,
            _ => return Err(JpegError::InvalidMarkerData("invalid DQT precision")),
        };
        let body = data.get(pos..pos + 64 * width).ok_or(JpegError::UnexpectedEof)?;

        let mut values = [0u16; 64];
        for (zi, ni) in path.natural_indices().enumerate() {
            values[ni] = if width == 1 {
                body[zi] as u16
            } else {
                u16::from_be_bytes([body[zi * 2], body[zi * 2 + 1]])
            };
        }
        pos += 64 * width;

        tables.push((table_id, QuantTable::new(values)?));
    }

    Ok(tables)
}

/// Build a DHT segment body (without marker and length) for one table.
pub fn dht_payload(spec: &HuffmanSpec) -> Vec<u8> {
    let mut out = Vec::with_capacity(17 + spec.huffval.len());
    out.push(spec.tc_th());
    out.extend_from_slice(&spec.bits);
    out.extend_from_slice(&spec.huffval);
    out
}

/// Parse a DHT marker segment body (after the 2-byte length).
///
/// Returns a list of HuffmanSpec. A single DHT segment can contain multiple tables.
pub fn parse_dht(data: &[u8]) -> Result<Vec<HuffmanSpec>> {
    let mut specs = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let tc_th = data[pos];
        pos += 1;
        let class = tc_th >> 4;
        let id = tc_th & 0x0F;

        if class > 1 || id > 3 {
            return Err(JpegError::InvalidMarkerData("DHT class or id out of range"));
        }

        let mut bits = [0u8; 16];
        bits.copy_from_slice(data.get(pos..pos + 16).ok_or(JpegError::UnexpectedEof)?);
        pos += 16;

        let total: usize = bits.iter().map(|&b| b as usize).sum();
        let huffval = data.get(pos..pos + total).ok_or(JpegError::UnexpectedEof)?.to_vec();
        pos += total;

        specs.push(HuffmanSpec {
            class,
            id,
            bits,
            huffval,
        });
    }

    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::zigzag::ZIGZAG_TO_NATURAL;

    fn path() -> std::sync::Arc<ZigzagPath> {
        ZigzagPath::for_block_size(8)
    }

    #[test]
    fn standard_specs_are_consistent() {
        for class in [TableClass::Dc, TableClass::Ac] {
            for channel in [ChannelClass::Luma, ChannelClass::Chroma] {
                let spec = HuffmanSpec::standard(class, channel);
                assert_eq!(spec.symbol_count(), spec.huffval.len());
            }
        }
        let ac = HuffmanSpec::standard(TableClass::Ac, ChannelClass::Chroma);
        assert_eq!(ac.tc_th(), 0x11);
        assert_eq!(ac.huffval.len(), 162);
        let dc = HuffmanSpec::standard(TableClass::Dc, ChannelClass::Luma);
        assert_eq!(dc.tc_th(), 0x00);
    }

    #[test]
    fn dht_order() {
        let set = HuffmanTableSet::standard();
        let order: Vec<u8> = set.in_dht_order().iter().map(|s| s.tc_th()).collect();
        assert_eq!(order, vec![0x10, 0x11, 0x00, 0x01]);
        assert_eq!(set.get(TableClass::Ac, ChannelClass::Chroma), &set.chroma_ac);
    }

    #[test]
    fn dqt_written_in_zigzag_order() {
        let mut values = [0u16; 64];
        for (i, v) in values.iter_mut().enumerate() {
            *v = (i + 1) as u16;
        }
        let qt = QuantTable::new(values).unwrap();
        let body = dqt_payload(1, &qt, &path());
        assert_eq!(body.len(), 65);
        assert_eq!(body[0], 0x01);
        for zi in 0..64 {
            assert_eq!(body[1 + zi] as usize, ZIGZAG_TO_NATURAL[zi] + 1);
        }
    }

    #[test]
    fn dqt_round_trip() {
        let body = dqt_payload(0, &STD_LUMA_QUANT, &path());
        let tables = parse_dqt(&body, &path()).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].0, 0);
        assert_eq!(tables[0].1, STD_LUMA_QUANT);
    }

    #[test]
    fn dqt_16bit_round_trip() {
        let mut values = [5u16; 64];
        values[0] = 511;
        values[63] = 300;
        let qt = QuantTable::new(values).unwrap();
        let body = dqt_payload(1, &qt, &path());
        assert_eq!(body[0], 0x11);
        assert_eq!(body.len(), 1 + 128);
        let tables = parse_dqt(&body, &path()).unwrap();
        assert_eq!(tables[0].1.values(), &values);
    }

    #[test]
    fn parse_dqt_truncated() {
        let body = [0x00u8, 1, 2, 3];
        assert!(matches!(parse_dqt(&body, &path()), Err(JpegError::UnexpectedEof)));
    }

    #[test]
    fn dht_round_trip() {
        let spec = HuffmanSpec::standard(TableClass::Ac, ChannelClass::Luma);
        let body = dht_payload(&spec);
        assert_eq!(body.len(), 1 + 16 + 162);
        let specs = parse_dht(&body).unwrap();
        assert_eq!(specs, vec![spec]);
    }

    #[test]
    fn empty_dht_round_trip() {
        let spec = HuffmanSpec {
            class: 0,
            id: 1,
            bits: [0; 16],
            huffval: vec![],
        };
        let specs = parse_dht(&dht_payload(&spec)).unwrap();
        assert_eq!(specs, vec![spec]);
    }
}
