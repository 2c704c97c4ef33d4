// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! JPEG marker segments: writing the container and walking it back.
//!
//! [`ContainerWriter`] emits length-prefixed marker segments to any
//! [`Write`] sink. [`read_segments`] walks the header of a produced file up
//! to SOS and returns the byte offset where entropy-coded data begins.

use std::io::Write;

use super::color::Channel;
use super::dct::QuantTable;
use super::error::{JpegError, Result};
use super::frame::FrameHeader;
use super::tables::{dht_payload, dqt_payload, HuffmanSpec};
use super::zigzag::ZigzagPath;

/// JPEG marker constants.
pub const SOI: u8 = 0xD8;
pub const EOI: u8 = 0xD9;
pub const SOF0: u8 = 0xC0;
pub const DHT: u8 = 0xC4;
pub const DQT: u8 = 0xDB;
pub const SOS: u8 = 0xDA;

/// A marker segment read back from a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSegment {
    /// The marker byte (e.g., 0xDB for DQT). Does NOT include the 0xFF prefix.
    pub marker: u8,
    /// The segment data NOT including the marker or the 2-byte length field.
    pub data: Vec<u8>,
    /// Byte offset of the marker (the 0xFF byte).
    pub offset: usize,
}

/// Scan header contents: component selectors plus spectral parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHeader {
    /// (component_id, dc_table_id, ac_table_id) per scan component.
    pub components: Vec<(u8, u8, u8)>,
    /// Start of spectral selection.
    pub ss: u8,
    /// End of spectral selection.
    pub se: u8,
    /// Successive approximation bits (Ah << 4 | Al).
    pub ah_al: u8,
}

impl ScanHeader {
    /// Single interleaved scan over Y, Cb, Cr with full spectral range.
    pub fn baseline() -> Self {
        let components = Channel::ALL
            .iter()
            .map(|&ch| {
                let table = ch.class().table_id();
                (ch as u8 + 1, table, table)
            })
            .collect();
        Self {
            components,
            ss: 0,
            se: 63,
            ah_al: 0,
        }
    }

    pub fn to_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + 2 * self.components.len());
        out.push(self.components.len() as u8);
        for &(id, dc, ac) in &self.components {
            out.push(id);
            out.push((dc << 4) | (ac & 0x0F));
        }
        out.extend_from_slice(&[self.ss, self.se, self.ah_al]);
        out
    }

    /// Parse an SOS segment body.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let (&count, rest) = data
            .split_first()
            .ok_or(JpegError::InvalidMarkerData("empty SOS"))?;
        let count = count as usize;
        if rest.len() < count * 2 + 3 {
            return Err(JpegError::UnexpectedEof);
        }
        let components = rest[..count * 2]
            .chunks_exact(2)
            .map(|c| (c[0], c[1] >> 4, c[1] & 0x0F))
            .collect();
        let params = &rest[count * 2..];
        Ok(Self {
            components,
            ss: params[0],
            se: params[1],
            ah_al: params[2],
        })
    }
}

/// Length-prefixed segment writer over any byte sink.
pub struct ContainerWriter<W: Write> {
    inner: W,
    written: usize,
}

impl<W: Write> ContainerWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Bytes written so far.
    pub fn bytes_written(&self) -> usize {
        self.written
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len();
        Ok(())
    }

    fn write_marker(&mut self, marker: u8) -> Result<()> {
        self.write_all(&[0xFF, marker])
    }

    /// Write marker, 2-byte big-endian length (payload + 2), then payload.
    pub fn write_segment(&mut self, marker: u8, payload: &[u8]) -> Result<()> {
        let length = u16::try_from(payload.len() + 2)
            .map_err(|_| JpegError::InvalidMarkerData("segment payload too long"))?;
        self.write_marker(marker)?;
        self.write_all(&length.to_be_bytes())?;
        self.write_all(payload)
    }

    pub fn write_soi(&mut self) -> Result<()> {
        self.write_marker(SOI)
    }

    /// One DQT segment holding one table in zigzag order.
    pub fn write_dqt(&mut self, table_id: u8, table: &QuantTable, path: &ZigzagPath) -> Result<()> {
        self.write_segment(DQT, &dqt_payload(table_id, table, path))
    }

    pub fn write_sof0(&mut self, frame: &FrameHeader) -> Result<()> {
        self.write_segment(SOF0, &frame.to_payload())
    }

    /// One DHT segment holding one table.
    pub fn write_dht(&mut self, spec: &HuffmanSpec) -> Result<()> {
        self.write_segment(DHT, &dht_payload(spec))
    }

    pub fn write_sos(&mut self, scan: &ScanHeader) -> Result<()> {
        self.write_segment(SOS, &scan.to_payload())
    }

    /// Already byte-stuffed entropy-coded data.
    pub fn write_entropy(&mut self, data: &[u8]) -> Result<()> {
        self.write_all(data)
    }

    pub fn write_eoi(&mut self) -> Result<()> {
        self.write_marker(EOI)?;
        self.inner.flush()?;
        Ok(())
    }
}

/// Walk the header segments of a file from SOI through SOS.
///
/// Returns the segments (SOI included, with empty data) and the byte offset
/// where entropy-coded data begins.
pub fn read_segments(data: &[u8]) -> Result<(Vec<MarkerSegment>, usize)> {
    if data.len() < 2 || data[0] != 0xFF || data[1] != SOI {
        return Err(JpegError::InvalidMarkerData("missing SOI marker"));
    }
    let mut segments = vec![MarkerSegment {
        marker: SOI,
        data: Vec::new(),
        offset: 0,
    }];
    let mut pos = 2;

    loop {
        if pos + 4 > data.len() {
            return Err(JpegError::UnexpectedEof);
        }
        if data[pos] != 0xFF {
            return Err(JpegError::InvalidMarkerData("expected marker"));
        }
        let offset = pos;
        let marker = data[pos + 1];
        if marker == EOI {
            return Err(JpegError::InvalidMarkerData("EOI before SOS"));
        }

        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if length < 2 || pos + 2 + length > data.len() {
            return Err(JpegError::InvalidMarkerData("invalid segment length"));
        }
        segments.push(MarkerSegment {
            marker,
            data: data[pos + 4..pos + 2 + length].to_vec(),
            offset,
        });
        pos += 2 + length;

        if marker == SOS {
            return Ok((segments, pos));
        }
    }
}

/// The entropy-coded bytes between the SOS header and the closing EOI.
pub fn entropy_data(data: &[u8]) -> Result<&[u8]> {
    let (_, start) = read_segments(data)?;
    match data {
        [.., 0xFF, EOI] if data.len() >= start + 2 => Ok(&data[start..data.len() - 2]),
        _ => Err(JpegError::InvalidMarkerData("missing EOI marker")),
    }
}
