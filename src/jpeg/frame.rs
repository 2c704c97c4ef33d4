// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Baseline frame header (SOF0).
//!
//! The encoder always writes 8-bit precision and three components with 1×1
//! sampling: Y (id 1) on quantization table 0, Cb (id 2) and Cr (id 3) on
//! table 1.

use super::color::Channel;
use super::error::{JpegError, Result};

/// One component entry of the frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// Component ID (1=Y, 2=Cb, 3=Cr).
    pub id: u8,
    /// Horizontal sampling factor (1–4).
    pub h_sampling: u8,
    /// Vertical sampling factor (1–4).
    pub v_sampling: u8,
    /// Quantization table ID (0–3).
    pub quant_table_id: u8,
}

/// SOF0 payload contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    /// Sample precision in bits (always 8 here).
    pub precision: u8,
    pub height: u16,
    pub width: u16,
    pub components: Vec<Component>,
}

impl FrameHeader {
    /// Header for a three-component, unsubsampled baseline frame.
    ///
    /// Fails with [`JpegError::InvalidDimensions`] if a side does not fit
    /// in 16 bits or is zero.
    pub fn baseline(width: usize, height: usize) -> Result<Self> {
        let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
            return Err(JpegError::InvalidDimensions { width, height });
        };
        if w == 0 || h == 0 {
            return Err(JpegError::InvalidDimensions { width, height });
        }
        let components = Channel::ALL
            .iter()
            .map(|&ch| Component {
                id: ch as u8 + 1,
                h_sampling: 1,
                v_sampling: 1,
                quant_table_id: ch.class().table_id(),
            })
            .collect();
        Ok(Self {
            precision: 8,
            height: h,
            width: w,
            components,
        })
    }

    /// Segment body (without marker and length).
    pub fn to_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(6 + 3 * self.components.len());
        out.push(self.precision);
        out.extend_from_slice(&self.height.to_be_bytes());
        out.extend_from_slice(&self.width.to_be_bytes());
        out.push(self.components.len() as u8);
        for c in &self.components {
            out.push(c.id);
            out.push((c.h_sampling << 4) | c.v_sampling);
            out.push(c.quant_table_id);
        }
        out
    }

    /// Parse a SOF0 marker segment body (after the 2-byte length).
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 6 {
            return Err(JpegError::UnexpectedEof);
        }

        let precision = data[0];
        if precision != 8 {
            return Err(JpegError::InvalidMarkerData("unsupported sample precision"));
        }

        let height = u16::from_be_bytes([data[1], data[2]]);
        let width = u16::from_be_bytes([data[3], data[4]]);
        let num_components = data[5] as usize;

        if width == 0 || height == 0 {
            return Err(JpegError::InvalidDimensions {
                width: width as usize,
                height: height as usize,
            });
        }
        let body = data
            .get(6..6 + num_components * 3)
            .ok_or(JpegError::UnexpectedEof)?;

        let mut components = Vec::with_capacity(num_components);
        for chunk in body.chunks_exact(3) {
            let h_sampling = chunk[1] >> 4;
            let v_sampling = chunk[1] & 0x0F;
            if !(1..=4).contains(&h_sampling) || !(1..=4).contains(&v_sampling) {
                return Err(JpegError::InvalidMarkerData("invalid sampling factor"));
            }
            if chunk[2] > 3 {
                return Err(JpegError::InvalidMarkerData("quantization table id out of range"));
            }
            components.push(Component {
                id: chunk[0],
                h_sampling,
                v_sampling,
                quant_table_id: chunk[2],
            });
        }

        Ok(Self {
            precision,
            height,
            width,
            components,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_payload_bytes() {
        let header = FrameHeader::baseline(640, 480).unwrap();
        assert_eq!(
            header.to_payload(),
            vec![8, 0x01, 0xE0, 0x02, 0x80, 3, 1, 0x11, 0, 2, 0x11, 1, 3, 0x11, 1]
        );
    }

    #[test]
    fn payload_parses_back() {
        let header = FrameHeader::baseline(16, 8).unwrap();
        let parsed = FrameHeader::parse(&header.to_payload()).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn rejects_oversized_frame() {
        assert!(matches!(
            FrameHeader::baseline(70_000, 8),
            Err(JpegError::InvalidDimensions { width: 70_000, height: 8 })
        ));
        assert!(FrameHeader::baseline(0, 8).is_err());
    }

    #[test]
    fn parse_truncated() {
        let data = [8, 0, 8, 0, 8, 3, 1, 0x11];
        assert!(matches!(FrameHeader::parse(&data), Err(JpegError::UnexpectedEof)));
    }

    #[test]
    fn parse_rejects_precision() {
        let mut data = FrameHeader::baseline(8, 8).unwrap().to_payload();
        data[0] = 12;
        assert!(FrameHeader::parse(&data).is_err());
    }
}
