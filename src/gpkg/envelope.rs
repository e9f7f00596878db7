//! GeoPackage binary header stripping.
//!
//! A stored geometry blob is `"GP"`, a version byte, a flags byte, a 4-byte
//! SRS id, an optional envelope of 8-byte doubles, then the WKB payload.
//! Flags bit 0 is the byte order, bits 1..=3 the envelope indicator.

use crate::error::{LookupError, Result};

const MAGIC: [u8; 2] = *b"GP";
const HEADER_LEN: usize = 8;
const SRID_MIN: i32 = -1;
const SRID_MAX: i32 = 1_000_000;

/// Decoded GeoPackage header fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeHeader {
    pub flags: u8,
    pub little_endian: bool,
    /// Envelope doubles in file order (minx, maxx, miny, maxy, ...).
    pub envelope: Vec<f64>,
    pub srid: i32,
}

/// A blob split into its header (if any) and the bare WKB payload.
#[derive(Debug, Clone, PartialEq)]
pub struct StrippedGeometry<'a> {
    pub header: Option<EnvelopeHeader>,
    pub payload: &'a [u8],
}

impl StrippedGeometry<'_> {
    pub fn srid(&self) -> Option<i32> {
        self.header.as_ref().map(|h| h.srid)
    }
}

/// Number of envelope doubles for a 3-bit indicator.
pub fn envelope_element_count(indicator: u8) -> usize {
    match indicator {
        1 => 4,
        2 | 3 => 6,
        4 => 8,
        // 0 is "no envelope"; 5..=7 are reserved and read as no envelope
        _ => 0,
    }
}

/// Byte offset of the WKB payload for a given envelope indicator.
pub fn payload_offset(indicator: u8) -> usize {
    HEADER_LEN + envelope_element_count(indicator) * 8
}

/// Resolve the SRS id when the header's byte order label can't be trusted:
/// take the big-endian reading if it's a plausible id, otherwise little-endian.
pub fn resolve_srid(raw: [u8; 4]) -> i32 {
    let big = i32::from_be_bytes(raw);
    if (SRID_MIN..=SRID_MAX).contains(&big) {
        big
    } else {
        i32::from_le_bytes(raw)
    }
}

/// Strip the GeoPackage header from a stored blob.
///
/// Blobs without the `GP` magic are returned whole as bare WKB.
pub fn strip_envelope(blob: &[u8]) -> Result<StrippedGeometry<'_>> {
    if blob.len() < HEADER_LEN {
        return Err(LookupError::Format(format!(
            "geometry blob too short: {} bytes",
            blob.len()
        )));
    }

    if blob[..2] != MAGIC {
        return Ok(StrippedGeometry {
            header: None,
            payload: blob,
        });
    }

    let flags = blob[3];
    let little_endian = flags & 0x01 == 1;
    let indicator = (flags >> 1) & 0x07;
    let srid = resolve_srid([blob[4], blob[5], blob[6], blob[7]]);

    let offset = payload_offset(indicator);
    if blob.len() <= offset {
        return Err(LookupError::Format(format!(
            "invalid gpkg header/envelope: payload offset {} beyond {} bytes",
            offset,
            blob.len()
        )));
    }

    let envelope = blob[HEADER_LEN..offset]
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            if little_endian {
                f64::from_le_bytes(raw)
            } else {
                f64::from_be_bytes(raw)
            }
        })
        .collect();

    Ok(StrippedGeometry {
        header: Some(EnvelopeHeader {
            flags,
            little_endian,
            envelope,
            srid,
        }),
        payload: &blob[offset..],
    })
}
