//! GeoPackage geometry blob decoding.
//!
//! Stored geometries carry a GeoPackage binary header in front of a WKB
//! payload. [`decode_geometry`] strips the header and parses the payload.

pub mod envelope;
pub mod wkb;

use geo_types::MultiPolygon;

use crate::error::Result;

pub use envelope::{strip_envelope, EnvelopeHeader, StrippedGeometry};
pub use wkb::parse_multipolygon;

/// Decode a stored geometry blob into a multipolygon.
pub fn decode_geometry(blob: &[u8]) -> Result<MultiPolygon<f64>> {
    let stripped = strip_envelope(blob)?;
    parse_multipolygon(stripped.payload)
}
