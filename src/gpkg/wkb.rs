//! WKB polygon / multipolygon reader.

use geo_types::{Coord, LineString, MultiPolygon, Polygon};

use crate::error::{LookupError, Result};

const WKB_POLYGON: u32 = 3;
const WKB_MULTIPOLYGON: u32 = 6;

const EWKB_Z: u32 = 0x8000_0000;
const EWKB_M: u32 = 0x4000_0000;
const EWKB_SRID: u32 = 0x2000_0000;

/// Parse a WKB payload into a multipolygon. A bare polygon becomes a
/// one-element multipolygon.
pub fn parse_multipolygon(payload: &[u8]) -> Result<MultiPolygon<f64>> {
    let mut reader = WkbReader::new(payload);
    let header = reader.read_header()?;

    let multipolygon = match header.kind {
        WKB_POLYGON => MultiPolygon::new(vec![reader.read_polygon_body(&header)?]),
        WKB_MULTIPOLYGON => {
            let count = reader.read_u32(header.little_endian)? as usize;
            let mut polygons = Vec::with_capacity(count.min(reader.remaining() / 9));
            for _ in 0..count {
                let inner = reader.read_header()?;
                if inner.kind != WKB_POLYGON {
                    return Err(LookupError::Format(format!(
                        "expected polygon inside multipolygon, got geometry type {}",
                        inner.kind
                    )));
                }
                polygons.push(reader.read_polygon_body(&inner)?);
            }
            MultiPolygon::new(polygons)
        }
        other => {
            return Err(LookupError::Format(format!(
                "unsupported geometry type {}",
                other
            )))
        }
    };

    Ok(multipolygon)
}

#[derive(Debug)]
struct GeometryHeader {
    little_endian: bool,
    kind: u32,
    /// Ordinates per vertex (2, 3 or 4)
    dims: usize,
}

struct WkbReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WkbReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        if self.remaining() < N {
            return Err(LookupError::Format(format!(
                "truncated WKB: needed {} bytes at offset {}, {} left",
                N,
                self.pos,
                self.remaining()
            )));
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    fn read_u32(&mut self, little_endian: bool) -> Result<u32> {
        let raw = self.take::<4>()?;
        Ok(if little_endian {
            u32::from_le_bytes(raw)
        } else {
            u32::from_be_bytes(raw)
        })
    }

    fn read_f64(&mut self, little_endian: bool) -> Result<f64> {
        let raw = self.take::<8>()?;
        Ok(if little_endian {
            f64::from_le_bytes(raw)
        } else {
            f64::from_be_bytes(raw)
        })
    }

    fn read_header(&mut self) -> Result<GeometryHeader> {
        let little_endian = match self.take::<1>()?[0] {
            0 => false,
            1 => true,
            other => {
                return Err(LookupError::Format(format!(
                    "invalid WKB byte order marker {}",
                    other
                )))
            }
        };

        let raw = self.read_u32(little_endian)?;
        if raw & EWKB_SRID != 0 {
            self.read_u32(little_endian)?;
        }

        // EWKB high-bit flags or ISO thousands offsets
        let mut has_z = raw & EWKB_Z != 0;
        let mut has_m = raw & EWKB_M != 0;
        let code = raw & 0x0FFF_FFFF;
        match code / 1000 {
            1 => has_z = true,
            2 => has_m = true,
            3 => {
                has_z = true;
                has_m = true;
            }
            _ => {}
        }

        Ok(GeometryHeader {
            little_endian,
            kind: code % 1000,
            dims: 2 + has_z as usize + has_m as usize,
        })
    }

    fn read_polygon_body(&mut self, header: &GeometryHeader) -> Result<Polygon<f64>> {
        let ring_count = self.read_u32(header.little_endian)? as usize;
        if ring_count == 0 {
            return Ok(Polygon::new(LineString::new(vec![]), vec![]));
        }

        let exterior = self.read_ring(header)?;
        let mut interiors = Vec::with_capacity(ring_count - 1);
        for _ in 1..ring_count {
            interiors.push(self.read_ring(header)?);
        }
        Ok(Polygon::new(exterior, interiors))
    }

    fn read_ring(&mut self, header: &GeometryHeader) -> Result<LineString<f64>> {
        let point_count = self.read_u32(header.little_endian)? as usize;
        let needed = point_count.saturating_mul(header.dims * 8);
        if needed > self.remaining() {
            return Err(LookupError::Format(format!(
                "truncated WKB ring: {} points declared, {} bytes left",
                point_count,
                self.remaining()
            )));
        }

        let mut coords = Vec::with_capacity(point_count);
        for _ in 0..point_count {
            let x = self.read_f64(header.little_endian)?;
            let y = self.read_f64(header.little_endian)?;
            for _ in 2..header.dims {
                self.read_f64(header.little_endian)?;
            }
            coords.push(Coord { x, y });
        }
        Ok(LineString::new(coords))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use geo::polygon;

    fn square_with_hole() -> Polygon<f64> {
        polygon!(
            exterior: [
                (x: 0.0, y: 0.0),
                (x: 10.0, y: 0.0),
                (x: 10.0, y: 10.0),
                (x: 0.0, y: 10.0),
                (x: 0.0, y: 0.0),
            ],
            interiors: [[
                (x: 4.0, y: 4.0),
                (x: 6.0, y: 4.0),
                (x: 6.0, y: 6.0),
                (x: 4.0, y: 6.0),
                (x: 4.0, y: 4.0),
            ]]
        )
    }

    #[test]
    fn test_polygon_wrapped_into_multipolygon() {
        let poly = square_with_hole();
        let parsed = parse_multipolygon(&polygon_wkb(&poly)).unwrap();
        assert_eq!(parsed.0.len(), 1);
        assert_eq!(parsed.0[0], poly);
        assert_eq!(parsed.0[0].interiors().len(), 1);
    }

    #[test]
    fn test_multipolygon_keeps_order() {
        let a = square_with_hole();
        let b = polygon![
            (x: 20.0, y: 20.0),
            (x: 21.0, y: 20.0),
            (x: 21.0, y: 21.0),
            (x: 20.0, y: 20.0),
        ];
        let multi = MultiPolygon::new(vec![a.clone(), b.clone()]);
        let parsed = parse_multipolygon(&multipolygon_wkb(&multi)).unwrap();
        assert_eq!(parsed, multi);
    }

    #[test]
    fn test_big_endian_polygon() {
        let mut wkb = vec![0u8];
        wkb.extend_from_slice(&WKB_POLYGON.to_be_bytes());
        wkb.extend_from_slice(&1u32.to_be_bytes());
        wkb.extend_from_slice(&4u32.to_be_bytes());
        for (x, y) in [(0.0f64, 0.0f64), (1.0, 0.0), (0.0, 1.0), (0.0, 0.0)] {
            wkb.extend_from_slice(&x.to_be_bytes());
            wkb.extend_from_slice(&y.to_be_bytes());
        }
        let parsed = parse_multipolygon(&wkb).unwrap();
        assert_eq!(parsed.0[0].exterior().0[1], Coord { x: 1.0, y: 0.0 });
    }

    #[test]
    fn test_z_coordinates_dropped() {
        let mut wkb = vec![1u8];
        wkb.extend_from_slice(&1003u32.to_le_bytes());
        wkb.extend_from_slice(&1u32.to_le_bytes());
        wkb.extend_from_slice(&4u32.to_le_bytes());
        for (x, y) in [(0.0f64, 0.0f64), (1.0, 0.0), (0.0, 1.0), (0.0, 0.0)] {
            wkb.extend_from_slice(&x.to_le_bytes());
            wkb.extend_from_slice(&y.to_le_bytes());
            wkb.extend_from_slice(&99.0f64.to_le_bytes());
        }
        let parsed = parse_multipolygon(&wkb).unwrap();
        assert_eq!(parsed.0[0].exterior().0.len(), 4);
        assert_eq!(parsed.0[0].exterior().0[2], Coord { x: 0.0, y: 1.0 });
    }

    #[test]
    fn test_point_rejected() {
        let mut wkb = vec![1u8];
        wkb.extend_from_slice(&1u32.to_le_bytes());
        wkb.extend_from_slice(&1.0f64.to_le_bytes());
        wkb.extend_from_slice(&2.0f64.to_le_bytes());
        assert!(matches!(
            parse_multipolygon(&wkb),
            Err(LookupError::Format(_))
        ));
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let wkb = polygon_wkb(&square_with_hole());
        for cut in [0, 1, 5, 9, 20, wkb.len() - 1] {
            assert!(
                parse_multipolygon(&wkb[..cut]).is_err(),
                "cut at {} should fail",
                cut
            );
        }
    }

    #[test]
    fn test_bad_byte_order_rejected() {
        let mut wkb = polygon_wkb(&square_with_hole());
        wkb[0] = 7;
        assert!(parse_multipolygon(&wkb).is_err());
    }
}
