//! Exact point-in-polygon resolution over prefiltered candidates.
//!
//! Polygons are treated as closed sets: a point on an exterior or hole edge
//! counts as contained.

use geo::coordinate_position::CoordPos;
use geo::CoordinatePosition;
use geo_types::{Coord, MultiPolygon, Polygon};
use tracing::debug;

use crate::dataset::CandidateRow;
use crate::error::{LookupError, Result};
use crate::gpkg::decode_geometry;

use super::index::QueryPoint;

/// Inside the exterior ring and not strictly inside any hole.
pub fn polygon_contains(polygon: &Polygon<f64>, coord: &Coord<f64>) -> bool {
    !matches!(polygon.coordinate_position(coord), CoordPos::Outside)
}

pub fn multipolygon_contains(multi: &MultiPolygon<f64>, coord: &Coord<f64>) -> bool {
    multi.iter().any(|polygon| polygon_contains(polygon, coord))
}

/// First candidate, in the order given, whose geometry contains the point.
///
/// Candidates with undecodable geometry are skipped.
pub fn first_containing(candidates: Vec<CandidateRow>, point: QueryPoint) -> Result<CandidateRow> {
    let coord = Coord {
        x: point.lon,
        y: point.lat,
    };

    for candidate in candidates {
        let geometry = match decode_geometry(&candidate.geometry) {
            Ok(g) => g,
            Err(e) => {
                debug!(
                    "Skipping candidate {:?}: {}",
                    candidate.columns.codes.iter().flatten().last(),
                    e
                );
                continue;
            }
        };

        if multipolygon_contains(&geometry, &coord) {
            return Ok(candidate);
        }
    }

    Err(LookupError::NotFound(format!(
        "no region contains ({}, {})",
        point.lat, point.lon
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpkg::wkb::test_support::{gpkg_wrap, multipolygon_wkb};
    use crate::models::{AdminLevel, LevelColumns};
    use geo::polygon;

    fn donut() -> Polygon<f64> {
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

    fn candidate(code: &str, blob: Vec<u8>) -> CandidateRow {
        let mut columns = LevelColumns::default();
        columns.codes[0] = Some(code.to_string());
        CandidateRow {
            columns,
            geometry: blob,
        }
    }

    fn blob(poly: Polygon<f64>) -> Vec<u8> {
        gpkg_wrap(&multipolygon_wkb(&MultiPolygon::new(vec![poly])), 4326)
    }

    #[test]
    fn test_holes_excluded() {
        let poly = donut();
        assert!(polygon_contains(&poly, &Coord { x: 2.0, y: 2.0 }));
        assert!(!polygon_contains(&poly, &Coord { x: 5.0, y: 5.0 }));
        assert!(!polygon_contains(&poly, &Coord { x: 11.0, y: 5.0 }));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let poly = donut();
        assert!(polygon_contains(&poly, &Coord { x: 0.0, y: 5.0 }));
        assert!(polygon_contains(&poly, &Coord { x: 4.0, y: 5.0 }));
        // Repeated calls agree
        for _ in 0..3 {
            assert!(polygon_contains(&poly, &Coord { x: 10.0, y: 10.0 }));
        }
    }

    #[test]
    fn test_first_match_in_order_wins() {
        let candidates = vec![
            candidate("A", blob(donut())),
            candidate("B", blob(donut())),
        ];
        let hit = first_containing(candidates, QueryPoint { lon: 1.0, lat: 1.0 }).unwrap();
        assert_eq!(hit.columns.code(AdminLevel::Country), Some("A"));
    }

    #[test]
    fn test_malformed_candidates_skipped() {
        let candidates = vec![
            candidate("BAD", vec![1, 2, 3]),
            candidate("WORSE", b"GP\0\x09\0\0\x10\xE6garbage".to_vec()),
            candidate("GOOD", blob(donut())),
        ];
        let hit = first_containing(candidates, QueryPoint { lon: 1.0, lat: 1.0 }).unwrap();
        assert_eq!(hit.columns.code(AdminLevel::Country), Some("GOOD"));
    }

    #[test]
    fn test_no_match_is_not_found() {
        let candidates = vec![candidate("A", blob(donut()))];
        let err = first_containing(candidates, QueryPoint { lon: 5.0, lat: 5.0 }).unwrap_err();
        assert!(err.is_not_found());
        assert!(first_containing(vec![], QueryPoint { lon: 0.0, lat: 0.0 })
            .unwrap_err()
            .is_not_found());
    }
}
