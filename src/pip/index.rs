//! Bounding-box candidate prefilter.

use tracing::debug;

use crate::dataset::{CandidateRow, GpkgDataset};
use crate::error::Result;

pub const DEFAULT_ROUND_PLACES: u32 = 4;
pub const MAX_ROUND_PLACES: u32 = 6;
pub const DEFAULT_CANDIDATE_LIMIT: usize = 200;

/// Round a coordinate to `places` decimal places.
pub fn round_coordinate(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// A query point after rounding, in (lon, lat) order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryPoint {
    pub lon: f64,
    pub lat: f64,
}

/// Envelope prefilter over the dataset's bounding-box index
#[derive(Debug, Clone, Copy)]
pub struct SpatialIndexQuery {
    round_places: u32,
    candidate_limit: usize,
}

impl Default for SpatialIndexQuery {
    fn default() -> Self {
        Self::new(DEFAULT_ROUND_PLACES, DEFAULT_CANDIDATE_LIMIT)
    }
}

impl SpatialIndexQuery {
    /// Precision above [`MAX_ROUND_PLACES`] falls back to the default.
    pub fn new(round_places: u32, candidate_limit: usize) -> Self {
        let round_places = if round_places > MAX_ROUND_PLACES {
            DEFAULT_ROUND_PLACES
        } else {
            round_places
        };
        Self {
            round_places,
            candidate_limit: candidate_limit.max(1),
        }
    }

    pub fn round_places(&self) -> u32 {
        self.round_places
    }

    pub fn candidate_limit(&self) -> usize {
        self.candidate_limit
    }

    pub fn round(&self, lat: f64, lon: f64) -> QueryPoint {
        QueryPoint {
            lon: round_coordinate(lon, self.round_places),
            lat: round_coordinate(lat, self.round_places),
        }
    }

    /// Rows whose envelope contains the point, at most `candidate_limit`.
    pub fn candidates(&self, dataset: &GpkgDataset, point: QueryPoint) -> Result<Vec<CandidateRow>> {
        let rows = dataset.candidates(point.lon, point.lat, self.candidate_limit)?;
        debug!(
            "Envelope prefilter at ({}, {}): {} candidates",
            point.lon,
            point.lat,
            rows.len()
        );
        Ok(rows)
    }
}
