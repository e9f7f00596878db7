//! Planar area-weighted centroid.
//!
//! Treats (lon, lat) as Cartesian coordinates, which is accurate enough at
//! regional scale.

use geo::Centroid;
use geo_types::MultiPolygon;

use crate::error::{LookupError, Result};

/// Centroid of a multipolygon as `(lon, lat)`.
pub fn planar_centroid(geometry: &MultiPolygon<f64>) -> Result<(f64, f64)> {
    geometry
        .centroid()
        .map(|p| (p.x(), p.y()))
        .ok_or_else(|| LookupError::Format("centroid of empty geometry".to_string()))
}
