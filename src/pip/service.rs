//! PIP service for looking up the admin hierarchy of a point.

use tracing::debug;

use super::centroid::planar_centroid;
use super::containment::first_containing;
use super::hierarchy::HierarchyResolver;
use super::index::SpatialIndexQuery;
use crate::dataset::GpkgDataset;
use crate::error::{LookupError, Result};
use crate::gpkg::decode_geometry;
use crate::models::{AdminEntry, AdminHierarchy, AdminLevel};

/// A region with its planar centroid.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionLocation {
    pub code: String,
    pub name: String,
    pub parent_code: Option<String>,
    pub level: AdminLevel,
    pub centroid_lon: f64,
    pub centroid_lat: f64,
}

/// Point-in-Polygon lookup service over the region dataset
pub struct PipService {
    dataset: GpkgDataset,
    index: SpatialIndexQuery,
}

impl PipService {
    pub fn new(dataset: GpkgDataset, index: SpatialIndexQuery) -> Self {
        Self { dataset, index }
    }

    /// Build the admin hierarchy for a point. Coordinates are rounded first.
    pub fn reverse_lookup(&self, lat: f64, lon: f64) -> Result<AdminHierarchy> {
        let point = self.index.round(lat, lon);
        let candidates = self.index.candidates(&self.dataset, point)?;
        let hit = first_containing(candidates, point)?;

        let hierarchy = AdminHierarchy::from_row(&hit.columns);
        debug!(
            "Reverse lookup at ({}, {}) resolved to {:?}",
            point.lat,
            point.lon,
            hierarchy.deepest().map(|e| &e.code)
        );
        Ok(hierarchy)
    }

    pub fn detect_level(&self, code: &str) -> Result<AdminLevel> {
        HierarchyResolver::new(&self.dataset).detect_level(required_code(code)?)
    }

    pub fn children_of(&self, code: &str) -> Result<Vec<AdminEntry>> {
        HierarchyResolver::new(&self.dataset).children_of(required_code(code)?)
    }

    /// Region details plus centroid of its geometry.
    pub fn locate(&self, code: &str) -> Result<RegionLocation> {
        let code = required_code(code)?;
        let level = self.detect_level(code)?;
        let row = self
            .dataset
            .node_row(level, code)?
            .ok_or_else(|| LookupError::NotFound(format!("code {} not found", code)))?;

        let geometry = decode_geometry(&row.geometry)?;
        let (centroid_lon, centroid_lat) = planar_centroid(&geometry)?;

        Ok(RegionLocation {
            code: row.code,
            name: row.name,
            parent_code: row.parent_code.filter(|p| !p.is_empty()),
            level,
            centroid_lon,
            centroid_lat,
        })
    }

    pub fn index(&self) -> &SpatialIndexQuery {
        &self.index
    }
}

/// Trimmed region code; blank input is not a code.
fn required_code(code: &str) -> Result<&str> {
    let code = code.trim();
    if code.is_empty() {
        return Err(LookupError::NotFound("region code is required".to_string()));
    }
    Ok(code)
}
