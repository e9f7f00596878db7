//! Point-in-Polygon (PIP) region lookup.
//!
//! Candidates come from the dataset's bounding-box index, then each
//! candidate's geometry is decoded and tested exactly.

mod centroid;
mod containment;
mod hierarchy;
mod index;
mod service;

pub use centroid::planar_centroid;
pub use containment::{first_containing, multipolygon_contains, polygon_contains};
pub use hierarchy::HierarchyResolver;
pub use index::{
    round_coordinate, QueryPoint, SpatialIndexQuery, DEFAULT_CANDIDATE_LIMIT,
    DEFAULT_ROUND_PLACES, MAX_ROUND_PLACES,
};
pub use service::{PipService, RegionLocation};
