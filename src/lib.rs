//! Wilayah - reverse lookup over a hierarchical administrative region dataset
//!
//! Answers "which region contains this point?" against a GeoPackage of
//! six-level admin boundaries, lists a region's children, and reports a
//! region's centroid and (cached) elevation.

pub mod config;
pub mod dataset;
pub mod elevation;
pub mod error;
pub mod gpkg;
pub mod models;
pub mod pip;
pub mod service;

pub use error::{LookupError, Result};
pub use models::{AdminEntry, AdminHierarchy, AdminLevel, NodeInfo};
pub use service::RegionService;
