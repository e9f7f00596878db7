//! Per-region elevation, cached locally and fetched from an external
//! provider on first use.

mod cache;
mod provider;
mod store;

pub use cache::{CacheLookup, ElevationCache, DEFAULT_ELEVATION};
pub use provider::{ElevationProvider, ElevationResponse, ElevationResult, GoogleElevationClient};
pub use store::{ElevationStore, InsertOutcome};
