//! Region lookups combined with cached elevation.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::ServiceConfig;
use crate::dataset::GpkgDataset;
use crate::elevation::{ElevationCache, ElevationProvider, ElevationStore, GoogleElevationClient};
use crate::error::{LookupError, Result};
use crate::models::{AdminEntry, AdminHierarchy, AdminLevel, NodeInfo};
use crate::pip::{PipService, SpatialIndexQuery};

/// Entry point for the reverse / children / node-info queries.
///
/// Dataset work runs on the blocking pool; the elevation fetch is awaited.
pub struct RegionService<P> {
    pip: Arc<PipService>,
    elevation: ElevationCache<P>,
}

impl RegionService<GoogleElevationClient> {
    /// Open the dataset and elevation store named by `config`.
    pub fn open(config: &ServiceConfig) -> Result<Self> {
        let dataset = GpkgDataset::open(&config.gpkg_path, &config.table, &config.geom_column)?;
        let index = SpatialIndexQuery::new(config.round_places, config.candidate_limit);
        info!(
            "Region dataset ready (round to {} places, {} candidates max)",
            index.round_places(),
            index.candidate_limit()
        );

        let store = ElevationStore::open(&config.elevation_db_path)?;
        let provider = GoogleElevationClient::new(
            config.google_api_key.clone(),
            Duration::from_secs(config.provider_timeout_secs),
        )?;

        Ok(Self::new(
            PipService::new(dataset, index),
            ElevationCache::new(store, provider),
        ))
    }
}

impl<P: ElevationProvider> RegionService<P> {
    pub fn new(pip: PipService, elevation: ElevationCache<P>) -> Self {
        Self {
            pip: Arc::new(pip),
            elevation,
        }
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&PipService) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pip = Arc::clone(&self.pip);
        tokio::task::spawn_blocking(move || f(&pip))
            .await
            .map_err(|e| LookupError::Store(format!("lookup task failed: {}", e)))?
    }

    /// Hierarchy chain of the region containing `(lat, lon)`.
    pub async fn reverse_lookup(&self, lat: f64, lon: f64) -> Result<AdminHierarchy> {
        self.blocking(move |pip| pip.reverse_lookup(lat, lon)).await
    }

    pub async fn detect_level(&self, code: &str) -> Result<AdminLevel> {
        let code = code.to_string();
        self.blocking(move |pip| pip.detect_level(&code)).await
    }

    pub async fn children_of(&self, code: &str) -> Result<Vec<AdminEntry>> {
        let code = code.to_string();
        self.blocking(move |pip| pip.children_of(&code)).await
    }

    /// Region details with centroid and elevation.
    pub async fn node_info(&self, code: &str) -> Result<NodeInfo> {
        let code = code.to_string();
        let location = self.blocking(move |pip| pip.locate(&code)).await?;

        let elevation = self
            .elevation
            .resolve(
                &location.code,
                location.centroid_lat,
                location.centroid_lon,
            )
            .await?;

        Ok(NodeInfo {
            code: location.code,
            latitude: location.centroid_lat,
            longitude: location.centroid_lon,
            name: location.name,
            parent_code: location.parent_code.unwrap_or_default(),
            level: location.level,
            elevation,
        })
    }

    pub fn pip(&self) -> &PipService {
        &self.pip
    }
}
