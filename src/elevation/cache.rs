//! Region elevation cache with provider fallback.

use tracing::{info, warn};

use super::provider::ElevationProvider;
use super::store::{ElevationStore, InsertOutcome};
use crate::error::Result;

/// Elevation reported when the provider can't be reached.
pub const DEFAULT_ELEVATION: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheLookup {
    Hit(f64),
    Miss,
}

/// Lookup-or-fetch elevation cache keyed by region code.
pub struct ElevationCache<P> {
    store: ElevationStore,
    provider: P,
}

impl<P: ElevationProvider> ElevationCache<P> {
    pub fn new(store: ElevationStore, provider: P) -> Self {
        Self { store, provider }
    }

    pub fn get(&self, code: &str) -> Result<CacheLookup> {
        Ok(match self.store.get(code)? {
            Some(elevation) => CacheLookup::Hit(elevation),
            None => CacheLookup::Miss,
        })
    }

    /// Cached elevation for `code`, fetching at `(lat, lon)` on a miss.
    ///
    /// Provider failures return [`DEFAULT_ELEVATION`] without persisting it.
    pub async fn resolve(&self, code: &str, lat: f64, lon: f64) -> Result<f64> {
        if let CacheLookup::Hit(elevation) = self.get(code)? {
            return Ok(elevation);
        }

        let elevation = match self.provider.fetch(lat, lon).await {
            Ok(elevation) => elevation,
            Err(e) => {
                warn!("Failed to fetch elevation for {}: {}", code, e);
                return Ok(DEFAULT_ELEVATION);
            }
        };
        info!("Fetched elevation for {}: {}", code, elevation);

        match self.store.insert(code, elevation) {
            Ok(InsertOutcome::Inserted) => {}
            Ok(InsertOutcome::AlreadyPresent) => {
                warn!("Elevation for {} was stored concurrently, keeping existing", code);
            }
            Err(e) => warn!("Failed to save elevation for {}: {}", code, e),
        }
        Ok(elevation)
    }

    pub fn store(&self) -> &ElevationStore {
        &self.store
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{Builder, TempDir};

    struct FakeProvider {
        calls: AtomicUsize,
        answer: Option<f64>,
    }

    impl FakeProvider {
        fn new(answer: Option<f64>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                answer,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ElevationProvider for FakeProvider {
        async fn fetch(&self, _lat: f64, _lon: f64) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
                .ok_or_else(|| LookupError::Provider("status 503".to_string()))
        }
    }

    fn cache(answer: Option<f64>) -> (TempDir, ElevationCache<FakeProvider>) {
        let dir = Builder::new().prefix("wilayah-cache-").tempdir().unwrap();
        let store = ElevationStore::open(dir.path().join("elevations.db")).unwrap();
        (dir, ElevationCache::new(store, FakeProvider::new(answer)))
    }

    #[tokio::test]
    async fn test_second_get_uses_cache() {
        let (_dir, cache) = cache(Some(42.0));
        assert_eq!(cache.get("IDN.8_1").unwrap(), CacheLookup::Miss);

        assert_eq!(cache.resolve("IDN.8_1", -6.2, 106.8).await.unwrap(), 42.0);
        assert_eq!(cache.resolve("IDN.8_1", -6.2, 106.8).await.unwrap(), 42.0);

        assert_eq!(cache.provider.calls(), 1);
        assert_eq!(cache.get("IDN.8_1").unwrap(), CacheLookup::Hit(42.0));
    }

    #[tokio::test]
    async fn test_failure_not_persisted() {
        let (_dir, cache) = cache(None);
        assert_eq!(
            cache.resolve("IDN", 0.0, 0.0).await.unwrap(),
            DEFAULT_ELEVATION
        );
        assert_eq!(cache.get("IDN").unwrap(), CacheLookup::Miss);

        // Retried on the next request
        cache.resolve("IDN", 0.0, 0.0).await.unwrap();
        assert_eq!(cache.provider.calls(), 2);
        assert!(cache.store().is_empty());
    }

    /// Stores its own value mid-fetch, like a concurrent request would.
    struct RacingProvider {
        store: ElevationStore,
    }

    impl ElevationProvider for RacingProvider {
        async fn fetch(&self, _lat: f64, _lon: f64) -> Result<f64> {
            self.store.insert("IDN", 1.0)?;
            Ok(5.0)
        }
    }

    #[tokio::test]
    async fn test_lost_race_is_benign() {
        let dir = Builder::new().prefix("wilayah-cache-").tempdir().unwrap();
        let store = ElevationStore::open(dir.path().join("elevations.db")).unwrap();
        let cache = ElevationCache::new(
            store.clone(),
            RacingProvider {
                store: store.clone(),
            },
        );

        assert_eq!(cache.resolve("IDN", 0.0, 0.0).await.unwrap(), 5.0);
        assert_eq!(cache.get("IDN").unwrap(), CacheLookup::Hit(1.0));
    }
}
