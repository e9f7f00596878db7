//! External elevation lookup.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{LookupError, Result};

const GOOGLE_ELEVATION_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/elevation/json";

/// Source of elevation values for a coordinate.
pub trait ElevationProvider: Send + Sync {
    fn fetch(&self, lat: f64, lon: f64) -> impl Future<Output = Result<f64>> + Send;
}

#[derive(Debug, Deserialize)]
pub struct ElevationResponse {
    #[serde(default)]
    pub results: Vec<ElevationResult>,
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ElevationResult {
    pub elevation: f64,
}

impl ElevationResponse {
    /// Success requires status `OK` and at least one result.
    pub fn into_elevation(self) -> Result<f64> {
        if self.status != "OK" {
            return Err(LookupError::Provider(format!(
                "elevation api error: {}, message: {}",
                self.status,
                self.error_message.unwrap_or_default()
            )));
        }
        self.results
            .first()
            .map(|r| r.elevation)
            .ok_or_else(|| LookupError::Provider("no elevation results".to_string()))
    }
}

/// Google Maps Elevation API client
pub struct GoogleElevationClient {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

impl GoogleElevationClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("wilayah/0.1 (region lookup)")
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Provider(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.is_empty()),
            endpoint: GOOGLE_ELEVATION_ENDPOINT.to_string(),
        })
    }

    /// Point the client at a different endpoint (proxies, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_url(&self, lat: f64, lon: f64, key: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("locations", format!("{},{}", lat, lon)),
                ("key", key.to_string()),
            ],
        )
        .map_err(|e| LookupError::Provider(format!("invalid elevation endpoint: {}", e)))
    }
}

impl ElevationProvider for GoogleElevationClient {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<f64> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(LookupError::Provider("GOOGLE_API_KEY is not set".to_string()));
        };

        let url = self.request_url(lat, lon, key)?;
        debug!("Requesting elevation for ({}, {})", lat, lon);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::Provider(format!("elevation request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(LookupError::Provider(format!(
                "elevation api request failed with status: {}",
                response.status()
            )));
        }

        let body: ElevationResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Provider(format!("invalid elevation response: {}", e)))?;

        body.into_elevation()
    }
}
