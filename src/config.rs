//! Service configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::pip::{DEFAULT_CANDIDATE_LIMIT, DEFAULT_ROUND_PLACES};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub gpkg_path: PathBuf,
    pub table: String,
    pub geom_column: String,
    pub round_places: u32,
    pub candidate_limit: usize,
    pub elevation_db_path: PathBuf,
    pub google_api_key: Option<String>,
    pub provider_timeout_secs: u64,
    /// Code used by `/children` and `/latlng` when none is given
    pub default_parent_code: String,
    pub listen: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            gpkg_path: PathBuf::from("data/gadm_410.gpkg"),
            table: "gadm_410".to_string(),
            geom_column: "geom".to_string(),
            round_places: DEFAULT_ROUND_PLACES,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            elevation_db_path: PathBuf::from("data/elevations.db"),
            google_api_key: None,
            provider_timeout_secs: 10,
            default_parent_code: "IDN".to_string(),
            listen: "0.0.0.0:8082".to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: ServiceConfig =
            toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
gpkg_path = "/srv/gadm.gpkg"
round_places = 3
google_api_key = "secret"
"#
        )
        .unwrap();

        let config = ServiceConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.gpkg_path, PathBuf::from("/srv/gadm.gpkg"));
        assert_eq!(config.round_places, 3);
        assert_eq!(config.google_api_key.as_deref(), Some("secret"));
        assert_eq!(config.table, "gadm_410");
        assert_eq!(config.candidate_limit, 200);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "round_places = \"four\"").unwrap();
        assert!(ServiceConfig::load_from_file(file.path()).is_err());
    }
}
