//! Error types for region lookups.

use thiserror::Error;

/// Errors produced by the lookup engine.
#[derive(Error, Debug)]
pub enum LookupError {
    /// Malformed geometry envelope or payload.
    #[error("format error: {0}")]
    Format(String),

    /// No containing region, or a code absent at every level.
    #[error("not found: {0}")]
    NotFound(String),

    /// External elevation provider failed.
    #[error("elevation provider error: {0}")]
    Provider(String),

    /// Spatial dataset or elevation store unreachable or corrupt.
    #[error("store error: {0}")]
    Store(String),
}

impl LookupError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound(_))
    }
}

impl From<rusqlite::Error> for LookupError {
    fn from(err: rusqlite::Error) -> Self {
        LookupError::Store(err.to_string())
    }
}

impl From<sled::Error> for LookupError {
    fn from(err: sled::Error) -> Self {
        LookupError::Store(err.to_string())
    }
}

/// Result type for lookup operations.
pub type Result<T> = std::result::Result<T, LookupError>;
