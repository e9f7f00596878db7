use std::path::Path;

use sled::{Db, Tree};
use tracing::info;

use crate::error::{LookupError, Result};

const TREE_NAME: &str = "elevations";

/// Result of a write-once insert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InsertOutcome {
    Inserted,
    /// Another writer stored a value first; the existing value is kept.
    AlreadyPresent,
}

/// Persistent region code → elevation map.
#[derive(Clone)]
pub struct ElevationStore {
    _db: Db,
    tree: Tree,
}

impl ElevationStore {
    /// Open (or create) the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        let tree = db.open_tree(TREE_NAME)?;
        info!(
            "Opened elevation store {} ({} entries)",
            path.display(),
            tree.len()
        );
        Ok(Self { _db: db, tree })
    }

    pub fn get(&self, code: &str) -> Result<Option<f64>> {
        let Some(raw) = self.tree.get(code.as_bytes())? else {
            return Ok(None);
        };
        let bytes: [u8; 8] = raw[..].try_into().map_err(|_| {
            LookupError::Store(format!(
                "corrupt elevation entry for {}: {} bytes",
                code,
                raw.len()
            ))
        })?;
        Ok(Some(f64::from_be_bytes(bytes)))
    }

    /// Insert only if no value exists for `code`.
    pub fn insert(&self, code: &str, elevation: f64) -> Result<InsertOutcome> {
        let swapped = self.tree.compare_and_swap(
            code.as_bytes(),
            None as Option<&[u8]>,
            Some(&elevation.to_be_bytes()[..]),
        )?;
        match swapped {
            Ok(()) => {
                self.tree.flush()?;
                Ok(InsertOutcome::Inserted)
            }
            Err(_) => Ok(InsertOutcome::AlreadyPresent),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
