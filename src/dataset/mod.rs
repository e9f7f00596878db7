//! Read-only access to the GeoPackage region table.
//!
//! The region table carries `GID_0..GID_5` / `NAME_0..NAME_5` plus a geometry
//! blob column; the companion `rtree_<table>_<geom>` table maps row ids to
//! bounding boxes. All queries go through one mutex-guarded connection.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::info;
use url::Url;

use crate::error::{LookupError, Result};
use crate::models::{AdminLevel, LevelColumns, LEVEL_COUNT};

/// A row returned by the bounding-box prefilter.
#[derive(Debug, Clone)]
pub struct CandidateRow {
    pub columns: LevelColumns,
    pub geometry: Vec<u8>,
}

/// The row describing one region at a known level.
#[derive(Debug, Clone)]
pub struct NodeRow {
    pub code: String,
    pub name: String,
    pub parent_code: Option<String>,
    pub geometry: Vec<u8>,
}

/// Single-connection handle on the region dataset.
pub struct GpkgDataset {
    conn: Mutex<Connection>,
    table: String,
    geom_column: String,
    candidate_sql: String,
}

impl GpkgDataset {
    /// Open a GeoPackage file read-only.
    pub fn open<P: AsRef<Path>>(path: P, table: &str, geom_column: &str) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening region dataset {}", path.display());

        let uri = read_only_uri(path)?;
        let conn = Connection::open_with_flags(
            uri,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Self::from_connection(conn, table, geom_column)
    }

    /// Wrap an already opened connection.
    pub fn from_connection(conn: Connection, table: &str, geom_column: &str) -> Result<Self> {
        let rtree = quote_identifier(&rtree_table_name(table, geom_column))?;
        let table = quote_identifier(table)?;
        let geom_column = quote_identifier(geom_column)?;

        let level_columns: Vec<String> = AdminLevel::all()
            .iter()
            .map(|l| format!("a.{}", l.code_column()))
            .chain(
                AdminLevel::all()
                    .iter()
                    .map(|l| format!("a.{}", l.name_column())),
            )
            .collect();

        let candidate_sql = format!(
            "SELECT {}, a.{geom} FROM {table} AS a \
             JOIN {rtree} AS r ON a.rowid = r.id \
             WHERE r.minx <= ?1 AND r.maxx >= ?1 AND r.miny <= ?2 AND r.maxy >= ?2 \
             LIMIT ?3",
            level_columns.join(", "),
            geom = geom_column,
            table = table,
            rtree = rtree,
        );

        Ok(Self {
            conn: Mutex::new(conn),
            table,
            geom_column,
            candidate_sql,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LookupError::Store("dataset connection poisoned".to_string()))
    }

    /// Rows whose bounding box contains `(x, y)`, in index scan order.
    pub fn candidates(&self, x: f64, y: f64, limit: usize) -> Result<Vec<CandidateRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&self.candidate_sql)?;
        let rows = stmt.query_map(params![x, y, limit as i64], |row| {
            let mut columns = LevelColumns::default();
            for i in 0..LEVEL_COUNT {
                columns.codes[i] = row.get(i)?;
                columns.names[i] = row.get(LEVEL_COUNT + i)?;
            }
            let geometry: Option<Vec<u8>> = row.get(2 * LEVEL_COUNT)?;
            Ok(CandidateRow {
                columns,
                geometry: geometry.unwrap_or_default(),
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Whether any row carries `code` in the given level's code column.
    pub fn has_code_at(&self, level: AdminLevel, code: &str) -> Result<bool> {
        let sql = format!(
            "SELECT 1 FROM {} WHERE {} = ?1 LIMIT 1",
            self.table,
            level.code_column()
        );
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let found = stmt
            .query_row(params![code], |row| row.get::<_, i64>(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// Distinct `(code, name)` pairs one level below `parent_level` whose
    /// parent column equals `parent_code`, ordered case-insensitively by name.
    pub fn child_rows(
        &self,
        parent_level: AdminLevel,
        parent_code: &str,
    ) -> Result<Vec<(String, String)>> {
        let Some(child_level) = parent_level.child() else {
            return Ok(Vec::new());
        };

        let sql = format!(
            "SELECT DISTINCT {child}, {name} FROM {table} \
             WHERE {parent} = ?1 AND {child} IS NOT NULL AND {child} <> '' \
             ORDER BY {name} COLLATE NOCASE",
            child = child_level.code_column(),
            name = child_level.name_column(),
            parent = parent_level.code_column(),
            table = self.table,
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![parent_code], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, Option<String>>(1)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            if let (Some(code), Some(name)) = row? {
                if !code.is_empty() {
                    out.push((code, name));
                }
            }
        }
        Ok(out)
    }

    /// First row carrying `code` at `level`, with its parent code and geometry.
    pub fn node_row(&self, level: AdminLevel, code: &str) -> Result<Option<NodeRow>> {
        let parent_column = level
            .parent()
            .map(|p| p.code_column())
            .unwrap_or("NULL");
        let sql = format!(
            "SELECT {code}, {name}, {parent}, {geom} FROM {table} WHERE {code} = ?1 LIMIT 1",
            code = level.code_column(),
            name = level.name_column(),
            parent = parent_column,
            geom = self.geom_column,
            table = self.table,
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let row = stmt
            .query_row(params![code], |row| {
                Ok(NodeRow {
                    code: row.get(0)?,
                    name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    parent_code: row.get(2)?,
                    geometry: row.get::<_, Option<Vec<u8>>>(3)?.unwrap_or_default(),
                })
            })
            .optional()?;
        Ok(row)
    }
}

/// `file:` URI opening `path` read-only and immutable, with the path
/// percent-encoded so `?`, `#` and `%` stay part of the file name.
fn read_only_uri(path: &Path) -> Result<String> {
    let absolute = std::path::absolute(path)
        .map_err(|e| LookupError::Store(format!("cannot resolve {}: {}", path.display(), e)))?;
    let mut url = Url::from_file_path(&absolute).map_err(|_| {
        LookupError::Store(format!("cannot build file URI for {}", absolute.display()))
    })?;
    url.set_query(Some("mode=ro&immutable=1"));
    Ok(url.into())
}

/// GeoPackage name of the bounding-box index for a geometry column.
pub fn rtree_table_name(table: &str, geom_column: &str) -> String {
    format!("rtree_{}_{}", table, geom_column)
}

/// Validate an identifier and wrap it in double quotes.
fn quote_identifier(ident: &str) -> Result<String> {
    let valid = !ident.is_empty()
        && ident
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(LookupError::Store(format!(
            "invalid table or column name: {:?}",
            ident
        )));
    }
    Ok(format!("\"{}\"", ident))
}
