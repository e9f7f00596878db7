//! Hierarchy level detection and child enumeration.

use tracing::debug;

use crate::dataset::GpkgDataset;
use crate::error::{LookupError, Result};
use crate::models::{AdminEntry, AdminLevel};

/// Resolves codes against the level columns of the dataset.
pub struct HierarchyResolver<'a> {
    dataset: &'a GpkgDataset,
}

impl<'a> HierarchyResolver<'a> {
    pub fn new(dataset: &'a GpkgDataset) -> Self {
        Self { dataset }
    }

    /// Level whose code column carries `code`, probing country first.
    ///
    /// A code present at two levels resolves to the lower one. Missing
    /// levels are stored as empty strings, so an empty code never matches.
    pub fn detect_level(&self, code: &str) -> Result<AdminLevel> {
        if code.is_empty() {
            return Err(LookupError::NotFound("region code is required".to_string()));
        }
        for level in AdminLevel::all() {
            if self.dataset.has_code_at(*level, code)? {
                return Ok(*level);
            }
        }
        Err(LookupError::NotFound(format!(
            "code {} not found at any level",
            code
        )))
    }

    /// Direct children of `code` as distinct `(code, name)` pairs, sorted
    /// case-insensitively by name.
    ///
    /// A leaf-level code has no children and yields an empty list.
    pub fn children_of(&self, code: &str) -> Result<Vec<AdminEntry>> {
        let level = self.detect_level(code)?;
        let Some(child_level) = level.child() else {
            return Ok(Vec::new());
        };

        let mut children: Vec<AdminEntry> = self
            .dataset
            .child_rows(level, code)?
            .into_iter()
            .map(|(child_code, name)| {
                AdminEntry::new(child_code, name, Some(code.to_string()), child_level)
            })
            .collect();

        children.sort_by_cached_key(|entry| entry.name.to_lowercase());

        debug!(
            "{} ({}) has {} children at {}",
            code,
            level,
            children.len(),
            child_level
        );
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::{build_connection, build_dataset, FixtureRow, GEOM, TABLE};
    use geo::polygon;

    fn unit() -> geo_types::Polygon<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ]
    }

    fn dataset() -> GpkgDataset {
        build_dataset(&[
            FixtureRow::new(
                ["IDN", "IDN.8_1", "IDN.8.1_1", "", "", ""],
                ["Indonesia", "Jakarta Raya", "Jakarta Barat", "", "", ""],
                unit(),
            ),
            FixtureRow::new(
                ["IDN", "IDN.8_1", "IDN.8.2_1", "", "", ""],
                ["Indonesia", "Jakarta Raya", "jakarta Pusat", "", "", ""],
                unit(),
            ),
            FixtureRow::new(
                ["IDN", "IDN.8_1", "IDN.8.3_1", "", "", ""],
                ["Indonesia", "Jakarta Raya", "Kepulauan Seribu", "", "", ""],
                unit(),
            ),
            FixtureRow::new(
                ["IDN", "IDN.1_1", "", "", "", ""],
                ["Indonesia", "Aceh", "", "", "", ""],
                unit(),
            ),
            FixtureRow::new(
                ["IDN", "IDN.9_1", "IDN.9.1_1", "IDN.9.1.1_1", "IDN.9.1.1.1_1", "IDN.9.1.1.1.1_1"],
                ["Indonesia", "Jawa Barat", "Bandung", "Cibeunying", "Cigadung", "RW 01"],
                unit(),
            ),
            // Anomaly: "DUP" appears at levels 1 and 2
            FixtureRow::new(
                ["XXX", "DUP", "XXX.1.1_1", "", "", ""],
                ["X", "Dup", "Child", "", "", ""],
                unit(),
            ),
            FixtureRow::new(
                ["XXX", "XXX.2_1", "DUP", "", "", ""],
                ["X", "Other", "Dup", "", "", ""],
                unit(),
            ),
            // One child code spelled two ways across rows
            FixtureRow::new(
                ["P", "P.1_1", "", "", "", ""],
                ["Parent", "Alpha", "", "", "", ""],
                unit(),
            ),
            FixtureRow::new(
                ["P", "P.1_1", "", "", "", ""],
                ["Parent", "Alfa", "", "", "", ""],
                unit(),
            ),
        ])
    }

    #[test]
    fn test_detect_level() {
        let ds = dataset();
        let resolver = HierarchyResolver::new(&ds);
        assert_eq!(resolver.detect_level("IDN").unwrap(), AdminLevel::Country);
        assert_eq!(resolver.detect_level("IDN.8_1").unwrap(), AdminLevel::Province);
        assert_eq!(resolver.detect_level("IDN.8.2_1").unwrap(), AdminLevel::City);
        assert_eq!(
            resolver.detect_level("IDN.9.1.1.1.1_1").unwrap(),
            AdminLevel::SubVillage
        );
        assert!(resolver.detect_level("NOPE").unwrap_err().is_not_found());
    }

    #[test]
    fn test_duplicate_level_resolves_lower() {
        let ds = dataset();
        let resolver = HierarchyResolver::new(&ds);
        assert_eq!(resolver.detect_level("DUP").unwrap(), AdminLevel::Province);
    }

    #[test]
    fn test_children_sorted() {
        let ds = dataset();
        let resolver = HierarchyResolver::new(&ds);

        let children = resolver.children_of("IDN.8_1").unwrap();
        let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Jakarta Barat", "jakarta Pusat", "Kepulauan Seribu"]);
        assert!(children.iter().all(|c| c.level == AdminLevel::City));
        assert!(children.iter().all(|c| c.parent_code == "IDN.8_1"));

        let provinces = resolver.children_of("IDN").unwrap();
        let codes: Vec<&str> = provinces.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["IDN.1_1", "IDN.8_1", "IDN.9_1"]);
    }

    #[test]
    fn test_children_keep_every_spelling() {
        let ds = dataset();
        let resolver = HierarchyResolver::new(&ds);
        let children = resolver.children_of("P").unwrap();
        let pairs: Vec<(&str, &str)> = children
            .iter()
            .map(|c| (c.code.as_str(), c.name.as_str()))
            .collect();
        assert_eq!(pairs, vec![("P.1_1", "Alfa"), ("P.1_1", "Alpha")]);
    }

    #[test]
    fn test_empty_code_not_found() {
        let conn = build_connection(&[FixtureRow::new(
            ["IDN", "IDN.8_1", "", "", "", ""],
            ["Indonesia", "Jakarta Raya", "", "", "", ""],
            unit(),
        )]);
        conn.execute(
            &format!("UPDATE {} SET GID_2 = '', NAME_2 = ''", TABLE),
            [],
        )
        .unwrap();
        let ds = GpkgDataset::from_connection(conn, TABLE, GEOM).unwrap();
        let resolver = HierarchyResolver::new(&ds);

        assert!(resolver.detect_level("").unwrap_err().is_not_found());
        assert!(resolver.children_of("").unwrap_err().is_not_found());
    }

    #[test]
    fn test_children_skip_empty_codes() {
        let ds = dataset();
        let resolver = HierarchyResolver::new(&ds);
        assert!(resolver.children_of("IDN.1_1").unwrap().is_empty());
    }

    #[test]
    fn test_leaf_has_no_children() {
        let ds = dataset();
        let resolver = HierarchyResolver::new(&ds);
        assert!(resolver.children_of("IDN.9.1.1.1.1_1").unwrap().is_empty());
    }

    #[test]
    fn test_children_of_unknown_code() {
        let ds = dataset();
        let resolver = HierarchyResolver::new(&ds);
        assert!(resolver.children_of("NOPE").unwrap_err().is_not_found());
    }
}
