//! Administrative hierarchy types.

use serde::Serialize;

/// Number of nesting levels in the region dataset.
pub const LEVEL_COUNT: usize = 6;

const CODE_COLUMNS: [&str; LEVEL_COUNT] = ["GID_0", "GID_1", "GID_2", "GID_3", "GID_4", "GID_5"];
const NAME_COLUMNS: [&str; LEVEL_COUNT] = [
    "NAME_0", "NAME_1", "NAME_2", "NAME_3", "NAME_4", "NAME_5",
];

/// Hierarchy level of a region, country first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AdminLevel {
    /// Country (GID_0)
    Country,
    /// Province / state (GID_1)
    Province,
    /// City / regency (GID_2)
    City,
    /// District (GID_3)
    District,
    /// Village (GID_4)
    Village,
    /// Sub-village (GID_5)
    SubVillage,
}

impl AdminLevel {
    /// All levels in probe order (country first)
    pub fn all() -> &'static [AdminLevel; LEVEL_COUNT] {
        &[
            AdminLevel::Country,
            AdminLevel::Province,
            AdminLevel::City,
            AdminLevel::District,
            AdminLevel::Village,
            AdminLevel::SubVillage,
        ]
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::all().get(index).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The level directly below this one, `None` at the leaf level.
    pub fn child(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// The level directly above this one, `None` at the country level.
    pub fn parent(&self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_leaf(&self) -> bool {
        self.child().is_none()
    }

    /// Column holding the region code for this level
    pub fn code_column(&self) -> &'static str {
        CODE_COLUMNS[self.index()]
    }

    /// Column holding the display name for this level
    pub fn name_column(&self) -> &'static str {
        NAME_COLUMNS[self.index()]
    }

    /// Label used in API responses
    pub fn label(&self) -> &'static str {
        match self {
            AdminLevel::Country => "LEVEL_UNSPECIFIED",
            AdminLevel::Province => "PROVINCE",
            AdminLevel::City => "CITY",
            AdminLevel::District => "DISTRICT",
            AdminLevel::Village => "VILLAGE",
            AdminLevel::SubVillage => "SUBVILLAGE",
        }
    }
}

impl std::fmt::Display for AdminLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for AdminLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// A region one hop away in the hierarchy (chain entry or child).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminEntry {
    pub code: String,
    pub name: String,
    #[serde(rename = "parentCode")]
    pub parent_code: String,
    pub level: AdminLevel,
}

impl AdminEntry {
    pub fn new(code: String, name: String, parent_code: Option<String>, level: AdminLevel) -> Self {
        Self {
            code,
            name,
            parent_code: parent_code.unwrap_or_default(),
            level,
        }
    }
}

/// Codes and names of one dataset row, indexed by level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelColumns {
    pub codes: [Option<String>; LEVEL_COUNT],
    pub names: [Option<String>; LEVEL_COUNT],
}

impl LevelColumns {
    pub fn code(&self, level: AdminLevel) -> Option<&str> {
        self.codes[level.index()]
            .as_deref()
            .filter(|code| !code.is_empty())
    }

    pub fn name(&self, level: AdminLevel) -> Option<&str> {
        self.names[level.index()].as_deref()
    }
}

/// Full hierarchy chain for a reverse lookup.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminHierarchy {
    #[serde(flatten)]
    pub columns: HierarchyColumns,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub list: Vec<AdminEntry>,
}

/// Flat `levelNCode` / `levelNName` view of a row.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyColumns {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub level0_code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub level1_code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub level2_code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub level3_code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub level4_code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub level5_code: String,

    pub level0_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub level1_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub level2_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub level3_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub level4_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub level5_name: String,
}

impl AdminHierarchy {
    /// Build the chain from a matched row. Each entry's parent is the
    /// previous non-empty code.
    pub fn from_row(row: &LevelColumns) -> Self {
        let mut list = Vec::with_capacity(LEVEL_COUNT);
        let mut parent: Option<String> = None;

        for level in AdminLevel::all() {
            if let Some(code) = row.code(*level) {
                let name = row.name(*level).unwrap_or_default().to_string();
                list.push(AdminEntry::new(
                    code.to_string(),
                    name,
                    parent.clone(),
                    *level,
                ));
                parent = Some(code.to_string());
            }
        }

        let text = |slot: &Option<String>| slot.clone().unwrap_or_default();
        let columns = HierarchyColumns {
            level0_code: text(&row.codes[0]),
            level1_code: text(&row.codes[1]),
            level2_code: text(&row.codes[2]),
            level3_code: text(&row.codes[3]),
            level4_code: text(&row.codes[4]),
            level5_code: text(&row.codes[5]),
            level0_name: text(&row.names[0]),
            level1_name: text(&row.names[1]),
            level2_name: text(&row.names[2]),
            level3_name: text(&row.names[3]),
            level4_name: text(&row.names[4]),
            level5_name: text(&row.names[5]),
        };

        Self { columns, list }
    }

    /// Get the chain entry for a given level
    pub fn get(&self, level: AdminLevel) -> Option<&AdminEntry> {
        self.list.iter().find(|entry| entry.level == level)
    }

    /// Deepest level present in the chain
    pub fn deepest(&self) -> Option<&AdminEntry> {
        self.list.last()
    }
}

/// Region details with centroid and elevation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeInfo {
    pub code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    #[serde(rename = "parentCode")]
    pub parent_code: String,
    pub level: AdminLevel,
    pub elevation: f64,
}
