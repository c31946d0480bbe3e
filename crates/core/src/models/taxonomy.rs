use serde::{Deserialize, Serialize};

/// Sentinel taxonomy id meaning "no category/sector restriction".
pub const ALL_TAXONOMY_ID: &str = "all";

/// Which record field the taxonomy selection filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterAxis {
    /// Match `FundRecord::category`.
    #[default]
    Category,
    /// Match `FundRecord::sector`. Records without a sector never match.
    Sector,
}

/// One selectable entry in the category/sector bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    /// Value compared against the record field (exact, case-sensitive).
    pub id: String,
    pub name: String,
    pub icon: String,
}

impl TaxonomyEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
        }
    }

    pub fn is_all(&self) -> bool {
        self.id == ALL_TAXONOMY_ID
    }
}

/// The fixed, ordered list of filter entries shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub axis: FilterAxis,
    pub entries: Vec<TaxonomyEntry>,
}

impl Taxonomy {
    pub fn new(axis: FilterAxis, entries: Vec<TaxonomyEntry>) -> Self {
        Self { axis, entries }
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &str) -> Option<&TaxonomyEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Display name for an id, falling back to the id itself for unknown values.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|e| e.name.as_str()).unwrap_or(id)
    }
}
