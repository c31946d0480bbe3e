use serde::{Deserialize, Serialize};

use super::taxonomy::ALL_TAXONOMY_ID;

/// Whether the list shows the whole catalog or only favorites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    AllFunds,
    FavoritesOnly,
}

/// Display ordering applied after filtering. `Catalog` keeps insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundSortOrder {
    #[default]
    Catalog,
    /// Largest (live) daily change first.
    ChangeDesc,
    ChangeAsc,
    NavDesc,
    /// Funds without a 1-year return go last.
    Return1YDesc,
    NameAsc,
}

/// Transient UI selection. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub search_text: String,
    /// Selected category/sector id, or [`ALL_TAXONOMY_ID`].
    pub taxonomy_id: String,
    pub view_mode: ViewMode,
    pub sort_order: FundSortOrder,
    pub sidebar_collapsed: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            taxonomy_id: ALL_TAXONOMY_ID.to_string(),
            view_mode: ViewMode::AllFunds,
            sort_order: FundSortOrder::Catalog,
            sidebar_collapsed: false,
        }
    }
}

impl Selection {
    /// True when the taxonomy selection is the "all" sentinel.
    pub fn is_all_taxonomy(&self) -> bool {
        self.taxonomy_id == ALL_TAXONOMY_ID
    }
}
