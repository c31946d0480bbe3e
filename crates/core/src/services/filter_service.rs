use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::models::catalog::FundCatalog;
use crate::models::fund::FundRecord;
use crate::models::overlay::PriceOverlay;
use crate::models::selection::{FundSortOrder, ViewMode};
use crate::models::taxonomy::{FilterAxis, Taxonomy, ALL_TAXONOMY_ID};

/// Computes the visible fund list from the catalog and the user's selection.
///
/// Pure business logic: no I/O, no state. Every filter is a hard AND
/// predicate; nothing is ranked, and the result keeps catalog order.
pub struct FilterService;

impl FilterService {
    pub fn new() -> Self {
        Self
    }

    /// Apply, in order: view mode, taxonomy selection, text search.
    ///
    /// The taxonomy axis (category or sector) and the display names used by the
    /// search come from the catalog's taxonomy.
    /// An empty result is a valid outcome, never an error.
    pub fn visible_funds<'a>(
        &self,
        catalog: &'a FundCatalog,
        favorites: &BTreeSet<String>,
        view_mode: ViewMode,
        taxonomy_id: &str,
        search_text: &str,
    ) -> Vec<&'a FundRecord> {
        let taxonomy = catalog.taxonomy();
        let query = normalize_query(search_text);

        catalog
            .funds()
            .iter()
            .filter(|f| matches_view_mode(f, favorites, view_mode))
            .filter(|f| matches_taxonomy(f, taxonomy.axis, taxonomy_id))
            .filter(|f| {
                query
                    .as_deref()
                    .map_or(true, |q| matches_search(f, taxonomy, q))
            })
            .collect()
    }

    /// Reorder an already-filtered list for display. Stable: ties keep catalog order.
    /// `Catalog` leaves the list untouched.
    pub fn sort_funds(
        &self,
        funds: &mut [&FundRecord],
        order: FundSortOrder,
        overlay: &PriceOverlay,
    ) {
        match order {
            FundSortOrder::Catalog => {}
            FundSortOrder::ChangeDesc => funds.sort_by(|a, b| {
                cmp_f64(overlay.current_change(b), overlay.current_change(a))
            }),
            FundSortOrder::ChangeAsc => funds.sort_by(|a, b| {
                cmp_f64(overlay.current_change(a), overlay.current_change(b))
            }),
            FundSortOrder::NavDesc => funds.sort_by(|a, b| cmp_f64(b.current_nav, a.current_nav)),
            FundSortOrder::Return1YDesc => funds.sort_by(|a, b| {
                match (a.returns.one_year, b.returns.one_year) {
                    (Some(x), Some(y)) => cmp_f64(y, x),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }),
            FundSortOrder::NameAsc => funds.sort_by(|a, b| a.name.cmp(&b.name)),
        }
    }
}

impl Default for FilterService {
    fn default() -> Self {
        Self::new()
    }
}

/// Lower-cased, trimmed query; `None` when there is nothing to search for.
fn normalize_query(search_text: &str) -> Option<String> {
    let q = search_text.trim().to_lowercase();
    (!q.is_empty()).then_some(q)
}

fn matches_view_mode(fund: &FundRecord, favorites: &BTreeSet<String>, view_mode: ViewMode) -> bool {
    match view_mode {
        ViewMode::AllFunds => true,
        ViewMode::FavoritesOnly => favorites.contains(&fund.id),
    }
}

fn matches_taxonomy(fund: &FundRecord, axis: FilterAxis, taxonomy_id: &str) -> bool {
    if taxonomy_id == ALL_TAXONOMY_ID {
        return true;
    }
    match axis {
        FilterAxis::Category => fund.category == taxonomy_id,
        FilterAxis::Sector => fund.sector.as_deref() == Some(taxonomy_id),
    }
}

/// Substring match on name, manager, sector and category (lower-cased) and on
/// the raw ticker code. Sector and category also match through their
/// taxonomy display names, so the label shown on a chip finds its funds.
fn matches_search(fund: &FundRecord, taxonomy: &Taxonomy, query: &str) -> bool {
    let label_matches = |value: &str| {
        value.to_lowercase().contains(query)
            || taxonomy.display_name(value).to_lowercase().contains(query)
    };

    fund.name.to_lowercase().contains(query)
        || fund.code.contains(query)
        || fund.manager.to_lowercase().contains(query)
        || fund.sector.as_deref().is_some_and(label_matches)
        || label_matches(fund.category.as_str())
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
