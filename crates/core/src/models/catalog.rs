use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::catalog::synthetic::generate_synthetic_tail;
use crate::errors::CoreError;

use super::fund::FundRecord;
use super::taxonomy::Taxonomy;

/// Immutable per-session fund collection plus the taxonomy used to filter it.
///
/// Order of `funds` is the catalog's insertion order; every list derived from
/// the catalog preserves it unless a display sort is explicitly requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FundCatalog {
    funds: Vec<FundRecord>,
    taxonomy: Taxonomy,
}

/// Wire shape of a catalog snapshot; validated on the way in.
#[derive(Deserialize)]
struct CatalogSnapshot {
    funds: Vec<FundRecord>,
    #[serde(default)]
    taxonomy: Taxonomy,
}

impl FundCatalog {
    /// Build a catalog, enforcing unique ids and positive, finite NAVs.
    pub fn new(funds: Vec<FundRecord>, taxonomy: Taxonomy) -> Result<Self, CoreError> {
        let mut seen = HashSet::with_capacity(funds.len());
        for fund in &funds {
            Self::validate_record(fund)?;
            if !seen.insert(fund.id.as_str()) {
                return Err(CoreError::DuplicateFundId(fund.id.clone()));
            }
        }
        Ok(Self { funds, taxonomy })
    }

    /// Load a snapshot of the form `{"funds": [...], "taxonomy": {...}}`.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let snapshot: CatalogSnapshot = serde_json::from_str(json)?;
        Self::new(snapshot.funds, snapshot.taxonomy)
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize catalog: {e}")))
    }

    /// Append more records (e.g. a generated tail), re-checking the invariants.
    pub fn extended(self, more: Vec<FundRecord>) -> Result<Self, CoreError> {
        let mut funds = self.funds;
        funds.extend(more);
        Self::new(funds, self.taxonomy)
    }

    /// Append `count` generated demo funds whose histories end on `end_date`.
    pub fn with_synthetic_tail<R: Rng + ?Sized>(
        self,
        rng: &mut R,
        count: usize,
        end_date: NaiveDate,
    ) -> Result<Self, CoreError> {
        let tail = generate_synthetic_tail(rng, count, end_date);
        self.extended(tail)
    }

    pub fn funds(&self) -> &[FundRecord] {
        &self.funds
    }

    pub fn get(&self, id: &str) -> Option<&FundRecord> {
        self.funds.iter().find(|f| f.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }

    fn validate_record(fund: &FundRecord) -> Result<(), CoreError> {
        if fund.id.trim().is_empty() {
            return Err(CoreError::ValidationError(format!(
                "Fund '{}' has an empty id",
                fund.name
            )));
        }
        if !fund.current_nav.is_finite() || fund.current_nav <= 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Fund {} has invalid NAV {}: must be finite and positive",
                fund.id, fund.current_nav
            )));
        }
        Ok(())
    }
}
