use std::collections::HashMap;

use super::fund::FundRecord;

/// Live change-percent values layered over the catalog's baseline figures.
///
/// Process-lifetime only, never persisted. A fund without an entry shows its
/// baseline `change_percent`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceOverlay {
    values: HashMap<String, f64>,
}

impl PriceOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw overlay entry, if the fund has been ticked at least once.
    pub fn get(&self, fund_id: &str) -> Option<f64> {
        self.values.get(fund_id).copied()
    }

    /// Change percent to display for `fund`: overlay value or baseline.
    pub fn current_change(&self, fund: &FundRecord) -> f64 {
        self.get(&fund.id).unwrap_or(fund.change_percent)
    }

    /// Set one entry. Unrelated entries are left untouched.
    pub fn set(&mut self, fund_id: impl Into<String>, value: f64) {
        self.values.insert(fund_id.into(), value);
    }

    /// Merge a batch of updates into the overlay.
    pub fn merge<I>(&mut self, updates: I)
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        self.values.extend(updates);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
