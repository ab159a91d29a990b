use serde::{Deserialize, Serialize};

use super::holding::Holding;

/// The live ledger: the single mutable source of truth for current holdings.
///
/// Persisted as one JSON document under the `portfolio` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    /// Holdings in insertion order
    #[serde(default)]
    pub holdings: Vec<Holding>,

    /// Ledger-wide substitute for the sum of per-holding cost.
    /// Individual holdings keep their own `total_cost` regardless.
    #[serde(default)]
    pub total_cost_override: Option<f64>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Look up the holding with the given `(symbol, note)` identity.
    #[must_use]
    pub fn find(&self, symbol: &str, note: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.matches(symbol, note))
    }

    /// Sum of individual holdings' cost basis, ignoring any override.
    #[must_use]
    pub fn sum_of_costs(&self) -> f64 {
        self.holdings.iter().map(|h| h.total_cost).sum()
    }

    /// Distinct symbols across all holdings, sorted.
    #[must_use]
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.holdings.iter().map(|h| h.symbol.clone()).collect();
        symbols.sort();
        symbols.dedup();
        symbols
    }
}
