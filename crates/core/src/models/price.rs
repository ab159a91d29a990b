use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::holding::normalize_symbol;

/// Live quote for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    /// Price in USD
    pub price: f64,
    /// 24h change in percent
    #[serde(default)]
    pub change_24h: f64,
}

impl PriceQuote {
    pub fn new(price: f64, change_24h: f64) -> Self {
        Self { price, change_24h }
    }
}

/// `symbol → quote`, as returned by a price feed. Absent symbols are omitted.
pub type PriceMap = HashMap<String, PriceQuote>;

/// Session cache of the most recent live quotes.
///
/// Refreshes are merged in as they resolve; a slow response may overwrite a
/// newer one (last-resolved wins). Symbols missing from a refresh keep their
/// previous quote.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceCache {
    quotes: PriceMap,
    last_updated: Option<DateTime<Utc>>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch of quotes into the cache.
    pub fn merge(&mut self, quotes: PriceMap, at: DateTime<Utc>) {
        if quotes.is_empty() {
            return;
        }
        for (symbol, quote) in quotes {
            self.quotes.insert(normalize_symbol(&symbol), quote);
        }
        self.last_updated = Some(at);
    }

    /// Insert or replace a single quote.
    pub fn set_quote(&mut self, symbol: &str, quote: PriceQuote) {
        self.quotes.insert(normalize_symbol(symbol), quote);
    }

    #[must_use]
    pub fn get_quote(&self, symbol: &str) -> Option<&PriceQuote> {
        self.quotes.get(&normalize_symbol(symbol))
    }

    /// Live price for `symbol`, if one has been fetched.
    #[must_use]
    pub fn get_price(&self, symbol: &str) -> Option<f64> {
        self.get_quote(symbol).map(|q| q.price)
    }

    /// All quotes, keyed by normalized symbol.
    #[must_use]
    pub fn quotes(&self) -> &PriceMap {
        &self.quotes
    }

    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn clear(&mut self) {
        self.quotes.clear();
        self.last_updated = None;
    }
}
