use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line item in the ledger.
///
/// **Identity** is the `(symbol, note)` pair, not `id`. Adding a holding with
/// a pair that already exists merges into it instead of creating a new row.
///
/// Invariant after every mutation: `total_cost == amount * average_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    /// Unique identifier (stable across merges)
    pub id: Uuid,

    /// Ticker symbol, uppercased (e.g., "BTC", "ETH")
    pub symbol: String,

    /// Units held (always positive)
    pub amount: f64,

    /// Price per unit of the last purchase; overwritten with the weighted
    /// average whenever a purchase is merged in.
    pub purchase_price: f64,

    /// Accumulated cost basis
    pub total_cost: f64,

    /// `total_cost / amount`
    pub average_price: f64,

    /// Free-text label distinguishing lots of the same symbol
    /// (e.g., exchange or wallet name). Empty when unset.
    #[serde(default)]
    pub note: String,
}

impl Holding {
    pub fn new(
        symbol: impl Into<String>,
        amount: f64,
        purchase_price: f64,
        note: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: normalize_symbol(&symbol.into()),
            amount,
            purchase_price,
            total_cost: amount * purchase_price,
            average_price: purchase_price,
            note: normalize_note(&note.into()),
        }
    }

    /// Does this holding have the given `(symbol, note)` identity?
    /// Both sides are normalized before comparison.
    #[must_use]
    pub fn matches(&self, symbol: &str, note: &str) -> bool {
        self.symbol == normalize_symbol(symbol) && self.note == normalize_note(note)
    }

    /// Fold another purchase into this holding using a weighted average.
    pub fn merge_purchase(&mut self, amount: f64, purchase_price: f64) {
        self.amount += amount;
        self.total_cost += amount * purchase_price;
        self.average_price = self.total_cost / self.amount;
        self.purchase_price = self.average_price;
    }
}

/// Uppercase, trimmed ticker.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Trimmed note; whitespace-only notes collapse to the empty note.
pub fn normalize_note(note: &str) -> String {
    note.trim().to_string()
}
