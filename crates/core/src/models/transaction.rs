use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::holding::Holding;

/// Direction of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Buy,
    Sell,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Buy => write!(f, "buy"),
            TransactionType::Sell => write!(f, "sell"),
        }
    }
}

/// Append-only record of a ledger change.
///
/// Emitted automatically: a buy on every add, a sell when a holding is removed.
/// Never mutated or deleted by the normal flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub amount: f64,
    /// Unit price of this transaction (purchase price for buys, proceeds per unit for sells)
    pub purchase_price: f64,
    /// `amount * purchase_price`
    pub total_cost: f64,
    #[serde(default)]
    pub note: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
}

impl Transaction {
    pub fn buy(symbol: &str, amount: f64, purchase_price: f64, note: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            symbol: symbol.to_string(),
            amount,
            purchase_price,
            total_cost: amount * purchase_price,
            note: note.to_string(),
            tx_type: TransactionType::Buy,
        }
    }

    /// Sell the whole of `holding` at `unit_price`.
    pub fn sell(holding: &Holding, unit_price: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            symbol: holding.symbol.clone(),
            amount: holding.amount,
            purchase_price: unit_price,
            total_cost: holding.amount * unit_price,
            note: holding.note.clone(),
            tx_type: TransactionType::Sell,
        }
    }
}
