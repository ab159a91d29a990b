use log::info;

use crate::errors::CoreError;
use crate::models::holding::{normalize_note, normalize_symbol, Holding};
use crate::models::portfolio::Portfolio;
use crate::models::transaction::Transaction;

/// Mutations of the live ledger.
///
/// Pure business logic with no I/O. Every operation validates
/// first and only then mutates, so a rejected call never partially applies.
pub struct LedgerService;

impl LedgerService {
    pub fn new() -> Self {
        Self
    }

    /// Add a purchase, merging into an existing `(symbol, note)` holding
    /// when there is one.
    ///
    /// Returns the updated/created holding and the buy transaction to record.
    pub fn add_or_merge_holding(
        &self,
        portfolio: &mut Portfolio,
        symbol: &str,
        amount: f64,
        purchase_price: f64,
        note: &str,
    ) -> Result<(Holding, Transaction), CoreError> {
        let symbol = normalize_symbol(symbol);
        let note = normalize_note(note);
        Self::validate_purchase(&symbol, amount, purchase_price)?;

        let holding = match portfolio
            .holdings
            .iter_mut()
            .find(|h| h.symbol == symbol && h.note == note)
        {
            Some(existing) => {
                existing.merge_purchase(amount, purchase_price);
                existing.clone()
            }
            None => {
                let created = Holding::new(symbol.clone(), amount, purchase_price, note.clone());
                portfolio.holdings.push(created.clone());
                created
            }
        };

        let tx = Transaction::buy(&symbol, amount, purchase_price, &note);
        Ok((holding, tx))
    }

    /// Remove the `(symbol, note)` holding if present.
    ///
    /// The sell is priced at `live_price` when known, else at the holding's
    /// average price. Absent holdings are a no-op and produce no transaction.
    pub fn remove_holding(
        &self,
        portfolio: &mut Portfolio,
        symbol: &str,
        note: &str,
        live_price: Option<f64>,
    ) -> Option<(Holding, Transaction)> {
        let idx = portfolio
            .holdings
            .iter()
            .position(|h| h.matches(symbol, note))?;
        let removed = portfolio.holdings.remove(idx);
        let tx = Transaction::sell(&removed, Self::sell_price(&removed, live_price));
        Some((removed, tx))
    }

    /// Unit price used for sell proceeds.
    ///
    /// Falls back to the cost basis (average price) when no live quote is
    /// known. This fallback is a product decision, not a derived invariant.
    pub fn sell_price(holding: &Holding, live_price: Option<f64>) -> f64 {
        match live_price {
            Some(p) if p.is_finite() && p >= 0.0 => p,
            _ => holding.average_price,
        }
    }

    /// Empty the ledger (holdings and any cost override).
    /// Returns the number of holdings removed.
    pub fn clear(&self, portfolio: &mut Portfolio) -> usize {
        let removed = portfolio.holdings.len();
        portfolio.holdings.clear();
        portfolio.total_cost_override = None;
        info!("Cleared ledger ({removed} holdings)");
        removed
    }

    /// Replace the aggregate cost with `value`.
    pub fn set_cost_override(&self, portfolio: &mut Portfolio, value: f64) -> Result<(), CoreError> {
        if !value.is_finite() || value < 0.0 {
            return Err(CoreError::validation(format!(
                "Total cost must be a non-negative number, got {value}"
            )));
        }
        if portfolio.is_empty() {
            return Err(CoreError::validation(
                "Cannot set a total cost on an empty portfolio",
            ));
        }
        portfolio.total_cost_override = Some(value);
        info!("Total cost override set to {value}");
        Ok(())
    }

    /// Drop the override so aggregate cost falls back to the per-holding sum.
    /// Returns that sum.
    pub fn reset_cost_override(&self, portfolio: &mut Portfolio) -> Result<f64, CoreError> {
        if portfolio.is_empty() {
            return Err(CoreError::validation(
                "Cannot reset the total cost of an empty portfolio",
            ));
        }
        portfolio.total_cost_override = None;
        let sum = portfolio.sum_of_costs();
        info!("Total cost override cleared; cost basis back to {sum}");
        Ok(sum)
    }

    fn validate_purchase(symbol: &str, amount: f64, purchase_price: f64) -> Result<(), CoreError> {
        if symbol.is_empty() {
            return Err(CoreError::validation("Symbol is required"));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CoreError::validation(format!(
                "Amount must be positive, got {amount}"
            )));
        }
        if !purchase_price.is_finite() || purchase_price < 0.0 {
            return Err(CoreError::validation(format!(
                "Purchase price cannot be negative, got {purchase_price}"
            )));
        }
        Ok(())
    }
}

impl Default for LedgerService {
    fn default() -> Self {
        Self::new()
    }
}
