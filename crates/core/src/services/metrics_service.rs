use std::cmp::Ordering;

use crate::models::holding::Holding;
use crate::models::metrics::{HoldingMetrics, PnlPercent, PortfolioMetrics, SortColumn, SortDirection};
use crate::models::portfolio::Portfolio;
use crate::models::price::PriceMap;

/// `amount * price`, or 0 when no price is known.
pub fn current_value(holding: &Holding, prices: &PriceMap) -> f64 {
    prices
        .get(&holding.symbol)
        .map(|q| holding.amount * q.price)
        .unwrap_or(0.0)
}

pub fn total_value(holdings: &[Holding], prices: &PriceMap) -> f64 {
    holdings.iter().map(|h| current_value(h, prices)).sum()
}

/// The override when set, else the sum of per-holding cost.
pub fn total_cost(portfolio: &Portfolio) -> f64 {
    portfolio
        .total_cost_override
        .unwrap_or_else(|| portfolio.sum_of_costs())
}

/// `(value - cost) / cost * 100`, or [`PnlPercent::NotApplicable`] when
/// there is no cost basis to divide by.
pub fn pnl_percent(value: f64, cost: f64) -> PnlPercent {
    if cost > 0.0 {
        PnlPercent::Value((value - cost) / cost * 100.0)
    } else {
        PnlPercent::NotApplicable
    }
}

pub fn percent_of_total(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        value / total * 100.0
    } else {
        0.0
    }
}

/// Derives value, cost and P&L figures from holdings and live prices.
///
/// Pure and deterministic: same ledger and prices, same numbers.
pub struct MetricsService;

impl MetricsService {
    pub fn new() -> Self {
        Self
    }

    /// Compute per-row and aggregate metrics. Rows keep ledger order.
    pub fn compute(&self, portfolio: &Portfolio, prices: &PriceMap) -> PortfolioMetrics {
        let total_value = total_value(&portfolio.holdings, prices);

        let rows = portfolio
            .holdings
            .iter()
            .map(|h| {
                let quote = prices.get(&h.symbol);
                let value = current_value(h, prices);
                HoldingMetrics {
                    symbol: h.symbol.clone(),
                    note: h.note.clone(),
                    amount: h.amount,
                    average_price: h.average_price,
                    total_cost: h.total_cost,
                    current_price: quote.map(|q| q.price),
                    change_24h: quote.map(|q| q.change_24h),
                    current_value: value,
                    pnl: value - h.total_cost,
                    pnl_percent: pnl_percent(value, h.total_cost),
                    percent_of_total: percent_of_total(value, total_value),
                }
            })
            .collect();

        let total_cost = total_cost(portfolio);

        PortfolioMetrics {
            total_value,
            total_cost,
            total_pnl: total_value - total_cost,
            total_pnl_percent: pnl_percent(total_value, total_cost),
            cost_overridden: portfolio.total_cost_override.is_some(),
            rows,
        }
    }

    /// Sort rows for display. Symbols compare lexicographically, everything
    /// else numerically; `N/A` percentages and unknown prices count as 0.
    /// The sort is stable, so ties keep ledger order.
    pub fn sort_rows(&self, rows: &mut [HoldingMetrics], column: SortColumn, direction: SortDirection) {
        rows.sort_by(|a, b| {
            let ord = match column {
                SortColumn::Symbol => a.symbol.cmp(&b.symbol),
                _ => cmp_f64(numeric_key(a, column), numeric_key(b, column)),
            };
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }
}

impl Default for MetricsService {
    fn default() -> Self {
        Self::new()
    }
}

fn numeric_key(row: &HoldingMetrics, column: SortColumn) -> f64 {
    match column {
        SortColumn::Symbol => 0.0,
        SortColumn::Amount => row.amount,
        SortColumn::AveragePrice => row.average_price,
        SortColumn::CurrentPrice => row.current_price.unwrap_or(0.0),
        SortColumn::TotalCost => row.total_cost,
        SortColumn::CurrentValue => row.current_value,
        SortColumn::Pnl => row.pnl,
        SortColumn::PnlPercent => row.pnl_percent.sort_key(),
        SortColumn::PercentOfTotal => row.percent_of_total,
        SortColumn::Change24h => row.change_24h.unwrap_or(0.0),
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
