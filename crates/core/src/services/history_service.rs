use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::errors::CoreError;
use crate::models::history::{ChartPoint, DailyValue, HistoryEntry, HistoryMode, SessionHistory};
use crate::models::metrics::PortfolioMetrics;
use crate::models::portfolio::Portfolio;
use crate::models::snapshot::Snapshot;

/// Header row of the daily export.
pub const CSV_HEADER: &str = "date,portfolio";

/// Reconciles the two history timelines (session entries and persisted
/// snapshots) into chart series and the daily CSV export.
///
/// The core computes all the numbers; the frontend only renders.
pub struct HistoryService;

impl HistoryService {
    pub fn new() -> Self {
        Self
    }

    /// Timeline actually used for `mode`. Snapshot-backed history is used
    /// whenever snapshots exist and the user has not asked for realtime;
    /// with no snapshots, the session timeline is the only one available.
    pub fn effective_mode(&self, mode: HistoryMode, has_snapshots: bool) -> HistoryMode {
        match mode {
            HistoryMode::Saved if has_snapshots => HistoryMode::Saved,
            _ => HistoryMode::Realtime,
        }
    }

    /// Build the session entry for freshly recomputed metrics.
    pub fn entry_from_metrics(
        &self,
        metrics: &PortfolioMetrics,
        portfolio: &Portfolio,
        at: DateTime<Utc>,
    ) -> HistoryEntry {
        HistoryEntry {
            timestamp: at,
            total_value: metrics.total_value,
            total_cost: metrics.total_cost,
            total_pnl: metrics.total_pnl,
            total_pnl_percent: metrics.total_pnl_percent,
            portfolio: portfolio.holdings.clone(),
        }
    }

    /// Chart series for the selected timeline, oldest point first.
    pub fn chart_series(
        &self,
        mode: HistoryMode,
        session: &SessionHistory,
        snapshots: &[Snapshot],
    ) -> Vec<ChartPoint> {
        let mut points: Vec<ChartPoint> = match self.effective_mode(mode, !snapshots.is_empty()) {
            HistoryMode::Saved => snapshots
                .iter()
                .map(|s| ChartPoint {
                    timestamp: s.timestamp,
                    total_value: s.total_value,
                    total_cost: s.total_cost,
                    total_pnl: s.total_pnl,
                })
                .collect(),
            HistoryMode::Realtime => session
                .iter()
                .map(|e| ChartPoint {
                    timestamp: e.timestamp,
                    total_value: e.total_value,
                    total_cost: e.total_cost,
                    total_pnl: e.total_pnl,
                })
                .collect(),
        };
        points.sort_by_key(|p| p.timestamp);
        points
    }

    /// One value per UTC day inside `[start, end]` (both inclusive, whole
    /// days), taken from the latest snapshot of that day. Sorted by date.
    pub fn daily_values(
        &self,
        snapshots: &[Snapshot],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<DailyValue>, CoreError> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(CoreError::validation(format!(
                    "Start date ({s}) must not be after end date ({e})"
                )));
            }
        }

        // date → latest snapshot on that date
        let mut by_day: BTreeMap<NaiveDate, &Snapshot> = BTreeMap::new();
        for snapshot in snapshots {
            let date = snapshot.date();
            if start.is_some_and(|s| date < s) || end.is_some_and(|e| date > e) {
                continue;
            }
            by_day
                .entry(date)
                .and_modify(|kept| {
                    if snapshot.timestamp > kept.timestamp {
                        *kept = snapshot;
                    }
                })
                .or_insert(snapshot);
        }

        Ok(by_day
            .into_iter()
            .map(|(date, s)| DailyValue {
                date,
                total_value: s.total_value,
            })
            .collect())
    }

    /// Render the daily export as CSV: header `date,portfolio`, one row per
    /// day, values with two decimals and no thousands separators.
    pub fn export_csv(
        &self,
        snapshots: &[Snapshot],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<String, CoreError> {
        let rows = self.daily_values(snapshots, start, end)?;
        let mut csv = String::from(CSV_HEADER);
        csv.push('\n');
        for row in rows {
            csv.push_str(&format!(
                "{},{:.2}\n",
                row.date.format("%Y-%m-%d"),
                row.total_value
            ));
        }
        Ok(csv)
    }

    /// `portfolio-history-<start>-to-<end>.csv`, with `all` for open bounds.
    pub fn export_filename(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
        let fmt = |d: Option<NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "all".to_string())
        };
        format!("portfolio-history-{}-to-{}.csv", fmt(start), fmt(end))
    }
}

impl Default for HistoryService {
    fn default() -> Self {
        Self::new()
    }
}
