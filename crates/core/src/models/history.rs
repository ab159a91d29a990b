use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::holding::Holding;
use super::metrics::PnlPercent;

/// Ephemeral, session-scoped capture appended on every metrics recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub total_value: f64,
    pub total_cost: f64,
    pub total_pnl: f64,
    pub total_pnl_percent: PnlPercent,
    pub portfolio: Vec<Holding>,
}

/// Bounded FIFO of [`HistoryEntry`] values. Oldest entries are evicted first.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl SessionHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries in insertion order (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Which timeline feeds the chart and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    /// In-session history entries
    Realtime,
    /// Persisted snapshots
    #[default]
    Saved,
}

/// A single point of the history chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub total_value: f64,
    pub total_cost: f64,
    pub total_pnl: f64,
}

/// One row of the daily export: the latest snapshot value on `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyValue {
    pub date: NaiveDate,
    pub total_value: f64,
}
