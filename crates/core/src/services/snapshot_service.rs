use chrono::{DateTime, Duration, Utc};
use log::debug;
use uuid::Uuid;

use crate::models::portfolio::Portfolio;
use crate::models::price::PriceMap;
use crate::models::project::Project;
use crate::models::snapshot::{Snapshot, SnapshotTrigger};
use crate::services::metrics_service::MetricsService;

/// Builds snapshots and decides when automatic ones are due.
pub struct SnapshotService {
    metrics_service: MetricsService,
}

impl SnapshotService {
    pub fn new() -> Self {
        Self {
            metrics_service: MetricsService::new(),
        }
    }

    /// Freeze the current ledger into an immutable [`Snapshot`].
    ///
    /// Holdings, quotes and projects are cloned here once; later ledger
    /// mutations cannot reach the snapshot.
    pub fn capture(
        &self,
        portfolio: &Portfolio,
        quotes: &PriceMap,
        projects: &[Project],
        description: Option<String>,
        trigger: SnapshotTrigger,
        at: DateTime<Utc>,
    ) -> Snapshot {
        let metrics = self.metrics_service.compute(portfolio, quotes);
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| Self::default_description(trigger, at));

        let snapshot = Snapshot {
            id: Uuid::new_v4(),
            timestamp: at,
            description,
            trigger,
            portfolio: portfolio.holdings.clone(),
            crypto_data: quotes.clone(),
            projects: projects.to_vec(),
            total_value: metrics.total_value,
            total_cost: metrics.total_cost,
            total_pnl: metrics.total_pnl,
            total_pnl_percent: metrics.total_pnl_percent,
        };
        debug!(
            "Captured {} snapshot {} (value {:.2}, cost {:.2})",
            trigger, snapshot.id, snapshot.total_value, snapshot.total_cost
        );
        snapshot
    }

    /// Label used when the user gives no description.
    pub fn default_description(trigger: SnapshotTrigger, at: DateTime<Utc>) -> String {
        format!("{trigger} snapshot {}", at.format("%Y-%m-%d %H:%M UTC"))
    }

    /// Debounce for automatic snapshots: due only when no snapshot exists
    /// or the latest one is at least `interval` old.
    pub fn should_auto_snapshot(
        &self,
        latest: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        interval: Duration,
    ) -> bool {
        match latest {
            Some(last) => now - last >= interval,
            None => true,
        }
    }

    /// Timestamp of the most recent snapshot of any kind.
    pub fn latest_timestamp(snapshots: &[Snapshot]) -> Option<DateTime<Utc>> {
        snapshots.iter().map(|s| s.timestamp).max()
    }

    /// Sort oldest-first and keep only the `limit` most recent.
    pub fn retain_recent(snapshots: &mut Vec<Snapshot>, limit: usize) {
        snapshots.sort_by_key(|s| s.timestamp);
        if snapshots.len() > limit {
            let excess = snapshots.len() - limit;
            snapshots.drain(..excess);
        }
    }
}

impl Default for SnapshotService {
    fn default() -> Self {
        Self::new()
    }
}
