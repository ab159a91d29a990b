use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::holding::Holding;
use super::metrics::PnlPercent;
use super::price::PriceMap;
use super::project::Project;

/// Prefix shared by every persisted snapshot key.
pub const SNAPSHOT_KEY_PREFIX: &str = "snapshot:";

/// What caused a snapshot to be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotTrigger {
    Manual,
    Automatic,
    CostOverride,
    CostReset,
}

impl std::fmt::Display for SnapshotTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotTrigger::Manual => write!(f, "Manual"),
            SnapshotTrigger::Automatic => write!(f, "Automatic"),
            SnapshotTrigger::CostOverride => write!(f, "Cost override"),
            SnapshotTrigger::CostReset => write!(f, "Cost reset"),
        }
    }
}

/// Immutable point-in-time capture of the ledger plus derived metrics.
///
/// Built once from owned copies of the live state and never mutated
/// afterwards. Stored under [`Snapshot::storage_key`], so two captures
/// never collide even when they share an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_trigger")]
    pub trigger: SnapshotTrigger,
    pub portfolio: Vec<Holding>,
    #[serde(default)]
    pub crypto_data: PriceMap,
    #[serde(default)]
    pub projects: Vec<Project>,
    pub total_value: f64,
    pub total_cost: f64,
    pub total_pnl: f64,
    pub total_pnl_percent: PnlPercent,
}

fn default_trigger() -> SnapshotTrigger {
    SnapshotTrigger::Manual
}

impl Snapshot {
    /// Key under which this snapshot is persisted:
    /// `snapshot:<id>-<ISO timestamp with ':' and '.' replaced by '-'>`.
    #[must_use]
    pub fn storage_key(&self) -> String {
        snapshot_key(&self.id, self.timestamp)
    }

    /// UTC calendar day of the capture.
    #[must_use]
    pub fn date(&self) -> chrono::NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Build the storage key for a snapshot id captured at `timestamp`.
pub fn snapshot_key(id: &Uuid, timestamp: DateTime<Utc>) -> String {
    let iso = timestamp
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{SNAPSHOT_KEY_PREFIX}{id}-{iso}")
}
