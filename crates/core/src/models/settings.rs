use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::history::HistoryMode;

/// User-configurable settings, stored under the `settings` key.
/// Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Minimum age of the latest snapshot before an automatic one is taken
    pub auto_snapshot_interval_minutes: i64,

    /// Maximum session history entries kept in memory
    pub history_capacity: usize,

    /// Maximum snapshots retained client-side (storage keeps all of them)
    pub snapshot_retention: usize,

    /// How often the host should poll for fresh prices
    pub price_refresh_interval_secs: u64,

    /// Timeline used for charts and export
    pub history_mode: HistoryMode,

    /// Optional API keys for price providers.
    /// Keys: provider name (e.g., "coingecko"). Values: the API key string.
    pub api_keys: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_snapshot_interval_minutes: 60,
            history_capacity: 100,
            snapshot_retention: 50,
            price_refresh_interval_secs: 60,
            history_mode: HistoryMode::Saved,
            api_keys: HashMap::new(),
        }
    }
}
