use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;
use crate::models::project::Project;
use crate::models::settings::Settings;
use crate::models::snapshot::{Snapshot, SNAPSHOT_KEY_PREFIX};
use crate::models::transaction::Transaction;

use super::migration::{self, CURRENT_SCHEMA_VERSION};
use super::traits::Storage;

pub const PORTFOLIO_KEY: &str = "portfolio";
pub const TRANSACTIONS_KEY: &str = "transactions";
pub const PROJECTS_KEY: &str = "projects";
pub const SETTINGS_KEY: &str = "settings";
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Typed document operations on top of a [`Storage`] backend.
///
/// Flow: typed model → serde_json::Value → backend key.
pub struct StorageManager {
    backend: Box<dyn Storage>,
}

impl StorageManager {
    pub fn new(backend: Box<dyn Storage>) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    // ── Schema ──────────────────────────────────────────────────────

    /// Bring stored documents up to [`CURRENT_SCHEMA_VERSION`].
    /// Runs once at load; a no-op when already current.
    /// Returns the version the documents were at before migrating.
    pub async fn migrate(&self) -> Result<u32, CoreError> {
        let stored = self.backend.get(SCHEMA_VERSION_KEY).await?;
        let version = migration::parse_version(stored.as_ref())?;
        migration::check_version(version)?;

        if version == CURRENT_SCHEMA_VERSION {
            return Ok(version);
        }

        info!("Migrating stored documents from schema v{version} to v{CURRENT_SCHEMA_VERSION}");

        if let Some(mut projects) = self.backend.get(PROJECTS_KEY).await? {
            if migration::migrate_projects_document(&mut projects) {
                self.backend.set(PROJECTS_KEY, projects).await?;
            }
        }

        let mut migrated = 0usize;
        for key in self.backend.list_keys(SNAPSHOT_KEY_PREFIX).await? {
            if let Some(mut doc) = self.backend.get(&key).await? {
                if migration::migrate_snapshot_document(&mut doc) {
                    self.backend.set(&key, doc).await?;
                    migrated += 1;
                }
            }
        }
        debug!("Migrated {migrated} stored snapshots");

        self.backend
            .set(SCHEMA_VERSION_KEY, Value::from(CURRENT_SCHEMA_VERSION))
            .await?;
        Ok(version)
    }

    // ── Ledger documents ────────────────────────────────────────────

    pub async fn load_portfolio(&self) -> Result<Portfolio, CoreError> {
        self.load_or_default(PORTFOLIO_KEY).await
    }

    pub async fn save_portfolio(&self, portfolio: &Portfolio) -> Result<(), CoreError> {
        self.save(PORTFOLIO_KEY, portfolio).await
    }

    pub async fn load_transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        self.load_or_default(TRANSACTIONS_KEY).await
    }

    pub async fn save_transactions(&self, transactions: &[Transaction]) -> Result<(), CoreError> {
        self.save(TRANSACTIONS_KEY, transactions).await
    }

    pub async fn load_projects(&self) -> Result<Vec<Project>, CoreError> {
        self.load_or_default(PROJECTS_KEY).await
    }

    pub async fn save_projects(&self, projects: &[Project]) -> Result<(), CoreError> {
        self.save(PROJECTS_KEY, projects).await
    }

    pub async fn load_settings(&self) -> Result<Settings, CoreError> {
        self.load_or_default(SETTINGS_KEY).await
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<(), CoreError> {
        self.save(SETTINGS_KEY, settings).await
    }

    // ── Snapshots ───────────────────────────────────────────────────

    pub async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        self.save(&snapshot.storage_key(), snapshot).await
    }

    /// Load every stored snapshot, oldest first (sorted by parsed timestamp).
    /// Documents that fail to parse are skipped with a warning.
    pub async fn load_snapshots(&self) -> Result<Vec<Snapshot>, CoreError> {
        let keys = self.backend.list_keys(SNAPSHOT_KEY_PREFIX).await?;
        let mut snapshots = Vec::with_capacity(keys.len());

        for key in keys {
            let Some(doc) = self.backend.get(&key).await? else {
                continue;
            };
            match serde_json::from_value::<Snapshot>(doc) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => warn!("Skipping unreadable snapshot {key}: {e}"),
            }
        }

        snapshots.sort_by_key(|s| s.timestamp);
        Ok(snapshots)
    }

    /// Delete every stored capture with the given id.
    /// Returns `false` if none existed.
    pub async fn delete_snapshot(&self, id: Uuid) -> Result<bool, CoreError> {
        let prefix = format!("{SNAPSHOT_KEY_PREFIX}{id}-");
        let mut removed = false;
        for key in self.backend.list_keys(&prefix).await? {
            removed |= self.backend.delete(&key).await?;
        }
        Ok(removed)
    }

    /// Delete all stored snapshots. Returns how many were removed.
    pub async fn delete_all_snapshots(&self) -> Result<usize, CoreError> {
        let mut removed = 0;
        for key in self.backend.list_keys(SNAPSHOT_KEY_PREFIX).await? {
            if self.backend.delete(&key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    // ── Internal ────────────────────────────────────────────────────

    async fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, CoreError> {
        match self.backend.get(key).await? {
            Some(Value::Null) | None => Ok(T::default()),
            Some(doc) => serde_json::from_value(doc).map_err(|e| {
                CoreError::Deserialization(format!("Failed to deserialize {key}: {e}"))
            }),
        }
    }

    async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CoreError> {
        let doc = serde_json::to_value(value)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize {key}: {e}")))?;
        self.backend.set(key, doc).await
    }
}
