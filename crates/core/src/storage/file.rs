use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::traits::Storage;
use crate::errors::CoreError;

/// Local backend: every key lives in one pretty-printed JSON object on disk.
///
/// Each operation re-reads the file so external edits are picked up. Writes go
/// to a sibling temp file first and are renamed into place, so a crash never
/// leaves a half-written document behind.
pub struct FileStorage {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, Value>, CoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(|b| b.is_ascii_whitespace()) => Ok(BTreeMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                CoreError::Storage(format!(
                    "Corrupted data file {}: {e}",
                    self.path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(CoreError::Storage(format!(
                "Failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn write_all(&self, map: &BTreeMap<String, Value>) -> Result<(), CoreError> {
        let bytes = serde_json::to_vec_pretty(map)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize data file: {e}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    CoreError::Storage(format!("Failed to create {}: {e}", parent.display()))
                })?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| CoreError::Storage(format!("Failed to write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            CoreError::Storage(format!("Failed to replace {}: {e}", self.path.display()))
        })
    }
}

#[async_trait]
impl Storage for FileStorage {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, CoreError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_all().await?;
        Ok(map.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), CoreError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_all().await?;
        map.insert(key.to_string(), value);
        self.write_all(&map).await
    }

    async fn delete(&self, key: &str) -> Result<bool, CoreError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_all().await?;
        if map.remove(key).is_none() {
            return Ok(false);
        }
        self.write_all(&map).await?;
        Ok(true)
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, CoreError> {
        let _guard = self.lock.lock().await;
        let map = self.read_all().await?;
        Ok(map
            .into_keys()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }
}
