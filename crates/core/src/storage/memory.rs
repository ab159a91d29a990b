use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::traits::Storage;
use crate::errors::CoreError;

/// In-process backend. Nothing survives the process; used for tests and
/// throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Storage for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, CoreError> {
        let map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), CoreError> {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CoreError> {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(map.remove(key).is_some())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, CoreError> {
        let map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(map
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
