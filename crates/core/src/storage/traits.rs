use async_trait::async_trait;
use serde_json::Value;

use crate::errors::CoreError;

/// Key → JSON document store.
///
/// The core never assumes atomicity across multiple keys. Concurrent writers
/// to the same key race; last write wins.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Storage: Send + Sync {
    /// Human-readable backend name (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch the document stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<Value>, CoreError>;

    /// Store `value` under `key`, replacing any previous document.
    async fn set(&self, key: &str, value: Value) -> Result<(), CoreError>;

    /// Remove `key`. Returns `false` if nothing was stored there.
    async fn delete(&self, key: &str) -> Result<bool, CoreError>;

    /// All keys starting with `prefix`, in no particular order.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, CoreError>;
}

/// Lets callers keep a handle on a backend they hand to the tracker.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl<T: Storage + ?Sized> Storage for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, CoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), CoreError> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool, CoreError> {
        (**self).delete(key).await
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, CoreError> {
        (**self).list_keys(prefix).await
    }
}
