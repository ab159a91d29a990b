use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use super::traits::Storage;
use crate::errors::CoreError;

/// Remote key-value backend speaking the Redis-over-REST dialect
/// (`/get/{key}`, `/set/{key}`, `/del/{key}`, `/keys/{pattern}`) used by
/// hosted KV services.
///
/// Documents are stored as JSON strings and parsed back on read.
pub struct RemoteKvStorage {
    client: Client,
    base_url: String,
    token: String,
}

/// Every endpoint wraps its payload in `{"result": ...}` or `{"error": ...}`.
#[derive(Deserialize)]
struct KvResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

impl RemoteKvStorage {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, command: &str, key: &str) -> String {
        format!("{}/{command}/{key}", self.base_url)
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<Option<T>, CoreError> {
        let resp = request.bearer_auth(&self.token).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Storage(format!(
                "Remote store returned {status} for {what}"
            )));
        }
        let body: Value = resp.json().await.map_err(|e| {
            CoreError::Storage(format!("Malformed remote store response for {what}: {e}"))
        })?;
        decode_response(body, what)
    }
}

// ── Wire format ─────────────────────────────────────────────────────

/// Unwrap a `{"result": ...}` / `{"error": ...}` envelope.
/// A `null` or missing result is `Ok(None)`.
pub fn decode_response<T: serde::de::DeserializeOwned>(
    body: Value,
    what: &str,
) -> Result<Option<T>, CoreError> {
    let envelope: KvResponse<T> = serde_json::from_value(body).map_err(|e| {
        CoreError::Storage(format!("Malformed remote store response for {what}: {e}"))
    })?;
    if let Some(err) = envelope.error {
        return Err(CoreError::Storage(format!("Remote store error for {what}: {err}")));
    }
    Ok(envelope.result)
}

/// Documents travel as JSON text inside the store.
pub fn encode_document(key: &str, value: &Value) -> Result<String, CoreError> {
    serde_json::to_string(value)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize {key}: {e}")))
}

/// Parse the JSON text stored under `key`.
pub fn decode_document(key: &str, raw: Option<String>) -> Result<Option<Value>, CoreError> {
    match raw {
        Some(text) => serde_json::from_str(&text).map(Some).map_err(|e| {
            CoreError::Deserialization(format!("Stored value for {key} is not JSON: {e}"))
        }),
        None => Ok(None),
    }
}

/// `del` answers with the number of keys removed.
#[must_use]
pub fn was_deleted(removed: Option<i64>) -> bool {
    removed.unwrap_or(0) > 0
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Storage for RemoteKvStorage {
    fn name(&self) -> &str {
        "remote"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, CoreError> {
        let raw: Option<String> = self
            .send(self.client.get(self.url("get", key)), key)
            .await?;
        decode_document(key, raw)
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), CoreError> {
        let body = encode_document(key, &value)?;
        let _: Option<Value> = self
            .send(self.client.post(self.url("set", key)).body(body), key)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CoreError> {
        let removed: Option<i64> = self
            .send(self.client.get(self.url("del", key)), key)
            .await?;
        Ok(was_deleted(removed))
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, CoreError> {
        let pattern = format!("{prefix}*");
        let keys: Option<Vec<String>> = self
            .send(self.client.get(self.url("keys", &pattern)), &pattern)
            .await?;
        Ok(keys.unwrap_or_default())
    }
}
