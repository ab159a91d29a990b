use serde::{Deserialize, Serialize};

use super::memory::MemoryStorage;
use super::remote::RemoteKvStorage;
use super::traits::Storage;

/// Which backend the storage facade talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Single JSON file on local disk (native only)
    File { path: String },
    /// Hosted key-value store over HTTP
    Remote { base_url: String, token: String },
    /// In-process, nothing persisted
    Memory,
}

impl StorageConfig {
    /// Instantiate the configured backend.
    pub fn build(&self) -> Box<dyn Storage> {
        match self {
            #[cfg(not(target_arch = "wasm32"))]
            StorageConfig::File { path } => Box::new(super::file::FileStorage::new(path.clone())),
            #[cfg(target_arch = "wasm32")]
            StorageConfig::File { .. } => {
                log::warn!("File storage is unavailable on wasm32; falling back to memory");
                Box::new(MemoryStorage::new())
            }
            StorageConfig::Remote { base_url, token } => {
                Box::new(RemoteKvStorage::new(base_url.clone(), token.clone()))
            }
            StorageConfig::Memory => Box::new(MemoryStorage::new()),
        }
    }
}
