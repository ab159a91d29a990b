use thiserror::Error;

/// Unified error type for the entire crypto-portfolio-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Business Logic ──────────────────────────────────────────────
    /// Bad user input. Never partially applied.
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // ── Storage ─────────────────────────────────────────────────────
    /// Persistence failure. In-memory state is NOT rolled back.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unsupported schema version: {0}")]
    UnsupportedSchemaVersion(u32),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── File I/O (native only) ──────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("No price provider registered")]
    NoProvider,
}

impl CoreError {
    /// Shorthand for building a validation error from anything displayable.
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::ValidationError(msg.into())
    }

    /// `true` for errors caused by user input rather than the environment.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::ValidationError(_))
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL; API keys travel in the query string.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
