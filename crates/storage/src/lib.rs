use async_trait::async_trait;
use std::{path::Path, sync::Arc};
use thiserror::Error;

use shared::domain::SessionState;

mod json_file;
mod sqlite;

pub use json_file::JsonFileStateStore;
pub use sqlite::SqliteStateStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode session state: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage {operation} timed out after {timeout_ms} ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
}

impl StorageError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Durable home of the single session record.
///
/// `load` must hand back the zero-value state when the record is missing or
/// cannot be parsed; only genuine I/O or database failures surface as errors.
/// `save` must never leave a half-written record behind.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> Result<SessionState, StorageError>;

    async fn save(&self, state: &SessionState) -> Result<(), StorageError>;

    /// Deletes the persisted record. Resetting an absent record succeeds.
    async fn reset(&self) -> Result<(), StorageError>;

    fn describe(&self) -> String;
}

pub fn is_sqlite_url(state_url: &str) -> bool {
    state_url.starts_with("sqlite:")
}

/// Opens the backend named by `state_url`: `sqlite:` URLs get the database
/// store, anything else is treated as a JSON file path.
pub async fn open_state_store(state_url: &str) -> Result<Arc<dyn StateStore>, StorageError> {
    if is_sqlite_url(state_url) {
        let store = SqliteStateStore::new(state_url).await?;
        Ok(Arc::new(store))
    } else {
        let path = state_url.strip_prefix("file://").unwrap_or(state_url);
        Ok(Arc::new(JsonFileStateStore::new(path)))
    }
}

/// Decodes a stored record, falling back to the zero-value state.
pub(crate) fn decode_record(raw: &str, origin: &str) -> SessionState {
    if raw.trim().is_empty() {
        return SessionState::default();
    }
    match serde_json::from_str::<SessionState>(raw) {
        Ok(state) => state.normalized(),
        Err(error) => {
            tracing::warn!(%origin, %error, "session record is unreadable; starting from zero");
            SessionState::default()
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
