use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::SessionState;

use crate::{decode_record, StateStore, StorageError};

/// Session record stored as a JSON column in a one-row SQLite table.
#[derive(Clone)]
pub struct SqliteStateStore {
    pool: Pool<Sqlite>,
    database_url: String,
}

impl SqliteStateStore {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let in_memory = is_memory_url(database_url);
        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to `sqlite::memory:` is its own database, so pin one.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;

        let store = Self {
            pool,
            database_url: database_url.to_string(),
        };
        store.ensure_session_table().await?;
        Ok(store)
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn ensure_session_table(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_state (
                id          INTEGER PRIMARY KEY CHECK (id = 1),
                record      TEXT NOT NULL,
                updated_at  TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn load(&self) -> Result<SessionState, StorageError> {
        let row = sqlx::query("SELECT record FROM session_state WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(SessionState::default());
        };
        let raw: String = row.try_get("record")?;
        Ok(decode_record(&raw, &self.describe()))
    }

    async fn save(&self, state: &SessionState) -> Result<(), StorageError> {
        let record = serde_json::to_string(state)?;
        sqlx::query(
            "INSERT INTO session_state (id, record) VALUES (1, ?)
             ON CONFLICT(id) DO UPDATE SET record = excluded.record, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(record)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reset(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_state WHERE id = 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.database_url.clone()
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<(), StorageError> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    Ok(())
}

pub(crate) fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_memory_url(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}
