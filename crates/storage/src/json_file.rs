use async_trait::async_trait;
use std::{
    fs,
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};
use tempfile::{Builder, NamedTempFile};

use shared::domain::SessionState;

use crate::{decode_record, StateStore, StorageError};

/// Keeps the session as a single JSON document on disk.
///
/// Every save stages the record in its own uniquely named sibling file,
/// fsyncs it and renames it over the target, so readers only ever see a
/// complete record. Saves run to completion on the blocking pool even when
/// the caller stops waiting, and one writer lock orders them.
#[derive(Debug, Clone)]
pub struct JsonFileStateStore {
    path: PathBuf,
    writer: Arc<Mutex<()>>,
}

impl JsonFileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn staging_prefix(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "session".to_string());
        format!(".{name}.")
    }
}

fn stage(dir: &Path, prefix: &str, payload: &[u8]) -> Result<NamedTempFile, StorageError> {
    let mut staged = Builder::new()
        .prefix(prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| StorageError::io(dir, e))?;
    staged
        .write_all(payload)
        .map_err(|e| StorageError::io(staged.path(), e))?;
    staged
        .as_file()
        .sync_all()
        .map_err(|e| StorageError::io(staged.path(), e))?;
    Ok(staged)
}

/// Staged file is removed by `NamedTempFile` on every error path.
fn write_record(path: &Path, prefix: &str, payload: &[u8]) -> Result<(), StorageError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;

    let staged = stage(dir, prefix, payload)?;
    staged
        .persist(path)
        .map_err(|e| StorageError::io(path, e.error))?;
    Ok(())
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn load(&self) -> Result<SessionState, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(decode_record(&raw, &self.describe())),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(SessionState::default()),
            // Non UTF-8 bytes are as unreadable as broken JSON.
            Err(error) if error.kind() == ErrorKind::InvalidData => {
                tracing::warn!(path = %self.path.display(), %error, "session file is not valid text; starting from zero");
                Ok(SessionState::default())
            }
            Err(error) => Err(StorageError::io(&self.path, error)),
        }
    }

    async fn save(&self, state: &SessionState) -> Result<(), StorageError> {
        let payload = serde_json::to_vec(state)?;
        let path = self.path.clone();
        let prefix = self.staging_prefix();
        let writer = Arc::clone(&self.writer);

        tokio::task::spawn_blocking(move || {
            let _writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
            write_record(&path, &prefix, &payload)
        })
        .await
        .map_err(|e| StorageError::io(&self.path, io::Error::other(e)))?
    }

    async fn reset(&self) -> Result<(), StorageError> {
        let path = self.path.clone();
        let writer = Arc::clone(&self.writer);

        tokio::task::spawn_blocking(move || {
            let _writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
            match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
                Err(error) => Err(StorageError::io(&path, error)),
            }
        })
        .await
        .map_err(|e| StorageError::io(&self.path, io::Error::other(e)))?
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}
