use std::{
    io::{ErrorKind, SeekFrom},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use fs4::tokio::AsyncFileExt;
use thiserror::Error;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, warn};

use crate::tracking::entities::DailyRecord;

pub const HISTORY_FILE_NAME: &str = "history.json";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to read history: {0}")]
    Read(#[source] std::io::Error),
    #[error("Failed to write history: {0}")]
    Write(#[source] std::io::Error),
    #[error("Stored history is corrupted: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("Failed to encode history: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Interface for abstracting where the history lives.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Returns `None` when nothing was saved yet.
    async fn load(&self) -> Result<Option<Vec<DailyRecord>>, PersistenceError>;

    async fn save(&self, records: &[DailyRecord]) -> Result<(), PersistenceError>;
}

/// The main realization of [PersistenceStore]. Keeps the history in a single file guarded by
/// file locks, so a second process never sees a half written file.
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store placed in the application directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(HISTORY_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_locked(path: &Path) -> Result<String, std::io::Error> {
        let mut file = File::open(path).await?;
        file.lock_shared()?;
        let mut content = String::new();
        let result = file.read_to_string(&mut content).await;
        file.unlock_async().await?;
        result.map(|_| content)
    }

    async fn write_locked(path: &Path, content: &[u8]) -> Result<(), std::io::Error> {
        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .await?;
        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::overwrite(&mut file, content).await;
        file.unlock_async().await?;
        result
    }

    async fn overwrite(file: &mut File, content: &[u8]) -> Result<(), std::io::Error> {
        file.set_len(0).await?;
        file.seek(SeekFrom::Start(0)).await?;
        file.write_all(content).await?;
        file.flush().await?;
        file.sync_all().await
    }
}

#[async_trait]
impl PersistenceStore for FileHistoryStore {
    async fn load(&self) -> Result<Option<Vec<DailyRecord>>, PersistenceError> {
        debug!("Loading history from {:?}", self.path);
        let content = match Self::read_locked(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistenceError::Read(e)),
        };
        if content.trim().is_empty() {
            warn!("History file {:?} is empty", self.path);
            return Ok(None);
        }
        serde_json::from_str(&content)
            .map(Some)
            .map_err(PersistenceError::Corrupt)
    }

    async fn save(&self, records: &[DailyRecord]) -> Result<(), PersistenceError> {
        let content = serde_json::to_vec_pretty(records).map_err(PersistenceError::Encode)?;
        Self::write_locked(&self.path, &content)
            .await
            .map_err(PersistenceError::Write)?;
        debug!("Saved {} record(s) into {:?}", records.len(), self.path);
        Ok(())
    }
}
