//! # Local Storage Syncer
//!
//! One JSON file per checkpoint (`{index}.json`) plus `index.json` holding
//! the highest index written.

use crate::domain::{SignedCheckpoint, SyncerError};
use crate::ports::CheckpointSyncer;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

const LATEST_INDEX_FILE: &str = "index.json";

/// Filesystem checkpoint syncer.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Syncer rooted at `path`. The directory is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Root directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn checkpoint_file(&self, index: u32) -> PathBuf {
        self.path.join(format!("{index}.json"))
    }

    fn latest_index_file(&self) -> PathBuf {
        self.path.join(LATEST_INDEX_FILE)
    }

    async fn read_optional(path: &Path) -> Result<Option<String>, SyncerError> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(io_error(path, source)),
        }
    }

    async fn write_file(path: &Path, contents: String) -> Result<(), SyncerError> {
        tokio::fs::write(path, contents)
            .await
            .map_err(|source| io_error(path, source))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> SyncerError {
    SyncerError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[async_trait]
impl CheckpointSyncer for LocalStorage {
    async fn latest_index(&self) -> Result<Option<u32>, SyncerError> {
        match Self::read_optional(&self.latest_index_file()).await? {
            Some(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            None => Ok(None),
        }
    }

    async fn fetch_checkpoint(&self, index: u32) -> Result<Option<SignedCheckpoint>, SyncerError> {
        match Self::read_optional(&self.checkpoint_file(index)).await? {
            Some(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            None => Ok(None),
        }
    }

    async fn write_checkpoint(&self, signed: &SignedCheckpoint) -> Result<(), SyncerError> {
        tokio::fs::create_dir_all(&self.path)
            .await
            .map_err(|source| io_error(&self.path, source))?;

        let index = signed.index();
        Self::write_file(
            &self.checkpoint_file(index),
            serde_json::to_string_pretty(signed)?,
        )
        .await?;

        // The checkpoint file is in place before the index advances.
        if self.latest_index().await?.map_or(true, |latest| index > latest) {
            Self::write_file(&self.latest_index_file(), serde_json::to_string(&index)?).await?;
        }

        debug!(path = %self.path.display(), index, "Checkpoint written");
        Ok(())
    }
}
