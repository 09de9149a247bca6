//! # Syncer Configuration

use super::{InMemorySyncer, LocalStorage};
use crate::domain::{SignedCheckpoint, SyncerError};
use crate::ports::CheckpointSyncer;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Checkpoint syncer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CheckpointSyncerConf {
    /// Directory on the local filesystem
    LocalStorage {
        /// Directory path
        path: String,
    },
    /// Process memory
    InMemory,
}

impl CheckpointSyncerConf {
    /// Build the configured syncer.
    pub fn build(&self) -> CheckpointSyncers {
        match self {
            Self::LocalStorage { path } => CheckpointSyncers::Local(LocalStorage::new(path)),
            Self::InMemory => CheckpointSyncers::InMemory(InMemorySyncer::new()),
        }
    }
}

/// Any configured syncer.
#[derive(Debug)]
pub enum CheckpointSyncers {
    /// Filesystem syncer
    Local(LocalStorage),
    /// In-memory syncer
    InMemory(InMemorySyncer),
}

#[async_trait]
impl CheckpointSyncer for CheckpointSyncers {
    async fn latest_index(&self) -> Result<Option<u32>, SyncerError> {
        match self {
            Self::Local(syncer) => syncer.latest_index().await,
            Self::InMemory(syncer) => syncer.latest_index().await,
        }
    }

    async fn fetch_checkpoint(&self, index: u32) -> Result<Option<SignedCheckpoint>, SyncerError> {
        match self {
            Self::Local(syncer) => syncer.fetch_checkpoint(index).await,
            Self::InMemory(syncer) => syncer.fetch_checkpoint(index).await,
        }
    }

    async fn write_checkpoint(&self, signed: &SignedCheckpoint) -> Result<(), SyncerError> {
        match self {
            Self::Local(syncer) => syncer.write_checkpoint(signed).await,
            Self::InMemory(syncer) => syncer.write_checkpoint(signed).await,
        }
    }
}
