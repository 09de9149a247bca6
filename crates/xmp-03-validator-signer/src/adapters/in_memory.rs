//! # In-Memory Syncer
//!
//! Process-local syncer for single-node deployments and tests.

use crate::domain::{SignedCheckpoint, SyncerError};
use crate::ports::CheckpointSyncer;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Checkpoints held in a map keyed by index.
#[derive(Debug, Default)]
pub struct InMemorySyncer {
    checkpoints: RwLock<BTreeMap<u32, SignedCheckpoint>>,
}

impl InMemorySyncer {
    /// Empty syncer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored checkpoints.
    pub fn len(&self) -> usize {
        self.checkpoints.read().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.checkpoints.read().is_empty()
    }
}

#[async_trait]
impl CheckpointSyncer for InMemorySyncer {
    async fn latest_index(&self) -> Result<Option<u32>, SyncerError> {
        Ok(self.checkpoints.read().keys().next_back().copied())
    }

    async fn fetch_checkpoint(&self, index: u32) -> Result<Option<SignedCheckpoint>, SyncerError> {
        Ok(self.checkpoints.read().get(&index).copied())
    }

    async fn write_checkpoint(&self, signed: &SignedCheckpoint) -> Result<(), SyncerError> {
        self.checkpoints.write().insert(signed.index(), *signed);
        Ok(())
    }
}
