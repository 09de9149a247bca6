//! # Outbound Ports
//!
//! Where validators publish signed checkpoints and relayers read them.

use crate::domain::{SignedCheckpoint, SyncerError};
use async_trait::async_trait;
use std::sync::Arc;

/// Signed checkpoint store for one validator.
///
/// Writers are single validators; readers are relayers aggregating many
/// syncers. Indices need not be contiguous.
#[async_trait]
pub trait CheckpointSyncer: Send + Sync + std::fmt::Debug {
    /// Highest index written, if any.
    async fn latest_index(&self) -> Result<Option<u32>, SyncerError>;

    /// Signed checkpoint at `index`, if written.
    async fn fetch_checkpoint(&self, index: u32) -> Result<Option<SignedCheckpoint>, SyncerError>;

    /// Publish a signed checkpoint.
    async fn write_checkpoint(&self, signed: &SignedCheckpoint) -> Result<(), SyncerError>;
}

#[async_trait]
impl<T: CheckpointSyncer + ?Sized> CheckpointSyncer for Arc<T> {
    async fn latest_index(&self) -> Result<Option<u32>, SyncerError> {
        (**self).latest_index().await
    }

    async fn fetch_checkpoint(&self, index: u32) -> Result<Option<SignedCheckpoint>, SyncerError> {
        (**self).fetch_checkpoint(index).await
    }

    async fn write_checkpoint(&self, signed: &SignedCheckpoint) -> Result<(), SyncerError> {
        (**self).write_checkpoint(signed).await
    }
}
