//! # Outbox Errors

use shared_types::StorageError;
use thiserror::Error;
use xmp_01_message_codec::CodecError;

/// Outbox errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OutboxError {
    /// Message failed codec validation.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// The tree holds its maximum number of leaves. Fatal for this outbox.
    #[error("Outbox capacity exceeded: {max} leaves")]
    CapacityExceeded {
        /// Maximum leaf count
        max: u32,
    },

    /// The outbox was halted by governance.
    #[error("Outbox has failed and no longer accepts messages")]
    OutboxFailed,

    /// Proof requested for a leaf or checkpoint outside the tree.
    #[error("Invalid proof request: leaf {leaf_index} at checkpoint {checkpoint_index}, {count} leaves")]
    InvalidProofRequest {
        /// Requested leaf
        leaf_index: u32,
        /// Requested checkpoint index
        checkpoint_index: u32,
        /// Leaves currently held
        count: usize,
    },

    /// Persistence failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl OutboxError {
    /// Whether this outbox can never accept another message.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CapacityExceeded { .. } | Self::OutboxFailed)
    }

    /// Whether the same call may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(StorageError::DatabaseError(_)))
    }
}
