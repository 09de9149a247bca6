//! # Inbox Errors
//!
//! Relayers branch on `is_retryable()`: a retryable failure may succeed
//! later (more signatures, a newer checkpoint, a recovered handler), a
//! non-retryable one never will for the same input.

use shared_types::{Domain, StorageError, H256};
use thiserror::Error;
use xmp_01_message_codec::CodecError;
use xmp_04_validator_manager::ValidatorManagerError;

/// Inbox errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InboxError {
    /// Message bytes failed to decode.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// The proof's root is not a proven root.
    #[error("Root not proven: {root:?}")]
    ProofNotProven {
        /// Root computed from the proof
        root: H256,
    },

    /// The message is already pending or processed.
    #[error("Message already processed: {0:?}")]
    AlreadyProcessed(H256),

    /// Message addressed to another domain.
    #[error("Wrong destination: inbox is {expected}, message is for {actual}")]
    WrongDestination {
        /// This inbox's domain
        expected: Domain,
        /// Message destination
        actual: Domain,
    },

    /// Message from an origin this inbox does not serve.
    #[error("Wrong origin: inbox serves {expected}, message is from {actual}")]
    WrongOrigin {
        /// This inbox's remote domain
        expected: Domain,
        /// Message origin
        actual: Domain,
    },

    /// Sender is not enrolled for its origin.
    #[error("Unauthorized sender {sender:?} on domain {origin}")]
    UnauthorizedSender {
        /// Message origin
        origin: Domain,
        /// Message sender
        sender: H256,
    },

    /// Signatures did not reach the threshold.
    #[error("Quorum not met for checkpoint {index}")]
    QuorumNotMet {
        /// Checkpoint index
        index: u32,
    },

    /// Malformed signature list.
    #[error("Quorum check failed: {0}")]
    Quorum(#[from] ValidatorManagerError),

    /// Checkpoint from a different origin domain.
    #[error("Checkpoint domain mismatch: inbox serves {expected}, checkpoint is from {actual}")]
    CheckpointDomainMismatch {
        /// This inbox's remote domain
        expected: Domain,
        /// Checkpoint domain
        actual: Domain,
    },

    /// The recipient handler failed. All state changes were reverted.
    #[error("Handler failed: {0}")]
    HandlerFailed(String),

    /// Persistence failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl InboxError {
    /// Whether the same call may succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::QuorumNotMet { .. } | Self::ProofNotProven { .. } | Self::HandlerFailed(_) => {
                true
            }
            Self::Storage(StorageError::DatabaseError(_)) => true,
            _ => false,
        }
    }
}
