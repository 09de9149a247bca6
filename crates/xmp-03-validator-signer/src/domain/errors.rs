//! # Signer Errors

use shared_crypto::CryptoError;
use shared_types::{Domain, H160};
use thiserror::Error;

/// Checkpoint signing errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignerError {
    /// Key or signature failure.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Checkpoint belongs to a different outbox domain.
    #[error("Domain mismatch: validator signs for {expected}, checkpoint is for {actual}")]
    DomainMismatch {
        /// Validator's domain
        expected: Domain,
        /// Checkpoint's domain
        actual: Domain,
    },
}

/// Checkpoint syncer errors.
#[derive(Debug, Error)]
pub enum SyncerError {
    /// Filesystem failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path involved
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Stored checkpoint could not be parsed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored signature does not recover to the syncer's validator.
    #[error("Signer mismatch at index {index}: expected {expected:?}, recovered {recovered:?}")]
    SignerMismatch {
        /// Checkpoint index
        index: u32,
        /// Validator the syncer belongs to
        expected: H160,
        /// Address recovered from the signature
        recovered: H160,
    },

    /// Signature recovery failed.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Invalid multisig syncer configuration.
    #[error("Invalid syncer configuration: {0}")]
    InvalidConfig(String),
}

impl SyncerError {
    /// I/O failures are worth retrying; bad data is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
