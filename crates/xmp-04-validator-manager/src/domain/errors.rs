//! # Validator Manager Errors

use shared_types::{StorageError, H160};
use thiserror::Error;

/// Validator manager errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidatorManagerError {
    /// Signer at `position` is not strictly greater than the one before it.
    ///
    /// A malformed submission. Retrying without reordering cannot succeed.
    #[error("Signers not strictly ascending at position {position}")]
    UnsortedSigners {
        /// Index into the signature list
        position: usize,
    },

    /// Signature at `position` does not recover to any address.
    #[error("Invalid signature at position {position}: {reason}")]
    InvalidSignature {
        /// Index into the signature list
        position: usize,
        /// Recovery failure
        reason: String,
    },

    /// Validator already in the set.
    #[error("Validator already enrolled: {0:?}")]
    AlreadyEnrolled(H160),

    /// Validator not in the set.
    #[error("Validator not enrolled: {0:?}")]
    NotEnrolled(H160),

    /// Removal would leave fewer validators than the threshold.
    #[error("Quorum violation: {set_size} validators would remain, threshold is {threshold}")]
    QuorumViolation {
        /// Set size after removal
        set_size: usize,
        /// Current threshold
        threshold: u32,
    },

    /// Threshold is zero or above the set size.
    #[error("Threshold {threshold} out of range for {set_size} validators")]
    OutOfRange {
        /// Requested threshold
        threshold: u32,
        /// Current set size
        set_size: usize,
    },

    /// Persistence failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ValidatorManagerError {
    /// Whether the same call may succeed later without changing its input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(StorageError::DatabaseError(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quorum_errors_not_retryable() {
        assert!(!ValidatorManagerError::UnsortedSigners { position: 1 }.is_retryable());
        assert!(!ValidatorManagerError::AlreadyEnrolled(H160::zero()).is_retryable());
        assert!(
            ValidatorManagerError::Storage(StorageError::DatabaseError("locked".into()))
                .is_retryable()
        );
    }
}
