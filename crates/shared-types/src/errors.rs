//! # Error Types
//!
//! Errors shared by the persistence and governance layers.

use primitive_types::H160;
use thiserror::Error;

/// Errors raised by a `KeyValueStore` or while decoding a persisted record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The backing store failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A record was written by a schema this build does not understand.
    #[error("Unsupported schema version: found {found}, supported {supported}")]
    UnsupportedSchema { found: u16, supported: u16 },

    /// A record could not be encoded or decoded.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Persisted state failed an integrity check on load.
    #[error("Data corruption: {0}")]
    Corrupted(String),
}

/// Errors raised by the `AccessControl` state machine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    /// Caller is not the current owner.
    #[error("Unauthorized: {caller:?} is not the current owner")]
    Unauthorized { caller: H160 },

    /// Only the recovery manager may start or end recovery.
    #[error("Unauthorized: {caller:?} is not the recovery manager")]
    NotRecoveryManager { caller: H160 },

    /// Recovery was already initiated.
    #[error("Recovery already initiated, active at {active_at}")]
    RecoveryAlreadyInitiated { active_at: u64 },

    /// Recovery is not active (never initiated, or timelock still running).
    #[error("Not in recovery")]
    NotInRecovery,
}
