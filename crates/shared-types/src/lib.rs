//! # Shared Types Crate
//!
//! Types every protocol component agrees on.
//!
//! ## Contents
//!
//! - **Entities**: `Domain`, 32-byte and 20-byte hash types
//! - **Storage**: the `KeyValueStore` port and schema-versioned records
//! - **Governance**: the `AccessControl` state machine that mints the
//!   `AdminCapability` required by every admin mutator

pub mod entities;
pub mod errors;
pub mod governance;
pub mod storage;

pub use entities::*;
pub use errors::*;
pub use governance::{
    AccessControl, AdminCapability, Clock, ManualClock, RecoveryState, SystemClock,
    DEFAULT_RECOVERY_TIMELOCK_SECS,
};
pub use storage::{
    BatchOperation, InMemoryKVStore, KeyValueStore, VersionedRecord, CURRENT_SCHEMA_VERSION,
};
