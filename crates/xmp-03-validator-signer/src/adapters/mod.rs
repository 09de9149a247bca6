//! # Adapters
//!
//! Checkpoint syncer implementations and the multisig aggregator.

pub mod conf;
pub mod in_memory;
pub mod local_storage;
pub mod multisig;

pub use conf::{CheckpointSyncerConf, CheckpointSyncers};
pub use in_memory::InMemorySyncer;
pub use local_storage::LocalStorage;
pub use multisig::MultisigCheckpointSyncer;
