//! # XMP-03 Validator Signer
//!
//! Off-chain attestation of outbox checkpoints.
//!
//! **Component ID:** 03
//! **Architecture:** Hexagonal (domain + ports + adapters)
//!
//! ## Purpose
//!
//! - Derive the domain-scoped signing payload for a `(root, index)` checkpoint
//! - Sign checkpoints with a secp256k1 validator key (recoverable, low-S)
//! - Publish signed checkpoints through a `CheckpointSyncer`
//! - Aggregate per-validator syncers into quorum-signed checkpoints
//!
//! ## Module Structure
//!
//! ```text
//! xmp-03-validator-signer/
//! ├── domain/          # domain_hash, SignedCheckpoint, errors
//! ├── ports/           # CheckpointSyncer
//! ├── adapters/        # LocalStorage, InMemorySyncer, MultisigCheckpointSyncer
//! └── service.rs       # Validator
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    CheckpointSyncerConf, CheckpointSyncers, InMemorySyncer, LocalStorage,
    MultisigCheckpointSyncer,
};
pub use domain::{
    checkpoint_digest, domain_hash, signing_hash, MultisigSignedCheckpoint, SignedCheckpoint,
    SignerError, SyncerError, DOMAIN_HASH_SUFFIX,
};
pub use ports::CheckpointSyncer;
pub use service::Validator;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
