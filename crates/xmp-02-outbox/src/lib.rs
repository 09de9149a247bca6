//! # XMP-02 Outbox
//!
//! Append-only commitment log of dispatched messages for one origin domain.
//!
//! **Component ID:** 02
//! **Architecture:** Hexagonal (domain + ports)
//!
//! ## Purpose
//!
//! - Assign each dispatched message the next nonce (its leaf index)
//! - Append `keccak256(message)` to a depth-32 incremental Merkle tree
//! - Expose `(root, index)` checkpoints for validators to sign
//! - Keep every leaf so relayers can build inclusion proofs
//!
//! ## Module Structure
//!
//! ```text
//! xmp-02-outbox/
//! ├── domain/          # IncrementalMerkle, Prover, MerkleProof, errors
//! ├── ports/           # OutboxApi
//! └── service.rs       # Outbox
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use domain::{
    hash_pair, DispatchEvent, IncrementalMerkle, MerkleProof, OutboxError, OutboxState, Prover,
    MAX_LEAVES, TREE_DEPTH, ZERO_HASHES,
};
pub use ports::OutboxApi;
pub use service::{Outbox, EVENT_CHANNEL_CAPACITY};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
