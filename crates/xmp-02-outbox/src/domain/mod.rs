//! # Domain Module
//!
//! Merkle accumulator, prover, outbox entities and errors.

pub mod accumulator;
pub mod entities;
pub mod errors;
pub mod prover;

pub use accumulator::{
    hash_pair, IncrementalMerkle, MerkleProof, MAX_LEAVES, TREE_DEPTH, ZERO_HASHES,
};
pub use entities::{DispatchEvent, OutboxState};
pub(crate) use entities::OutboxHead;
pub use errors::OutboxError;
pub use prover::Prover;
