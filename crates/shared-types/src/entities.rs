//! # Core Domain Entities
//!
//! Identifiers and hash types shared across the outbox, signer, validator
//! manager and inbox.

pub use primitive_types::{H160, H256};
use serde::{Deserialize, Serialize};

/// A 32-bit identifier for one chain/deployment instance.
///
/// Every hash a validator signs is scoped by the origin domain, so a
/// domain id must never be reused by an incompatible deployment.
pub type Domain = u32;

/// A 20-byte EVM-style address (validators, governors).
pub type Address = H160;

/// Convert a 20-byte address into its 32-byte left-padded form.
pub fn address_to_h256(address: H160) -> H256 {
    H256::from(address)
}

/// Take the low 20 bytes of a 32-byte word as an address.
pub fn h256_to_address(word: H256) -> H160 {
    H160::from(word)
}

/// A snapshot of an outbox tree: the root over leaves `0..=index`.
///
/// This is what validators sign. It is never stored as a unit on the
/// origin side; the outbox only exposes it on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Merkle root of the outbox tree
    pub root: H256,
    /// Index of the last leaf covered by `root`
    pub index: u32,
}

impl Checkpoint {
    /// Create a checkpoint.
    pub fn new(root: H256, index: u32) -> Self {
        Self { root, index }
    }

    /// Whether this checkpoint covers the leaf at `leaf_index`.
    pub fn covers(&self, leaf_index: u32) -> bool {
        leaf_index <= self.index
    }
}
