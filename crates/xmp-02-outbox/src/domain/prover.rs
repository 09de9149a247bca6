//! # Prover
//!
//! Full-leaf Merkle tree used off-chain to build inclusion proofs.
//!
//! The incremental accumulator cannot produce proofs because it forgets
//! interior nodes. Relayers keep every leaf instead and rebuild the levels
//! they need. A proof can target any earlier checkpoint: the tree over
//! `leaves[..=checkpoint_index]` is exactly the tree the outbox had when
//! that checkpoint was taken.

use super::accumulator::{hash_pair, MerkleProof, TREE_DEPTH, ZERO_HASHES};
use super::errors::OutboxError;
use shared_types::H256;

/// Leaf store that answers proof requests.
#[derive(Debug, Clone, Default)]
pub struct Prover {
    leaves: Vec<H256>,
}

impl Prover {
    /// Empty prover.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an existing leaf sequence.
    pub fn from_leaves(leaves: impl IntoIterator<Item = H256>) -> Self {
        Self {
            leaves: leaves.into_iter().collect(),
        }
    }

    /// Append a leaf.
    pub fn ingest(&mut self, leaf: H256) {
        self.leaves.push(leaf);
    }

    /// Number of leaves held.
    pub fn count(&self) -> usize {
        self.leaves.len()
    }

    /// Leaf at `index`.
    pub fn leaf(&self, index: u32) -> Option<H256> {
        self.leaves.get(index as usize).copied()
    }

    /// Root over every held leaf.
    pub fn root(&self) -> H256 {
        match self.leaves.len() {
            0 => ZERO_HASHES[TREE_DEPTH],
            n => self.root_at(n as u32 - 1),
        }
    }

    /// Root over `leaves[..=checkpoint_index]`.
    pub fn root_at(&self, checkpoint_index: u32) -> H256 {
        let end = (checkpoint_index as usize + 1).min(self.leaves.len());
        let mut level = self.leaves[..end].to_vec();
        for zero in ZERO_HASHES.iter().take(TREE_DEPTH) {
            level = next_level(&level, zero);
        }
        level.first().copied().unwrap_or(ZERO_HASHES[TREE_DEPTH])
    }

    /// Proof for `leaf_index` against the current root.
    pub fn prove(&self, leaf_index: u32) -> Result<MerkleProof, OutboxError> {
        let last = self.leaves.len().checked_sub(1).ok_or(OutboxError::InvalidProofRequest {
            leaf_index,
            checkpoint_index: 0,
            count: 0,
        })?;
        self.prove_against(leaf_index, last as u32)
    }

    /// Proof for `leaf_index` against the root of checkpoint `checkpoint_index`.
    pub fn prove_against(
        &self,
        leaf_index: u32,
        checkpoint_index: u32,
    ) -> Result<MerkleProof, OutboxError> {
        let count = self.leaves.len();
        if leaf_index > checkpoint_index || checkpoint_index as usize >= count {
            return Err(OutboxError::InvalidProofRequest {
                leaf_index,
                checkpoint_index,
                count,
            });
        }

        let mut level = self.leaves[..=checkpoint_index as usize].to_vec();
        let mut position = leaf_index as usize;
        let mut path = [H256::zero(); TREE_DEPTH];

        for (depth, zero) in ZERO_HASHES.iter().take(TREE_DEPTH).enumerate() {
            path[depth] = level.get(position ^ 1).copied().unwrap_or(*zero);
            level = next_level(&level, zero);
            position >>= 1;
        }

        Ok(MerkleProof {
            leaf: self.leaves[leaf_index as usize],
            index: leaf_index,
            path,
        })
    }
}

fn next_level(level: &[H256], zero: &H256) -> Vec<H256> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => hash_pair(left, right),
            [left] => hash_pair(left, zero),
            _ => *zero,
        })
        .collect()
}
