//! # Incremental Merkle Accumulator
//!
//! Fixed-depth append-only Merkle tree that keeps only one node per level.
//!
//! ## Algorithm
//!
//! `branch[i]` holds the most recent left-hand node completed at depth `i`.
//! Inserting leaf `n` walks up from the leaf, hashing with stored branch
//! nodes until it reaches the first depth where bit `i` of `n + 1` is set,
//! and stores the running node there. The root is recomputed on read by
//! combining branch nodes with the precomputed empty-subtree hash of every
//! depth that has no left sibling.
//!
//! Insertion and root are both O(depth).

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use shared_crypto::{keccak256, keccak256_concat};
use shared_types::H256;

/// Depth of every outbox tree.
pub const TREE_DEPTH: usize = 32;

/// Maximum number of leaves one tree can hold.
pub const MAX_LEAVES: u32 = u32::MAX;

lazy_static! {
    /// `ZERO_HASHES[i]` is the root of an empty subtree of height `i`.
    ///
    /// `ZERO_HASHES[0]` is the empty leaf `keccak256(0x00 * 32)` and
    /// `ZERO_HASHES[TREE_DEPTH]` is the root of an empty tree.
    pub static ref ZERO_HASHES: [H256; TREE_DEPTH + 1] = {
        let mut zeros = [H256::zero(); TREE_DEPTH + 1];
        zeros[0] = H256::from(keccak256(&[0u8; 32]));
        for i in 1..=TREE_DEPTH {
            zeros[i] = hash_pair(&zeros[i - 1], &zeros[i - 1]);
        }
        zeros
    };
}

/// keccak256(left || right)
pub fn hash_pair(left: &H256, right: &H256) -> H256 {
    H256::from(keccak256_concat(&[left.as_bytes(), right.as_bytes()]))
}

/// Incremental Merkle tree state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementalMerkle {
    branch: [H256; TREE_DEPTH],
    count: u32,
}

impl Default for IncrementalMerkle {
    fn default() -> Self {
        Self {
            branch: [H256::zero(); TREE_DEPTH],
            count: 0,
        }
    }
}

impl IncrementalMerkle {
    /// Empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of inserted leaves.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Whether another leaf fits.
    pub fn is_full(&self) -> bool {
        self.count == MAX_LEAVES
    }

    /// Append a leaf. Returns `false` (and leaves the tree untouched) when full.
    pub fn ingest(&mut self, leaf: H256) -> bool {
        if self.is_full() {
            return false;
        }

        self.count += 1;
        let mut size = self.count;
        let mut node = leaf;
        for i in 0..TREE_DEPTH {
            if size & 1 == 1 {
                self.branch[i] = node;
                return true;
            }
            node = hash_pair(&self.branch[i], &node);
            size >>= 1;
        }

        // size < 2^32 so some bit within TREE_DEPTH is set
        unreachable!("incremental merkle insert fell through all levels")
    }

    /// Root over the first `count` leaves.
    pub fn root(&self) -> H256 {
        let zeros = &*ZERO_HASHES;
        let mut node = zeros[0];
        let mut size = self.count;
        for (i, zero) in zeros.iter().take(TREE_DEPTH).enumerate() {
            node = if size & 1 == 1 {
                hash_pair(&self.branch[i], &node)
            } else {
                hash_pair(&node, zero)
            };
            size >>= 1;
        }
        node
    }

    /// Root implied by `leaf` at `index` with siblings `branch` (leaf-to-root).
    pub fn branch_root(leaf: H256, branch: &[H256; TREE_DEPTH], index: u32) -> H256 {
        branch
            .iter()
            .enumerate()
            .fold(leaf, |current, (i, sibling)| {
                if (index >> i) & 1 == 1 {
                    hash_pair(sibling, &current)
                } else {
                    hash_pair(&current, sibling)
                }
            })
    }
}

/// Inclusion proof for one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Leaf hash
    pub leaf: H256,
    /// Leaf index
    pub index: u32,
    /// Sibling hashes, leaf level first
    pub path: [H256; TREE_DEPTH],
}

impl MerkleProof {
    /// Root this proof commits to.
    pub fn root(&self) -> H256 {
        IncrementalMerkle::branch_root(self.leaf, &self.path, self.index)
    }
}
