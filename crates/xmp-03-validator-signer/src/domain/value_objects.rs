//! # Signing Payload
//!
//! Every validator signature is scoped by the origin domain and a fixed
//! protocol tag:
//!
//! ```text
//! domain_hash = keccak256(origin_domain as u32 BE || "OPTICS")
//! digest      = keccak256(domain_hash || root || index as u256 BE)
//! signed      = keccak256("\x19Ethereum Signed Message:\n32" || digest)
//! ```

use shared_crypto::{eth_signed_message_hash, keccak256_concat, Hash};
use shared_types::{Checkpoint, Domain, H256};

/// Protocol tag appended to the domain id before hashing.
pub const DOMAIN_HASH_SUFFIX: &[u8] = b"OPTICS";

/// Hash binding signatures to one domain of one protocol deployment.
pub fn domain_hash(domain: Domain) -> H256 {
    H256::from(keccak256_concat(&[&domain.to_be_bytes(), DOMAIN_HASH_SUFFIX]))
}

/// `keccak256(domain_hash || root || index)` with the index widened to 32 bytes.
pub fn checkpoint_digest(outbox_domain: Domain, checkpoint: &Checkpoint) -> H256 {
    let mut index = [0u8; 32];
    index[28..].copy_from_slice(&checkpoint.index.to_be_bytes());

    H256::from(keccak256_concat(&[
        domain_hash(outbox_domain).as_bytes(),
        checkpoint.root.as_bytes(),
        &index,
    ]))
}

/// The prehash a validator key actually signs.
pub fn signing_hash(outbox_domain: Domain, checkpoint: &Checkpoint) -> Hash {
    eth_signed_message_hash(&checkpoint_digest(outbox_domain, checkpoint).0)
}
