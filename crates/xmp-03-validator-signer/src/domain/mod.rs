//! # Domain Module
//!
//! Signing payload, signed checkpoint types and errors.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::{MultisigSignedCheckpoint, SignedCheckpoint};
pub use errors::{SignerError, SyncerError};
pub use value_objects::{checkpoint_digest, domain_hash, signing_hash, DOMAIN_HASH_SUFFIX};
