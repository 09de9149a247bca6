//! # Shared Crypto
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256 | Message leaves, Merkle nodes, checkpoint digests |
//! | `ecdsa` | secp256k1 (recoverable) | Validator checkpoint signatures |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic nonces, low-S normalization (EIP-2)
//! - **Recovery**: signer addresses are recovered, never trusted from input
//! - Secret key material is zeroized on drop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{address_from_pubkey, recover_address, EcdsaSignature, Secp256k1KeyPair};
pub use errors::CryptoError;
pub use hashing::{eth_signed_message_hash, keccak256, keccak256_concat, Hash, Keccak256Hasher};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
