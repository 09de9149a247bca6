//! # XMP-01 Message Codec
//!
//! Deterministic binary encoding of cross-domain messages.
//!
//! **Component ID:** 01
//! **Architecture:** Pure domain logic, no I/O
//!
//! ## Wire Layout
//!
//! ```text
//! ┌──────────┬──────────┬─────────┬─────────────┬───────────┬──────────┐
//! │ origin   │ sender   │ nonce   │ destination │ recipient │ body     │
//! │ u32 BE   │ 32 bytes │ u32 BE  │ u32 BE      │ 32 bytes  │ rest     │
//! └──────────┴──────────┴─────────┴─────────────┴───────────┴──────────┘
//!   0          4          36        40            44          76
//! ```
//!
//! The body length is implied by the payload length. A message's identity
//! (and its Merkle leaf) is `keccak256(encode(message))`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;

// Re-exports
pub use domain::{
    parse_address, CodecError, CommittedMessage, Message, MAX_MESSAGE_BODY_BYTES, PREFIX_LEN,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
