//! # Codec Errors
//!
//! Every codec error is a local validation failure: the caller must fix the
//! input, retrying the same bytes can never succeed.

use thiserror::Error;

/// Message encoding/decoding errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Payload shorter than the fixed 76-byte prefix.
    #[error("Malformed message: {len} bytes, need at least {min}")]
    MalformedMessage {
        /// Payload length received
        len: usize,
        /// Minimum valid length
        min: usize,
    },

    /// Body exceeds the dispatch limit.
    #[error("Message body too long: {len} bytes, max {max}")]
    BodyTooLong {
        /// Body length received
        len: usize,
        /// Maximum body length
        max: usize,
    },

    /// Textual address is not 20 or 32 bytes of hex.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl CodecError {
    /// Codec failures are never retryable.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
