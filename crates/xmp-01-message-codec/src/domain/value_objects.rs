//! # Value Objects
//!
//! Wire-format constants and address normalization.

use super::errors::CodecError;
use shared_types::H256;

/// Length of the fixed prefix: origin(4) + sender(32) + nonce(4) + destination(4) + recipient(32).
pub const PREFIX_LEN: usize = 76;

/// Largest body the outbox accepts.
pub const MAX_MESSAGE_BODY_BYTES: usize = 2048;

pub(crate) const ORIGIN_OFFSET: usize = 0;
pub(crate) const SENDER_OFFSET: usize = 4;
pub(crate) const NONCE_OFFSET: usize = 36;
pub(crate) const DESTINATION_OFFSET: usize = 40;
pub(crate) const RECIPIENT_OFFSET: usize = 44;

/// Normalize a textual address into its 32-byte form.
///
/// Accepts an optional `0x` prefix and either case. A 20-byte address is
/// left-padded with zeros; a 32-byte word is taken as-is.
pub fn parse_address(text: &str) -> Result<H256, CodecError> {
    let trimmed = text.trim();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let bytes = hex::decode(stripped.to_ascii_lowercase())
        .map_err(|e| CodecError::InvalidAddress(format!("{text}: {e}")))?;

    match bytes.len() {
        20 => {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(&bytes);
            Ok(H256::from(word))
        }
        32 => Ok(H256::from_slice(&bytes)),
        len => Err(CodecError::InvalidAddress(format!(
            "{text}: expected 20 or 32 bytes, got {len}"
        ))),
    }
}
