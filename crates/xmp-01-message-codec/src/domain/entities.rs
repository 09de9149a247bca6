//! # Message Entities
//!
//! The cross-domain message and its committed (indexed) form.

use super::errors::CodecError;
use super::value_objects::*;
use serde::{Deserialize, Serialize};
use shared_crypto::keccak256;
use shared_types::{Domain, H256};

/// A cross-domain message.
///
/// The encoding is injective: two messages differing in any field produce
/// different bytes, and therefore different leaves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Domain the message was dispatched from
    pub origin: Domain,
    /// Sender, left-padded to 32 bytes
    pub sender: H256,
    /// Outbox insertion index, assigned at dispatch
    pub nonce: u32,
    /// Domain the message is addressed to
    pub destination: Domain,
    /// Recipient, left-padded to 32 bytes
    pub recipient: H256,
    /// Opaque payload
    pub body: Vec<u8>,
}

impl Message {
    /// Serialize into the fixed-layout wire format.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PREFIX_LEN + self.body.len());
        out.extend_from_slice(&self.origin.to_be_bytes());
        out.extend_from_slice(self.sender.as_bytes());
        out.extend_from_slice(&self.nonce.to_be_bytes());
        out.extend_from_slice(&self.destination.to_be_bytes());
        out.extend_from_slice(self.recipient.as_bytes());
        out.extend_from_slice(&self.body);
        out
    }

    /// Parse the wire format. Everything after the prefix is the body.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < PREFIX_LEN {
            return Err(CodecError::MalformedMessage {
                len: bytes.len(),
                min: PREFIX_LEN,
            });
        }

        Ok(Self {
            origin: read_u32(bytes, ORIGIN_OFFSET),
            sender: H256::from_slice(&bytes[SENDER_OFFSET..NONCE_OFFSET]),
            nonce: read_u32(bytes, NONCE_OFFSET),
            destination: read_u32(bytes, DESTINATION_OFFSET),
            recipient: H256::from_slice(&bytes[RECIPIENT_OFFSET..PREFIX_LEN]),
            body: bytes[PREFIX_LEN..].to_vec(),
        })
    }

    /// keccak256 of the encoded message. This is the Merkle leaf.
    pub fn hash(&self) -> H256 {
        H256::from(keccak256(&self.encode()))
    }

    /// Alias for [`Message::hash`], read at call sites that feed the tree.
    pub fn to_leaf(&self) -> H256 {
        self.hash()
    }

    /// Reject bodies above [`MAX_MESSAGE_BODY_BYTES`].
    pub fn check_body(body: &[u8]) -> Result<(), CodecError> {
        if body.len() > MAX_MESSAGE_BODY_BYTES {
            return Err(CodecError::BodyTooLong {
                len: body.len(),
                max: MAX_MESSAGE_BODY_BYTES,
            });
        }
        Ok(())
    }

    /// Length of the encoded message.
    pub fn encoded_len(&self) -> usize {
        PREFIX_LEN + self.body.len()
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_be_bytes(word)
}

/// A message together with the leaf index it occupies in its outbox tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedMessage {
    /// Position in the outbox Merkle tree
    pub leaf_index: u32,
    /// The dispatched message
    pub message: Message,
}

impl CommittedMessage {
    /// Leaf hash of the committed message.
    pub fn leaf(&self) -> H256 {
        self.message.hash()
    }
}
