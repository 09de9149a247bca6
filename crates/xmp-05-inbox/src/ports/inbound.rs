//! # Inbound Ports
//!
//! The relayer-facing surface of an inbox.

use crate::domain::{InboxError, MessageStatus};
use shared_types::H256;
use xmp_02_outbox::{MerkleProof, TREE_DEPTH};
use xmp_03_validator_signer::MultisigSignedCheckpoint;

/// Primary API of an inbox.
///
/// Every call applies fully or not at all.
pub trait InboxApi: Send + Sync {
    /// Record a quorum-signed root as proven.
    ///
    /// ## Errors
    ///
    /// - `QuorumNotMet`: too few enrolled signers (retryable)
    /// - `Quorum`: unsorted or unrecoverable signatures
    /// - `CheckpointDomainMismatch`: checkpoint from another origin
    fn submit_checkpoint(&mut self, signed: &MultisigSignedCheckpoint) -> Result<(), InboxError>;

    /// Prove and deliver one message. Returns the message hash.
    ///
    /// ## Errors
    ///
    /// - `ProofNotProven`: proof root not proven yet (retryable)
    /// - `AlreadyProcessed`: message already delivered
    /// - `UnauthorizedSender`, `WrongDestination`, `WrongOrigin`
    /// - `HandlerFailed`: recipient failed, nothing changed (retryable)
    fn process(
        &mut self,
        message: &[u8],
        proof: &[H256; TREE_DEPTH],
        proof_index: u32,
    ) -> Result<H256, InboxError>;

    /// Submit the checkpoint if needed, then process.
    fn process_with_checkpoint(
        &mut self,
        signed: &MultisigSignedCheckpoint,
        message: &[u8],
        proof: &MerkleProof,
    ) -> Result<H256, InboxError>;

    /// Status of a message hash.
    fn message_status(&self, message_hash: &H256) -> MessageStatus;

    /// Whether `root` is proven.
    fn is_proven(&self, root: &H256) -> bool;
}
