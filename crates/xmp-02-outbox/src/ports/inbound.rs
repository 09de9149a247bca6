//! # Inbound Ports
//!
//! The dispatch surface of the outbox.

use crate::domain::OutboxError;
use shared_types::{Checkpoint, Domain, H256};
use xmp_01_message_codec::CommittedMessage;

/// Primary API of an outbox.
///
/// Implementations must apply each dispatch atomically: either the leaf
/// is appended and the root updated, or nothing changes.
pub trait OutboxApi: Send + Sync {
    /// Commit a message from `sender` to `recipient` on `destination`.
    ///
    /// ## Errors
    ///
    /// - `Codec`: body exceeds the size limit
    /// - `CapacityExceeded`: tree is full
    /// - `OutboxFailed`: outbox halted by governance
    fn dispatch(
        &mut self,
        sender: H256,
        destination: Domain,
        recipient: H256,
        body: Vec<u8>,
    ) -> Result<CommittedMessage, OutboxError>;

    /// Latest `(root, index)`, or `None` when empty.
    fn latest_checkpoint(&self) -> Option<Checkpoint>;

    /// Number of committed messages.
    fn count(&self) -> u32;

    /// Origin domain of this outbox.
    fn domain(&self) -> Domain;
}
