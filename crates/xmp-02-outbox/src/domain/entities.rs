//! # Outbox Entities

use serde::{Deserialize, Serialize};
use shared_types::{Domain, H256};
use xmp_01_message_codec::CommittedMessage;

/// Lifecycle of an outbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutboxState {
    /// Accepting dispatches.
    #[default]
    Active,
    /// Halted. Terminal.
    Failed,
}

/// Emitted once per successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchEvent {
    /// The committed message
    pub message: CommittedMessage,
    /// Tree root after insertion
    pub root: H256,
}

impl DispatchEvent {
    /// Leaf index of the dispatched message.
    pub fn leaf_index(&self) -> u32 {
        self.message.leaf_index
    }
}

/// Stored head of an outbox: everything except the messages themselves.
///
/// Messages are stored one record per leaf index. The tree is rebuilt on
/// load and checked against `root`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct OutboxHead {
    pub domain: Domain,
    pub state: OutboxState,
    pub count: u32,
    pub root: H256,
}
