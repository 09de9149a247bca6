//! # Inbox Entities

use serde::{Deserialize, Serialize};
use shared_types::H256;

/// Delivery status of one message hash.
///
/// `None -> Pending -> Processed`. `Pending` only exists while the
/// recipient handler runs; a failed handler reverts to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MessageStatus {
    /// Never admitted
    #[default]
    None,
    /// Proof admitted, handler running
    Pending,
    /// Handler succeeded
    Processed,
}

/// Stored record for one proven root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ProvenRootRecord {
    pub root: H256,
    pub index: u32,
}
