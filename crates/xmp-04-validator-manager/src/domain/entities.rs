//! # Validator Manager Entities

use serde::{Deserialize, Serialize};
use shared_types::{Domain, H160};

/// Emitted by every successful admin mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorManagerEvent {
    /// A validator joined the set.
    ValidatorEnrolled {
        /// Origin domain
        domain: Domain,
        /// Enrolled address
        validator: H160,
    },
    /// A validator left the set.
    ValidatorUnenrolled {
        /// Origin domain
        domain: Domain,
        /// Removed address
        validator: H160,
    },
    /// The quorum threshold changed.
    QuorumThresholdSet {
        /// Origin domain
        domain: Domain,
        /// New threshold
        threshold: u32,
    },
}

/// Persisted validator set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ValidatorSetSnapshot {
    pub outbox_domain: Domain,
    pub validators: Vec<H160>,
    pub threshold: u32,
}
