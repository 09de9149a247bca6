//! # Inbound Ports
//!
//! The verification surface the inbox consumes.

use crate::domain::ValidatorManagerError;
use crate::service::ValidatorManager;
use parking_lot::RwLock;
use shared_crypto::EcdsaSignature;
use shared_types::{Checkpoint, Domain};
use std::sync::Arc;

/// Quorum predicate over checkpoints from one origin domain.
///
/// The inbox only reads through this trait; it never mutates validator
/// state.
pub trait CheckpointVerifier: Send + Sync {
    /// Origin domain whose checkpoints are verified.
    fn outbox_domain(&self) -> Domain;

    /// Whether `signatures` form a quorum over `checkpoint`.
    ///
    /// ## Errors
    ///
    /// - `UnsortedSigners`: signers not strictly ascending
    /// - `InvalidSignature`: a signature does not recover
    fn is_quorum(
        &self,
        checkpoint: &Checkpoint,
        signatures: &[EcdsaSignature],
    ) -> Result<bool, ValidatorManagerError>;
}

impl CheckpointVerifier for ValidatorManager {
    fn outbox_domain(&self) -> Domain {
        ValidatorManager::outbox_domain(self)
    }

    fn is_quorum(
        &self,
        checkpoint: &Checkpoint,
        signatures: &[EcdsaSignature],
    ) -> Result<bool, ValidatorManagerError> {
        ValidatorManager::is_quorum(self, checkpoint, signatures)
    }
}

/// Shared manager, mutated by governance while inboxes read it.
impl CheckpointVerifier for Arc<RwLock<ValidatorManager>> {
    fn outbox_domain(&self) -> Domain {
        self.read().outbox_domain()
    }

    fn is_quorum(
        &self,
        checkpoint: &Checkpoint,
        signatures: &[EcdsaSignature],
    ) -> Result<bool, ValidatorManagerError> {
        self.read().is_quorum(checkpoint, signatures)
    }
}
