//! # Validator
//!
//! Off-chain signing identity for one origin domain.

use crate::domain::{signing_hash, SignedCheckpoint, SignerError};
use shared_crypto::Secp256k1KeyPair;
use shared_types::{Checkpoint, Domain, H160, H256};
use tracing::debug;

/// A validator key bound to the outbox domain it attests to.
#[derive(Debug)]
pub struct Validator {
    keypair: Secp256k1KeyPair,
    outbox_domain: Domain,
}

impl Validator {
    /// Bind `keypair` to `outbox_domain`.
    pub fn new(keypair: Secp256k1KeyPair, outbox_domain: Domain) -> Self {
        Self {
            keypair,
            outbox_domain,
        }
    }

    /// Load from a hex secret key.
    pub fn from_hex(secret: &str, outbox_domain: Domain) -> Result<Self, SignerError> {
        Ok(Self::new(Secp256k1KeyPair::from_hex(secret)?, outbox_domain))
    }

    /// Validator address.
    pub fn address(&self) -> H160 {
        self.keypair.address()
    }

    /// Domain this validator signs for.
    pub fn outbox_domain(&self) -> Domain {
        self.outbox_domain
    }

    /// Sign `(root, index)` for this validator's domain.
    pub fn sign_checkpoint(&self, root: H256, index: u32) -> Result<SignedCheckpoint, SignerError> {
        self.sign(Checkpoint::new(root, index))
    }

    /// Sign a checkpoint.
    pub fn sign(&self, checkpoint: Checkpoint) -> Result<SignedCheckpoint, SignerError> {
        let signature = self
            .keypair
            .sign_prehash(&signing_hash(self.outbox_domain, &checkpoint))?;

        debug!(
            validator = ?self.address(),
            domain = self.outbox_domain,
            index = checkpoint.index,
            root = ?checkpoint.root,
            "Checkpoint signed"
        );

        Ok(SignedCheckpoint {
            outbox_domain: self.outbox_domain,
            checkpoint,
            signature,
        })
    }

    /// Sign a checkpoint that claims to be from `outbox_domain`.
    ///
    /// Refuses checkpoints from any other domain.
    pub fn sign_for(
        &self,
        outbox_domain: Domain,
        checkpoint: Checkpoint,
    ) -> Result<SignedCheckpoint, SignerError> {
        if outbox_domain != self.outbox_domain {
            return Err(SignerError::DomainMismatch {
                expected: self.outbox_domain,
                actual: outbox_domain,
            });
        }
        self.sign(checkpoint)
    }
}
