//! # Signed Checkpoints

use super::value_objects::signing_hash;
use serde::{Deserialize, Serialize};
use shared_crypto::{recover_address, CryptoError, EcdsaSignature, Hash};
use shared_types::{Checkpoint, Domain, H160, H256};

/// A checkpoint signed by one validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedCheckpoint {
    /// Domain of the outbox the checkpoint was taken from
    pub outbox_domain: Domain,
    /// The signed `(root, index)`
    pub checkpoint: Checkpoint,
    /// Recoverable signature over the signing hash
    pub signature: EcdsaSignature,
}

impl SignedCheckpoint {
    /// Prehash the signature covers.
    pub fn signing_hash(&self) -> Hash {
        signing_hash(self.outbox_domain, &self.checkpoint)
    }

    /// Address of the signer.
    pub fn recover(&self) -> Result<H160, CryptoError> {
        recover_address(&self.signing_hash(), &self.signature)
    }

    /// Signed root.
    pub fn root(&self) -> H256 {
        self.checkpoint.root
    }

    /// Signed index.
    pub fn index(&self) -> u32 {
        self.checkpoint.index
    }
}

/// A checkpoint with signatures from several validators, ordered by
/// ascending signer address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultisigSignedCheckpoint {
    /// Domain of the outbox the checkpoint was taken from
    pub outbox_domain: Domain,
    /// The signed `(root, index)`
    pub checkpoint: Checkpoint,
    /// Signatures, ordered by signer address
    pub signatures: Vec<EcdsaSignature>,
}

impl MultisigSignedCheckpoint {
    /// Signed root.
    pub fn root(&self) -> H256 {
        self.checkpoint.root
    }

    /// Signed index.
    pub fn index(&self) -> u32 {
        self.checkpoint.index
    }

    /// Recover every signer, in signature order.
    pub fn signers(&self) -> Result<Vec<H160>, CryptoError> {
        let hash = signing_hash(self.outbox_domain, &self.checkpoint);
        self.signatures
            .iter()
            .map(|signature| recover_address(&hash, signature))
            .collect()
    }
}
