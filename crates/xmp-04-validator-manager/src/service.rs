//! # Validator Manager Service
//!
//! Enrolled validator set and quorum threshold for one origin domain.
//!
//! ## Quorum Check
//!
//! 1. Fewer signatures than the threshold is `Ok(false)`.
//! 2. Every signer is recovered from the domain-scoped signing hash
//!    (in parallel).
//! 3. Recovered signers must be strictly ascending by address; the first
//!    violation is `UnsortedSigners`.
//! 4. Signers outside the enrolled set are ignored. The check passes when
//!    enrolled signers reach the threshold.

use crate::domain::{
    invariant_threshold_in_range, invariant_unenroll_keeps_quorum, ValidatorManagerError,
    ValidatorManagerEvent, ValidatorSetSnapshot,
};
use rayon::prelude::*;
use shared_crypto::{recover_address, EcdsaSignature};
use shared_types::{
    AdminCapability, Checkpoint, Domain, KeyValueStore, StorageError, VersionedRecord, H160, H256,
};
use std::collections::BTreeSet;
use tracing::{debug, info};
use xmp_03_validator_signer::{domain_hash, signing_hash};

const SNAPSHOT_KEY_PREFIX: &str = "validator_manager/";

/// Validator set for one origin domain.
#[derive(Debug, Clone)]
pub struct ValidatorManager {
    outbox_domain: Domain,
    domain_hash: H256,
    validators: BTreeSet<H160>,
    threshold: u32,
}

impl ValidatorManager {
    /// Create a manager, checking `1 <= threshold <= |validators|`.
    pub fn new(
        outbox_domain: Domain,
        validators: impl IntoIterator<Item = H160>,
        threshold: u32,
    ) -> Result<Self, ValidatorManagerError> {
        let mut set = BTreeSet::new();
        for validator in validators {
            if !set.insert(validator) {
                return Err(ValidatorManagerError::AlreadyEnrolled(validator));
            }
        }
        invariant_threshold_in_range(threshold, set.len())?;

        Ok(Self {
            outbox_domain,
            domain_hash: domain_hash(outbox_domain),
            validators: set,
            threshold,
        })
    }

    /// Origin domain whose checkpoints this manager verifies.
    pub fn outbox_domain(&self) -> Domain {
        self.outbox_domain
    }

    /// Cached `domain_hash(outbox_domain)`.
    pub fn domain_hash(&self) -> H256 {
        self.domain_hash
    }

    /// Quorum threshold.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Enrolled validators in ascending order.
    pub fn validators(&self) -> Vec<H160> {
        self.validators.iter().copied().collect()
    }

    /// Number of enrolled validators.
    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    /// Whether `validator` is enrolled.
    pub fn is_enrolled(&self, validator: &H160) -> bool {
        self.validators.contains(validator)
    }

    /// Whether `signatures` form a quorum over `checkpoint`.
    pub fn is_quorum(
        &self,
        checkpoint: &Checkpoint,
        signatures: &[EcdsaSignature],
    ) -> Result<bool, ValidatorManagerError> {
        if signatures.len() < self.threshold as usize {
            debug!(
                domain = self.outbox_domain,
                signatures = signatures.len(),
                threshold = self.threshold,
                "Not enough signatures for quorum"
            );
            return Ok(false);
        }

        let hash = signing_hash(self.outbox_domain, checkpoint);
        let recovered: Vec<_> = signatures
            .par_iter()
            .map(|signature| recover_address(&hash, signature))
            .collect();

        let mut previous: Option<H160> = None;
        let mut enrolled = 0u32;
        for (position, result) in recovered.into_iter().enumerate() {
            let signer = result.map_err(|e| ValidatorManagerError::InvalidSignature {
                position,
                reason: e.to_string(),
            })?;

            if previous.is_some_and(|prev| signer <= prev) {
                return Err(ValidatorManagerError::UnsortedSigners { position });
            }
            previous = Some(signer);

            if self.validators.contains(&signer) {
                enrolled += 1;
            }
        }

        debug!(
            domain = self.outbox_domain,
            index = checkpoint.index,
            enrolled,
            threshold = self.threshold,
            "Quorum evaluated"
        );
        Ok(enrolled >= self.threshold)
    }

    /// Add `validator` to the set.
    pub fn enroll_validator(
        &mut self,
        cap: &AdminCapability,
        validator: H160,
    ) -> Result<ValidatorManagerEvent, ValidatorManagerError> {
        if self.validators.contains(&validator) {
            return Err(ValidatorManagerError::AlreadyEnrolled(validator));
        }
        self.validators.insert(validator);

        info!(domain = self.outbox_domain, ?validator, by = ?cap.holder(), "Validator enrolled");
        Ok(ValidatorManagerEvent::ValidatorEnrolled {
            domain: self.outbox_domain,
            validator,
        })
    }

    /// Remove `validator`, keeping the set at or above the threshold.
    pub fn unenroll_validator(
        &mut self,
        cap: &AdminCapability,
        validator: H160,
    ) -> Result<ValidatorManagerEvent, ValidatorManagerError> {
        if !self.validators.contains(&validator) {
            return Err(ValidatorManagerError::NotEnrolled(validator));
        }
        invariant_unenroll_keeps_quorum(self.validators.len(), self.threshold)?;
        self.validators.remove(&validator);

        info!(domain = self.outbox_domain, ?validator, by = ?cap.holder(), "Validator unenrolled");
        Ok(ValidatorManagerEvent::ValidatorUnenrolled {
            domain: self.outbox_domain,
            validator,
        })
    }

    /// Change the quorum threshold.
    pub fn set_quorum_threshold(
        &mut self,
        cap: &AdminCapability,
        threshold: u32,
    ) -> Result<ValidatorManagerEvent, ValidatorManagerError> {
        invariant_threshold_in_range(threshold, self.validators.len())?;
        self.threshold = threshold;

        info!(domain = self.outbox_domain, threshold, by = ?cap.holder(), "Quorum threshold set");
        Ok(ValidatorManagerEvent::QuorumThresholdSet {
            domain: self.outbox_domain,
            threshold,
        })
    }

    /// Write the validator set to `store`.
    pub fn persist(&self, store: &mut dyn KeyValueStore) -> Result<(), ValidatorManagerError> {
        let snapshot = ValidatorSetSnapshot {
            outbox_domain: self.outbox_domain,
            validators: self.validators(),
            threshold: self.threshold,
        };
        store.put(
            snapshot_key(self.outbox_domain).as_bytes(),
            &VersionedRecord::encode(&snapshot)?,
        )?;
        Ok(())
    }

    /// Read the validator set for `outbox_domain`, if stored.
    pub fn load(
        store: &dyn KeyValueStore,
        outbox_domain: Domain,
    ) -> Result<Option<Self>, ValidatorManagerError> {
        let Some(snapshot) = VersionedRecord::load::<ValidatorSetSnapshot>(
            store,
            snapshot_key(outbox_domain).as_bytes(),
        )?
        else {
            return Ok(None);
        };

        if snapshot.outbox_domain != outbox_domain {
            return Err(StorageError::Corrupted(format!(
                "validator set for domain {} stored under {}",
                snapshot.outbox_domain, outbox_domain
            ))
            .into());
        }

        Self::new(outbox_domain, snapshot.validators, snapshot.threshold)
            .map(Some)
            .map_err(|e| StorageError::Corrupted(format!("stored validator set: {e}")).into())
    }
}

fn snapshot_key(domain: Domain) -> String {
    format!("{SNAPSHOT_KEY_PREFIX}{domain}")
}
