//! # Multisig Checkpoint Syncer
//!
//! Aggregates per-validator syncers into quorum-signed checkpoints.
//!
//! A signature only counts if it recovers to the validator whose syncer it
//! came from, so one compromised bucket cannot impersonate another
//! validator. Signatures are grouped by signed root: validators that signed
//! a different root for the same index never combine.

use crate::domain::{MultisigSignedCheckpoint, SignedCheckpoint, SyncerError};
use crate::ports::CheckpointSyncer;
use shared_crypto::EcdsaSignature;
use shared_types::{Checkpoint, Domain, H160, H256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Quorum reader over one syncer per validator.
#[derive(Debug, Clone)]
pub struct MultisigCheckpointSyncer {
    threshold: usize,
    syncers: BTreeMap<H160, Arc<dyn CheckpointSyncer>>,
}

impl MultisigCheckpointSyncer {
    /// `threshold` agreeing validators out of `syncers`.
    pub fn new(
        threshold: usize,
        syncers: BTreeMap<H160, Arc<dyn CheckpointSyncer>>,
    ) -> Result<Self, SyncerError> {
        if threshold == 0 || threshold > syncers.len() {
            return Err(SyncerError::InvalidConfig(format!(
                "threshold {threshold} with {} syncers",
                syncers.len()
            )));
        }
        Ok(Self { threshold, syncers })
    }

    /// Required number of agreeing signatures.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Validators with a syncer.
    pub fn validators(&self) -> impl Iterator<Item = &H160> {
        self.syncers.keys()
    }

    /// Latest index reported by each reachable syncer, descending.
    async fn latest_indices(&self) -> Vec<u32> {
        let mut indices = Vec::with_capacity(self.syncers.len());
        for (validator, syncer) in &self.syncers {
            match syncer.latest_index().await {
                Ok(Some(index)) => indices.push(index),
                Ok(None) => {}
                Err(e) => warn!(?validator, error = %e, "Failed to read latest index"),
            }
        }
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices
    }

    /// Highest index that at least `threshold` validators have reached.
    pub async fn latest_quorum_index(&self) -> Option<u32> {
        self.latest_indices()
            .await
            .get(self.threshold - 1)
            .copied()
    }

    /// Quorum checkpoint at exactly `index`, if `threshold` validators agree on a root.
    pub async fn fetch_checkpoint(
        &self,
        index: u32,
    ) -> Result<Option<MultisigSignedCheckpoint>, SyncerError> {
        let mut by_root: HashMap<(Domain, H256), Vec<(H160, EcdsaSignature)>> = HashMap::new();

        for (validator, syncer) in &self.syncers {
            let signed = match syncer.fetch_checkpoint(index).await {
                Ok(Some(signed)) => signed,
                Ok(None) => continue,
                Err(e) => {
                    warn!(?validator, index, error = %e, "Failed to fetch checkpoint");
                    continue;
                }
            };

            if let Err(e) = verify_signer(&signed, *validator) {
                warn!(?validator, index, error = %e, "Ignoring checkpoint with foreign signer");
                continue;
            }

            by_root
                .entry((signed.outbox_domain, signed.root()))
                .or_default()
                .push((*validator, signed.signature));
        }

        let quorum = by_root
            .into_iter()
            .filter(|(_, signatures)| signatures.len() >= self.threshold)
            .max_by_key(|(_, signatures)| signatures.len());

        Ok(quorum.map(|((outbox_domain, root), mut signatures)| {
            signatures.sort_by_key(|(signer, _)| *signer);
            debug!(
                index,
                ?root,
                signatures = signatures.len(),
                "Assembled quorum checkpoint"
            );
            MultisigSignedCheckpoint {
                outbox_domain,
                checkpoint: Checkpoint::new(root, index),
                signatures: signatures.into_iter().map(|(_, sig)| sig).collect(),
            }
        }))
    }

    /// Highest quorum checkpoint with `index >= minimum_index`.
    ///
    /// Tries each validator's latest index from the top down, since a
    /// quorum usually forms at an index many validators report as latest.
    pub async fn fetch_latest_quorum_checkpoint(
        &self,
        minimum_index: u32,
    ) -> Result<Option<MultisigSignedCheckpoint>, SyncerError> {
        let mut indices = self.latest_indices().await;
        indices.dedup();

        for index in indices.into_iter().take_while(|index| *index >= minimum_index) {
            if let Some(checkpoint) = self.fetch_checkpoint(index).await? {
                return Ok(Some(checkpoint));
            }
        }
        Ok(None)
    }
}

fn verify_signer(signed: &SignedCheckpoint, expected: H160) -> Result<(), SyncerError> {
    let recovered = signed.recover()?;
    if recovered != expected {
        return Err(SyncerError::SignerMismatch {
            index: signed.index(),
            expected,
            recovered,
        });
    }
    Ok(())
}
