//! # Checkpoint Fetcher
//!
//! Polls the validators' checkpoint syncers for the newest quorum checkpoint
//! and publishes it on a `watch` channel shared by every relayer of the
//! origin.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument};
use xmp_03_validator_signer::{MultisigCheckpointSyncer, MultisigSignedCheckpoint};
use xmp_telemetry::{metric_inc, AGENT_ERRORS};

/// Publishes the latest quorum checkpoint.
#[derive(Debug)]
pub struct CheckpointFetcher {
    syncer: MultisigCheckpointSyncer,
    sender: watch::Sender<Option<MultisigSignedCheckpoint>>,
    interval: Duration,
}

impl CheckpointFetcher {
    /// Fetcher and the receiver relayers read from.
    pub fn new(
        syncer: MultisigCheckpointSyncer,
        interval: Duration,
    ) -> (Self, watch::Receiver<Option<MultisigSignedCheckpoint>>) {
        let (sender, receiver) = watch::channel(None);
        (
            Self {
                syncer,
                sender,
                interval,
            },
            receiver,
        )
    }

    /// Another receiver of published checkpoints.
    pub fn subscribe(&self) -> watch::Receiver<Option<MultisigSignedCheckpoint>> {
        self.sender.subscribe()
    }

    /// Index of the last published checkpoint.
    pub fn latest_index(&self) -> Option<u32> {
        self.sender.borrow().as_ref().map(MultisigSignedCheckpoint::index)
    }

    /// Look for a quorum checkpoint newer than the published one.
    ///
    /// Returns the new index if one was published.
    pub async fn tick(&self) -> Result<Option<u32>> {
        let minimum = self.latest_index().map_or(0, |index| index.saturating_add(1));
        let Some(checkpoint) = self
            .syncer
            .fetch_latest_quorum_checkpoint(minimum)
            .await
            .context("Failed to fetch quorum checkpoint")?
        else {
            debug!(minimum, "No newer quorum checkpoint");
            return Ok(None);
        };

        let index = checkpoint.index();
        info!(
            index,
            root = ?checkpoint.root(),
            signatures = checkpoint.signatures.len(),
            "Quorum checkpoint published"
        );
        self.sender.send_replace(Some(checkpoint));
        Ok(Some(index))
    }

    /// Tick every interval until `shutdown` flips.
    #[instrument(name = "checkpoint_fetcher", skip_all)]
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            threshold = self.syncer.threshold(),
            interval = ?self.interval,
            "Checkpoint fetcher started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        metric_inc!(AGENT_ERRORS, &["checkpoint_fetcher", "fetch"]);
                        error!(error = %e, "Checkpoint fetch failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("Checkpoint fetcher shutting down");
                    break;
                }
            }
        }
    }
}
