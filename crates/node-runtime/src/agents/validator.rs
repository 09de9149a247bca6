//! # Validator Agent
//!
//! Polls the outbox for its latest checkpoint and, whenever the index moves
//! past the last one signed, signs it and publishes it to the validator's
//! checkpoint syncer.

use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};
use xmp_02_outbox::Outbox;
use xmp_03_validator_signer::{CheckpointSyncer, SignedCheckpoint, Validator};
use xmp_telemetry::{metric_inc, AGENT_ERRORS, CHECKPOINTS_SIGNED, LATEST_LEAF_INDEX};

/// Signs and publishes outbox checkpoints for one validator key.
#[derive(Debug)]
pub struct ValidatorAgent {
    validator: Validator,
    outbox: Arc<RwLock<Outbox>>,
    syncer: Arc<dyn CheckpointSyncer>,
    interval: Duration,
    last_signed: Option<u32>,
}

impl ValidatorAgent {
    /// Agent signing `outbox` checkpoints with `validator`.
    pub fn new(
        validator: Validator,
        outbox: Arc<RwLock<Outbox>>,
        syncer: Arc<dyn CheckpointSyncer>,
        interval: Duration,
    ) -> Self {
        Self {
            validator,
            outbox,
            syncer,
            interval,
            last_signed: None,
        }
    }

    /// Index of the last checkpoint published.
    pub fn last_signed(&self) -> Option<u32> {
        self.last_signed
    }

    /// Pick up where a previous run stopped.
    pub async fn resume(&mut self) -> Result<()> {
        self.last_signed = self
            .syncer
            .latest_index()
            .await
            .context("Failed to read latest published checkpoint")?;
        if let Some(index) = self.last_signed {
            info!(validator = ?self.validator.address(), index, "Resuming after published checkpoint");
        }
        Ok(())
    }

    /// Sign the latest checkpoint if it is new. Returns what was published.
    pub async fn tick(&mut self) -> Result<Option<SignedCheckpoint>> {
        let Some(checkpoint) = self.outbox.read().latest_checkpoint() else {
            debug!("Outbox empty, nothing to sign");
            return Ok(None);
        };
        if self.last_signed.is_some_and(|last| checkpoint.index <= last) {
            return Ok(None);
        }

        let signed = self
            .validator
            .sign(checkpoint)
            .context("Failed to sign checkpoint")?;
        self.syncer
            .write_checkpoint(&signed)
            .await
            .with_context(|| format!("Failed to publish checkpoint {}", checkpoint.index))?;

        self.last_signed = Some(checkpoint.index);
        metric_inc!(CHECKPOINTS_SIGNED);
        LATEST_LEAF_INDEX
            .with_label_values(&["validator"])
            .set(f64::from(checkpoint.index));
        info!(
            validator = ?self.validator.address(),
            index = checkpoint.index,
            root = ?checkpoint.root,
            "Checkpoint signed"
        );
        Ok(Some(signed))
    }

    /// Tick every interval until `shutdown` flips.
    #[instrument(name = "validator_agent", skip_all, fields(validator = ?self.validator.address()))]
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let address = self.validator.address();
        info!(validator = ?address, interval = ?self.interval, "Validator agent started");

        if let Err(e) = self.resume().await {
            warn!(validator = ?address, error = %e, "Starting without published checkpoints");
        }

        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        metric_inc!(AGENT_ERRORS, &["validator", "tick"]);
                        error!(validator = ?address, error = %e, "Validator tick failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!(validator = ?address, "Validator agent shutting down");
                    break;
                }
            }
        }
    }
}
