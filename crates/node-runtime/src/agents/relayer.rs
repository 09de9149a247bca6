//! # Relayer Agent
//!
//! Delivers messages from the origin outbox to one destination inbox.
//!
//! ## Per-Message Flow
//!
//! 1. Walk the message index by leaf index from the persisted cursor.
//! 2. Messages for other destinations, and senders rejected by the
//!    allow/deny lists, are skipped.
//! 3. Wait until the published quorum checkpoint covers the leaf.
//! 4. Prove the leaf against that checkpoint and call
//!    `process_with_checkpoint`.
//! 5. `AlreadyProcessed` counts as delivered. Retryable failures stop the
//!    pass and are retried next interval; anything else is logged and
//!    skipped.
//! 6. The inbox is written to the store before its lock is released. A
//!    failed write is retried and holds the cursor back.

use crate::adapters::SharedStore;
use crate::agents::MessageIndex;
use crate::config::SenderPolicy;
use parking_lot::RwLock;
use shared_types::{Domain, StorageError, VersionedRecord, H256};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};
use xmp_01_message_codec::CommittedMessage;
use xmp_02_outbox::OutboxError;
use xmp_03_validator_signer::MultisigSignedCheckpoint;
use xmp_04_validator_manager::ValidatorManager;
use xmp_05_inbox::{Inbox, InboxError};
use xmp_telemetry::{
    metric_inc, HistogramTimer, AGENT_ERRORS, CHECKPOINTS_PROVEN, LATEST_LEAF_INDEX,
    MESSAGES_PROCESSED, PROCESS_DURATION, QUORUM_REJECTIONS,
};

/// Inbox shared between the runtime and its relayer.
pub type SharedInbox = Arc<RwLock<Inbox<Arc<RwLock<ValidatorManager>>>>>;

const CURSOR_KEY_PREFIX: &str = "relayer/";

/// Why one delivery attempt failed.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The inbox rejected the message or checkpoint.
    #[error(transparent)]
    Inbox(#[from] InboxError),

    /// No proof could be built from the local index.
    #[error("Proof unavailable: {0}")]
    Proof(#[from] OutboxError),

    /// The local index disagrees with the validators' root.
    #[error("Checkpoint {index} root {expected:?} does not match local root {actual:?}")]
    RootMismatch {
        /// Checkpoint index
        index: u32,
        /// Root signed by the quorum
        expected: H256,
        /// Root computed from the local index
        actual: H256,
    },
}

impl RelayError {
    /// Whether the same message should be attempted again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            // A rejected checkpoint says nothing about the message itself.
            Self::Inbox(InboxError::Quorum(_) | InboxError::CheckpointDomainMismatch { .. }) => {
                true
            }
            Self::Inbox(e) => e.is_retryable(),
            Self::Proof(_) | Self::RootMismatch { .. } => true,
        }
    }
}

/// Outcome counts of one relay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    /// Delivered by this pass
    pub delivered: usize,
    /// Found already delivered
    pub already_processed: usize,
    /// Filtered by destination or sender policy
    pub skipped: usize,
    /// Permanently rejected
    pub failed: usize,
    /// Stopped on a retryable failure
    pub retry: bool,
    /// Stopped waiting for a covering checkpoint
    pub waiting: bool,
}

/// Relays origin messages to one destination.
pub struct RelayerAgent {
    origin: Domain,
    destination: Domain,
    index: MessageIndex,
    inbox: SharedInbox,
    checkpoints: watch::Receiver<Option<MultisigSignedCheckpoint>>,
    policy: SenderPolicy,
    store: SharedStore,
    interval: Duration,
    cursor: u32,
}

impl std::fmt::Debug for RelayerAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayerAgent")
            .field("origin", &self.origin)
            .field("destination", &self.destination)
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl RelayerAgent {
    /// Relayer into `inbox`, resuming from the cursor in `store`.
    pub fn new(
        index: MessageIndex,
        inbox: SharedInbox,
        checkpoints: watch::Receiver<Option<MultisigSignedCheckpoint>>,
        policy: SenderPolicy,
        store: SharedStore,
        interval: Duration,
    ) -> Result<Self, StorageError> {
        let (origin, destination) = {
            let inbox = inbox.read();
            (inbox.remote_domain(), inbox.local_domain())
        };
        let cursor = VersionedRecord::load::<u32>(
            &*store.lock(),
            cursor_key(origin, destination).as_bytes(),
        )?
        .unwrap_or(0);
        if cursor > 0 {
            info!(origin, destination, cursor, "Relayer resuming from cursor");
        }

        Ok(Self {
            origin,
            destination,
            index,
            inbox,
            checkpoints,
            policy,
            store,
            interval,
            cursor,
        })
    }

    /// Next leaf index to relay.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Destination domain.
    pub fn destination(&self) -> Domain {
        self.destination
    }

    /// Relay every deliverable message. Stops at the first one that must wait.
    pub fn tick(&mut self) -> RelayReport {
        self.index.sync();
        let checkpoint = self.checkpoints.borrow_and_update().clone();
        let start = self.cursor;
        let mut report = RelayReport::default();

        while let Some(committed) = self.index.get(self.cursor).cloned() {
            let leaf_index = committed.leaf_index;
            let message = &committed.message;

            if message.destination != self.destination {
                self.cursor += 1;
                continue;
            }
            if !self.policy.permits(&message.sender) {
                debug!(leaf_index, sender = ?message.sender, "Sender not permitted, skipping");
                metric_inc!(MESSAGES_PROCESSED, &["skipped"]);
                report.skipped += 1;
                self.cursor += 1;
                continue;
            }
            let Some(signed) = checkpoint.as_ref().filter(|cp| cp.index() >= leaf_index) else {
                debug!(leaf_index, "Waiting for a quorum checkpoint covering the message");
                report.waiting = true;
                break;
            };

            match self.deliver(&committed, signed) {
                Ok(message_hash) => {
                    metric_inc!(MESSAGES_PROCESSED, &["delivered"]);
                    info!(
                        origin = self.origin,
                        destination = self.destination,
                        leaf_index,
                        ?message_hash,
                        "Message delivered"
                    );
                    report.delivered += 1;
                }
                Err(RelayError::Inbox(InboxError::AlreadyProcessed(_))) => {
                    metric_inc!(MESSAGES_PROCESSED, &["already_processed"]);
                    report.already_processed += 1;
                }
                Err(e) if e.is_retryable() => {
                    metric_inc!(MESSAGES_PROCESSED, &["retry"]);
                    warn!(leaf_index, error = %e, "Delivery failed, will retry");
                    report.retry = true;
                    break;
                }
                Err(e) => {
                    metric_inc!(MESSAGES_PROCESSED, &["failed"]);
                    metric_inc!(AGENT_ERRORS, &["relayer", "delivery"]);
                    error!(leaf_index, error = %e, "Message undeliverable, skipping");
                    report.failed += 1;
                }
            }
            self.cursor += 1;
        }

        if self.cursor != start {
            LATEST_LEAF_INDEX
                .with_label_values(&["relayer"])
                .set(f64::from(self.cursor));
            if let Err(e) = self.persist_cursor() {
                metric_inc!(AGENT_ERRORS, &["relayer", "storage"]);
                error!(error = %e, "Failed to persist relayer cursor");
            }
        }
        report
    }

    fn deliver(
        &self,
        committed: &CommittedMessage,
        signed: &MultisigSignedCheckpoint,
    ) -> Result<H256, RelayError> {
        let proof = self
            .index
            .prover()
            .prove_against(committed.leaf_index, signed.index())?;
        let local_root = proof.root();
        if local_root != signed.root() {
            return Err(RelayError::RootMismatch {
                index: signed.index(),
                expected: signed.root(),
                actual: local_root,
            });
        }

        let _timer = HistogramTimer::new(&PROCESS_DURATION);
        let mut inbox = self.inbox.write();
        let newly_proven = !inbox.is_proven(&signed.root());
        let result = inbox.process_with_checkpoint(signed, &committed.message.encode(), &proof);

        if newly_proven && inbox.is_proven(&signed.root()) {
            let destination = self.destination.to_string();
            metric_inc!(CHECKPOINTS_PROVEN, &[destination.as_str()]);
        }
        if let Err(InboxError::QuorumNotMet { .. } | InboxError::Quorum(_)) = &result {
            metric_inc!(QUORUM_REJECTIONS, &[rejection_reason(&result)]);
        }

        // The cursor only moves past a delivery once the inbox is stored.
        inbox.persist(&mut *self.store.lock())?;
        Ok(result?)
    }

    fn persist_cursor(&self) -> Result<(), StorageError> {
        let bytes = VersionedRecord::encode(&self.cursor)?;
        self.store
            .lock()
            .put(cursor_key(self.origin, self.destination).as_bytes(), &bytes)
    }

    /// Tick every interval until `shutdown` flips.
    #[instrument(name = "relayer", skip_all, fields(origin = self.origin, destination = self.destination))]
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            origin = self.origin,
            destination = self.destination,
            cursor = self.cursor,
            interval = ?self.interval,
            "Relayer agent started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.tick();
                    if report != RelayReport::default() {
                        debug!(destination = self.destination, ?report, "Relay pass finished");
                    }
                }
                _ = shutdown.changed() => {
                    info!(destination = self.destination, "Relayer agent shutting down");
                    break;
                }
            }
        }
    }
}

fn rejection_reason(result: &Result<H256, InboxError>) -> &'static str {
    use xmp_04_validator_manager::ValidatorManagerError as E;
    match result {
        Err(InboxError::QuorumNotMet { .. }) => "below_threshold",
        Err(InboxError::Quorum(E::UnsortedSigners { .. })) => "unsorted",
        Err(InboxError::Quorum(E::InvalidSignature { .. })) => "invalid_signature",
        _ => "other",
    }
}

fn cursor_key(origin: Domain, destination: Domain) -> String {
    format!("{CURSOR_KEY_PREFIX}{origin}/{destination}/cursor")
}
