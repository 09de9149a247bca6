//! # Outbox Service
//!
//! Per-origin append-only message log.
//!
//! ## Invariants
//!
//! - `root()` is always the Merkle root over exactly the first `count()` leaves.
//! - The n-th dispatched message has `nonce == leaf_index == n - 1`.
//! - A rejected dispatch leaves the tree, the message log and the event
//!   stream untouched.
//!
//! ## Persistence
//!
//! ```text
//! outbox/{domain}/head                 -> (state, count, root)
//! outbox/{domain}/message/{leaf_index} -> CommittedMessage
//! ```
//!
//! `dispatch_persisted` writes the new message and head in one atomic batch
//! before the dispatch becomes visible, so each dispatch costs one message
//! record and a failed write leaves the outbox exactly as it was.

use crate::domain::{
    DispatchEvent, IncrementalMerkle, MerkleProof, OutboxError, OutboxHead, OutboxState, Prover,
    MAX_LEAVES,
};
use crate::ports::inbound::OutboxApi;
use shared_types::{
    AdminCapability, BatchOperation, Checkpoint, Domain, KeyValueStore, StorageError,
    VersionedRecord, H256,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use xmp_01_message_codec::{CommittedMessage, Message};

/// Capacity of the dispatch event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

const KEY_PREFIX: &str = "outbox/";

/// Outbox for one origin domain.
pub struct Outbox {
    domain: Domain,
    state: OutboxState,
    tree: IncrementalMerkle,
    prover: Prover,
    messages: Vec<CommittedMessage>,
    persisted: u32,
    events: broadcast::Sender<DispatchEvent>,
}

/// A validated dispatch whose leaf is inserted into a copy of the tree.
struct StagedDispatch {
    committed: CommittedMessage,
    tree: IncrementalMerkle,
}

impl std::fmt::Debug for Outbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outbox")
            .field("domain", &self.domain)
            .field("state", &self.state)
            .field("count", &self.tree.count())
            .finish()
    }
}

impl Outbox {
    /// Create an empty outbox for `domain`.
    pub fn new(domain: Domain) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            domain,
            state: OutboxState::Active,
            tree: IncrementalMerkle::new(),
            prover: Prover::new(),
            messages: Vec::new(),
            persisted: 0,
            events,
        }
    }

    /// Origin domain.
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Lifecycle state.
    pub fn state(&self) -> OutboxState {
        self.state
    }

    /// Current root.
    pub fn root(&self) -> H256 {
        self.tree.root()
    }

    /// Number of dispatched messages (also the next nonce).
    pub fn count(&self) -> u32 {
        self.tree.count()
    }

    /// Commit a message from `sender` and return it with its leaf index.
    pub fn dispatch(
        &mut self,
        sender: H256,
        destination: Domain,
        recipient: H256,
        body: Vec<u8>,
    ) -> Result<CommittedMessage, OutboxError> {
        let staged = self.stage(sender, destination, recipient, body)?;
        Ok(self.commit(staged))
    }

    /// Like [`Outbox::dispatch`], but the message is written to `store`
    /// first. On a store error nothing changes and no event is sent.
    pub fn dispatch_persisted(
        &mut self,
        store: &mut dyn KeyValueStore,
        sender: H256,
        destination: Domain,
        recipient: H256,
        body: Vec<u8>,
    ) -> Result<CommittedMessage, OutboxError> {
        if self.persisted < self.tree.count() {
            self.persist(store)?;
        }
        let staged = self.stage(sender, destination, recipient, body)?;

        let head = OutboxHead {
            domain: self.domain,
            state: self.state,
            count: staged.tree.count(),
            root: staged.tree.root(),
        };
        store.atomic_batch_write(vec![
            BatchOperation::put(
                message_key(self.domain, staged.committed.leaf_index),
                VersionedRecord::encode(&staged.committed)?,
            ),
            BatchOperation::put(head_key(self.domain), VersionedRecord::encode(&head)?),
        ])?;

        let committed = self.commit(staged);
        self.persisted = self.tree.count();
        Ok(committed)
    }

    fn stage(
        &self,
        sender: H256,
        destination: Domain,
        recipient: H256,
        body: Vec<u8>,
    ) -> Result<StagedDispatch, OutboxError> {
        if self.state == OutboxState::Failed {
            return Err(OutboxError::OutboxFailed);
        }
        Message::check_body(&body)?;
        if self.tree.is_full() {
            warn!(domain = self.domain, "Outbox at capacity, dispatch rejected");
            return Err(OutboxError::CapacityExceeded { max: MAX_LEAVES });
        }

        let leaf_index = self.tree.count();
        let message = Message {
            origin: self.domain,
            sender,
            nonce: leaf_index,
            destination,
            recipient,
            body,
        };

        let mut tree = self.tree.clone();
        if !tree.ingest(message.hash()) {
            return Err(OutboxError::CapacityExceeded { max: MAX_LEAVES });
        }
        Ok(StagedDispatch {
            committed: CommittedMessage {
                leaf_index,
                message,
            },
            tree,
        })
    }

    fn commit(&mut self, staged: StagedDispatch) -> CommittedMessage {
        let StagedDispatch { committed, tree } = staged;
        let leaf = committed.leaf();
        self.tree = tree;
        self.prover.ingest(leaf);
        self.messages.push(committed.clone());

        let root = self.tree.root();
        debug!(
            domain = self.domain,
            leaf_index = committed.leaf_index,
            destination = committed.message.destination,
            leaf = ?leaf,
            root = ?root,
            "Message dispatched"
        );

        // No subscribers is fine; agents may not be running yet.
        let _ = self.events.send(DispatchEvent {
            message: committed.clone(),
            root,
        });

        committed
    }

    /// `(root, count - 1)`, or `None` before the first dispatch.
    pub fn latest_checkpoint(&self) -> Option<Checkpoint> {
        self.tree
            .count()
            .checked_sub(1)
            .map(|index| Checkpoint::new(self.tree.root(), index))
    }

    /// Committed message at `leaf_index`.
    pub fn message(&self, leaf_index: u32) -> Option<&CommittedMessage> {
        self.messages.get(leaf_index as usize)
    }

    /// Every message with `leaf_index >= from`.
    pub fn dispatched_since(&self, from: u32) -> Vec<CommittedMessage> {
        self.messages
            .get(from as usize..)
            .map(<[CommittedMessage]>::to_vec)
            .unwrap_or_default()
    }

    /// Leaf store for proof generation.
    pub fn prover(&self) -> &Prover {
        &self.prover
    }

    /// Proof for `leaf_index` against checkpoint `checkpoint_index`.
    pub fn prove_against(
        &self,
        leaf_index: u32,
        checkpoint_index: u32,
    ) -> Result<MerkleProof, OutboxError> {
        self.prover.prove_against(leaf_index, checkpoint_index)
    }

    /// Subscribe to dispatch events.
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.events.subscribe()
    }

    /// Halt dispatch permanently.
    pub fn fail(&mut self, cap: &AdminCapability) {
        if self.state != OutboxState::Failed {
            warn!(
                domain = self.domain,
                by = ?cap.holder(),
                count = self.tree.count(),
                "Outbox failed by governance"
            );
        }
        self.state = OutboxState::Failed;
    }

    /// Write messages not yet stored, and the head, to `store`.
    pub fn persist(&mut self, store: &mut dyn KeyValueStore) -> Result<(), OutboxError> {
        let mut operations = Vec::new();
        for committed in &self.messages[self.persisted as usize..] {
            operations.push(BatchOperation::put(
                message_key(self.domain, committed.leaf_index),
                VersionedRecord::encode(committed)?,
            ));
        }
        let head = OutboxHead {
            domain: self.domain,
            state: self.state,
            count: self.tree.count(),
            root: self.tree.root(),
        };
        operations.push(BatchOperation::put(
            head_key(self.domain),
            VersionedRecord::encode(&head)?,
        ));
        store.atomic_batch_write(operations)?;

        self.persisted = self.tree.count();
        debug!(domain = self.domain, count = self.tree.count(), "Outbox persisted");
        Ok(())
    }

    /// Restore the outbox for `domain`, or start empty if nothing is stored.
    pub fn load(store: &dyn KeyValueStore, domain: Domain) -> Result<Self, OutboxError> {
        let mut outbox = Self::new(domain);
        let Some(head) = VersionedRecord::load::<OutboxHead>(store, head_key(domain).as_bytes())?
        else {
            return Ok(outbox);
        };

        if head.domain != domain {
            return Err(StorageError::Corrupted(format!(
                "outbox head for domain {} stored under {}",
                head.domain, domain
            ))
            .into());
        }

        let records = store.prefix_scan(message_prefix(domain).as_bytes())?;
        for (position, (_, bytes)) in records.iter().enumerate() {
            let committed: CommittedMessage = VersionedRecord::decode(bytes)?;
            if committed.leaf_index as usize != position
                || committed.message.nonce != committed.leaf_index
            {
                return Err(StorageError::Corrupted(format!(
                    "outbox message at position {position} has leaf index {}",
                    committed.leaf_index
                ))
                .into());
            }
            let leaf = committed.leaf();
            outbox.tree.ingest(leaf);
            outbox.prover.ingest(leaf);
            outbox.messages.push(committed);
        }

        if outbox.tree.count() != head.count || outbox.tree.root() != head.root {
            return Err(StorageError::Corrupted(format!(
                "outbox head mismatch: stored {} leaves with root {:?}, rebuilt {} with {:?}",
                head.count,
                head.root,
                outbox.tree.count(),
                outbox.tree.root()
            ))
            .into());
        }

        outbox.state = head.state;
        outbox.persisted = head.count;
        info!(domain, count = outbox.tree.count(), "Outbox restored");
        Ok(outbox)
    }
}

fn head_key(domain: Domain) -> String {
    format!("{KEY_PREFIX}{domain}/head")
}

fn message_prefix(domain: Domain) -> String {
    format!("{KEY_PREFIX}{domain}/message/")
}

fn message_key(domain: Domain, leaf_index: u32) -> String {
    format!("{}{leaf_index:010}", message_prefix(domain))
}

impl OutboxApi for Outbox {
    fn dispatch(
        &mut self,
        sender: H256,
        destination: Domain,
        recipient: H256,
        body: Vec<u8>,
    ) -> Result<CommittedMessage, OutboxError> {
        Outbox::dispatch(self, sender, destination, recipient, body)
    }

    fn latest_checkpoint(&self) -> Option<Checkpoint> {
        Outbox::latest_checkpoint(self)
    }

    fn count(&self) -> u32 {
        Outbox::count(self)
    }

    fn domain(&self) -> Domain {
        self.domain
    }
}
