//! # Message Index
//!
//! The relayer's view of the outbox: every committed message by leaf index,
//! plus a `Prover` over the same leaves so proofs can be built without
//! touching the outbox lock.
//!
//! Dispatch events arrive over a broadcast channel. When the receiver lags
//! (or the channel closes) the index backfills from `Outbox::dispatched_since`,
//! so the index never has gaps.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};
use xmp_01_message_codec::CommittedMessage;
use xmp_02_outbox::{DispatchEvent, Outbox, Prover};

/// Contiguous index of committed messages.
#[derive(Debug)]
pub struct MessageIndex {
    outbox: Arc<RwLock<Outbox>>,
    events: broadcast::Receiver<DispatchEvent>,
    messages: BTreeMap<u32, CommittedMessage>,
    prover: Prover,
}

impl MessageIndex {
    /// Subscribe to `outbox` and load everything already committed.
    pub fn new(outbox: Arc<RwLock<Outbox>>) -> Self {
        // Subscribe first so nothing dispatched during the backfill is missed.
        let events = outbox.read().subscribe();
        let mut index = Self {
            outbox,
            events,
            messages: BTreeMap::new(),
            prover: Prover::new(),
        };
        index.backfill();
        index
    }

    /// Next leaf index the index expects.
    pub fn next_leaf_index(&self) -> u32 {
        self.messages.len() as u32
    }

    /// Number of indexed messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Message at `leaf_index`.
    pub fn get(&self, leaf_index: u32) -> Option<&CommittedMessage> {
        self.messages.get(&leaf_index)
    }

    /// Prover over the indexed leaves.
    pub fn prover(&self) -> &Prover {
        &self.prover
    }

    /// Drain pending dispatch events. Returns how many messages were added.
    pub fn sync(&mut self) -> usize {
        let before = self.messages.len();
        loop {
            match self.events.try_recv() {
                Ok(event) => self.insert(event.message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Dispatch events lagged, backfilling from outbox");
                    self.backfill();
                }
                Err(TryRecvError::Closed) => {
                    self.backfill();
                    break;
                }
            }
        }
        let added = self.messages.len() - before;
        if added > 0 {
            debug!(added, next = self.next_leaf_index(), "Message index synced");
        }
        added
    }

    fn backfill(&mut self) {
        let missing = self.outbox.read().dispatched_since(self.next_leaf_index());
        for committed in missing {
            self.insert(committed);
        }
    }

    fn insert(&mut self, committed: CommittedMessage) {
        let next = self.next_leaf_index();
        if committed.leaf_index < next {
            return;
        }
        if committed.leaf_index > next {
            // An event ahead of the index means earlier ones were dropped.
            self.backfill();
            if committed.leaf_index != self.next_leaf_index() {
                return;
            }
        }
        self.prover.ingest(committed.leaf());
        self.messages.insert(committed.leaf_index, committed);
    }
}
