//! # Outbound Ports
//!
//! Collaborators the inbox consults while delivering a message: the sender
//! enrollment registry and the recipient application handlers.

use parking_lot::{Mutex, RwLock};
use shared_types::{Domain, H256};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// =============================================================================
// SENDER REGISTRY
// =============================================================================

/// Which senders on which origin domains may deliver to this inbox.
pub trait SenderRegistry: Send + Sync {
    /// Whether `sender` on `origin` is enrolled.
    fn is_enrolled(&self, origin: Domain, sender: H256) -> bool;
}

/// In-process sender registry.
#[derive(Debug, Default)]
pub struct InMemorySenderRegistry {
    senders: RwLock<HashMap<Domain, HashSet<H256>>>,
}

impl InMemorySenderRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enroll `sender` on `origin`. Returns `false` if already enrolled.
    pub fn enroll(&self, origin: Domain, sender: H256) -> bool {
        self.senders.write().entry(origin).or_default().insert(sender)
    }

    /// Remove `sender` on `origin`. Returns `false` if it was absent.
    pub fn unenroll(&self, origin: Domain, sender: H256) -> bool {
        self.senders
            .write()
            .get_mut(&origin)
            .is_some_and(|senders| senders.remove(&sender))
    }

    /// Enrolled senders on `origin`, sorted.
    pub fn senders(&self, origin: Domain) -> Vec<H256> {
        let mut senders: Vec<H256> = self
            .senders
            .read()
            .get(&origin)
            .map(|senders| senders.iter().copied().collect())
            .unwrap_or_default();
        senders.sort();
        senders
    }
}

impl SenderRegistry for InMemorySenderRegistry {
    fn is_enrolled(&self, origin: Domain, sender: H256) -> bool {
        self.senders
            .read()
            .get(&origin)
            .is_some_and(|senders| senders.contains(&sender))
    }
}

// =============================================================================
// RECIPIENTS
// =============================================================================

/// Destination application handler.
///
/// Returning `Err` reverts the whole delivery.
pub trait MessageRecipient: Send + Sync {
    /// Handle a delivered message.
    fn handle(&self, origin: Domain, sender: H256, body: &[u8]) -> Result<(), String>;
}

/// Recipient handlers keyed by recipient address.
#[derive(Default, Clone)]
pub struct RecipientRegistry {
    recipients: HashMap<H256, Arc<dyn MessageRecipient>>,
    fallback: Option<Arc<dyn MessageRecipient>>,
}

impl std::fmt::Debug for RecipientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipientRegistry")
            .field("recipients", &self.recipients.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl RecipientRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for `recipient`.
    pub fn register(&mut self, recipient: H256, handler: Arc<dyn MessageRecipient>) {
        self.recipients.insert(recipient, handler);
    }

    /// Handler used when no recipient-specific handler exists.
    pub fn with_fallback(mut self, handler: Arc<dyn MessageRecipient>) -> Self {
        self.fallback = Some(handler);
        self
    }

    /// Handler for `recipient`.
    pub fn resolve(&self, recipient: &H256) -> Option<Arc<dyn MessageRecipient>> {
        self.recipients
            .get(recipient)
            .or(self.fallback.as_ref())
            .cloned()
    }
}

// =============================================================================
// MOCK IMPLEMENTATIONS
// =============================================================================

/// One recorded delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Message origin
    pub origin: Domain,
    /// Message sender
    pub sender: H256,
    /// Message body
    pub body: Vec<u8>,
}

/// Recipient that records deliveries and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingRecipient {
    deliveries: Mutex<Vec<Delivery>>,
    fail: AtomicBool,
}

impl RecordingRecipient {
    /// Recipient that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent deliveries fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Successful deliveries so far.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }
}

impl MessageRecipient for RecordingRecipient {
    fn handle(&self, origin: Domain, sender: H256, body: &[u8]) -> Result<(), String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err("recipient rejected message".to_string());
        }
        self.deliveries.lock().push(Delivery {
            origin,
            sender,
            body: body.to_vec(),
        });
        Ok(())
    }
}
