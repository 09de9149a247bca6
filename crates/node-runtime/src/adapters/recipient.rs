//! # Default Recipient
//!
//! A destination without an application handler still needs a recipient
//! so that delivery completes. This one records the delivery in the log
//! and counts it.

use shared_types::{Domain, H256};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;
use xmp_05_inbox::MessageRecipient;

/// Recipient that logs every delivered message.
#[derive(Debug)]
pub struct LoggingRecipient {
    destination: Domain,
    delivered: AtomicU64,
}

impl LoggingRecipient {
    /// Recipient for messages delivered on `destination`.
    pub fn new(destination: Domain) -> Self {
        Self {
            destination,
            delivered: AtomicU64::new(0),
        }
    }

    /// Messages handled so far.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}

impl MessageRecipient for LoggingRecipient {
    fn handle(&self, origin: Domain, sender: H256, body: &[u8]) -> Result<(), String> {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        info!(
            origin,
            destination = self.destination,
            ?sender,
            body_len = body.len(),
            "Message handled"
        );
        Ok(())
    }
}
