//! # XMP-05 Inbox
//!
//! Replay-safe delivery of messages from one origin domain.
//!
//! **Component ID:** 05
//! **Architecture:** Hexagonal (domain + ports)
//!
//! ## Purpose
//!
//! - Accept quorum-signed checkpoints as proven roots
//! - Admit messages by Merkle proof against a proven root
//! - Deliver each message to its recipient handler exactly once
//!
//! ## State Machine
//!
//! ```text
//!   None ──proof ok──▶ Pending ──handler ok──▶ Processed
//!    ▲                    │
//!    └──handler failed────┘
//! ```
//!
//! `Processed` is terminal. Reprocessing fails with `AlreadyProcessed`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use domain::{InboxError, MessageStatus};
pub use ports::{
    Delivery, InMemorySenderRegistry, InboxApi, MessageRecipient, RecipientRegistry,
    RecordingRecipient, SenderRegistry,
};
pub use service::Inbox;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
