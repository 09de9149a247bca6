//! # Integration Tests
//!
//! Flows across the codec, outbox, signer, validator manager and inbox.

pub mod agents;
pub mod delivery;
pub mod governance;
pub mod quorum;
