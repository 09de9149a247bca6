//! # Ports
//!
//! Outbound storage port for signed checkpoints.

pub mod outbound;

pub use outbound::CheckpointSyncer;
