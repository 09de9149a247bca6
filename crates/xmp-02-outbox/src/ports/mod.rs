//! # Ports
//!
//! Inbound API exposed to dispatchers and agents.

pub mod inbound;

pub use inbound::OutboxApi;
