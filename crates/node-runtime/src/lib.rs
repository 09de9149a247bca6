//! # Node Runtime Library
//!
//! Wires the XMP components into a running node. The main entry point is
//! the `xmp-node` binary (`main.rs`); this library exposes the same pieces
//! for integration tests.
//!
//! ## Module Structure
//!
//! - `config/` - `NodeConfig` loading and validation
//! - `adapters/` - storage backends, admin endpoint, default recipient
//! - `agents/` - validator, checkpoint fetcher and relayer loops
//! - `runtime/` - `NodeRuntime`, lifecycle and governance entry points

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::type_complexity)]

pub mod adapters;
pub mod agents;
pub mod config;
pub mod runtime;

pub use adapters::{NodeStatus, SharedStore};
pub use agents::{
    CheckpointFetcher, MessageIndex, RelayError, RelayReport, RelayerAgent, SharedInbox,
    ValidatorAgent,
};
pub use config::{ConfigError, NodeConfig, SenderPolicy};
pub use runtime::{NodeRuntime, RuntimeError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
