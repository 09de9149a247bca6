//! # XMP-04 Validator Manager
//!
//! Enrolled validator set and quorum verification for one origin domain.
//!
//! **Component ID:** 04
//! **Architecture:** Hexagonal (domain + ports)
//!
//! ## Purpose
//!
//! - Hold the validator set and `1 <= threshold <= |set|`
//! - Decide whether an ordered signature list is a quorum over a checkpoint
//! - Gate every mutation behind an `AdminCapability`
//!
//! ## Security Properties
//!
//! | Property | Enforcement |
//! |----------|-------------|
//! | Domain scoping | Signatures recover against `domain_hash(origin)` |
//! | No double counting | Signers must be strictly ascending |
//! | Relayer tolerance | Non-enrolled signers are ignored, not fatal |
//! | Malleability | High-S signatures fail recovery |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use domain::{ValidatorManagerError, ValidatorManagerEvent};
pub use ports::CheckpointVerifier;
pub use service::ValidatorManager;

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
