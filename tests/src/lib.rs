//! # XMP Test Suite
//!
//! Unified test crate for behavior that spans components.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── fixtures.rs      # Deployment: outbox + validators + inbox
//! │   └── integration/     # Cross-component flows
//! │       ├── delivery.rs  # dispatch → checkpoint → process
//! │       ├── quorum.rs    # signature ordering, enrollment, thresholds
//! │       ├── governance.rs# ownership, recovery, validator set changes
//! │       └── agents.rs    # NodeRuntime with live agents
//! └── benches/
//!     └── protocol_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p xmp-tests
//!
//! # By category
//! cargo test -p xmp-tests integration::delivery::
//! cargo test -p xmp-tests integration::agents::
//!
//! # Benchmarks
//! cargo bench -p xmp-tests
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
