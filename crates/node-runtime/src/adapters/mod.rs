//! # Adapters
//!
//! Runtime-side implementations of the component ports.
//!
//! - `storage`: `KeyValueStore` backends (memory, RocksDB)
//! - `recipient`: default `MessageRecipient` for delivered messages
//! - `admin`: HTTP endpoint for health, status and Prometheus metrics

pub mod admin;
pub mod recipient;
pub mod storage;

pub use admin::{admin_router, serve_admin, NodeStatus, StatusSource};
pub use recipient::LoggingRecipient;
pub use storage::{in_memory_store, open_store, SharedStore};
