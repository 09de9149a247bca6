//! # Storage Adapters
//!
//! Backends for the `KeyValueStore` port every component persists through.
//!
//! ## Usage
//!
//! Enable the `rocksdb` feature for on-disk persistence:
//!
//! ```toml
//! node-runtime = { path = "...", features = ["rocksdb"] }
//! ```
//!
//! Without it the node keeps state in `InMemoryKVStore`.

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{RocksDbConfig, RocksDbStore};

use crate::config::{StorageBackend, StorageConfig};
use parking_lot::Mutex;
use shared_types::{InMemoryKVStore, KeyValueStore, StorageError};
use std::sync::Arc;

/// Store shared by the runtime and the agents.
///
/// Writers take the lock for the whole snapshot so a persisted component
/// never interleaves with another.
pub type SharedStore = Arc<Mutex<dyn KeyValueStore>>;

/// Fresh in-memory store.
pub fn in_memory_store() -> SharedStore {
    Arc::new(Mutex::new(InMemoryKVStore::new()))
}

/// Open the store selected by `config`.
pub fn open_store(config: &StorageConfig) -> Result<SharedStore, StorageError> {
    match config.backend {
        StorageBackend::Memory => Ok(in_memory_store()),
        #[cfg(feature = "rocksdb")]
        StorageBackend::RocksDb => {
            let store = RocksDbStore::open(RocksDbConfig {
                path: config.path.clone(),
                ..RocksDbConfig::default()
            })?;
            Ok(Arc::new(Mutex::new(store)))
        }
        #[cfg(not(feature = "rocksdb"))]
        StorageBackend::RocksDb => Err(StorageError::DatabaseError(
            "RocksDB backend requested but node-runtime was built without the `rocksdb` feature"
                .to_string(),
        )),
    }
}
