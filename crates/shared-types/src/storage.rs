//! # Persistence Port
//!
//! Key-value storage used by the outbox, validator manager and inbox to
//! persist their state, plus the schema-versioned record envelope every
//! persisted value is wrapped in.
//!
//! ## Versioning
//!
//! Each record is `version (u16, big-endian) || bincode(payload)`. A loader
//! rejects any version other than `CURRENT_SCHEMA_VERSION` with
//! `StorageError::UnsupportedSchema` instead of guessing at the layout.

use crate::errors::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u16 = 1;

const VERSION_HEADER_LEN: usize = 2;

/// Abstract interface for key-value storage.
///
/// Production: `RocksDbStore` in node-runtime (feature `rocksdb`)
/// Testing: `InMemoryKVStore` (below)
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Put a single key-value pair.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.
    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError>;

    /// Execute an atomic batch write.
    ///
    /// Either all operations in the batch are applied, or none are.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), StorageError>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, StorageError>;

    /// Iterate over keys with a prefix, in key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError>;
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// In-memory key-value store for unit tests and single-process nodes.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKVStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError> {
        self.data.remove(key);
        Ok(())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), StorageError> {
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    self.data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, StorageError> {
        Ok(self.data.contains_key(key))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        Ok(self
            .data
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

/// Schema-versioned envelope around a bincode payload.
pub struct VersionedRecord;

impl VersionedRecord {
    /// Encode `value` under the current schema version.
    pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
        let payload =
            bincode::serialize(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let mut bytes = Vec::with_capacity(VERSION_HEADER_LEN + payload.len());
        bytes.extend_from_slice(&CURRENT_SCHEMA_VERSION.to_be_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    /// Decode a record, rejecting unknown schema versions.
    pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
        if bytes.len() < VERSION_HEADER_LEN {
            return Err(StorageError::Corrupted(format!(
                "record too short: {} bytes",
                bytes.len()
            )));
        }

        let found = u16::from_be_bytes([bytes[0], bytes[1]]);
        if found != CURRENT_SCHEMA_VERSION {
            return Err(StorageError::UnsupportedSchema {
                found,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        bincode::deserialize(&bytes[VERSION_HEADER_LEN..])
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Read and decode the record at `key`, if present.
    pub fn load<T: DeserializeOwned>(
        store: &dyn KeyValueStore,
        key: &[u8],
    ) -> Result<Option<T>, StorageError> {
        match store.get(key)? {
            Some(bytes) => Self::decode(&bytes).map(Some),
            None => Ok(None),
        }
    }
}
