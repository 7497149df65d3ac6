use crate::error::TrieError;
use ethereum_types::H256;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

/// External content-addressed storage for trie nodes and long values.
///
/// Entries are keyed by the Keccak-256 of their bytes, so writes are
/// idempotent and concurrent writers of the same entry collapse safely.
pub trait TrieStore: Send + Sync {
    /// Fetch a serialized node by its hash.
    fn retrieve_node(&self, hash: H256) -> Result<Option<Vec<u8>>, TrieError>;
    /// Fetch an externalized long value by its hash.
    fn retrieve_value(&self, hash: H256) -> Result<Option<Vec<u8>>, TrieError>;
    /// Persist `bytes` under `hash`.
    fn save(&self, hash: H256, bytes: Vec<u8>) -> Result<(), TrieError>;
}

/// InMemory implementation of the [`TrieStore`] trait.
///
/// Nodes and values share one keyspace; both are addressed by content hash.
#[derive(Default)]
pub struct InMemoryTrieStore {
    inner: Arc<Mutex<HashMap<H256, Vec<u8>>>>,
}

impl InMemoryTrieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store over an externally shared map.
    pub fn from_map(map: Arc<Mutex<HashMap<H256, Vec<u8>>>>) -> Self {
        Self { inner: map }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TrieStore for InMemoryTrieStore {
    fn retrieve_node(&self, hash: H256) -> Result<Option<Vec<u8>>, TrieError> {
        Ok(self
            .inner
            .lock()
            .map_err(|_| TrieError::LockError)?
            .get(&hash)
            .cloned())
    }

    fn retrieve_value(&self, hash: H256) -> Result<Option<Vec<u8>>, TrieError> {
        self.retrieve_node(hash)
    }

    fn save(&self, hash: H256, bytes: Vec<u8>) -> Result<(), TrieError> {
        self.inner
            .lock()
            .map_err(|_| TrieError::LockError)?
            .insert(hash, bytes);
        Ok(())
    }
}
