use ethereum_types::H256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrieError {
    #[error("Malformed node: {0}")]
    MalformedNode(String),
    #[error("Invalid value length")]
    InvalidValueLength,
    #[error("Missing store entry for hash {0:#x}")]
    MissingStoreEntry(H256),
    #[error("Inconsistent internal tree structure: {0}")]
    InvariantViolation(String),
    #[error("Lock Error: Panicked when trying to acquire a lock")]
    LockError,
    #[error("Store error: {0}")]
    StoreError(#[from] anyhow::Error),
}
