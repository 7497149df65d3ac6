//! A persistent, path-compressed binary radix trie authenticated with
//! Keccak-256.
//!
//! The trie maps variable-length byte keys to variable-length byte values.
//! Every mutation returns a new root that shares unchanged subtrees with its
//! predecessor, and any two tries holding the same key/value set hash
//! identically regardless of insertion order. Nodes serialize to three
//! interoperable wire formats and are content-addressed in an external
//! [`TrieStore`]; values longer than 32 bytes are stored externally by their
//! own hash, and small terminal nodes are inlined into their parent's
//! encoding.

mod encoding;
mod error;
mod iter;
mod keccak;
mod key_slice;
mod node_ref;
mod path;
mod rent;
mod store;
mod trie;
mod varint;

use ethereum_types::H256;
use lazy_static::lazy_static;

pub use self::error::TrieError;
pub use self::iter::{InOrderIterator, IterationElement, PostOrderIterator, PreOrderIterator};
pub use self::keccak::{keccak, keccak_hash};
pub use self::key_slice::KeySlice;
pub use self::node_ref::{HashOrEmbedded, NodeRef};
pub use self::rent::{storage_rent, RentTracker, TrieNodeData, RENT_EPOCH_ANCHOR};
pub use self::store::{InMemoryTrieStore, TrieStore};
pub use self::trie::{
    NodeVersion, Trie, LONG_VALUE_THRESHOLD, MAX_EMBEDDED_NODE_SIZE, MAX_VALUE_LENGTH,
};

/// RLP encoding of the empty byte string.
const RLP_NULL: u8 = 0x80;

lazy_static! {
    /// Hash of the empty trie, equal to keccak(RLP_NULL).
    pub static ref EMPTY_TRIE_HASH: H256 = keccak::keccak([RLP_NULL]);
}
