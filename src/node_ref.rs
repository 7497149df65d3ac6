use std::fmt;
use std::sync::{Arc, OnceLock};

use ethereum_types::H256;

use crate::error::TrieError;
use crate::store::TrieStore;
use crate::trie::Trie;

/// The content of a non-empty reference.
#[derive(Clone, Debug)]
pub enum HashOrEmbedded {
    Hash(H256),
    Embedded(Trie),
}

/// A reference to a child node.
#[derive(Clone, Default)]
pub enum NodeRef {
    /// No child on this side.
    #[default]
    Empty,
    /// The node lives in the store, referenced by its hash. The first
    /// successful fetch is memoized; the memo never changes how the
    /// reference serializes.
    Hash {
        hash: H256,
        store: Option<Arc<dyn TrieStore>>,
        resolved: OnceLock<Trie>,
    },
    /// The node is held in memory. It is inlined into the parent's encoding
    /// when embeddable, and referenced by hash otherwise.
    Node(Trie),
}

impl NodeRef {
    pub fn from_hash(hash: H256, store: Option<Arc<dyn TrieStore>>) -> Self {
        NodeRef::Hash {
            hash,
            store,
            resolved: OnceLock::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NodeRef::Empty)
    }

    /// True when the referenced node is held in memory rather than behind a
    /// hash.
    pub fn is_embedded(&self) -> bool {
        matches!(self, NodeRef::Node(_))
    }

    /// What the reference carries: a hash to chase or the node itself.
    pub fn hash_or_embedded(&self) -> Option<HashOrEmbedded> {
        match self {
            NodeRef::Empty => None,
            NodeRef::Hash { hash, .. } => Some(HashOrEmbedded::Hash(*hash)),
            NodeRef::Node(node) => Some(HashOrEmbedded::Embedded(node.clone())),
        }
    }

    /// Resolves the referenced node, fetching it from the store on demand.
    pub fn node(&self) -> Result<Option<Trie>, TrieError> {
        match self {
            NodeRef::Empty => Ok(None),
            NodeRef::Node(node) => Ok(Some(node.clone())),
            NodeRef::Hash {
                hash,
                store,
                resolved,
            } => {
                if let Some(node) = resolved.get() {
                    return Ok(Some(node.clone()));
                }
                let store = store
                    .as_ref()
                    .ok_or(TrieError::MissingStoreEntry(*hash))?;
                let bytes = store
                    .retrieve_node(*hash)?
                    .ok_or(TrieError::MissingStoreEntry(*hash))?;
                let node = Trie::from_message(&bytes, Some(store.clone()))?;
                Ok(Some(resolved.get_or_init(|| node).clone()))
            }
        }
    }

    /// Hash of the referenced node, or `None` for an empty reference.
    pub fn hash(&self) -> Result<Option<H256>, TrieError> {
        match self {
            NodeRef::Empty => Ok(None),
            NodeRef::Hash { hash, .. } => Ok(Some(*hash)),
            NodeRef::Node(node) => Ok(Some(node.hash()?)),
        }
    }

    /// Legacy-format hash of the referenced node. Resolves the node, since
    /// the stored hash is a current-format address.
    pub fn hash_legacy(&self, is_secure: bool) -> Result<Option<H256>, TrieError> {
        match self.node()? {
            None => Ok(None),
            Some(node) => Ok(Some(node.hash_legacy(is_secure)?)),
        }
    }

    /// True when the referenced node will be inlined into its parent's
    /// encoding. Hash references always stay hash references.
    pub fn is_embeddable(&self) -> Result<bool, TrieError> {
        match self {
            NodeRef::Node(node) => node.is_embeddable(),
            _ => Ok(false),
        }
    }

    /// Aggregate serialized size of the referenced subtree: the node's own
    /// message, its externalized long value, and all of its descendants.
    pub fn reference_size(&self) -> Result<u64, TrieError> {
        match self.node()? {
            None => Ok(0),
            Some(node) => {
                let external_value = if node.has_long_value() {
                    node.value_length() as u64
                } else {
                    0
                };
                Ok(node.message_length()? as u64 + external_value + node.children_size()?)
            }
        }
    }

    /// Byte cost this reference contributes to its parent's encoding.
    pub(crate) fn serialized_length(&self) -> Result<usize, TrieError> {
        match self {
            NodeRef::Empty => Ok(0),
            NodeRef::Node(node) if node.is_embeddable()? => Ok(node.message_length()? + 1),
            _ => Ok(H256::len_bytes()),
        }
    }

    pub(crate) fn serialize_into(&self, buf: &mut Vec<u8>) -> Result<(), TrieError> {
        match self {
            NodeRef::Empty => Ok(()),
            NodeRef::Node(node) if node.is_embeddable()? => {
                let message = node.to_message()?;
                buf.push(message.len() as u8);
                buf.extend_from_slice(&message);
                Ok(())
            }
            NodeRef::Node(node) => {
                buf.extend_from_slice(node.hash()?.as_bytes());
                Ok(())
            }
            NodeRef::Hash { hash, .. } => {
                buf.extend_from_slice(hash.as_bytes());
                Ok(())
            }
        }
    }
}

impl From<Trie> for NodeRef {
    /// A reference to an empty trie collapses to an empty reference.
    fn from(node: Trie) -> Self {
        if node.is_empty_trie() {
            NodeRef::Empty
        } else {
            NodeRef::Node(node)
        }
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Empty => write!(f, "Empty"),
            NodeRef::Hash { hash, .. } => f.debug_tuple("Hash").field(hash).finish(),
            NodeRef::Node(node) => f.debug_tuple("Node").field(node).finish(),
        }
    }
}
