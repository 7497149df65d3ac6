use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use ethereum_types::H256;

use crate::encoding;
use crate::error::TrieError;
use crate::keccak::keccak;
use crate::key_slice::KeySlice;
use crate::node_ref::NodeRef;
use crate::store::TrieStore;
use crate::EMPTY_TRIE_HASH;

/// Largest serialized size of a node that may be inlined into its parent.
pub const MAX_EMBEDDED_NODE_SIZE: usize = 52;

/// Values longer than this are stored externally, addressed by their hash.
pub const LONG_VALUE_THRESHOLD: usize = 32;

/// Value lengths are carried as 3-byte integers on the wire.
pub const MAX_VALUE_LENGTH: usize = 1 << 24;

/// Serialization format of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeVersion {
    /// The original fixed-header format, read and written only to reproduce
    /// historical roots.
    Legacy,
    /// Path-compressed binary format without a rent timestamp.
    V1,
    /// V1 plus a per-node rent timestamp.
    V2,
}

impl NodeVersion {
    pub fn number(self) -> u8 {
        match self {
            NodeVersion::Legacy => 0,
            NodeVersion::V1 => 1,
            NodeVersion::V2 => 2,
        }
    }
}

/// A binary trie node.
///
/// Each node has an optional associated value and up to two children. A node
/// is reached by a key whose bits select the branch at every level; runs of
/// single-child nodes are compressed into the node's shared path.
///
/// A node hashes to the Keccak-256 of its serialization and is immutable:
/// every mutation builds a new node graph that shares unchanged subtrees
/// with the old one. Cloning a `Trie` is cheap and shares the node.
///
/// An empty node has no subnodes and no value; storing an empty value is the
/// same as removing the key.
#[derive(Clone)]
pub struct Trie {
    pub(crate) inner: Arc<NodeData>,
}

pub(crate) struct NodeData {
    pub(crate) shared_path: KeySlice,
    pub(crate) value: OnceLock<Vec<u8>>,
    pub(crate) value_length: u32,
    pub(crate) value_hash: OnceLock<H256>,
    pub(crate) left: NodeRef,
    pub(crate) right: NodeRef,
    pub(crate) children_size: OnceLock<u64>,
    pub(crate) hash: OnceLock<H256>,
    pub(crate) hash_legacy: OnceLock<(bool, H256)>,
    // temporary storage of the encoding, released at the save boundary
    pub(crate) encoded: Mutex<Option<Vec<u8>>>,
    pub(crate) version: NodeVersion,
    pub(crate) last_rent_paid_time: Option<i64>,
    pub(crate) store: Option<Arc<dyn TrieStore>>,
}

impl Trie {
    /// Creates an empty trie backed by `store`.
    pub fn new(store: Arc<dyn TrieStore>) -> Trie {
        Trie::empty_with(Some(store))
    }

    /// Creates an empty trie with a temporary in-memory store.
    pub fn new_temp() -> Trie {
        Trie::new(Arc::new(crate::store::InMemoryTrieStore::new()))
    }

    pub(crate) fn empty_with(store: Option<Arc<dyn TrieStore>>) -> Trie {
        Trie::build(
            store,
            KeySlice::empty(),
            None,
            0,
            None,
            NodeRef::Empty,
            NodeRef::Empty,
            None,
            None,
            NodeVersion::V1,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn build(
        store: Option<Arc<dyn TrieStore>>,
        shared_path: KeySlice,
        value: Option<Vec<u8>>,
        value_length: u32,
        value_hash: Option<H256>,
        left: NodeRef,
        right: NodeRef,
        children_size: Option<u64>,
        last_rent_paid_time: Option<i64>,
        version: NodeVersion,
    ) -> Trie {
        let value_cell = OnceLock::new();
        if let Some(value) = value {
            debug_assert_eq!(value.len(), value_length as usize);
            let _ = value_cell.set(value);
        } else {
            debug_assert!(value_length == 0 || value_hash.is_some());
        }
        let value_hash_cell = OnceLock::new();
        if let Some(hash) = value_hash {
            let _ = value_hash_cell.set(hash);
        }
        let children_size_cell = OnceLock::new();
        if let Some(size) = children_size {
            let _ = children_size_cell.set(size);
        }
        Trie {
            inner: Arc::new(NodeData {
                shared_path,
                value: value_cell,
                value_length,
                value_hash: value_hash_cell,
                left,
                right,
                children_size: children_size_cell,
                hash: OnceLock::new(),
                hash_legacy: OnceLock::new(),
                encoded: Mutex::new(None),
                version,
                last_rent_paid_time,
                store,
            }),
        }
    }

    /// Deserializes a node, detecting the format from the first byte.
    pub fn from_message(
        message: &[u8],
        store: Option<Arc<dyn TrieStore>>,
    ) -> Result<Trie, TrieError> {
        encoding::decode_node(message, store)
    }

    /// True when both tries are the same node, not merely equal ones.
    pub fn ptr_eq(&self, other: &Trie) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn shared_path(&self) -> &KeySlice {
        &self.inner.shared_path
    }

    pub fn left(&self) -> &NodeRef {
        &self.inner.left
    }

    pub fn right(&self) -> &NodeRef {
        &self.inner.right
    }

    pub(crate) fn child(&self, bit: u8) -> &NodeRef {
        if bit == 0 {
            &self.inner.left
        } else {
            &self.inner.right
        }
    }

    pub fn version(&self) -> NodeVersion {
        self.inner.version
    }

    /// Timestamp up to which storage rent has been paid, in seconds since
    /// the epoch. `None` for nodes that were never stamped.
    pub fn last_rent_paid_time(&self) -> Option<i64> {
        self.inner.last_rent_paid_time
    }

    pub fn value_length(&self) -> u32 {
        self.inner.value_length
    }

    pub fn has_long_value(&self) -> bool {
        self.inner.value_length as usize > LONG_VALUE_THRESHOLD
    }

    /// The node's value. Long values are fetched from the store on first
    /// access and cached.
    pub fn value(&self) -> Result<Option<Vec<u8>>, TrieError> {
        if self.inner.value_length == 0 {
            return Ok(None);
        }
        if let Some(value) = self.inner.value.get() {
            return Ok(Some(value.clone()));
        }
        let hash = self
            .inner
            .value_hash
            .get()
            .copied()
            .ok_or(TrieError::InvalidValueLength)?;
        let store = self
            .inner
            .store
            .as_ref()
            .ok_or(TrieError::MissingStoreEntry(hash))?;
        let value = store
            .retrieve_value(hash)?
            .ok_or(TrieError::MissingStoreEntry(hash))?;
        if value.len() != self.inner.value_length as usize {
            return Err(TrieError::InvalidValueLength);
        }
        Ok(Some(self.inner.value.get_or_init(|| value).clone()))
    }

    /// Keccak-256 of the value, or `None` when there is no value.
    pub fn value_hash(&self) -> Option<H256> {
        if self.inner.value_length == 0 {
            return None;
        }
        if let Some(hash) = self.inner.value_hash.get() {
            return Some(*hash);
        }
        let value = self.inner.value.get()?;
        Some(*self.inner.value_hash.get_or_init(|| keccak(value)))
    }

    pub fn is_terminal(&self) -> bool {
        self.inner.left.is_empty() && self.inner.right.is_empty()
    }

    pub fn is_empty_trie(&self) -> bool {
        self.inner.value_length == 0 && self.is_terminal()
    }

    /// A node with children but no value of its own.
    pub fn is_internal_node(&self) -> bool {
        !self.is_terminal() && self.inner.value_length == 0
    }

    /// True when this node may be inlined into its parent's encoding.
    pub fn is_embeddable(&self) -> Result<bool, TrieError> {
        Ok(self.is_terminal() && self.message_length()? <= MAX_EMBEDDED_NODE_SIZE)
    }

    /// Aggregate serialized size of all descendants in bytes. Zero for
    /// terminal nodes.
    pub fn children_size(&self) -> Result<u64, TrieError> {
        if let Some(size) = self.inner.children_size.get() {
            return Ok(*size);
        }
        let size = if self.is_terminal() {
            0
        } else {
            self.inner.left.reference_size()? + self.inner.right.reference_size()?
        };
        Ok(*self.inner.children_size.get_or_init(|| size))
    }

    /// Serializes the node in its current format, caching the encoding
    /// until the next save boundary.
    pub fn to_message(&self) -> Result<Vec<u8>, TrieError> {
        let mut cache = self.inner.encoded.lock().map_err(|_| TrieError::LockError)?;
        if let Some(bytes) = cache.as_ref() {
            return Ok(bytes.clone());
        }
        let bytes = encoding::encode_node(self)?;
        *cache = Some(bytes.clone());
        Ok(bytes)
    }

    /// Serializes the node in the legacy format. Not cached.
    pub fn to_message_legacy(&self, is_secure: bool) -> Result<Vec<u8>, TrieError> {
        encoding::encode_node_legacy(self, is_secure)
    }

    pub fn message_length(&self) -> Result<usize, TrieError> {
        Ok(self.to_message()?.len())
    }

    /// Keccak-256 of the node's current-format serialization; cached.
    pub fn hash(&self) -> Result<H256, TrieError> {
        if let Some(hash) = self.inner.hash.get() {
            return Ok(*hash);
        }
        if self.is_empty_trie() {
            return Ok(*EMPTY_TRIE_HASH);
        }
        let message = self.to_message()?;
        Ok(*self.inner.hash.get_or_init(|| keccak(&message)))
    }

    /// Keccak-256 of the node's legacy serialization; cached independently
    /// of [`Trie::hash`] so historical roots can be re-derived cheaply. The
    /// cache holds one flavor; the other is recomputed when asked for.
    pub fn hash_legacy(&self, is_secure: bool) -> Result<H256, TrieError> {
        if let Some((cached_secure, hash)) = self.inner.hash_legacy.get() {
            if *cached_secure == is_secure {
                return Ok(*hash);
            }
        }
        if self.is_empty_trie() {
            return Ok(*EMPTY_TRIE_HASH);
        }
        let message = self.to_message_legacy(is_secure)?;
        let hash = keccak(&message);
        let _ = self.inner.hash_legacy.set((is_secure, hash));
        Ok(hash)
    }

    /// Returns the value associated with `key`, or `None`.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, TrieError> {
        match self.find(key)? {
            Some(node) => node.value(),
            None => Ok(None),
        }
    }

    /// Returns the node holding `key`, or `None` when the key is absent.
    pub fn find(&self, key: &[u8]) -> Result<Option<Trie>, TrieError> {
        self.find_slice(KeySlice::from_key(key))
    }

    fn find_slice(&self, key: KeySlice) -> Result<Option<Trie>, TrieError> {
        let shared_len = self.inner.shared_path.len();
        if shared_len > key.len() {
            return Ok(None);
        }

        let common_len = key.common_prefix(&self.inner.shared_path).len();
        if common_len < shared_len {
            return Ok(None);
        }

        if common_len == key.len() {
            return Ok(Some(self.clone()));
        }

        let Some(node) = self.retrieve_node(key.get(common_len))? else {
            return Ok(None);
        };
        node.find_slice(key.slice(common_len + 1, key.len()))
    }

    /// All nodes traversed while resolving `key`, leaf first, or `None` when
    /// the key does not exist. Each element's encoding contains its
    /// predecessor's hash or embedded bytes, forming a Merkle path.
    pub fn get_nodes(&self, key: &[u8]) -> Result<Option<Vec<Trie>>, TrieError> {
        self.find_nodes_slice(KeySlice::from_key(key))
    }

    fn find_nodes_slice(&self, key: KeySlice) -> Result<Option<Vec<Trie>>, TrieError> {
        let shared_len = self.inner.shared_path.len();
        if shared_len > key.len() {
            return Ok(None);
        }

        let common_len = key.common_prefix(&self.inner.shared_path).len();
        if common_len < shared_len {
            return Ok(None);
        }

        if common_len == key.len() {
            return Ok(Some(vec![self.clone()]));
        }

        let Some(node) = self.retrieve_node(key.get(common_len))? else {
            return Ok(None);
        };
        let Some(mut nodes) = node.find_nodes_slice(key.slice(common_len + 1, key.len()))? else {
            return Ok(None);
        };
        nodes.push(self.clone());
        Ok(Some(nodes))
    }

    /// Collects every stored key of at most `byte_size` bytes. The sentinel
    /// `usize::MAX` collects all keys. Hash-only children are loaded from
    /// the store.
    pub fn collect_keys(&self, byte_size: usize) -> Result<HashSet<Vec<u8>>, TrieError> {
        let bit_size = if byte_size == usize::MAX {
            usize::MAX
        } else {
            byte_size.saturating_mul(8)
        };
        let mut keys = HashSet::new();
        self.collect_keys_from(self.inner.shared_path.clone(), bit_size, &mut keys)?;
        Ok(keys)
    }

    fn collect_keys_from(
        &self,
        key: KeySlice,
        bit_size: usize,
        keys: &mut HashSet<Vec<u8>>,
    ) -> Result<(), TrieError> {
        if bit_size != usize::MAX && key.len() > bit_size {
            return Ok(());
        }

        if self.inner.value_length > 0 {
            keys.insert(key.encode());
        }

        for bit in 0..2u8 {
            if let Some(node) = self.retrieve_node(bit)? {
                let child_key = key.rebuild_shared_path(bit, node.shared_path());
                node.collect_keys_from(child_key, bit_size, keys)?;
            }
        }
        Ok(())
    }

    /// Number of nodes in the subtree, this node included.
    pub fn trie_size(&self) -> Result<usize, TrieError> {
        let left = match self.inner.left.node()? {
            Some(node) => node.trie_size()?,
            None => 0,
        };
        let right = match self.inner.right.node()? {
            Some(node) => node.trie_size()?,
            None => 0,
        };
        Ok(1 + left + right)
    }

    pub(crate) fn retrieve_node(&self, bit: u8) -> Result<Option<Trie>, TrieError> {
        self.child(bit).node()
    }

    /// Associates `key` with `value`, returning the new root. The receiver
    /// is unchanged; unchanged subtrees are shared between both roots. An
    /// empty `value` removes the key.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<Trie, TrieError> {
        self.put_with_rent(key, value, None)
    }

    /// Like [`Trie::put`], additionally stamping the written node, and any
    /// internal node the write creates, with a rent timestamp.
    pub fn put_with_rent(
        &self,
        key: &[u8],
        value: &[u8],
        rent_time: Option<i64>,
    ) -> Result<Trie, TrieError> {
        if value.len() >= MAX_VALUE_LENGTH {
            return Err(TrieError::InvalidValueLength);
        }
        let value = (!value.is_empty()).then(|| value.to_vec());
        let rent_time = rent_time.filter(|time| *time != -1);
        let trie = self.put_slice(KeySlice::from_key(key), value, false, rent_time)?;
        Ok(trie.unwrap_or_else(|| Trie::empty_with(self.inner.store.clone())))
    }

    /// Removes `key`, returning the new root.
    pub fn delete(&self, key: &[u8]) -> Result<Trie, TrieError> {
        self.put(key, &[])
    }

    /// Removes the entire subtree rooted at `key`. The key must identify an
    /// exact node.
    pub fn delete_recursive(&self, key: &[u8]) -> Result<Trie, TrieError> {
        let trie = self.put_slice(KeySlice::from_key(key), None, true, None)?;
        Ok(trie.unwrap_or_else(|| Trie::empty_with(self.inner.store.clone())))
    }

    fn put_slice(
        &self,
        key: KeySlice,
        value: Option<Vec<u8>>,
        is_recursive_delete: bool,
        rent_time: Option<i64>,
    ) -> Result<Option<Trie>, TrieError> {
        let version = if rent_time.is_none() {
            NodeVersion::V1
        } else {
            NodeVersion::V2
        };
        let is_delete = value.is_none();
        let trie = self.internal_put(key, value, is_recursive_delete, rent_time, version)?;

        // deletes may leave a value-less node with a single child behind;
        // fold it into that child
        let Some(trie) = trie else { return Ok(None) };
        if !is_delete {
            return Ok(Some(trie));
        }
        if trie.is_empty_trie() {
            return Ok(None);
        }
        if trie.inner.value_length > 0 {
            return Ok(Some(trie));
        }

        let left = trie.inner.left.node()?;
        let right = trie.inner.right.node()?;
        let (child, child_bit) = match (left, right) {
            (Some(_), Some(_)) | (None, None) => return Ok(Some(trie)),
            (Some(child), None) => (child, 0),
            (None, Some(child)) => (child, 1),
        };

        let shared_path = trie
            .inner
            .shared_path
            .rebuild_shared_path(child_bit, child.shared_path());
        let (value, value_length, value_hash) = child.value_parts();
        Ok(Some(Trie::build(
            child.inner.store.clone(),
            shared_path,
            value,
            value_length,
            value_hash,
            child.inner.left.clone(),
            child.inner.right.clone(),
            child.inner.children_size.get().copied(),
            child.inner.last_rent_paid_time,
            child.inner.version,
        )))
    }

    fn internal_put(
        &self,
        key: KeySlice,
        value: Option<Vec<u8>>,
        is_recursive_delete: bool,
        rent_time: Option<i64>,
        version: NodeVersion,
    ) -> Result<Option<Trie>, TrieError> {
        let shared_len = self.inner.shared_path.len();
        let common = key.common_prefix(&self.inner.shared_path);

        if common.len() < shared_len {
            // a removed key was not found here, so no split is needed
            if value.is_none() {
                return Ok(Some(self.clone()));
            }
            let split = self.split(common, rent_time, version);
            return split.put_slice(key, value, is_recursive_delete, rent_time);
        }

        if shared_len >= key.len() {
            let new_length = value.as_ref().map_or(0, |value| value.len());
            if self.inner.value_length as usize == new_length {
                let unchanged = match (&value, self.value()?) {
                    (None, None) => true,
                    (Some(new), Some(current)) => *new == current,
                    _ => false,
                };
                // a rent-less write never restamps a node that already
                // carries a timestamp
                if unchanged
                    && (rent_time.is_none() || rent_time == self.inner.last_rent_paid_time)
                {
                    return Ok(Some(self.clone()));
                }
            }

            if is_recursive_delete {
                return Ok(None);
            }

            if value.is_none() && self.is_terminal() {
                return Ok(None);
            }

            return Ok(Some(Trie::build(
                self.inner.store.clone(),
                self.inner.shared_path.clone(),
                value,
                new_length as u32,
                None,
                self.inner.left.clone(),
                self.inner.right.clone(),
                None,
                rent_time,
                version,
            )));
        }

        if self.is_empty_trie() {
            let value_length = value.as_ref().map_or(0, |value| value.len()) as u32;
            return Ok(Some(Trie::build(
                self.inner.store.clone(),
                key,
                value,
                value_length,
                None,
                NodeRef::Empty,
                NodeRef::Empty,
                None,
                rent_time,
                version,
            )));
        }

        // this bit is implicit and not part of any shared path
        let bit = key.get(shared_len);
        let child = match self.retrieve_node(bit)? {
            Some(node) => node,
            None => Trie::empty_with(self.inner.store.clone()),
        };
        let sub_key = key.slice(shared_len + 1, key.len());
        let new_child = child.put_slice(sub_key, value, is_recursive_delete, rent_time)?;

        if let Some(new_child) = &new_child {
            if new_child.ptr_eq(&child) {
                return Ok(Some(self.clone()));
            }
        }

        let new_ref = match new_child {
            Some(node) => NodeRef::from(node),
            None => NodeRef::Empty,
        };
        let (new_left, new_right) = if bit == 0 {
            (new_ref, self.inner.right.clone())
        } else {
            (self.inner.left.clone(), new_ref)
        };

        if self.inner.value_length == 0 && new_left.is_empty() && new_right.is_empty() {
            return Ok(None);
        }

        let (value, value_length, value_hash) = self.value_parts();
        Ok(Some(Trie::build(
            self.inner.store.clone(),
            self.inner.shared_path.clone(),
            value,
            value_length,
            value_hash,
            new_left,
            new_right,
            None,
            self.inner.last_rent_paid_time,
            self.inner.version,
        )))
    }

    /// Turns this node into a child of a new internal node whose shared path
    /// is `common`. The new parent carries the rent stamp of the write that
    /// caused the split.
    fn split(&self, common: KeySlice, rent_time: Option<i64>, version: NodeVersion) -> Trie {
        let shared = &self.inner.shared_path;
        let child_path = shared.slice(common.len() + 1, shared.len());
        let (value, value_length, value_hash) = self.value_parts();
        let child = Trie::build(
            self.inner.store.clone(),
            child_path,
            value,
            value_length,
            value_hash,
            self.inner.left.clone(),
            self.inner.right.clone(),
            None,
            self.inner.last_rent_paid_time,
            self.inner.version,
        );

        let bit = shared.get(common.len());
        let child_ref = NodeRef::from(child);
        let (left, right) = if bit == 0 {
            (child_ref, NodeRef::Empty)
        } else {
            (NodeRef::Empty, child_ref)
        };
        Trie::build(
            self.inner.store.clone(),
            common,
            None,
            0,
            None,
            left,
            right,
            None,
            rent_time,
            version,
        )
    }

    fn value_parts(&self) -> (Option<Vec<u8>>, u32, Option<H256>) {
        (
            self.inner.value.get().cloned(),
            self.inner.value_length,
            self.inner.value_hash.get().copied(),
        )
    }

    /// Persists the subtree into `store`: every non-embedded node under its
    /// hash and every long value under its value hash. Embedded nodes live
    /// inside their parent's encoding and are not written separately. Each
    /// visited node's cached encoding is released afterwards.
    pub fn save(&self, store: &dyn TrieStore) -> Result<(), TrieError> {
        if self.is_empty_trie() {
            return Ok(());
        }
        self.save_subtree(store, true)
    }

    fn save_subtree(&self, store: &dyn TrieStore, is_root: bool) -> Result<(), TrieError> {
        if let NodeRef::Node(child) = &self.inner.left {
            child.save_subtree(store, false)?;
        }
        if let NodeRef::Node(child) = &self.inner.right {
            child.save_subtree(store, false)?;
        }

        if self.has_long_value() {
            let value = self.value()?.ok_or(TrieError::InvalidValueLength)?;
            let value_hash = self.value_hash().ok_or(TrieError::InvalidValueLength)?;
            store.save(value_hash, value)?;
        }

        if is_root || !self.is_embeddable()? {
            store.save(self.hash()?, self.to_message()?)?;
        }

        *self.inner.encoded.lock().map_err(|_| TrieError::LockError)? = None;
        Ok(())
    }

    /// In-order traversal of the subtree. Items resolve hash-only children
    /// through the store and are therefore fallible.
    pub fn in_order_iter(&self) -> crate::iter::InOrderIterator {
        crate::iter::InOrderIterator::new(self)
    }

    pub fn pre_order_iter(&self) -> crate::iter::PreOrderIterator {
        crate::iter::PreOrderIterator::new(self)
    }

    pub fn post_order_iter(&self) -> crate::iter::PostOrderIterator {
        crate::iter::PostOrderIterator::new(self)
    }
}

impl Default for Trie {
    fn default() -> Self {
        Trie::new_temp()
    }
}

impl fmt::Debug for Trie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trie")
            .field("shared_path", &self.inner.shared_path)
            .field("value_length", &self.inner.value_length)
            .field("left", &self.inner.left)
            .field("right", &self.inner.right)
            .field("version", &self.inner.version)
            .field("last_rent_paid_time", &self.inner.last_rent_paid_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_get() {
        let trie = Trie::new_temp().put(b"foo", b"bar").unwrap();
        assert_eq!(trie.get(b"foo").unwrap(), Some(b"bar".to_vec()));
        assert_eq!(trie.get(b"f").unwrap(), None);
        assert_eq!(trie.get(b"fooo").unwrap(), None);
    }

    #[test]
    fn receiver_is_unchanged() {
        let trie = Trie::new_temp().put(b"foo", b"bar").unwrap();
        let updated = trie.put(b"foo", b"baz").unwrap();
        assert_eq!(trie.get(b"foo").unwrap(), Some(b"bar".to_vec()));
        assert_eq!(updated.get(b"foo").unwrap(), Some(b"baz".to_vec()));
    }

    #[test]
    fn identical_put_returns_same_node() {
        let trie = Trie::new_temp().put(b"foo", b"bar").unwrap();
        let again = trie.put(b"foo", b"bar").unwrap();
        assert!(trie.ptr_eq(&again));
    }

    #[test]
    fn empty_value_deletes() {
        let trie = Trie::new_temp().put(b"foo", b"bar").unwrap();
        let deleted = trie.put(b"foo", &[]).unwrap();
        assert!(deleted.is_empty_trie());
        assert_eq!(
            deleted.hash().unwrap(),
            trie.delete(b"foo").unwrap().hash().unwrap()
        );
    }

    #[test]
    fn oversized_value_is_rejected() {
        let trie = Trie::new_temp();
        let value = vec![0u8; MAX_VALUE_LENGTH];
        assert!(matches!(
            trie.put(b"foo", &value),
            Err(TrieError::InvalidValueLength)
        ));
    }
}
