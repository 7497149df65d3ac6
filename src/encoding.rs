//! Bit-exact node codecs.
//!
//! Three formats coexist. A message starting with the arity byte (2) is the
//! legacy fixed-header format; anything else is the current format, where
//! the top two bits of the flags byte select between v1 (no rent timestamp)
//! and v2 (rent timestamp). New nodes are always written in the current
//! format; legacy messages are read, and written only on demand to
//! reproduce historical roots.

use std::sync::Arc;

use ethereum_types::H256;

use crate::error::TrieError;
use crate::key_slice::KeySlice;
use crate::node_ref::NodeRef;
use crate::path;
use crate::store::TrieStore;
use crate::trie::{NodeVersion, Trie, MAX_VALUE_LENGTH};
use crate::varint;

pub(crate) const ARITY: u8 = 2;

const HASH_BYTES: usize = 32;
const UINT24_BYTES: usize = 3;

// flags byte of the current format, most significant bit first
const FLAG_HAS_RENT: u8 = 0b1000_0000;
const FLAG_VERSION_1: u8 = 0b0100_0000;
const FLAG_LONG_VALUE: u8 = 0b0010_0000;
const FLAG_SHARED_PREFIX: u8 = 0b0001_0000;
const FLAG_LEFT_PRESENT: u8 = 0b0000_1000;
const FLAG_RIGHT_PRESENT: u8 = 0b0000_0100;
const FLAG_LEFT_EMBEDDED: u8 = 0b0000_0010;
const FLAG_RIGHT_EMBEDDED: u8 = 0b0000_0001;

// legacy flags byte
const LEGACY_FLAG_SECURE: u8 = 0b0000_0001;
const LEGACY_FLAG_LONG_VALUE: u8 = 0b0000_0010;

pub(crate) fn decode_node(
    message: &[u8],
    store: Option<Arc<dyn TrieStore>>,
) -> Result<Trie, TrieError> {
    match message.first() {
        None => Err(TrieError::MalformedNode("empty message".into())),
        Some(&ARITY) => decode_node_legacy(message, store),
        Some(_) => {
            let mut reader = ByteReader::new(message);
            decode_node_current(&mut reader, &store)
        }
    }
}

fn decode_node_current(
    reader: &mut ByteReader,
    store: &Option<Arc<dyn TrieStore>>,
) -> Result<Trie, TrieError> {
    let flags = reader.read_u8()?;
    let version = match flags & (FLAG_HAS_RENT | FLAG_VERSION_1) {
        FLAG_HAS_RENT => NodeVersion::V2,
        FLAG_VERSION_1 => NodeVersion::V1,
        _ => return Err(TrieError::MalformedNode("unknown version flags".into())),
    };
    let has_long_value = flags & FLAG_LONG_VALUE != 0;
    let shared_prefix_present = flags & FLAG_SHARED_PREFIX != 0;
    let left_present = flags & FLAG_LEFT_PRESENT != 0;
    let right_present = flags & FLAG_RIGHT_PRESENT != 0;
    let left_embedded = flags & FLAG_LEFT_EMBEDDED != 0;
    let right_embedded = flags & FLAG_RIGHT_EMBEDDED != 0;

    let last_rent_paid_time = if version == NodeVersion::V2 {
        Some(reader.read_i64_be()?)
    } else {
        None
    };

    let shared_path = path::deserialize(reader, shared_prefix_present)?;

    let left = decode_child(reader, left_present, left_embedded, store)?;
    let right = decode_child(reader, right_present, right_embedded, store)?;

    let children_size = if left_present || right_present {
        Some(varint::read(reader)?)
    } else {
        None
    };

    let (value, value_length, value_hash) = if has_long_value {
        let value_hash = H256(reader.read_array()?);
        let value_length = read_uint24(reader)?;
        if !reader.is_empty() {
            return Err(TrieError::MalformedNode(
                "trailing bytes after value".into(),
            ));
        }
        (None, value_length, Some(value_hash))
    } else {
        let rest = reader.read_remaining();
        if rest.len() >= MAX_VALUE_LENGTH {
            return Err(TrieError::InvalidValueLength);
        }
        let length = rest.len() as u32;
        let value = (!rest.is_empty()).then(|| rest.to_vec());
        (value, length, None)
    };

    Ok(Trie::build(
        store.clone(),
        shared_path,
        value,
        value_length,
        value_hash,
        left,
        right,
        children_size,
        last_rent_paid_time,
        version,
    ))
}

fn decode_child(
    reader: &mut ByteReader,
    present: bool,
    embedded: bool,
    store: &Option<Arc<dyn TrieStore>>,
) -> Result<NodeRef, TrieError> {
    if !present {
        return Ok(NodeRef::Empty);
    }
    if embedded {
        let length = reader.read_u8()? as usize;
        let bytes = reader.read_slice(length)?;
        // embedded children always use the current format
        let node = decode_node_current(&mut ByteReader::new(bytes), store)?;
        Ok(NodeRef::from(node))
    } else {
        let hash = H256(reader.read_array()?);
        Ok(NodeRef::from_hash(hash, store.clone()))
    }
}

pub(crate) fn encode_node(node: &Trie) -> Result<Vec<u8>, TrieError> {
    let data = &node.inner;
    let contains_rent = data.version == NodeVersion::V2;
    let has_long_value = node.has_long_value();
    let terminal = node.is_terminal();
    let children_size = node.children_size()?;

    let mut capacity = 1
        + path::serialized_length(&data.shared_path)
        + data.left.serialized_length()?
        + data.right.serialized_length()?;
    if contains_rent {
        capacity += 8;
    }
    if !terminal {
        capacity += varint::size_of(children_size);
    }
    capacity += if has_long_value {
        HASH_BYTES + UINT24_BYTES
    } else {
        data.value_length as usize
    };

    let mut buf = Vec::with_capacity(capacity);

    let mut flags = if contains_rent {
        FLAG_HAS_RENT
    } else {
        FLAG_VERSION_1
    };
    if has_long_value {
        flags |= FLAG_LONG_VALUE;
    }
    if !data.shared_path.is_empty() {
        flags |= FLAG_SHARED_PREFIX;
    }
    if !data.left.is_empty() {
        flags |= FLAG_LEFT_PRESENT;
    }
    if !data.right.is_empty() {
        flags |= FLAG_RIGHT_PRESENT;
    }
    if data.left.is_embeddable()? {
        flags |= FLAG_LEFT_EMBEDDED;
    }
    if data.right.is_embeddable()? {
        flags |= FLAG_RIGHT_EMBEDDED;
    }
    buf.push(flags);

    if contains_rent {
        let rent_time = data.last_rent_paid_time.ok_or_else(|| {
            TrieError::InvariantViolation("rent-bearing node without a timestamp".into())
        })?;
        buf.extend_from_slice(&rent_time.to_be_bytes());
    }

    path::serialize_into(&mut buf, &data.shared_path);
    data.left.serialize_into(&mut buf)?;
    data.right.serialize_into(&mut buf)?;

    if !terminal {
        varint::write(&mut buf, children_size);
    }

    if has_long_value {
        let value_hash = node.value_hash().ok_or(TrieError::InvalidValueLength)?;
        buf.extend_from_slice(value_hash.as_bytes());
        buf.extend_from_slice(&uint24_bytes(data.value_length));
    } else if data.value_length > 0 {
        let value = node.value()?.ok_or(TrieError::InvalidValueLength)?;
        buf.extend_from_slice(&value);
    }

    Ok(buf)
}

fn decode_node_legacy(
    message: &[u8],
    store: Option<Arc<dyn TrieStore>>,
) -> Result<Trie, TrieError> {
    let mut reader = ByteReader::new(message);

    let arity = reader.read_u8()?;
    if arity != ARITY {
        return Err(TrieError::MalformedNode(format!("invalid arity {arity}")));
    }

    let flags = reader.read_u8()?;
    let has_long_value = flags & LEGACY_FLAG_LONG_VALUE != 0;

    let child_hashes = reader.read_u16_be()?;
    let shared_length = reader.read_u16_be()? as usize;

    let shared_path = if shared_length > 0 {
        let encoded = reader.read_slice(path::encoded_length(shared_length))?;
        KeySlice::from_encoded(encoded, shared_length)?
    } else {
        KeySlice::empty()
    };

    let left = if child_hashes & 0b01 != 0 {
        NodeRef::from_hash(H256(reader.read_array()?), store.clone())
    } else {
        NodeRef::Empty
    };
    let right = if child_hashes & 0b10 != 0 {
        NodeRef::from_hash(H256(reader.read_array()?), store.clone())
    } else {
        NodeRef::Empty
    };

    let (value, value_length, value_hash) = if has_long_value {
        let value_hash = H256(reader.read_array()?);
        if !reader.is_empty() {
            return Err(TrieError::MalformedNode(
                "trailing bytes after value".into(),
            ));
        }
        // the legacy format does not carry the length, so the value is
        // fetched eagerly
        let store = store
            .as_ref()
            .ok_or(TrieError::MissingStoreEntry(value_hash))?;
        let value = store
            .retrieve_value(value_hash)?
            .ok_or(TrieError::MissingStoreEntry(value_hash))?;
        if value.len() >= MAX_VALUE_LENGTH {
            return Err(TrieError::InvalidValueLength);
        }
        let length = value.len() as u32;
        (Some(value), length, Some(value_hash))
    } else {
        let rest = reader.read_remaining();
        if rest.len() >= MAX_VALUE_LENGTH {
            return Err(TrieError::InvalidValueLength);
        }
        let length = rest.len() as u32;
        let value = (!rest.is_empty()).then(|| rest.to_vec());
        (value, length, None)
    };

    Ok(Trie::build(
        store,
        shared_path,
        value,
        value_length,
        value_hash,
        left,
        right,
        None,
        None,
        NodeVersion::Legacy,
    ))
}

pub(crate) fn encode_node_legacy(node: &Trie, is_secure: bool) -> Result<Vec<u8>, TrieError> {
    let data = &node.inner;
    let shared_length = data.shared_path.len();
    if shared_length > u16::MAX as usize {
        return Err(TrieError::InvariantViolation(
            "shared path too long for the legacy format".into(),
        ));
    }
    let has_long_value = node.has_long_value();

    let left_hash = data.left.hash_legacy(is_secure)?;
    let right_hash = data.right.hash_legacy(is_secure)?;

    let mut child_hashes: u16 = 0;
    let mut hash_count = 0usize;
    if left_hash.is_some() {
        child_hashes |= 0b01;
        hash_count += 1;
    }
    if right_hash.is_some() {
        child_hashes |= 0b10;
        hash_count += 1;
    }

    let value_bytes = if has_long_value {
        HASH_BYTES
    } else {
        data.value_length as usize
    };
    let mut buf = Vec::with_capacity(
        6 + path::encoded_length(shared_length) + hash_count * HASH_BYTES + value_bytes,
    );

    buf.push(ARITY);

    let mut flags = 0u8;
    if is_secure {
        flags |= LEGACY_FLAG_SECURE;
    }
    if has_long_value {
        flags |= LEGACY_FLAG_LONG_VALUE;
    }
    buf.push(flags);

    buf.extend_from_slice(&child_hashes.to_be_bytes());
    buf.extend_from_slice(&(shared_length as u16).to_be_bytes());

    if shared_length > 0 {
        buf.extend_from_slice(&data.shared_path.encode());
    }

    if let Some(hash) = left_hash {
        buf.extend_from_slice(hash.as_bytes());
    }
    if let Some(hash) = right_hash {
        buf.extend_from_slice(hash.as_bytes());
    }

    if data.value_length > 0 {
        if has_long_value {
            let value_hash = node.value_hash().ok_or(TrieError::InvalidValueLength)?;
            buf.extend_from_slice(value_hash.as_bytes());
        } else {
            let value = node.value()?.ok_or(TrieError::InvalidValueLength)?;
            buf.extend_from_slice(&value);
        }
    }

    Ok(buf)
}

fn read_uint24(reader: &mut ByteReader) -> Result<u32, TrieError> {
    let bytes: [u8; UINT24_BYTES] = reader.read_array()?;
    Ok(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
}

fn uint24_bytes(value: u32) -> [u8; UINT24_BYTES] {
    let bytes = value.to_be_bytes();
    [bytes[1], bytes[2], bytes[3]]
}

/// Cursor over a message with bounds-checked reads.
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        ByteReader { buf, pos: 0 }
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], TrieError> {
        if count > self.buf.len() - self.pos {
            return Err(TrieError::MalformedNode(format!(
                "message too short: wanted {count} more bytes, {} left",
                self.buf.len() - self.pos
            )));
        }
        let slice = &self.buf[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, TrieError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn read_u16_be(&mut self) -> Result<u16, TrieError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_i64_be(&mut self) -> Result<i64, TrieError> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_slice(&mut self, count: usize) -> Result<&'a [u8], TrieError> {
        self.take(count)
    }

    pub(crate) fn read_array<const N: usize>(&mut self) -> Result<[u8; N], TrieError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn read_remaining(&mut self) -> &'a [u8] {
        let rest = &self.buf[self.pos..];
        self.pos = self.buf.len();
        rest
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }
}
