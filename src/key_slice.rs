use std::{fmt, sync::Arc};

use crate::error::TrieError;

/// A bit-addressable view over a packed byte key.
///
/// The backing buffer is shared; `slice` and `common_prefix` only adjust the
/// bit offset and length. Bits are numbered from the most significant bit of
/// the first byte.
#[derive(Clone)]
pub struct KeySlice {
    data: Arc<[u8]>,
    offset: usize,
    length: usize,
}

impl KeySlice {
    /// The zero-length slice.
    pub fn empty() -> Self {
        KeySlice {
            data: Vec::new().into(),
            offset: 0,
            length: 0,
        }
    }

    /// Full-length view over `key`, one bit per key bit.
    pub fn from_key(key: &[u8]) -> Self {
        KeySlice {
            data: key.to_vec().into(),
            offset: 0,
            length: key.len() * 8,
        }
    }

    /// Rebuilds a slice from its packed encoding and bit length.
    pub fn from_encoded(encoded: &[u8], bit_length: usize) -> Result<Self, TrieError> {
        if encoded.len() != bit_length.div_ceil(8) {
            return Err(TrieError::MalformedNode(format!(
                "shared path of {} bits cannot span {} bytes",
                bit_length,
                encoded.len()
            )));
        }
        Ok(KeySlice {
            data: encoded.to_vec().into(),
            offset: 0,
            length: bit_length,
        })
    }

    /// Length in bits.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Bit at `index`, either 0 or 1.
    pub fn get(&self, index: usize) -> u8 {
        assert!(
            index < self.length,
            "bit index {index} out of range for {} bits",
            self.length
        );
        let bit = self.offset + index;
        (self.data[bit / 8] >> (7 - bit % 8)) & 1
    }

    /// View over bits `[from, to)`. Shares the backing buffer.
    pub fn slice(&self, from: usize, to: usize) -> KeySlice {
        assert!(
            from <= to && to <= self.length,
            "invalid bit range {from}..{to} for {} bits",
            self.length
        );
        KeySlice {
            data: self.data.clone(),
            offset: self.offset + from,
            length: to - from,
        }
    }

    /// Longest prefix shared with `other`.
    pub fn common_prefix(&self, other: &KeySlice) -> KeySlice {
        let max = self.length.min(other.length);
        let mut shared = 0;
        while shared < max && self.get(shared) == other.get(shared) {
            shared += 1;
        }
        self.slice(0, shared)
    }

    /// Concatenation `self || implicit_bit || child_path`, used when walking
    /// down through a child reference whose leading bit is implicit.
    pub fn rebuild_shared_path(&self, implicit_bit: u8, child_path: &KeySlice) -> KeySlice {
        let length = self.length + 1 + child_path.length;
        let mut bits = BitWriter::for_bits(length);
        for i in 0..self.length {
            bits.push(self.get(i));
        }
        bits.push(implicit_bit & 1);
        for i in 0..child_path.length {
            bits.push(child_path.get(i));
        }
        KeySlice {
            data: bits.finish().into(),
            offset: 0,
            length,
        }
    }

    /// Canonical packed encoding: big-endian bits, unused trailing bits of
    /// the final byte zeroed.
    pub fn encode(&self) -> Vec<u8> {
        let mut bits = BitWriter::for_bits(self.length);
        for i in 0..self.length {
            bits.push(self.get(i));
        }
        bits.finish()
    }
}

struct BitWriter {
    bytes: Vec<u8>,
    len: usize,
}

impl BitWriter {
    fn for_bits(bits: usize) -> Self {
        BitWriter {
            bytes: vec![0; bits.div_ceil(8)],
            len: 0,
        }
    }

    fn push(&mut self, bit: u8) {
        if bit != 0 {
            self.bytes[self.len / 8] |= 1 << (7 - self.len % 8);
        }
        self.len += 1;
    }

    fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

impl PartialEq for KeySlice {
    fn eq(&self, other: &KeySlice) -> bool {
        self.length == other.length && (0..self.length).all(|i| self.get(i) == other.get(i))
    }
}

impl Eq for KeySlice {}

impl fmt::Debug for KeySlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeySlice(")?;
        for i in 0..self.length {
            write!(f, "{}", self.get(i))?;
        }
        write!(f, ")")
    }
}
