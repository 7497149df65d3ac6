//! Wire codec for a node's shared path: a one-byte length tag covering the
//! common cases, a VarInt escape for the rest, then the packed path bits.
//!
//! The tag byte maps as follows:
//! * `[0, 31]`: length is `tag + 1` (lengths 1 to 32)
//! * `[32, 254]`: length is `tag + 128` (lengths 160 to 382)
//! * `255`: length follows as a VarInt
//!
//! A zero-length path is encoded by omission; presence is governed by a flag
//! in the enclosing node header.

use crate::encoding::ByteReader;
use crate::error::TrieError;
use crate::key_slice::KeySlice;
use crate::varint;

/// Packed byte length of a path of `bit_length` bits.
pub(crate) fn encoded_length(bit_length: usize) -> usize {
    bit_length.div_ceil(8)
}

/// Total serialized size of `path`, including the length tag.
pub(crate) fn serialized_length(path: &KeySlice) -> usize {
    let bits = path.len();
    if bits == 0 {
        return 0;
    }
    let tag = if (1..=32).contains(&bits) || (160..=382).contains(&bits) {
        1
    } else {
        1 + varint::size_of(bits as u64)
    };
    tag + encoded_length(bits)
}

pub(crate) fn serialize_into(buf: &mut Vec<u8>, path: &KeySlice) {
    let bits = path.len();
    if bits == 0 {
        return;
    }

    if (1..=32).contains(&bits) {
        buf.push((bits - 1) as u8);
    } else if (160..=382).contains(&bits) {
        buf.push((bits - 128) as u8);
    } else {
        buf.push(255);
        varint::write(buf, bits as u64);
    }

    buf.extend_from_slice(&path.encode());
}

pub(crate) fn deserialize(reader: &mut ByteReader, present: bool) -> Result<KeySlice, TrieError> {
    if !present {
        return Ok(KeySlice::empty());
    }

    let first = reader.read_u8()? as usize;
    let bits = if first <= 31 {
        first + 1
    } else if first <= 254 {
        first + 128
    } else {
        usize::try_from(varint::read(reader)?)
            .map_err(|_| TrieError::MalformedNode("shared path length overflow".into()))?
    };

    let encoded = reader.read_slice(encoded_length(bits))?;
    KeySlice::from_encoded(encoded, bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(bits: usize, expected_tag_bytes: usize) {
        let key = vec![0xa5u8; bits.div_ceil(8)];
        let path = KeySlice::from_key(&key).slice(0, bits);

        let mut buf = Vec::new();
        serialize_into(&mut buf, &path);
        assert_eq!(buf.len(), expected_tag_bytes + encoded_length(bits));
        assert_eq!(serialized_length(&path), buf.len());

        let mut reader = ByteReader::new(&buf);
        let decoded = deserialize(&mut reader, true).unwrap();
        assert!(reader.is_empty());
        assert_eq!(decoded, path);
    }

    #[test]
    fn single_tag_byte_ranges() {
        round_trip(1, 1);
        round_trip(32, 1);
        round_trip(160, 1);
        round_trip(382, 1);
    }

    #[test]
    fn varint_escape_ranges() {
        // lengths 33..=159 and above 382 do not fit the one-byte forms
        round_trip(33, 2);
        round_trip(159, 2);
        round_trip(383, 4);
        round_trip(1000, 4);
    }

    #[test]
    fn tag_values_are_exact() {
        let path = KeySlice::from_key(&[0xff]).slice(0, 1);
        let mut buf = Vec::new();
        serialize_into(&mut buf, &path);
        assert_eq!(buf, vec![0, 0b1000_0000]);

        let path = KeySlice::from_key(&vec![0xff; 20]); // 160 bits
        let mut buf = Vec::new();
        serialize_into(&mut buf, &path);
        assert_eq!(buf[0], 32);

        let path = KeySlice::from_key(&vec![0x00; 5]); // 40 bits
        let mut buf = Vec::new();
        serialize_into(&mut buf, &path);
        assert_eq!(buf[0], 255);
        assert_eq!(buf[1], 40);
    }

    #[test]
    fn absent_path_decodes_empty() {
        let mut reader = ByteReader::new(&[]);
        assert!(deserialize(&mut reader, false).unwrap().is_empty());
    }
}
