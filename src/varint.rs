//! Variable-length integers in the Bitcoin wire format: a one-byte value
//! below 0xfd, otherwise a marker byte followed by 2, 4 or 8 little-endian
//! payload bytes.

use crate::encoding::ByteReader;
use crate::error::TrieError;

/// Encoded size of `value` in bytes (1, 3, 5 or 9).
pub(crate) fn size_of(value: u64) -> usize {
    if value < 0xfd {
        1
    } else if value <= 0xffff {
        3
    } else if value <= 0xffff_ffff {
        5
    } else {
        9
    }
}

pub(crate) fn write(buf: &mut Vec<u8>, value: u64) {
    if value < 0xfd {
        buf.push(value as u8);
    } else if value <= 0xffff {
        buf.push(0xfd);
        buf.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffff_ffff {
        buf.push(0xfe);
        buf.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        buf.push(0xff);
        buf.extend_from_slice(&value.to_le_bytes());
    }
}

pub(crate) fn read(reader: &mut ByteReader) -> Result<u64, TrieError> {
    let first = reader.read_u8()?;
    Ok(match first {
        0xfd => u16::from_le_bytes(reader.read_array()?) as u64,
        0xfe => u32::from_le_bytes(reader.read_array()?) as u64,
        0xff => u64::from_le_bytes(reader.read_array()?),
        short => short as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: u64, expected_len: usize) {
        let mut buf = Vec::new();
        write(&mut buf, value);
        assert_eq!(buf.len(), expected_len);
        assert_eq!(size_of(value), expected_len);
        let mut reader = ByteReader::new(&buf);
        assert_eq!(read(&mut reader).unwrap(), value);
        assert!(reader.is_empty());
    }

    #[test]
    fn encoded_widths() {
        round_trip(0, 1);
        round_trip(0xfc, 1);
        round_trip(0xfd, 3);
        round_trip(0xffff, 3);
        round_trip(0x1_0000, 5);
        round_trip(0xffff_ffff, 5);
        round_trip(0x1_0000_0000, 9);
        round_trip(u64::MAX, 9);
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let mut reader = ByteReader::new(&[0xfd, 0x01]);
        assert!(read(&mut reader).is_err());
    }
}
