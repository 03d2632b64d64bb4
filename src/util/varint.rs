//! Variable-length integer encoding utilities.
//!
//! Little-endian base-128 groups with a continuation bit, the same layout as
//! protocol buffers. Used for length prefixes inside document records and for
//! the anchors of the unbounded position layout. Ordering of the encoded
//! bytes is *not* numeric; see [`super::sorted_varint`] for that.

use crate::error::{GramdexError, Result};

/// Longest encoding of a `u64`.
pub const MAX_LEN: usize = 10;

/// Append `value` to `buf` and return the number of bytes written.
pub fn append_u64(buf: &mut Vec<u8>, value: u64) -> usize {
    let start = buf.len();
    let mut val = value;

    loop {
        let mut byte = (val & 0x7F) as u8;
        val >>= 7;

        if val != 0 {
            byte |= 0x80; // Set continuation bit
        }

        buf.push(byte);

        if val == 0 {
            break;
        }
    }

    buf.len() - start
}

/// Encode a u64 value using variable-length encoding.
pub fn encode_u64(value: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(MAX_LEN);
    append_u64(&mut bytes, value);
    bytes
}

/// Decode a u64 value from variable-length encoding.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_u64(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut result = 0u64;
    let mut shift = 0;
    let mut bytes_read = 0;

    for &byte in bytes {
        bytes_read += 1;

        if shift >= 64 {
            return Err(GramdexError::corruption("varint overflow"));
        }

        result |= ((byte & 0x7F) as u64) << shift;

        if (byte & 0x80) == 0 {
            return Ok((result, bytes_read));
        }

        shift += 7;
    }

    Err(GramdexError::corruption("incomplete varint"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_u64() {
        let test_values = [0, 1, 127, 128, 255, 256, 16383, 16384, u64::MAX];

        for &value in &test_values {
            let encoded = encode_u64(value);
            let (decoded, bytes_read) = decode_u64(&encoded).unwrap();

            assert_eq!(value, decoded);
            assert_eq!(encoded.len(), bytes_read);
        }
        assert_eq!(encode_u64(u64::MAX).len(), MAX_LEN);
    }

    #[test]
    fn test_append_reports_width() {
        let mut buf = vec![0xAA];
        assert_eq!(append_u64(&mut buf, 300), 2);
        assert_eq!(buf, vec![0xAA, 0xAC, 0x02]);
    }

    #[test]
    fn test_incomplete_varint() {
        // Continuation bit set but no more data.
        let err = decode_u64(&[0x80]).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_overflow() {
        let overflow_data = vec![0xFF; 20];
        assert!(decode_u64(&overflow_data).is_err());
    }
}
