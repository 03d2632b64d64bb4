//! Order-preserving variable-length unsigned integers.
//!
//! The first byte carries a 3-bit length selector in its high bits and the
//! top five bits of the value in its low bits; the remaining magnitude
//! follows big-endian. Selector `k < 7` means `k + 1` trailing bytes and a
//! value below `2^(5 + 8(k+1))`. Selector 7 is the fixed 9-byte fallback
//! (`0xE0` followed by the full big-endian `u64`). Because the selector grows
//! with magnitude, comparing encodings bytewise equals comparing the values.

use crate::error::{GramdexError, Result};

/// Width of the fallback encoding.
pub const MAX_LEN: usize = 9;

const FALLBACK_TAG: u8 = 7 << 5;

/// Append the order-preserving encoding of `v` to `buf`.
pub fn append(buf: &mut Vec<u8>, v: u64) {
    for k in 0..7u32 {
        let body = (k + 1) * 8;
        if v < 1u64 << (5 + body) {
            buf.push(((k as u8) << 5) | (v >> body) as u8);
            for i in (0..=k).rev() {
                buf.push((v >> (i * 8)) as u8);
            }
            return;
        }
    }
    buf.push(FALLBACK_TAG);
    buf.extend_from_slice(&v.to_be_bytes());
}

/// Encode `v` into a fresh buffer.
pub fn encode(v: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_LEN);
    append(&mut buf, v);
    buf
}

/// Decode a value from the front of `b`, returning it with its width.
pub fn decode(b: &[u8]) -> Result<(u64, usize)> {
    let first = *b
        .first()
        .ok_or_else(|| GramdexError::corruption("empty sorted varint"))?;

    let k = (first >> 5) as usize;
    if k < 7 {
        let width = k + 2;
        if b.len() < width {
            return Err(GramdexError::corruption(format!(
                "sorted varint needs {width} bytes, found {}",
                b.len()
            )));
        }
        let mut v = (first & 0x1F) as u64;
        for &byte in &b[1..width] {
            v = (v << 8) | byte as u64;
        }
        return Ok((v, width));
    }

    if b.len() < MAX_LEN {
        return Err(GramdexError::corruption("truncated 9-byte sorted varint"));
    }
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&b[1..MAX_LEN]);
    Ok((u64::from_be_bytes(raw), MAX_LEN))
}
