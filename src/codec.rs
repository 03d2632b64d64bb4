//! Position codec.
//!
//! Compresses a set of `u16` positions into a compact byte string that can be
//! tested for membership and range-membership without full decoding.
//!
//! # Format
//!
//! The default [`Layout::Fixed`] layout splits the sorted, deduplicated values
//! into blocks of `block_size` bytes (16 by default). Each block starts with
//! its first value as a big-endian `u16` anchor, followed by an MSB-first
//! stream of delta codes:
//!
//! | tag   | payload | deltas         |
//! |-------|---------|----------------|
//! | `0`   | 5 bits  | 1 ..= 31       |
//! | `10`  | 10 bits | 32 ..= 1023    |
//! | `110` | 12 bits | 1024 ..= 4095  |
//! | `111` | 15 bits | 4096 ..= 32767 |
//!
//! A new block begins when the next delta does not fit the remaining bits or
//! exceeds 32767. Non-final blocks are zero padded to the block stride; the
//! final block is truncated. A `0` tag with a zero payload, or fewer than six
//! remaining bits, ends a block. Because anchors sit at fixed offsets,
//! [`range_contains`] binary-searches them and decodes a single block.
//!
//! [`Layout::Unbounded`] is the variable-length sibling used for stored
//! document symbol lists: one varint anchor and an unbounded delta stream,
//! with an explicit terminator and a fresh byte-aligned varint anchor only
//! where a delta exceeds 32767.
//!
//! Encoding the same set always yields identical bytes.

mod bits;
mod encoder;
mod reader;

use std::fmt;

pub use reader::{DEFAULT_FAST_STEPS, PositionReader};

use crate::error::Result;

/// Default fixed block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Smallest usable fixed block: an anchor plus room for a few codes.
/// Smaller sizes are treated as this one by every function here.
pub const MIN_BLOCK_SIZE: usize = 4;

/// Block layout of an encoded position set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Fixed-stride blocks of the given byte size.
    Fixed(usize),
    /// A single variable-length stream.
    Unbounded,
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Fixed(BLOCK_SIZE)
    }
}

impl Layout {
    fn normalized(self) -> Self {
        match self {
            Layout::Fixed(size) => Layout::Fixed(size.max(MIN_BLOCK_SIZE)),
            Layout::Unbounded => Layout::Unbounded,
        }
    }
}

/// Encode `values` with the default fixed layout. Input order and duplicates
/// do not matter.
pub fn compress(values: &[u16]) -> Vec<u8> {
    compress_with(Layout::default(), values)
}

/// Encode `values` as a single unbounded stream.
pub fn compress_full(values: &[u16]) -> Vec<u8> {
    compress_with(Layout::Unbounded, values)
}

pub fn compress_with(layout: Layout, values: &[u16]) -> Vec<u8> {
    encoder::compress(layout.normalized(), values)
}

/// Visit every value in ascending order until `f` returns `false`.
///
/// Returns `false` if iteration was stopped by `f`. Damaged input ends the
/// walk early; use [`decode`] when that must be detected.
pub fn for_each<F>(data: &[u8], f: F) -> bool
where
    F: FnMut(u16) -> bool,
{
    for_each_with(Layout::default(), data, f)
}

pub fn for_each_full<F>(data: &[u8], f: F) -> bool
where
    F: FnMut(u16) -> bool,
{
    for_each_with(Layout::Unbounded, data, f)
}

pub fn for_each_with<F>(layout: Layout, data: &[u8], mut f: F) -> bool
where
    F: FnMut(u16) -> bool,
{
    PositionReader::with_layout(data, layout).all(|v| f(v))
}

/// Strictly decode every value.
///
/// Fails with [`crate::error::GramdexError::Corruption`] on truncated codes,
/// non-zero padding, anchors out of order, or values beyond `u16::MAX`.
pub fn decode(data: &[u8]) -> Result<Vec<u16>> {
    decode_with(Layout::default(), data)
}

pub fn decode_full(data: &[u8]) -> Result<Vec<u16>> {
    decode_with(Layout::Unbounded, data)
}

pub fn decode_with(layout: Layout, data: &[u8]) -> Result<Vec<u16>> {
    let mut reader = PositionReader::unprimed(data, layout.normalized());
    let mut values = Vec::new();
    while let Some(v) = reader.try_advance()? {
        values.push(v);
    }
    Ok(values)
}

/// Number of encoded values.
pub fn len(data: &[u8]) -> usize {
    len_with(Layout::default(), data)
}

pub fn len_with(layout: Layout, data: &[u8]) -> usize {
    PositionReader::with_layout(data, layout.normalized()).count()
}

/// Whether `value` is in the set.
pub fn contains(data: &[u8], value: u16) -> bool {
    range_contains(data, value, value)
}

/// Whether any value `v` with `lo <= v <= hi` is in the set.
pub fn range_contains(data: &[u8], lo: u16, hi: u16) -> bool {
    range_contains_with(Layout::default(), data, lo, hi)
}

pub fn range_contains_with(layout: Layout, data: &[u8], lo: u16, hi: u16) -> bool {
    match layout.normalized() {
        Layout::Fixed(block_size) => reader::range_contains_fixed(data, block_size, lo, hi),
        Layout::Unbounded => reader::range_contains_linear(data, lo, hi),
    }
}

/// Debug rendering of an encoded set, e.g. `[1 5 9]`.
pub struct Positions<'a> {
    data: &'a [u8],
    layout: Layout,
}

impl<'a> Positions<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_layout(data, Layout::default())
    }

    pub fn with_layout(data: &'a [u8], layout: Layout) -> Self {
        Self {
            data,
            layout: layout.normalized(),
        }
    }
}

impl fmt::Display for Positions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, v) in PositionReader::with_layout(self.data, self.layout).enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_and_range() {
        let data = compress(&[3, 7, 100, 1_000, 40_000]);
        assert!(contains(&data, 3));
        assert!(contains(&data, 40_000));
        assert!(!contains(&data, 4));
        assert!(!contains(&data, 0));
        assert!(!contains(&data, u16::MAX));

        assert!(range_contains(&data, 4, 7));
        assert!(!range_contains(&data, 8, 99));
        assert!(range_contains(&data, 999, 39_999));
        assert!(!range_contains(&data, 1_001, 39_999));
        assert!(!range_contains(&data, 10, 5));
    }

    #[test]
    fn test_empty_set() {
        let data = compress(&[]);
        assert!(data.is_empty());
        assert_eq!(len(&data), 0);
        assert!(!contains(&data, 0));
        assert!(decode(&data).unwrap().is_empty());
        assert!(for_each(&data, |_| panic!("no values expected")));
    }

    #[test]
    fn test_for_each_halts() {
        let data = compress(&[1, 2, 3, 4, 5]);
        let mut seen = Vec::new();
        let completed = for_each(&data, |v| {
            seen.push(v);
            v < 3
        });
        assert!(!completed);
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_extremes() {
        let data = compress(&[0, u16::MAX]);
        assert_eq!(decode(&data).unwrap(), vec![0, u16::MAX]);
        assert!(contains(&data, 0));
        assert!(contains(&data, u16::MAX));
        assert!(range_contains(&data, 1, u16::MAX));
    }

    #[test]
    fn test_full_layout() {
        let values: Vec<u16> = (0..500).map(|i| i * 131).collect();
        let data = compress_full(&values);
        assert!(data.len() < compress(&values).len());
        assert_eq!(decode_full(&data).unwrap(), values);
        assert!(range_contains_with(Layout::Unbounded, &data, 130, 131));
        assert!(!range_contains_with(Layout::Unbounded, &data, 132, 261));
        assert_eq!(len_with(Layout::Unbounded, &data), 500);
    }

    #[test]
    fn test_strict_decode_rejects_damage() {
        let mut data = compress(&[1, 2, 3]);
        data.push(0xFF);
        assert!(decode(&data).unwrap_err().is_corruption());

        // A lone byte cannot hold an anchor.
        assert!(decode(&[0x01]).unwrap_err().is_corruption());

        // Medium tag with its payload cut off.
        assert!(decode(&[0x00, 0x01, 0b1000_0000]).unwrap_err().is_corruption());
    }

    #[test]
    fn test_display() {
        let data = compress(&[9, 1, 5]);
        assert_eq!(Positions::new(&data).to_string(), "[1 5 9]");
    }

    #[test]
    fn test_tiny_block_size_is_clamped() {
        let values = [1u16, 2, 40, 5_000];
        let data = compress_with(Layout::Fixed(1), &values);
        assert_eq!(decode_with(Layout::Fixed(1), &data).unwrap(), values);
        assert!(range_contains_with(Layout::Fixed(0), &data, 3, 40));
    }
}
