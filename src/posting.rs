//! Posting keys and bucket naming.
//!
//! A posting lives in the bucket of its symbol, under the key
//! `[u32 BE score][sorted varint index]`. Byte order of keys equals
//! `(score, index)` order, so a reverse cursor walk yields documents by
//! descending score with the newest index breaking ties.

use std::fmt;

use byteorder::{BigEndian, ByteOrder};

use crate::analysis::Symbol;
use crate::error::{GramdexError, Result};
use crate::util::sorted_varint;

/// Longest encoded posting key.
pub const MAX_KEY_LEN: usize = 4 + sorted_varint::MAX_LEN;

/// Rank of a document inside every posting bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PostingKey {
    pub score: u32,
    pub index: u64,
}

impl PostingKey {
    pub fn new(score: u32, index: u64) -> Self {
        Self { score, index }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(MAX_KEY_LEN);
        self.append(&mut buf);
        buf
    }

    pub fn append(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.score.to_be_bytes());
        sorted_varint::append(buf, self.index);
    }

    /// Parse a stored key. Trailing bytes are a corruption.
    pub fn decode(key: &[u8]) -> Result<Self> {
        if key.len() < 5 {
            return Err(GramdexError::corruption(format!(
                "posting key too short: {} bytes",
                key.len()
            )));
        }
        let score = BigEndian::read_u32(&key[..4]);
        let (index, width) = sorted_varint::decode(&key[4..])?;
        if 4 + width != key.len() {
            return Err(GramdexError::corruption("trailing bytes after posting key"));
        }
        Ok(Self { score, index })
    }
}

impl fmt::Display for PostingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.score, self.index)
    }
}

/// Bucket names of one namespace.
///
/// | bucket              | key          | value           | sequence         |
/// |---------------------|--------------|-----------------|------------------|
/// | `<ns>`              | external id  | document record | next index       |
/// | `<ns>index`         | encoded index| external id     | live documents   |
/// | `<ns>content`       | external id  | raw content     |                  |
/// | `<ns><u32 symbol>`  | posting key  | positions       | posting count    |
///
/// Symbols never exceed 24 bits, so a posting bucket name cannot collide
/// with the `index` or `content` suffixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buckets {
    namespace: Vec<u8>,
}

impl Buckets {
    pub fn new(namespace: impl AsRef<[u8]>) -> Self {
        Self {
            namespace: namespace.as_ref().to_vec(),
        }
    }

    pub fn namespace(&self) -> &[u8] {
        &self.namespace
    }

    pub fn records(&self) -> Vec<u8> {
        self.namespace.clone()
    }

    pub fn index(&self) -> Vec<u8> {
        self.suffixed(b"index")
    }

    pub fn content(&self) -> Vec<u8> {
        self.suffixed(b"content")
    }

    pub fn postings(&self, symbol: Symbol) -> Vec<u8> {
        self.suffixed(&symbol.to_be_bytes())
    }

    fn suffixed(&self, suffix: &[u8]) -> Vec<u8> {
        let mut name = Vec::with_capacity(self.namespace.len() + suffix.len());
        name.extend_from_slice(&self.namespace);
        name.extend_from_slice(suffix);
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_order_matches_rank() {
        let keys = [
            PostingKey::new(0, 0),
            PostingKey::new(0, 31),
            PostingKey::new(0, 8_191),
            PostingKey::new(0, 1 << 40),
            PostingKey::new(0, u64::MAX),
            PostingKey::new(1, 0),
            PostingKey::new(1, 5),
            PostingKey::new(u32::MAX, 0),
        ];
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].encode() < pair[1].encode(), "{} vs {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_decode() {
        let key = PostingKey::new(7, 123_456);
        assert_eq!(PostingKey::decode(&key.encode()).unwrap(), key);

        assert!(PostingKey::decode(&[0, 0, 0]).unwrap_err().is_corruption());

        let mut long = key.encode();
        long.push(0);
        assert!(PostingKey::decode(&long).unwrap_err().is_corruption());
    }

    #[test]
    fn test_bucket_names() {
        let buckets = Buckets::new("docs");
        assert_eq!(buckets.records(), b"docs".to_vec());
        assert_eq!(buckets.index(), b"docsindex".to_vec());
        assert_eq!(buckets.content(), b"docscontent".to_vec());
        assert_eq!(
            buckets.postings(Symbol::from_char('a')),
            vec![b'd', b'o', b'c', b's', 0, 0, 0, b'a']
        );
    }
}
