//! Documents submitted for indexing.

use std::fmt;

/// Identifiers longer than this are rejected.
pub const MAX_ID_LEN: usize = 32 * 1024;

/// A document to index: an opaque external id, a caller-assigned score that
/// decides result order, and the text to index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDocument {
    pub id: Vec<u8>,
    pub score: u32,
    pub content: String,
}

impl IndexDocument {
    pub fn new(id: impl Into<Vec<u8>>, score: u32, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            score,
            content: content.into(),
        }
    }

    /// Use the big-endian bytes of `id` as identifier.
    pub fn with_int_id(mut self, id: u64) -> Self {
        self.id = id.to_be_bytes().to_vec();
        self
    }

    pub fn with_string_id(mut self, id: &str) -> Self {
        self.id = id.as_bytes().to_vec();
        self
    }

    pub fn with_score(mut self, score: u32) -> Self {
        self.score = score;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

impl fmt::Display for IndexDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndexDocument(")?;
        for b in &self.id {
            write!(f, "{b:02x}")?;
        }
        write!(f, ", {}, {}b)", self.score, self.content.len())
    }
}
