//! Search requests and results.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::matcher::MatchSpan;
use crate::posting::PostingKey;

/// Default page size.
pub const DEFAULT_LIMIT: usize = 10;

/// A search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    /// Continue from a key returned as [`SearchResults::next`].
    pub resume: Option<Vec<u8>>,
    /// Page size.
    pub limit: usize,
    /// Soft deadline; falls back to the index default.
    pub timeout: Option<Duration>,
    /// Overrides the configured fuzzy distance.
    pub fuzzy_distance: Option<u16>,
    /// Overrides the configured fuzzy miss allowance.
    pub fuzzy_misses: Option<usize>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            resume: None,
            limit: DEFAULT_LIMIT,
            timeout: None,
            fuzzy_distance: None,
            fuzzy_misses: None,
        }
    }

    pub fn with_resume(mut self, resume: Option<Vec<u8>>) -> Self {
        self.resume = resume;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_fuzzy(mut self, distance: u16, misses: usize) -> Self {
        self.fuzzy_distance = Some(distance);
        self.fuzzy_misses = Some(misses);
        self
    }
}

/// A matched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Internal index.
    pub index: u64,
    pub id: Vec<u8>,
    pub score: u32,
    pub content: String,
    /// Span matched by each required segment, in query order.
    pub matches: Vec<MatchSpan>,
}

impl Document {
    /// The id read as a big-endian `u64`, when it is eight bytes long.
    pub fn int_id(&self) -> Option<u64> {
        <[u8; 8]>::try_from(self.id.as_slice())
            .ok()
            .map(u64::from_be_bytes)
    }

    pub fn string_id(&self) -> String {
        String::from_utf8_lossy(&self.id).into_owned()
    }

    pub fn key(&self) -> PostingKey {
        PostingKey::new(self.score, self.index)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.id) {
            Ok(id) if !id.chars().any(char::is_control) => {
                write!(f, "Document(#{}, {id:?}", self.index)?
            }
            _ => {
                write!(f, "Document(#{}, ", self.index)?;
                for b in &self.id {
                    write!(f, "{b:02x}")?;
                }
            }
        }
        write!(f, ", {}, {}b)", self.score, self.content.len())
    }
}

/// Counters describing how a search ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchMetrics {
    pub query: String,
    /// Grams the query was tokenized into.
    pub collected: Vec<String>,
    /// Why the query was rejected, if it was.
    pub error: Option<String>,
    pub seeks: u64,
    pub scans: u64,
    pub switch_head: u64,
    pub fast_switch_head: u64,
    /// Symbols fuzzy verification failed to find.
    pub misses: u64,
    pub timed_out: bool,
    pub elapsed_us: u64,
}

impl fmt::Display for SearchMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    /// Matches by descending score, then descending index.
    pub documents: Vec<Document>,
    /// Resume key of the next page, `None` when there is none. A timed-out
    /// search also returns one so the walk can continue where it stopped.
    pub next: Option<Vec<u8>>,
    /// The deadline cut the search short; `documents` is partial.
    pub timed_out: bool,
    pub metrics: SearchMetrics,
}

impl SearchResults {
    pub fn ids(&self) -> Vec<Vec<u8>> {
        self.documents.iter().map(|d| d.id.clone()).collect()
    }
}
