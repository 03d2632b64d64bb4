//! # Gramdex
//!
//! An embedded full-text search core for mixed-script text.
//!
//! ## Features
//!
//! - Compact positional posting codec with in-place range probes
//! - Trigram and per-codepoint tokenization with Unicode folding
//! - Score-ordered posting keys over any ordered key-value store
//! - Cursor-merge query engine with fuzzy segments, phrases, exclusions
//!   and `|` alternatives
//! - Resumable, deadline-bounded pagination

pub mod analysis;
pub mod codec;
pub mod config;
pub mod error;
pub mod index;
pub mod posting;
pub mod search;
pub mod store;
pub mod util;

// Re-exports for the public API
pub use analysis::{Symbol, Tokenizer};
pub use config::{IndexConfig, IndexConfigBuilder};
pub use error::{GramdexError, Result};
pub use index::{GramIndex, IndexCount, IndexDocument};
pub use posting::{Buckets, PostingKey};
pub use search::{Document, MatchSpan, Query, SearchMetrics, SearchRequest, SearchResults};
pub use store::{BucketCursor, KvStore, MemoryStore, ReadTransaction, WriteTransaction};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
