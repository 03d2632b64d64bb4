//! Text analysis for gramdex.
//!
//! Turns text into a position-indexed stream of [`Symbol`]s:
//!
//! ```text
//! Text → classify code points → fold letter runs → trigrams / single symbols
//! ```
//!
//! - [`unicode`]: process-wide classification tables and letter folding
//! - [`symbol`]: the symbol type and trigram hashing
//! - [`tokenizer`]: the scanner used for both documents and query terms
//!
//! # Examples
//!
//! ```
//! use gramdex::analysis::{Symbol, Tokenizer};
//!
//! let symbols = Tokenizer::default().symbols("Hi 東京");
//! assert_eq!(symbols[1], Symbol::from_char('東'));
//! assert_eq!(symbols.len(), 3);
//! ```

pub mod symbol;
pub mod tokenizer;
pub mod unicode;

pub use symbol::Symbol;
pub use tokenizer::{Collected, MAX_POSITIONS, Token, Tokenizer};
