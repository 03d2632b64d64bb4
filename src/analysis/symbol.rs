//! Indexable symbols.

use std::fmt;

/// An indexable unit: a single code point, or a trigram fold of three
/// normalized letters.
///
/// Trigram folds live where bits 16..20 are all set, which covers the
/// private use plane 15 and values past `char::MAX`. Neither can be produced
/// by the tokenizer as a plain code point, so the two spaces never collide.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

const GRAM_BITS: u32 = 0x000F_0000;
const GRAM_MASK: u32 = 0x00F0_FFFF;

impl Symbol {
    /// The "no terms" sentinel. Every document posts into its bucket.
    pub const NONE: Symbol = Symbol(0);

    pub const fn new(value: u32) -> Self {
        Symbol(value)
    }

    pub fn from_char(c: char) -> Self {
        Symbol(c as u32)
    }

    /// Hash three folded letters into the trigram range. A missing third
    /// letter is passed as `'\0'`.
    ///
    /// Each letter is laid out as UTF-8 in its own zero-filled 4 byte slot and
    /// the 12 bytes are checksummed with CRC-32 (IEEE). This value is
    /// persisted, so the layout must not change.
    pub fn trigram(a: char, b: char, c: char) -> Self {
        let mut buf = [0u8; 12];
        for (slot, ch) in buf.chunks_exact_mut(4).zip([a, b, c]) {
            ch.encode_utf8(slot);
        }
        let hash = crc32fast::hash(&buf);
        Symbol((hash & GRAM_MASK) + GRAM_BITS)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    pub const fn is_gram(self) -> bool {
        self.0 & GRAM_BITS == GRAM_BITS
    }

    /// The code point this symbol stands for, unless it is a trigram fold or
    /// the sentinel.
    pub fn as_char(self) -> Option<char> {
        if self.is_none() || self.is_gram() {
            return None;
        }
        char::from_u32(self.0)
    }

    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_char() {
            Some(c) => write!(f, "{c}"),
            None => write!(f, "#{:06x}", self.0),
        }
    }
}
