//! Stored document records.
//!
//! A record remembers which posting buckets a document wrote to, so that a
//! reindex, rescore or delete can find every posting again:
//!
//! ```text
//! [sorted varint index][u32 BE score]
//! [uvarint len][BMP symbols, unbounded position codec]
//! [uvarint count][count × 3 byte (symbol - 0x10000)]
//! ```
//!
//! The sentinel symbol is implied and never stored.

use byteorder::{BigEndian, ByteOrder};

use crate::analysis::Symbol;
use crate::codec;
use crate::error::{GramdexError, Result};
use crate::posting::PostingKey;
use crate::util::{sorted_varint, varint};

const BMP_END: u32 = 0x1_0000;
const WIDE_MAX: u32 = 0xFF_FFFF + BMP_END;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub index: u64,
    pub score: u32,
    /// Distinct symbols, ascending, without the sentinel.
    pub symbols: Vec<Symbol>,
}

impl Record {
    pub fn new(index: u64, score: u32, mut symbols: Vec<Symbol>) -> Self {
        symbols.retain(|s| !s.is_none());
        symbols.sort_unstable();
        symbols.dedup();
        Self {
            index,
            score,
            symbols,
        }
    }

    pub fn key(&self) -> PostingKey {
        PostingKey::new(self.score, self.index)
    }

    /// Every posting bucket symbol of the document, sentinel included.
    pub fn posting_symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        std::iter::once(Symbol::NONE).chain(self.symbols.iter().copied())
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut narrow = Vec::new();
        let mut wide = Vec::new();
        for symbol in &self.symbols {
            match symbol.value() {
                v if v < BMP_END => narrow.push(v as u16),
                v if v < WIDE_MAX => wide.push(v - BMP_END),
                v => {
                    return Err(GramdexError::invalid_argument(format!(
                        "symbol {v:#x} out of range"
                    )));
                }
            }
        }

        let narrow = codec::compress_full(&narrow);
        let mut buf = Vec::with_capacity(16 + narrow.len() + wide.len() * 3);
        sorted_varint::append(&mut buf, self.index);
        buf.extend_from_slice(&self.score.to_be_bytes());
        varint::append_u64(&mut buf, narrow.len() as u64);
        buf.extend_from_slice(&narrow);
        varint::append_u64(&mut buf, wide.len() as u64);
        for v in wide {
            buf.extend_from_slice(&v.to_be_bytes()[1..]);
        }
        Ok(buf)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let (index, score, rest) = Self::decode_head(buf)?;

        let (narrow_len, w) = varint::decode_u64(rest)?;
        let rest = &rest[w..];
        let narrow_len = usize::try_from(narrow_len)
            .ok()
            .filter(|&n| n <= rest.len())
            .ok_or_else(|| GramdexError::corruption("record symbol list overruns record"))?;
        let mut symbols: Vec<Symbol> = codec::decode_full(&rest[..narrow_len])?
            .into_iter()
            .map(|v| Symbol::new(v as u32))
            .collect();

        let rest = &rest[narrow_len..];
        let (wide_count, w) = varint::decode_u64(rest)?;
        let rest = &rest[w..];
        if (rest.len() as u64) != wide_count.saturating_mul(3) {
            return Err(GramdexError::corruption(format!(
                "record expects {wide_count} wide symbols, found {} bytes",
                rest.len()
            )));
        }
        symbols.extend(
            rest.chunks_exact(3)
                .map(|c| Symbol::new(BigEndian::read_u24(c) + BMP_END)),
        );

        Ok(Self::new(index, score, symbols))
    }

    /// Index and score without decoding the symbol lists.
    pub fn decode_key(buf: &[u8]) -> Result<PostingKey> {
        let (index, score, _) = Self::decode_head(buf)?;
        Ok(PostingKey::new(score, index))
    }

    /// Re-encode `buf` with another score, leaving the symbol lists as is.
    pub fn with_score(buf: &[u8], score: u32) -> Result<Vec<u8>> {
        let (index, _, rest) = Self::decode_head(buf)?;
        let mut out = Vec::with_capacity(buf.len());
        sorted_varint::append(&mut out, index);
        out.extend_from_slice(&score.to_be_bytes());
        out.extend_from_slice(rest);
        Ok(out)
    }

    fn decode_head(buf: &[u8]) -> Result<(u64, u32, &[u8])> {
        let (index, w) = sorted_varint::decode(buf)?;
        let rest = &buf[w..];
        if rest.len() < 4 {
            return Err(GramdexError::corruption("record too short for score"));
        }
        Ok((index, BigEndian::read_u32(&rest[..4]), &rest[4..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record::new(
            42,
            7,
            vec![
                Symbol::from_char('中'),
                Symbol::from_char('a'),
                Symbol::trigram('a', 'b', 'c'),
                Symbol::from_char('\u{20000}'),
                Symbol::NONE,
                Symbol::from_char('a'),
            ],
        )
    }

    #[test]
    fn test_new_normalizes_symbols() {
        let record = sample();
        assert_eq!(record.symbols.len(), 4);
        assert!(record.symbols.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(record.posting_symbols().next(), Some(Symbol::NONE));
        assert_eq!(record.posting_symbols().count(), 5);
    }

    #[test]
    fn test_encode_decode() {
        let record = sample();
        let buf = record.encode().unwrap();
        assert_eq!(Record::decode(&buf).unwrap(), record);
        assert_eq!(Record::decode_key(&buf).unwrap(), PostingKey::new(7, 42));
    }

    #[test]
    fn test_with_score_keeps_symbols() {
        let record = sample();
        let buf = Record::with_score(&record.encode().unwrap(), 99).unwrap();
        let decoded = Record::decode(&buf).unwrap();
        assert_eq!(decoded.score, 99);
        assert_eq!(decoded.index, 42);
        assert_eq!(decoded.symbols, record.symbols);
    }

    #[test]
    fn test_truncated_record_is_corruption() {
        let buf = sample().encode().unwrap();
        for cut in [1, 3, buf.len() - 1] {
            assert!(Record::decode(&buf[..cut]).unwrap_err().is_corruption());
        }
    }
}
