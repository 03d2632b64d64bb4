//! The gram tokenizer.
//!
//! Runs of non-logographic letters and digits are folded and hashed into
//! sliding trigrams. Every other continuable code point (CJK ideographs,
//! kana, Hangul, Thai, stray marks) becomes a symbol of its own. Indexing and
//! querying share this exact code path.

use std::ops::Range;

use ahash::AHashMap;

use super::symbol::Symbol;
use super::unicode::{fold, is_continue, is_run_extender};

/// Largest number of positions a document can carry.
pub const MAX_POSITIONS: usize = u16::MAX as usize + 1;

/// One emitted symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// Index in the symbol stream, not a byte offset.
    pub position: u16,
    pub symbol: Symbol,
    /// Source byte range the symbol was built from.
    pub span: Range<usize>,
    /// The folded letters behind a symbol, or the code point itself.
    pub gram: &'a [char],
}

impl Token<'_> {
    pub fn gram_text(&self) -> String {
        self.gram.iter().filter(|&&c| c != '\0').collect()
    }
}

/// Symbols of a text grouped by symbol.
#[derive(Debug, Default, Clone)]
pub struct Collected {
    /// Positions of each symbol, ascending.
    pub positions: AHashMap<Symbol, Vec<u16>>,
    /// Number of positions emitted.
    pub len: usize,
    /// Whether the text produced more symbols than the cap allowed.
    pub truncated: bool,
}

impl Collected {
    /// Entries ordered by symbol, for deterministic writes.
    pub fn sorted(&self) -> Vec<(Symbol, &[u16])> {
        let mut entries: Vec<_> = self
            .positions
            .iter()
            .map(|(&symbol, positions)| (symbol, positions.as_slice()))
            .collect();
        entries.sort_unstable_by_key(|(symbol, _)| *symbol);
        entries
    }
}

/// Maps text to a position-indexed symbol stream.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    max_symbols: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(MAX_POSITIONS)
    }
}

impl Tokenizer {
    /// A tokenizer that stops after `max_symbols` positions. The cap is
    /// clamped to the position range.
    pub fn new(max_symbols: usize) -> Self {
        Self {
            max_symbols: max_symbols.min(MAX_POSITIONS),
        }
    }

    pub fn max_symbols(&self) -> usize {
        self.max_symbols
    }

    /// Feed every token to `f` until it returns `false` or the cap is hit.
    /// Returns `true` when the whole text was consumed.
    pub fn tokenize<F>(&self, text: &str, f: F) -> bool
    where
        F: FnMut(Token<'_>) -> bool,
    {
        let mut emitter = Emitter {
            next: 0,
            max: self.max_symbols,
            f,
        };
        let mut run: Vec<(char, Range<usize>)> = Vec::new();
        let mut grams: Vec<char> = Vec::new();
        let mut chars = text.char_indices().peekable();

        while let Some((start, c)) = chars.next() {
            let span = start..start + c.len_utf8();
            if !is_continue(c) {
                continue;
            }

            let Some(folded) = fold(c) else {
                if !emitter.emit(Symbol::from_char(c), span, &[c]) {
                    return false;
                }
                continue;
            };

            run.clear();
            run.push((folded, span));
            while let Some(&(next_start, next)) = chars.peek() {
                let next_end = next_start + next.len_utf8();
                if let Some(folded) = fold(next) {
                    run.push((folded, next_start..next_end));
                } else if is_run_extender(next) {
                    if let Some((_, last)) = run.last_mut() {
                        last.end = next_end;
                    }
                } else {
                    break;
                }
                chars.next();
            }

            grams.clear();
            grams.extend(run.iter().map(|(c, _)| *c));
            let emitted = match run.as_slice() {
                [(only, span)] => emitter.emit(Symbol::from_char(*only), span.clone(), &grams),
                [(a, first), (b, second)] => emitter.emit(
                    Symbol::trigram(*a, *b, '\0'),
                    first.start..second.end,
                    &grams,
                ),
                _ => run.windows(3).zip(grams.windows(3)).all(|(window, gram)| {
                    emitter.emit(
                        Symbol::trigram(gram[0], gram[1], gram[2]),
                        window[0].1.start..window[2].1.end,
                        gram,
                    )
                }),
            };
            if !emitted {
                return false;
            }
        }
        true
    }

    /// Group a document's symbols for indexing.
    pub fn collect(&self, text: &str) -> Collected {
        let mut collected = Collected::default();
        let complete = self.tokenize(text, |token| {
            collected
                .positions
                .entry(token.symbol)
                .or_default()
                .push(token.position);
            collected.len += 1;
            true
        });
        collected.truncated = !complete;
        collected
    }

    /// The symbol sequence of a text, in position order.
    pub fn symbols(&self, text: &str) -> Vec<Symbol> {
        let mut symbols = Vec::new();
        self.tokenize(text, |token| {
            symbols.push(token.symbol);
            true
        });
        symbols
    }

    /// Symbols paired with their readable grams.
    pub fn grams(&self, text: &str) -> Vec<(Symbol, String)> {
        let mut grams = Vec::new();
        self.tokenize(text, |token| {
            grams.push((token.symbol, token.gram_text()));
            true
        });
        grams
    }
}

struct Emitter<F> {
    next: usize,
    max: usize,
    f: F,
}

impl<F> Emitter<F>
where
    F: FnMut(Token<'_>) -> bool,
{
    fn emit(&mut self, symbol: Symbol, span: Range<usize>, gram: &[char]) -> bool {
        if self.next >= self.max {
            return false;
        }
        let position = self.next as u16;
        self.next += 1;
        (self.f)(Token {
            position,
            symbol,
            span,
            gram,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(s: &str) -> Symbol {
        let c: Vec<char> = s.chars().collect();
        Symbol::trigram(c[0], c[1], c.get(2).copied().unwrap_or('\0'))
    }

    #[test]
    fn test_runs_by_length() {
        let t = Tokenizer::default();
        assert_eq!(t.symbols("a"), vec![Symbol::from_char('a')]);
        assert_eq!(t.symbols("ab"), vec![tri("ab")]);
        assert_eq!(t.symbols("abcd"), vec![tri("abc"), tri("bcd")]);
        assert_eq!(
            t.symbols("a b, cd!"),
            vec![Symbol::from_char('a'), Symbol::from_char('b'), tri("cd")]
        );
    }

    #[test]
    fn test_case_and_accents_fold() {
        let t = Tokenizer::default();
        assert_eq!(t.symbols("Héllo"), t.symbols("hello"));
        // Decomposed accent is absorbed into the run.
        assert_eq!(t.symbols("he\u{0301}llo"), t.symbols("hello"));
        assert_eq!(t.symbols("HELLO"), t.symbols("hello"));
    }

    #[test]
    fn test_joiner_inside_run() {
        let t = Tokenizer::default();
        assert_eq!(t.symbols("ab\u{200D}c"), t.symbols("abc"));
        assert_eq!(t.symbols("a\u{200D}b\u{200D}cd"), t.symbols("abcd"));

        let mut spans = Vec::new();
        t.tokenize("ab\u{200D}c", |token| {
            spans.push(token.span.clone());
            true
        });
        // The joiner belongs to the trigram it sits in.
        assert_eq!(spans, vec![0..6]);
    }

    #[test]
    fn test_logographs_are_single_symbols() {
        let t = Tokenizer::default();
        assert_eq!(
            t.symbols("中文abc"),
            vec![Symbol::from_char('中'), Symbol::from_char('文'), tri("abc")]
        );
    }

    #[test]
    fn test_spans_and_positions() {
        let t = Tokenizer::default();
        let mut seen = Vec::new();
        t.tokenize("ab 中 xyz", |token| {
            seen.push((token.position, token.span.clone(), token.gram_text()));
            true
        });
        assert_eq!(
            seen,
            vec![
                (0, 0..2, "ab".to_string()),
                (1, 3..6, "中".to_string()),
                (2, 7..10, "xyz".to_string()),
            ]
        );
    }

    #[test]
    fn test_cap_truncates() {
        let t = Tokenizer::new(3);
        let collected = t.collect("a b c d e");
        assert_eq!(collected.len, 3);
        assert!(collected.truncated);
        assert!(!collected.positions.contains_key(&Symbol::from_char('d')));

        let collected = Tokenizer::new(5).collect("a b c d e");
        assert!(!collected.truncated);
    }

    #[test]
    fn test_collect_groups_positions() {
        let collected = Tokenizer::default().collect("a b a 中 a");
        assert_eq!(collected.positions[&Symbol::from_char('a')], vec![0, 2, 4]);
        assert_eq!(collected.positions[&Symbol::from_char('中')], vec![3]);
        let sorted = collected.sorted();
        assert!(sorted.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        let t = Tokenizer::default();
        assert!(t.symbols("").is_empty());
        assert!(t.symbols(" -- !! ").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let t = Tokenizer::default();
        let text = "Zwölf Boxkämpfer jagen Viktor quer über den großen Sylter Deich 东京";
        assert_eq!(t.symbols(text), t.symbols(text));
    }
}
