//! Query text parsing.
//!
//! ```text
//! hello "exact phrase" -unwanted -"unwanted phrase" red|green|blue
//! ```
//!
//! Whitespace separates terms; a quoted span is one phrase term. A leading
//! `-` turns a term into an exclusion. One unquoted term may list `|`
//! alternatives; each alternative becomes its own sub-query.

use std::sync::LazyLock;

use regex::Regex;

use crate::analysis::{Symbol, Tokenizer};
use crate::error::{GramdexError, Result};

static TERM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(-?)"([^"]*)"?|(-?)([^\s"]+)"#).unwrap());

/// A run of symbols that must occur together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub symbols: Vec<Symbol>,
    /// Readable grams, parallel to `symbols`.
    pub grams: Vec<String>,
    /// Quoted phrases never tolerate drift or misses.
    pub phrase: bool,
}

impl Segment {
    fn tokenize(tokenizer: &Tokenizer, text: &str, phrase: bool) -> Option<Self> {
        let (symbols, grams): (Vec<_>, Vec<_>) = tokenizer.grams(text).into_iter().unzip();
        (!symbols.is_empty()).then_some(Self {
            symbols,
            grams,
            phrase,
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// A parsed query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Segments every result must satisfy.
    pub required: Vec<Segment>,
    /// `|` alternatives; a result must also satisfy one of these when present.
    pub alternatives: Vec<Segment>,
    /// Segments no result may satisfy.
    pub exclusions: Vec<Segment>,
    /// Whether the text held any term at all, indexable or not.
    pub has_terms: bool,
}

impl Query {
    /// Parse `text`, tokenizing each term with `tokenizer`.
    pub fn parse(text: &str, tokenizer: &Tokenizer) -> Result<Self> {
        let mut query = Query::default();
        let mut groups = 0;

        for caps in TERM_RE.captures_iter(text) {
            query.has_terms = true;
            if let Some(phrase) = caps.get(2) {
                let excluded = caps.get(1).is_some_and(|m| !m.is_empty());
                if let Some(segment) = Segment::tokenize(tokenizer, phrase.as_str(), true) {
                    query.push(segment, excluded);
                }
                continue;
            }

            let excluded = caps.get(3).is_some_and(|m| !m.is_empty());
            let Some(term) = caps.get(4).map(|m| m.as_str()) else {
                continue;
            };

            if term.contains('|') {
                if excluded || term.split('|').any(|alt| alt.starts_with('-')) {
                    return Err(GramdexError::query(format!(
                        "exclusions cannot be combined with | in {:?}",
                        &caps[0]
                    )));
                }
                groups += 1;
                if groups > 1 {
                    return Err(GramdexError::query("only one | group is allowed"));
                }
                query.alternatives.extend(
                    term.split('|')
                        .filter_map(|alt| Segment::tokenize(tokenizer, alt, false)),
                );
                continue;
            }

            if let Some(segment) = Segment::tokenize(tokenizer, term, false) {
                query.push(segment, excluded);
            }
        }
        Ok(query)
    }

    fn push(&mut self, segment: Segment, excluded: bool) {
        if excluded {
            self.exclusions.push(segment);
        } else {
            self.required.push(segment);
        }
    }

    /// Every gram of the query, for metrics.
    pub fn grams(&self) -> Vec<String> {
        self.required
            .iter()
            .chain(&self.alternatives)
            .chain(&self.exclusions)
            .flat_map(|s| s.grams.iter().cloned())
            .collect()
    }

    /// The required segment sets to run: the required segments alone, or
    /// once per alternative.
    pub fn branches(&self) -> Vec<Vec<&Segment>> {
        let required: Vec<&Segment> = self.required.iter().collect();
        if self.alternatives.is_empty() {
            return vec![required];
        }
        self.alternatives
            .iter()
            .map(|alt| {
                let mut branch = required.clone();
                branch.push(alt);
                branch
            })
            .collect()
    }
}
