//! Query execution.
//!
//! A search parses the query, opens one posting cursor per distinct symbol
//! inside a read snapshot and merges them in descending key order (see
//! [`merge`]). Aligned keys are verified segment by segment ([`matcher`]),
//! filtered against exclusions and paged. `|` alternatives run as separate
//! branches whose pages are merged by key.
//!
//! # Examples
//!
//! ```
//! use gramdex::{GramIndex, IndexConfig, IndexDocument, MemoryStore, SearchRequest};
//!
//! let index = GramIndex::new(MemoryStore::new(), IndexConfig::default()).unwrap();
//! index.index(IndexDocument::new("1", 1, "a b c d e f")).unwrap();
//! index.index(IndexDocument::new("2", 2, "d e f g h i")).unwrap();
//!
//! let results = index.search(&SearchRequest::new("d e f -i")).unwrap();
//! assert_eq!(results.ids(), vec![b"1".to_vec()]);
//! ```

pub mod matcher;
pub mod merge;
pub mod query;
pub mod request;

use std::time::Instant;

use log::{debug, warn};

use crate::analysis::{Symbol, Tokenizer};
use crate::error::{GramdexError, Result};
use crate::index::{GramIndex, read_content};
use crate::posting::PostingKey;
use crate::store::{BucketCursor, KvStore, ReadTransaction};

pub use matcher::{MatchSpan, Tolerance};
pub use query::{Query, Segment};
pub use request::{Document, SearchMetrics, SearchRequest, SearchResults};

use matcher::match_segment;
use merge::{Flow, MergeOptions, MergeStats, Outcome};

/// Per-request settings shared by every branch.
struct Plan {
    fuzzy_distance: u16,
    fuzzy_misses: usize,
    exact_segment_len: usize,
    merge: MergeOptions,
}

impl Plan {
    fn tolerance(&self, segment: &Segment) -> Tolerance {
        Tolerance::for_segment(
            segment.len(),
            segment.phrase,
            self.exact_segment_len,
            self.fuzzy_distance,
            self.fuzzy_misses,
        )
    }
}

#[derive(Debug, Default)]
struct Page {
    documents: Vec<Document>,
    next: Option<Vec<u8>>,
    timed_out: bool,
}

impl<S: KvStore> GramIndex<S> {
    /// Run a search.
    ///
    /// Malformed queries are not an error: they yield an empty page with
    /// [`SearchMetrics::error`] set. Store failures are.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        let started = Instant::now();
        if request.limit == 0 {
            return Err(GramdexError::invalid_argument("search limit must be positive"));
        }

        let mut results = SearchResults::default();
        results.metrics.query = request.query.clone();

        let tokenizer = Tokenizer::new(self.config.max_query_symbols);
        let query = match Query::parse(&request.query, &tokenizer) {
            Ok(query) => query,
            Err(e) => {
                warn!("rejected query {:?}: {e}", request.query);
                results.metrics.error = Some(e.to_string());
                return Ok(results);
            }
        };
        results.metrics.collected = query.grams();

        if query.has_terms
            && query.required.is_empty()
            && query.alternatives.is_empty()
            && query.exclusions.is_empty()
        {
            debug!("query {:?} has nothing indexable", request.query);
            return Ok(results);
        }

        let timeout = request.timeout.or_else(|| self.config.default_timeout());
        let plan = Plan {
            fuzzy_distance: request.fuzzy_distance.unwrap_or(self.config.fuzzy_distance),
            fuzzy_misses: request.fuzzy_misses.unwrap_or(self.config.fuzzy_misses),
            exact_segment_len: self.config.exact_segment_len,
            merge: MergeOptions {
                fast_steps: self.config.fast_steps,
                poll_interval: self.config.poll_interval,
                deadline: timeout.map(|t| started + t),
            },
        };

        let tx = self.store.begin_read()?;
        let resume = request.resume.as_deref();
        let branches = query.branches();

        if let [branch] = branches.as_slice() {
            let page = self.run_branch(
                &tx,
                branch,
                &query.exclusions,
                resume,
                request.limit,
                &plan,
                &mut results.metrics,
            )?;
            results.documents = page.documents;
            results.next = page.next;
            results.timed_out = page.timed_out;
        } else {
            let mut merged = Vec::new();
            let mut next: Option<Vec<u8>> = None;
            for branch in &branches {
                let page = self.run_branch(
                    &tx,
                    branch,
                    &query.exclusions,
                    resume,
                    request.limit,
                    &plan,
                    &mut results.metrics,
                )?;
                merged.extend(page.documents);
                next = next.max(page.next);
                results.timed_out |= page.timed_out;
            }

            merged.sort_by(|a: &Document, b: &Document| b.key().cmp(&a.key()));
            merged.dedup_by_key(|d| d.key());
            // Documents at or below a branch's resume key come back on the
            // next page; a timed-out branch may leave such keys behind.
            if let Some(resume) = &next {
                merged.retain(|d| d.key().encode() > *resume);
            }
            if let Some(overflow) = merged.get(request.limit) {
                next = Some(overflow.key().encode());
            }
            merged.truncate(request.limit);
            results.documents = merged;
            results.next = next;
        }

        results.metrics.timed_out = results.timed_out;
        results.metrics.elapsed_us = started.elapsed().as_micros() as u64;
        if results.timed_out {
            warn!(
                "query {:?} timed out with {} documents",
                request.query,
                results.documents.len()
            );
        }
        debug!(
            "query {:?}: {} documents, more: {}, {}",
            request.query,
            results.documents.len(),
            results.next.is_some(),
            results.metrics
        );
        Ok(results)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_branch<T: ReadTransaction>(
        &self,
        tx: &T,
        segments: &[&Segment],
        exclusions: &[Segment],
        resume: Option<&[u8]>,
        limit: usize,
        plan: &Plan,
        metrics: &mut SearchMetrics,
    ) -> Result<Page> {
        // Cursors are opened per distinct symbol; segments refer to them by slot.
        let mut symbols: Vec<Symbol> = Vec::new();
        let slots: Vec<Vec<usize>> = segments
            .iter()
            .map(|segment| {
                segment
                    .symbols
                    .iter()
                    .map(|&symbol| match symbols.iter().position(|&s| s == symbol) {
                        Some(slot) => slot,
                        None => {
                            symbols.push(symbol);
                            symbols.len() - 1
                        }
                    })
                    .collect()
            })
            .collect();
        if symbols.is_empty() {
            symbols.push(Symbol::NONE);
        }
        let tolerances: Vec<Tolerance> = segments.iter().map(|s| plan.tolerance(s)).collect();

        let mut cursors = Vec::with_capacity(symbols.len());
        for &symbol in &symbols {
            // A missing bucket or one with nothing at or below the resume key
            // rules out every candidate.
            let Some(mut cursor) = tx.cursor(&self.buckets.postings(symbol))? else {
                return Ok(Page::default());
            };
            if !merge::position(&mut cursor, resume) {
                return Ok(Page::default());
            }
            cursors.push(cursor);
        }

        let mut page = Page::default();
        let mut failure: Option<GramdexError> = None;
        let mut misses = 0u64;
        let mut stats = MergeStats::default();

        let outcome = merge::merge(&mut cursors, plan.merge, &mut stats, |key, cursors| {
            let mut spans = Vec::with_capacity(slots.len());
            for (slots, &tolerance) in slots.iter().zip(&tolerances) {
                let postings: Vec<&[u8]> = slots
                    .iter()
                    .map(|&slot| cursors[slot].value().unwrap_or_default())
                    .collect();
                match match_segment(&postings, tolerance, plan.merge.fast_steps, &mut misses) {
                    Some(span) => spans.push(span),
                    None => return Flow::Continue,
                }
            }

            match self.excluded(tx, key, exclusions, plan, &mut misses) {
                Ok(false) => {}
                Ok(true) => return Flow::Continue,
                Err(e) => {
                    failure = Some(e);
                    return Flow::Stop;
                }
            }

            if page.documents.len() >= limit {
                page.next = Some(key.to_vec());
                return Flow::Stop;
            }

            match self.load_document(tx, key, spans) {
                Ok(Some(document)) => page.documents.push(document),
                Ok(None) => warn!("posting {key:x?} has no document"),
                Err(e) => {
                    failure = Some(e);
                    return Flow::Stop;
                }
            }
            Flow::Continue
        });

        if let Some(e) = failure {
            return Err(e);
        }
        if outcome == Outcome::TimedOut {
            // Every match not yet visited sits at or below the lowest cursor.
            page.timed_out = true;
            page.next = cursors.iter().filter_map(|c| c.key()).min().map(<[u8]>::to_vec);
        }

        metrics.seeks += stats.seeks;
        metrics.scans += stats.scans;
        metrics.switch_head += stats.switch_head;
        metrics.fast_switch_head += stats.fast_switch_head;
        metrics.misses += misses;
        Ok(page)
    }

    /// Whether the document under `key` matches any exclusion on its own.
    fn excluded<T: ReadTransaction>(
        &self,
        tx: &T,
        key: &[u8],
        exclusions: &[Segment],
        plan: &Plan,
        misses: &mut u64,
    ) -> Result<bool> {
        'segments: for segment in exclusions {
            let mut postings = Vec::with_capacity(segment.len());
            for &symbol in &segment.symbols {
                match tx.get(&self.buckets.postings(symbol), key)? {
                    Some(value) => postings.push(value),
                    None => continue 'segments,
                }
            }
            let tolerance = plan.tolerance(segment);
            if match_segment(&postings, tolerance, plan.merge.fast_steps, misses).is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn load_document<T: ReadTransaction>(
        &self,
        tx: &T,
        key: &[u8],
        matches: Vec<MatchSpan>,
    ) -> Result<Option<Document>> {
        let posting = PostingKey::decode(key)?;
        let Some(id) = tx.get(&self.buckets.index(), &key[4..])? else {
            return Ok(None);
        };
        let id = id.to_vec();
        let content = read_content(tx, &self.buckets, &id)?.unwrap_or_default();
        Ok(Some(Document {
            index: posting.index,
            id,
            score: posting.score,
            content,
            matches,
        }))
    }
}
