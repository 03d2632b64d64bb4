//! The index: documents in, posting buckets out.
//!
//! [`GramIndex`] owns one namespace of a [`KvStore`]. Every write happens in
//! a single store transaction, so a reindex, rescore or delete either lands
//! completely or not at all.

pub mod document;
pub mod record;

use log::{debug, trace};
use rayon::prelude::*;

use crate::analysis::{Collected, Symbol, Tokenizer};
use crate::codec;
use crate::config::IndexConfig;
use crate::error::{GramdexError, Result};
use crate::posting::{Buckets, PostingKey};
use crate::store::{KvStore, ReadTransaction, WriteTransaction};
use crate::util::sorted_varint;

pub use document::{IndexDocument, MAX_ID_LEN};
pub use record::Record;

/// Document counters of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexCount {
    /// Live documents.
    pub documents: u64,
    /// Next internal index to allocate.
    pub watermark: u64,
}

/// A full-text index over an ordered key-value store.
#[derive(Debug)]
pub struct GramIndex<S: KvStore> {
    pub(crate) store: S,
    pub(crate) config: IndexConfig,
    pub(crate) buckets: Buckets,
    tokenizer: Tokenizer,
}

impl<S: KvStore> GramIndex<S> {
    /// Open an index on `store`, creating its base buckets if needed.
    pub fn new(store: S, config: IndexConfig) -> Result<Self> {
        config.validate()?;
        let buckets = Buckets::new(&config.namespace);

        let mut tx = store.begin_write()?;
        for bucket in [
            buckets.records(),
            buckets.index(),
            buckets.content(),
            buckets.postings(Symbol::NONE),
        ] {
            tx.create_bucket_if_not_exists(&bucket)?;
        }
        tx.commit()?;

        let tokenizer = Tokenizer::new(config.max_symbols);
        Ok(Self {
            store,
            config,
            buckets,
            tokenizer,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Index or reindex one document.
    pub fn index(&self, doc: IndexDocument) -> Result<()> {
        self.index_batch(vec![doc], false)?
            .into_iter()
            .next()
            .unwrap_or(Ok(()))
    }

    /// Index many documents in one transaction.
    ///
    /// The outer error reports a failed transaction, in which case nothing was
    /// written. Otherwise each document gets its own result, in input order;
    /// rejected documents do not prevent the others from being written.
    /// `sort_by_id` inserts in identifier order, which keeps the store's
    /// pages dense for sequential ids.
    pub fn index_batch(
        &self,
        docs: Vec<IndexDocument>,
        sort_by_id: bool,
    ) -> Result<Vec<Result<()>>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }

        let tokenizer = self.tokenizer;
        let mut prepared: Vec<Option<Result<Collected>>> = docs
            .par_iter()
            .map(|doc| Some(prepare(&tokenizer, doc)))
            .collect();

        let mut order: Vec<usize> = (0..docs.len()).collect();
        if sort_by_id {
            order.sort_by(|&a, &b| docs[a].id.cmp(&docs[b].id));
        }

        let mut results: Vec<Result<()>> = Vec::with_capacity(docs.len());
        results.resize_with(docs.len(), || Ok(()));

        let mut tx = self.store.begin_write()?;
        let mut written = 0;
        for i in order {
            let doc = &docs[i];
            match prepared[i].take() {
                Some(Ok(collected)) => {
                    let index = self.write_document(&mut tx, doc, &collected)?;
                    trace!("{doc} -> index {index}, {} symbols", collected.len);
                    written += 1;
                }
                Some(Err(e)) => {
                    debug!("rejected {doc}: {e}");
                    results[i] = Err(e);
                }
                None => {}
            }
        }
        tx.commit()?;

        debug!("indexed {written} of {} documents", docs.len());
        Ok(results)
    }

    /// Remove a document. Returns whether it existed.
    pub fn delete(&self, id: &[u8]) -> Result<bool> {
        let records = self.buckets.records();
        let mut tx = self.store.begin_write()?;
        let Some(record) = tx.get(&records, id)?.map(Record::decode).transpose()? else {
            return Ok(false);
        };

        remove_postings(&mut tx, &self.buckets, &record)?;
        let index_bucket = self.buckets.index();
        if tx
            .delete(&index_bucket, &sorted_varint::encode(record.index))?
            .is_some()
        {
            decrement(&mut tx, &index_bucket)?;
        }
        tx.delete(&records, id)?;
        tx.delete(&self.buckets.content(), id)?;
        tx.commit()?;

        debug!("deleted document index {}", record.index);
        Ok(true)
    }

    /// Move a document to a new score without touching its positions.
    /// Returns whether it existed.
    pub fn rescore(&self, id: &[u8], score: u32) -> Result<bool> {
        let records = self.buckets.records();
        let mut tx = self.store.begin_write()?;
        let Some(buf) = tx.get(&records, id)?.map(<[u8]>::to_vec) else {
            return Ok(false);
        };
        let record = Record::decode(&buf)?;
        if record.score == score {
            return Ok(true);
        }

        let old_key = record.key().encode();
        let new_key = PostingKey::new(score, record.index).encode();
        let mut moved = 0;
        for symbol in record.posting_symbols() {
            let bucket = self.buckets.postings(symbol);
            if let Some(value) = tx.delete(&bucket, &old_key)? {
                tx.put(&bucket, &new_key, &value)?;
                moved += 1;
            }
        }
        tx.put(&records, id, &Record::with_score(&buf, score)?)?;
        tx.commit()?;

        debug!(
            "rescored index {} from {} to {score}, {moved} postings moved",
            record.index, record.score
        );
        Ok(true)
    }

    pub fn count(&self) -> Result<IndexCount> {
        let tx = self.store.begin_read()?;
        Ok(IndexCount {
            documents: tx.sequence(&self.buckets.index())?,
            watermark: tx.sequence(&self.buckets.records())?,
        })
    }

    /// Internal index and current score of a document.
    pub fn index_and_score(&self, id: &[u8]) -> Result<Option<(u64, u32)>> {
        let tx = self.store.begin_read()?;
        tx.get(&self.buckets.records(), id)?
            .map(|buf| Record::decode_key(buf).map(|key| (key.index, key.score)))
            .transpose()
    }

    /// Stored content of a document.
    pub fn content(&self, id: &[u8]) -> Result<Option<String>> {
        let tx = self.store.begin_read()?;
        read_content(&tx, &self.buckets, id)
    }

    fn write_document<W: WriteTransaction>(
        &self,
        tx: &mut W,
        doc: &IndexDocument,
        collected: &Collected,
    ) -> Result<u64> {
        let records = self.buckets.records();
        let old = tx.get(&records, &doc.id)?.map(Record::decode).transpose()?;

        let index = match old {
            Some(old) => {
                remove_postings(tx, &self.buckets, &old)?;
                old.index
            }
            None => {
                let index = tx.sequence(&records)?;
                tx.set_sequence(&records, index + 1)?;
                let index_bucket = self.buckets.index();
                tx.put(&index_bucket, &sorted_varint::encode(index), &doc.id)?;
                increment(tx, &index_bucket)?;
                index
            }
        };

        let key = PostingKey::new(doc.score, index).encode();
        add_posting(tx, &self.buckets.postings(Symbol::NONE), &key, &[])?;
        for (symbol, positions) in collected.sorted() {
            let value = codec::compress(positions);
            add_posting(tx, &self.buckets.postings(symbol), &key, &value)?;
        }

        let record = Record::new(index, doc.score, collected.positions.keys().copied().collect());
        tx.put(&records, &doc.id, &record.encode()?)?;
        tx.put(&self.buckets.content(), &doc.id, doc.content.as_bytes())?;
        Ok(index)
    }
}

/// Validate and tokenize a document outside the write transaction.
fn prepare(tokenizer: &Tokenizer, doc: &IndexDocument) -> Result<Collected> {
    if doc.id.is_empty() {
        return Err(GramdexError::invalid_argument("empty document id"));
    }
    if doc.id.len() > MAX_ID_LEN {
        return Err(GramdexError::invalid_argument(format!(
            "document id of {} bytes exceeds {MAX_ID_LEN}",
            doc.id.len()
        )));
    }
    let collected = tokenizer.collect(&doc.content);
    if collected.positions.is_empty() {
        return Err(GramdexError::invalid_argument("document has no indexable text"));
    }
    Ok(collected)
}

pub(crate) fn read_content<T: ReadTransaction>(
    tx: &T,
    buckets: &Buckets,
    id: &[u8],
) -> Result<Option<String>> {
    tx.get(&buckets.content(), id)?
        .map(|bytes| {
            String::from_utf8(bytes.to_vec())
                .map_err(|e| GramdexError::corruption(format!("stored content: {e}")))
        })
        .transpose()
}

fn add_posting<W: WriteTransaction>(tx: &mut W, bucket: &[u8], key: &[u8], value: &[u8]) -> Result<()> {
    tx.create_bucket_if_not_exists(bucket)?;
    if tx.put(bucket, key, value)?.is_none() {
        increment(tx, bucket)?;
    }
    Ok(())
}

fn remove_postings<W: WriteTransaction>(tx: &mut W, buckets: &Buckets, record: &Record) -> Result<()> {
    let key = record.key().encode();
    for symbol in record.posting_symbols() {
        let bucket = buckets.postings(symbol);
        if tx.delete(&bucket, &key)?.is_some() {
            decrement(tx, &bucket)?;
        }
    }
    Ok(())
}

fn increment<W: WriteTransaction>(tx: &mut W, bucket: &[u8]) -> Result<()> {
    let sequence = tx.sequence(bucket)?;
    tx.set_sequence(bucket, sequence + 1)
}

fn decrement<W: WriteTransaction>(tx: &mut W, bucket: &[u8]) -> Result<()> {
    let sequence = tx.sequence(bucket)?;
    tx.set_sequence(bucket, sequence.saturating_sub(1))
}
