//! In-memory implementation of the store seam.
//!
//! Committed state is an immutable map of buckets behind an `Arc`. Readers
//! clone that `Arc` and never block. The single writer works on a private
//! copy whose buckets are cloned lazily on first modification, and publishes
//! it on commit.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};

use super::{BucketCursor, KvStore, ReadTransaction, WriteTransaction};
use crate::error::{GramdexError, Result};

type BucketMap = BTreeMap<Vec<u8>, Arc<Bucket>>;

#[derive(Debug, Default, Clone)]
struct Bucket {
    sequence: u64,
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

/// A single-writer, multi-reader store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Arc<BucketMap>>,
    writer: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in a committed bucket.
    pub fn bucket_len(&self, bucket: &[u8]) -> Option<usize> {
        self.state.read().get(bucket).map(|b| b.entries.len())
    }

    /// Names of all committed buckets.
    pub fn bucket_names(&self) -> Vec<Vec<u8>> {
        self.state.read().keys().cloned().collect()
    }
}

impl KvStore for MemoryStore {
    type Read<'s> = MemoryRead;
    type Write<'s> = MemoryWrite<'s>;

    fn begin_read(&self) -> Result<MemoryRead> {
        Ok(MemoryRead {
            snapshot: Arc::clone(&self.state.read()),
        })
    }

    fn begin_write(&self) -> Result<MemoryWrite<'_>> {
        let guard = self.writer.lock();
        let working = BucketMap::clone(&self.state.read());
        Ok(MemoryWrite {
            store: self,
            _guard: guard,
            working,
        })
    }
}

/// A read snapshot of a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryRead {
    snapshot: Arc<BucketMap>,
}

impl ReadTransaction for MemoryRead {
    type Cursor<'t> = MemoryCursor<'t>;

    fn get(&self, bucket: &[u8], key: &[u8]) -> Result<Option<&[u8]>> {
        Ok(lookup(&self.snapshot, bucket, key))
    }

    fn sequence(&self, bucket: &[u8]) -> Result<u64> {
        Ok(self.snapshot.get(bucket).map_or(0, |b| b.sequence))
    }

    fn cursor(&self, bucket: &[u8]) -> Result<Option<MemoryCursor<'_>>> {
        Ok(self.snapshot.get(bucket).map(|b| MemoryCursor::new(&b.entries)))
    }
}

/// The write transaction of a [`MemoryStore`]. Holds the writer lock until
/// committed or dropped.
#[derive(Debug)]
pub struct MemoryWrite<'s> {
    store: &'s MemoryStore,
    _guard: MutexGuard<'s, ()>,
    working: BucketMap,
}

impl MemoryWrite<'_> {
    fn bucket_mut(&mut self, bucket: &[u8]) -> Result<&mut Bucket> {
        self.working
            .get_mut(bucket)
            .map(Arc::make_mut)
            .ok_or_else(|| {
                GramdexError::storage(format!(
                    "bucket {} does not exist",
                    String::from_utf8_lossy(bucket)
                ))
            })
    }
}

impl ReadTransaction for MemoryWrite<'_> {
    type Cursor<'t>
        = MemoryCursor<'t>
    where
        Self: 't;

    fn get(&self, bucket: &[u8], key: &[u8]) -> Result<Option<&[u8]>> {
        Ok(lookup(&self.working, bucket, key))
    }

    fn sequence(&self, bucket: &[u8]) -> Result<u64> {
        Ok(self.working.get(bucket).map_or(0, |b| b.sequence))
    }

    fn cursor(&self, bucket: &[u8]) -> Result<Option<MemoryCursor<'_>>> {
        Ok(self.working.get(bucket).map(|b| MemoryCursor::new(&b.entries)))
    }
}

impl WriteTransaction for MemoryWrite<'_> {
    fn create_bucket_if_not_exists(&mut self, bucket: &[u8]) -> Result<()> {
        self.working.entry(bucket.to_vec()).or_default();
        Ok(())
    }

    fn put(&mut self, bucket: &[u8], key: &[u8], value: &[u8]) -> Result<Option<Vec<u8>>> {
        if key.is_empty() {
            return Err(GramdexError::storage("empty key"));
        }
        let bucket = self.bucket_mut(bucket)?;
        Ok(bucket.entries.insert(key.to_vec(), value.to_vec()))
    }

    fn delete(&mut self, bucket: &[u8], key: &[u8]) -> Result<Option<Vec<u8>>> {
        let Some(shared) = self.working.get_mut(bucket) else {
            return Ok(None);
        };
        if !shared.entries.contains_key(key) {
            return Ok(None);
        }
        Ok(Arc::make_mut(shared).entries.remove(key))
    }

    fn set_sequence(&mut self, bucket: &[u8], sequence: u64) -> Result<()> {
        self.bucket_mut(bucket)?.sequence = sequence;
        Ok(())
    }

    fn commit(self) -> Result<()> {
        *self.store.state.write() = Arc::new(self.working);
        Ok(())
    }
}

fn lookup<'a>(buckets: &'a BucketMap, bucket: &[u8], key: &[u8]) -> Option<&'a [u8]> {
    buckets
        .get(bucket)
        .and_then(|b| b.entries.get(key))
        .map(Vec::as_slice)
}

/// Cursor over one bucket of a snapshot.
#[derive(Debug, Clone)]
pub struct MemoryCursor<'t> {
    entries: &'t BTreeMap<Vec<u8>, Vec<u8>>,
    current: Option<(&'t [u8], &'t [u8])>,
}

impl<'t> MemoryCursor<'t> {
    fn new(entries: &'t BTreeMap<Vec<u8>, Vec<u8>>) -> Self {
        Self {
            entries,
            current: None,
        }
    }

    fn set(&mut self, entry: Option<(&'t Vec<u8>, &'t Vec<u8>)>) -> bool {
        self.current = entry.map(|(k, v)| (k.as_slice(), v.as_slice()));
        self.current.is_some()
    }
}

impl BucketCursor for MemoryCursor<'_> {
    fn seek(&mut self, key: &[u8]) -> bool {
        let entry = self
            .entries
            .range::<[u8], _>((Bound::Included(key), Bound::Unbounded))
            .next();
        self.set(entry)
    }

    fn last(&mut self) -> bool {
        let entry = self.entries.iter().next_back();
        self.set(entry)
    }

    fn prev(&mut self) -> bool {
        let Some((key, _)) = self.current else {
            return false;
        };
        let entry = self
            .entries
            .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(key)))
            .next_back();
        self.set(entry)
    }

    /// Everything lives on one page.
    fn prev_in_page(&mut self) -> Option<bool> {
        Some(self.prev())
    }

    fn key(&self) -> Option<&[u8]> {
        self.current.map(|(k, _)| k)
    }

    fn value(&self) -> Option<&[u8]> {
        self.current.map(|(_, v)| v)
    }
}
