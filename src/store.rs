//! The ordered key-value store seam.
//!
//! The index keeps everything in named buckets of an ordered, transactional
//! key-value store. Writers run one at a time in [`WriteTransaction`]s;
//! readers work on a consistent snapshot for the lifetime of their
//! [`ReadTransaction`]. The index itself takes no locks.
//!
//! [`MemoryStore`] is the in-process implementation. Other stores plug in by
//! implementing the four traits below.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::Result;

/// A transactional store of named, ordered buckets.
pub trait KvStore: Send + Sync {
    type Read<'s>: ReadTransaction
    where
        Self: 's;
    type Write<'s>: WriteTransaction
    where
        Self: 's;

    /// Open a read-only snapshot.
    fn begin_read(&self) -> Result<Self::Read<'_>>;

    /// Open the write transaction, waiting for any other writer to finish.
    fn begin_write(&self) -> Result<Self::Write<'_>>;
}

/// Read access shared by both transaction kinds.
pub trait ReadTransaction {
    type Cursor<'t>: BucketCursor
    where
        Self: 't;

    fn get(&self, bucket: &[u8], key: &[u8]) -> Result<Option<&[u8]>>;

    /// The bucket's sequence counter, 0 for a missing bucket.
    fn sequence(&self, bucket: &[u8]) -> Result<u64>;

    /// A cursor over `bucket`, or `None` when the bucket does not exist.
    fn cursor(&self, bucket: &[u8]) -> Result<Option<Self::Cursor<'_>>>;
}

/// A write transaction. Dropping it without [`commit`](Self::commit) rolls
/// every change back.
pub trait WriteTransaction: ReadTransaction {
    fn create_bucket_if_not_exists(&mut self, bucket: &[u8]) -> Result<()>;

    /// Store `value` under `key`, returning the previous value. The bucket
    /// must exist.
    fn put(&mut self, bucket: &[u8], key: &[u8], value: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Remove `key`, returning its value. Missing buckets or keys are not an
    /// error.
    fn delete(&mut self, bucket: &[u8], key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn set_sequence(&mut self, bucket: &[u8], sequence: u64) -> Result<()>;

    fn commit(self) -> Result<()>
    where
        Self: Sized;
}

/// An ordered cursor over one bucket.
///
/// Movement methods return whether the cursor is positioned on an entry
/// afterwards; once a move fails the cursor is exhausted until the next
/// `seek` or `last`.
pub trait BucketCursor {
    /// Position on the first key `>= key`.
    fn seek(&mut self, key: &[u8]) -> bool;

    /// Position on the largest key.
    fn last(&mut self) -> bool;

    /// Step to the previous key.
    fn prev(&mut self) -> bool;

    /// Step to the previous key only if it sits on the same storage page.
    /// `None` means the hint is unavailable and the position is unchanged.
    fn prev_in_page(&mut self) -> Option<bool> {
        None
    }

    fn key(&self) -> Option<&[u8]>;

    fn value(&self) -> Option<&[u8]>;
}
