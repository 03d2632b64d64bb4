//! The switch-head cursor merge.
//!
//! One descending cursor per distinct symbol. The head cursor proposes a
//! candidate key; every other cursor is brought down to it. A cursor that
//! lands below the head becomes the new head and the round starts over,
//! since no key above it can be common to all cursors. Once all cursors
//! agree, the caller verifies positions and decides whether to go on.

use std::cmp::Ordering;
use std::time::Instant;

use log::trace;

use crate::store::BucketCursor;

/// What the caller wants after seeing an aligned key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Why a merge ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A cursor ran out of keys.
    Exhausted,
    /// The caller stopped it.
    Stopped,
    /// The deadline passed.
    TimedOut,
}

/// Cursor traffic of one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub seeks: u64,
    pub scans: u64,
    pub switch_head: u64,
    pub fast_switch_head: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct MergeOptions {
    pub fast_steps: usize,
    pub poll_interval: usize,
    pub deadline: Option<Instant>,
}

enum Align {
    Equal,
    Behind { fast: bool },
    Exhausted,
}

/// Place a fresh cursor on the largest key `<= resume`, or on the last key.
pub fn position<C: BucketCursor>(cursor: &mut C, resume: Option<&[u8]>) -> bool {
    let Some(resume) = resume else {
        return cursor.last();
    };
    if !cursor.seek(resume) {
        return cursor.last();
    }
    if cursor.key() == Some(resume) {
        return true;
    }
    cursor.prev()
}

/// Walk `cursors` (already positioned) in descending key order, calling
/// `on_aligned` with the common key whenever all of them agree.
pub fn merge<C, F>(
    cursors: &mut [C],
    options: MergeOptions,
    stats: &mut MergeStats,
    mut on_aligned: F,
) -> Outcome
where
    C: BucketCursor,
    F: FnMut(&[u8], &[C]) -> Flow,
{
    if cursors.is_empty() {
        return Outcome::Exhausted;
    }
    let poll_interval = options.poll_interval.max(1);
    let mut ticks = 0usize;
    let mut head = 0;
    let mut head_key: Vec<u8> = Vec::new();

    loop {
        let Some(key) = cursors[head].key() else {
            return Outcome::Exhausted;
        };
        head_key.clear();
        head_key.extend_from_slice(key);

        let mut i = 0;
        while i < cursors.len() {
            ticks += 1;
            if ticks % poll_interval == 0
                && options.deadline.is_some_and(|deadline| Instant::now() >= deadline)
            {
                return Outcome::TimedOut;
            }
            if i == head {
                i += 1;
                continue;
            }
            match align(&mut cursors[i], &head_key, options.fast_steps, stats) {
                Align::Equal => i += 1,
                Align::Behind { fast } => {
                    stats.switch_head += 1;
                    if fast {
                        stats.fast_switch_head += 1;
                    }
                    head = i;
                    let Some(key) = cursors[head].key() else {
                        return Outcome::Exhausted;
                    };
                    head_key.clear();
                    head_key.extend_from_slice(key);
                    i = 0;
                }
                Align::Exhausted => return Outcome::Exhausted,
            }
        }

        trace!("aligned {} cursors", cursors.len());
        if on_aligned(&head_key, cursors) == Flow::Stop {
            return Outcome::Stopped;
        }

        for cursor in cursors.iter_mut() {
            stats.scans += 1;
            if !cursor.prev() {
                return Outcome::Exhausted;
            }
        }
    }
}

/// Bring `cursor` to `head` or below it.
fn align<C: BucketCursor>(
    cursor: &mut C,
    head: &[u8],
    fast_steps: usize,
    stats: &mut MergeStats,
) -> Align {
    match compare(cursor, head) {
        Some(Ordering::Equal) => return Align::Equal,
        Some(Ordering::Less) => return Align::Behind { fast: false },
        Some(Ordering::Greater) => {}
        None => return Align::Exhausted,
    }

    for _ in 0..fast_steps {
        match cursor.prev_in_page() {
            None => break,
            Some(false) => return Align::Exhausted,
            Some(true) => {
                stats.scans += 1;
                match compare(cursor, head) {
                    Some(Ordering::Equal) => return Align::Equal,
                    Some(Ordering::Less) => return Align::Behind { fast: true },
                    Some(Ordering::Greater) => {}
                    None => return Align::Exhausted,
                }
            }
        }
    }

    stats.seeks += 1;
    if !cursor.seek(head) {
        // Every key sits below the head.
        return if cursor.last() {
            Align::Behind { fast: false }
        } else {
            Align::Exhausted
        };
    }
    if compare(cursor, head) == Some(Ordering::Equal) {
        return Align::Equal;
    }
    if cursor.prev() {
        Align::Behind { fast: false }
    } else {
        Align::Exhausted
    }
}

fn compare<C: BucketCursor>(cursor: &C, head: &[u8]) -> Option<Ordering> {
    cursor.key().map(|key| key.cmp(head))
}
