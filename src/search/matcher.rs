//! Positional verification of segments.
//!
//! Once every cursor sits on the same posting key, each segment is checked
//! against the position lists of its symbols. The first symbol anchors the
//! segment; symbol `i` is then expected at `anchor + i`, within `distance`
//! positions, and up to `misses` symbols may be absent.

use serde::Serialize;

use crate::codec::PositionReader;

/// Drift and miss allowance of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tolerance {
    pub distance: u16,
    pub misses: usize,
}

impl Tolerance {
    pub const EXACT: Tolerance = Tolerance {
        distance: 0,
        misses: 0,
    };

    /// Tolerance for a segment of `len` symbols. Phrases and short segments
    /// match exactly; misses never exceed half the segment.
    pub fn for_segment(
        len: usize,
        phrase: bool,
        exact_segment_len: usize,
        distance: u16,
        misses: usize,
    ) -> Self {
        if phrase || len <= exact_segment_len {
            return Self::EXACT;
        }
        Self {
            distance,
            misses: misses.min(len / 2),
        }
    }
}

/// Symbol positions `[start, end)` a segment matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchSpan {
    pub start: u16,
    pub end: u16,
}

/// Verify one segment. `postings[i]` is the encoded position list of the
/// segment's `i`-th symbol. Returns the span of the first qualifying anchor
/// and adds every tolerated or fatal miss to `missed`.
pub fn match_segment(
    postings: &[&[u8]],
    tolerance: Tolerance,
    fast_steps: usize,
    missed: &mut u64,
) -> Option<MatchSpan> {
    let (anchor, rest) = postings.split_first()?;
    let mut readers: Vec<PositionReader<'_>> = rest
        .iter()
        .map(|p| PositionReader::new(p).with_fast_steps(fast_steps))
        .collect();
    let span_len = postings.len() as u32;

    for start in PositionReader::new(anchor) {
        let mut misses = 0;
        for (offset, reader) in (1u32..).zip(readers.iter_mut()) {
            let expected = start as u32 + offset;
            let lo = expected.saturating_sub(tolerance.distance as u32);
            let hi = expected + tolerance.distance as u32;
            let found = lo <= u16::MAX as u32
                && reader
                    .forward_to(lo as u16)
                    .is_some_and(|p| (p as u32) <= hi);
            if !found {
                misses += 1;
                *missed += 1;
                if misses > tolerance.misses {
                    break;
                }
            }
        }
        if misses <= tolerance.misses {
            let end = (start as u32 + span_len).min(u16::MAX as u32) as u16;
            return Some(MatchSpan { start, end });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::compress;

    fn run(lists: &[&[u16]], tolerance: Tolerance) -> Option<MatchSpan> {
        let encoded: Vec<Vec<u8>> = lists.iter().map(|l| compress(l)).collect();
        let postings: Vec<&[u8]> = encoded.iter().map(Vec::as_slice).collect();
        let mut missed = 0;
        match_segment(&postings, tolerance, 4, &mut missed)
    }

    #[test]
    fn test_exact_adjacency() {
        // "cdef" against "abcdefg": cde at 2, def at 3.
        assert_eq!(
            run(&[&[2], &[3]], Tolerance::EXACT),
            Some(MatchSpan { start: 2, end: 4 })
        );
        assert_eq!(run(&[&[2], &[4]], Tolerance::EXACT), None);
        assert_eq!(run(&[&[3], &[2]], Tolerance::EXACT), None);
    }

    #[test]
    fn test_first_qualifying_anchor_wins() {
        let span = run(&[&[1, 10, 20], &[11, 21], &[12, 22]], Tolerance::EXACT);
        assert_eq!(span, Some(MatchSpan { start: 10, end: 13 }));
    }

    #[test]
    fn test_fuzzy_distance_and_misses() {
        let tolerance = Tolerance {
            distance: 2,
            misses: 1,
        };
        // Second symbol drifted by two, third missing entirely.
        assert!(run(&[&[5], &[8], &[40]], tolerance).is_some());
        // Two symbols missing exceeds the allowance.
        assert!(run(&[&[5], &[30], &[40]], tolerance).is_none());
        // Drift of three is too far.
        assert!(run(&[&[5], &[9], &[7]], tolerance).is_some());
        assert!(run(&[&[5], &[9], &[11]], tolerance).is_none());
    }

    #[test]
    fn test_tolerance_rules() {
        assert_eq!(Tolerance::for_segment(4, false, 4, 2, 2), Tolerance::EXACT);
        assert_eq!(Tolerance::for_segment(9, true, 4, 2, 2), Tolerance::EXACT);
        assert_eq!(
            Tolerance::for_segment(5, false, 4, 2, 9),
            Tolerance {
                distance: 2,
                misses: 2
            }
        );
    }

    #[test]
    fn test_single_symbol_and_edges() {
        assert_eq!(
            run(&[&[7, 9]], Tolerance::EXACT),
            Some(MatchSpan { start: 7, end: 8 })
        );
        assert_eq!(run(&[&[u16::MAX], &[0]], Tolerance::EXACT), None);
        let mut missed = 0;
        assert_eq!(match_segment(&[], Tolerance::EXACT, 4, &mut missed), None);
    }
}
