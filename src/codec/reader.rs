//! Resumable decoding and block-granular membership queries.

use byteorder::{BigEndian, ByteOrder};

use super::Layout;
use super::bits::BitReader;
use super::encoder::{LONG, MEDIUM, MIN_CODE_BITS, SHORT, WIDE};
use crate::error::{GramdexError, Result};
use crate::util::varint;

/// Linear steps [`PositionReader::forward_to`] tries before re-seeking.
pub const DEFAULT_FAST_STEPS: usize = 4;

/// Read the next delta of a block. `Ok(None)` means the block ended, either
/// on a terminator code or because too few bits remain for any code.
fn next_delta(bits: &mut BitReader<'_>) -> Result<Option<u16>> {
    if bits.remaining() < MIN_CODE_BITS {
        if bits.rest_is_zero() {
            return Ok(None);
        }
        return Err(GramdexError::corruption("truncated delta code"));
    }

    let code = if bits.read(1) == Some(0) {
        SHORT
    } else if bits.read(1).ok_or_else(truncated)? == 0 {
        MEDIUM
    } else if bits.read(1).ok_or_else(truncated)? == 0 {
        LONG
    } else {
        WIDE
    };

    let delta = bits.read(code.payload_bits()).ok_or_else(truncated)? as u16;
    if delta != 0 {
        return Ok(Some(delta));
    }
    if code == SHORT {
        Ok(None)
    } else {
        Err(GramdexError::corruption("zero delta in a long code"))
    }
}

fn truncated() -> GramdexError {
    GramdexError::corruption("truncated delta code")
}

/// Anchor of fixed block `index`, if the block holds one.
fn anchor_at(data: &[u8], block_size: usize, index: usize) -> Option<u16> {
    let start = index * block_size;
    data.get(start..start + 2).map(BigEndian::read_u16)
}

/// Index of the last fixed block whose anchor is `<= target`.
///
/// Anchors are absolute and ascending, so they binary-search directly.
pub(crate) fn find_block(data: &[u8], block_size: usize, target: u16) -> Option<usize> {
    let mut lo = 0;
    let mut hi = data.len().div_ceil(block_size);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if anchor_at(data, block_size, mid).is_some_and(|a| a <= target) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo.checked_sub(1)
}

/// A resumable decode cursor over an encoded position set.
///
/// The reader is positioned on the smallest value after construction.
/// [`advance`](Self::advance) steps one value forward;
/// [`forward_to`](Self::forward_to) skips ahead, trying a few linear steps
/// before falling back to an anchor binary search, so the short forward
/// jumps typical of phrase verification stay cheap.
///
/// Damaged input ends iteration early; use [`super::decode`] to surface it.
#[derive(Debug, Clone)]
pub struct PositionReader<'a> {
    data: &'a [u8],
    layout: Layout,
    /// Start of the block being decoded.
    block_start: usize,
    /// Where the code stream of the current block begins (after its anchor).
    stream_start: usize,
    bits: BitReader<'a>,
    current: Option<u16>,
    exhausted: bool,
    fast_steps: usize,
}

impl<'a> PositionReader<'a> {
    /// Reader over the default fixed-block layout.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_layout(data, Layout::default())
    }

    pub fn with_layout(data: &'a [u8], layout: Layout) -> Self {
        let mut reader = Self::unprimed(data, layout);
        reader.advance();
        reader
    }

    /// Override how many linear steps `forward_to` attempts.
    pub fn with_fast_steps(mut self, fast_steps: usize) -> Self {
        self.fast_steps = fast_steps;
        self
    }

    pub(crate) fn unprimed(data: &'a [u8], layout: Layout) -> Self {
        Self {
            data,
            layout: layout.normalized(),
            block_start: 0,
            stream_start: 0,
            bits: BitReader::new(&[]),
            current: None,
            exhausted: false,
            fast_steps: DEFAULT_FAST_STEPS,
        }
    }

    /// The value the reader is positioned on, `None` once exhausted.
    pub fn current(&self) -> Option<u16> {
        self.current
    }

    /// Step to the next value.
    pub fn advance(&mut self) -> Option<u16> {
        match self.try_advance() {
            Ok(v) => v,
            Err(e) => {
                log::trace!("position stream ended on damaged input: {e}");
                self.finish();
                None
            }
        }
    }

    /// Step to the next value, reporting damaged input.
    pub fn try_advance(&mut self) -> Result<Option<u16>> {
        if self.exhausted {
            return Ok(None);
        }
        let next = match self.current {
            None => self.open_block(0)?,
            Some(v) => match next_delta(&mut self.bits)? {
                Some(delta) => Some(v.checked_add(delta).ok_or_else(|| {
                    GramdexError::corruption(format!("position overflow: {v} + {delta}"))
                })?),
                None => {
                    if matches!(self.layout, Layout::Fixed(_)) && !self.bits.rest_is_zero() {
                        return Err(GramdexError::corruption("non-zero block padding"));
                    }
                    let next_block = self.next_block_offset();
                    self.open_block(next_block)?
                }
            },
        };
        match next {
            Some(v) => self.current = Some(v),
            None => self.finish(),
        }
        Ok(next)
    }

    /// Move to the first value `>= target` and return it.
    pub fn forward_to(&mut self, target: u16) -> Option<u16> {
        for _ in 0..self.fast_steps {
            match self.current {
                Some(v) if v < target => {
                    self.advance();
                }
                other => return other,
            }
        }
        if self.current? >= target {
            return self.current;
        }

        if let Layout::Fixed(block_size) = self.layout
            && let Some(block) = find_block(self.data, block_size, target)
        {
            let offset = block * block_size;
            if offset > self.block_start {
                match self.open_block(offset) {
                    Ok(Some(anchor)) => self.current = Some(anchor),
                    _ => {
                        self.finish();
                        return None;
                    }
                }
            }
        }

        while self.current? < target {
            self.advance();
        }
        self.current
    }

    fn finish(&mut self) {
        self.exhausted = true;
        self.current = None;
    }

    fn next_block_offset(&self) -> usize {
        match self.layout {
            Layout::Fixed(block_size) => self.block_start + block_size,
            Layout::Unbounded => self.stream_start + self.bits.byte_pos_ceil(),
        }
    }

    /// Position on the block at `offset` and return its anchor.
    fn open_block(&mut self, offset: usize) -> Result<Option<u16>> {
        if offset >= self.data.len() {
            return Ok(None);
        }

        let (anchor, stream_start, end) = match self.layout {
            Layout::Fixed(block_size) => {
                let end = (offset + block_size).min(self.data.len());
                if end - offset < 2 {
                    return Err(GramdexError::corruption("block too short for its anchor"));
                }
                let anchor = BigEndian::read_u16(&self.data[offset..offset + 2]);
                (anchor, offset + 2, end)
            }
            Layout::Unbounded => {
                let (anchor, width) = varint::decode_u64(&self.data[offset..])?;
                let anchor = u16::try_from(anchor)
                    .map_err(|_| GramdexError::corruption(format!("anchor {anchor} exceeds u16")))?;
                (anchor, offset + width, self.data.len())
            }
        };

        if let Some(prev) = self.current
            && anchor <= prev
        {
            return Err(GramdexError::corruption(format!(
                "anchor {anchor} does not follow {prev}"
            )));
        }

        self.block_start = offset;
        self.stream_start = stream_start;
        self.bits = BitReader::new(&self.data[stream_start..end]);
        Ok(Some(anchor))
    }
}

impl Iterator for PositionReader<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        let v = self.current?;
        self.advance();
        Some(v)
    }
}

/// Whether any encoded value lies in `[lo, hi]` (fixed layout).
pub(crate) fn range_contains_fixed(data: &[u8], block_size: usize, lo: u16, hi: u16) -> bool {
    if lo > hi {
        return false;
    }
    let Some(block) = find_block(data, block_size, hi) else {
        return false;
    };
    let start = block * block_size;
    let end = (start + block_size).min(data.len());
    // Values of earlier blocks sit below this anchor and later anchors exceed
    // `hi`, so only this block can hold a match.
    PositionReader::with_layout(&data[start..end], Layout::Fixed(block_size))
        .find(|&v| v >= lo)
        .is_some_and(|v| v <= hi)
}

/// Linear variant for the unbounded layout.
pub(crate) fn range_contains_linear(data: &[u8], lo: u16, hi: u16) -> bool {
    if lo > hi {
        return false;
    }
    PositionReader::with_layout(data, Layout::Unbounded)
        .find(|&v| v >= lo)
        .is_some_and(|v| v <= hi)
}
