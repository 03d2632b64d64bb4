//! MSB-first bit packing used by the delta stream.

/// Accumulates codes most-significant bit first and appends whole bytes to
/// an output buffer on flush. Unused low bits of the final byte are zero.
#[derive(Debug, Default)]
pub(crate) struct BitWriter {
    acc: u64,
    pending: u32,
    written: usize,
}

impl BitWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Bits written since construction, including those already flushed.
    pub(crate) fn len(&self) -> usize {
        self.written + self.pending as usize
    }

    /// Append the low `width` bits of `value`. `width` must be at most 32.
    pub(crate) fn write(&mut self, out: &mut Vec<u8>, value: u32, width: u32) {
        debug_assert!(width <= 32);
        let mask = if width == 32 { u32::MAX } else { (1u32 << width) - 1 };
        self.acc = (self.acc << width) | (value & mask) as u64;
        self.pending += width;
        while self.pending >= 8 {
            self.pending -= 8;
            out.push((self.acc >> self.pending) as u8);
            self.written += 8;
        }
    }

    /// Emit the partial trailing byte, zero padded, and reset.
    pub(crate) fn flush(&mut self, out: &mut Vec<u8>) {
        if self.pending > 0 {
            out.push((self.acc << (8 - self.pending)) as u8);
        }
        *self = Self::new();
    }
}

/// Reads MSB-first bit fields from a byte slice.
#[derive(Debug, Clone)]
pub(crate) struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    /// Byte offset of the first byte not yet (fully or partially) consumed.
    pub(crate) fn byte_pos_ceil(&self) -> usize {
        self.pos.div_ceil(8)
    }

    pub(crate) fn read(&mut self, width: u32) -> Option<u32> {
        if width as usize > self.remaining() {
            return None;
        }
        let mut value = 0u32;
        let mut left = width;
        while left > 0 {
            let byte = self.data[self.pos / 8];
            let offset = (self.pos % 8) as u32;
            let take = left.min(8 - offset);
            let chunk = (byte >> (8 - offset - take)) & ((1u16 << take) - 1) as u8;
            value = (value << take) | chunk as u32;
            self.pos += take as usize;
            left -= take;
        }
        Some(value)
    }

    /// True when every unread bit is zero.
    pub(crate) fn rest_is_zero(&self) -> bool {
        let mut probe = self.clone();
        while probe.remaining() > 0 {
            let width = probe.remaining().min(8) as u32;
            if probe.read(width) != Some(0) {
                return false;
            }
        }
        true
    }
}
