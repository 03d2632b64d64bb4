//! Delta encoder for sorted position sets.

use super::Layout;
use super::bits::BitWriter;
use crate::util::varint;

/// One self-describing delta code: a unary-ish tag followed by a payload.
///
/// | tag   | payload | deltas        |
/// |-------|---------|---------------|
/// | `0`   | 5 bits  | 1 ..= 31      |
/// | `10`  | 10 bits | 32 ..= 1023   |
/// | `110` | 12 bits | 1024 ..= 4095 |
/// | `111` | 15 bits | 4096 ..= 32767|
///
/// A `0` tag with a zero payload is the block terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DeltaCode {
    tag: u32,
    tag_bits: u32,
    payload_bits: u32,
}

pub(crate) const SHORT: DeltaCode = DeltaCode {
    tag: 0b0,
    tag_bits: 1,
    payload_bits: 5,
};
pub(crate) const MEDIUM: DeltaCode = DeltaCode {
    tag: 0b10,
    tag_bits: 2,
    payload_bits: 10,
};
pub(crate) const LONG: DeltaCode = DeltaCode {
    tag: 0b110,
    tag_bits: 3,
    payload_bits: 12,
};
pub(crate) const WIDE: DeltaCode = DeltaCode {
    tag: 0b111,
    tag_bits: 3,
    payload_bits: 15,
};

/// Width of the shortest code; fewer unread bits than this end a block.
pub(crate) const MIN_CODE_BITS: usize = 6;

impl DeltaCode {
    /// Smallest code able to carry `delta`, or `None` when the delta needs a
    /// fresh anchor.
    pub(crate) fn for_delta(delta: u16) -> Option<DeltaCode> {
        match delta {
            0..32 => Some(SHORT),
            32..1024 => Some(MEDIUM),
            1024..4096 => Some(LONG),
            4096..32768 => Some(WIDE),
            _ => None,
        }
    }

    pub(crate) fn payload_bits(&self) -> u32 {
        self.payload_bits
    }

    pub(crate) fn width(&self) -> usize {
        (self.tag_bits + self.payload_bits) as usize
    }

    fn write(&self, writer: &mut BitWriter, out: &mut Vec<u8>, delta: u16) {
        writer.write(out, self.tag, self.tag_bits);
        writer.write(out, delta as u32, self.payload_bits);
    }
}

/// Sort, dedupe and encode `values` under `layout`.
pub(crate) fn compress(layout: Layout, values: &[u16]) -> Vec<u8> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut out = Vec::new();
    let Some((&first, rest)) = sorted.split_first() else {
        return out;
    };

    match layout {
        Layout::Fixed(block_size) => encode_fixed(&mut out, block_size, first, rest),
        Layout::Unbounded => encode_unbounded(&mut out, first, rest),
    }
    out
}

fn encode_fixed(out: &mut Vec<u8>, block_size: usize, first: u16, rest: &[u16]) {
    let budget = block_size * 8 - 16;
    let mut block_start = 0;
    let mut writer = BitWriter::new();
    let mut prev = first;
    out.extend_from_slice(&first.to_be_bytes());

    for &v in rest {
        let delta = v - prev;
        match DeltaCode::for_delta(delta) {
            Some(code) if writer.len() + code.width() <= budget => {
                code.write(&mut writer, out, delta);
            }
            _ => {
                writer.flush(out);
                out.resize(block_start + block_size, 0);
                block_start = out.len();
                out.extend_from_slice(&v.to_be_bytes());
            }
        }
        prev = v;
    }
    writer.flush(out);
}

fn encode_unbounded(out: &mut Vec<u8>, first: u16, rest: &[u16]) {
    let mut writer = BitWriter::new();
    let mut prev = first;
    varint::append_u64(out, first as u64);

    for &v in rest {
        let delta = v - prev;
        match DeltaCode::for_delta(delta) {
            Some(code) => code.write(&mut writer, out, delta),
            None => {
                // Explicit terminator, then a byte-aligned varint anchor.
                SHORT.write(&mut writer, out, 0);
                writer.flush(out);
                varint::append_u64(out, v as u64);
            }
        }
        prev = v;
    }
    writer.flush(out);
}
