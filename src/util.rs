//! Shared byte-level helpers used by the codec, record and key layers.

pub mod sorted_varint;
pub mod varint;
