//! The trace chain array: one fixed-stride entry per page-access trace
//! segment.

use scroll::{Pread, Pwrite, SizeWith};

use crate::prefetch::primitive::slice;
use crate::error::{Error, Result};

/// Stride of one trace-chain entry, in bytes (same across all versions).
pub const TRACE_CHAIN_STRIDE: usize = 12;

const END_OF_CHAIN: u32 = 0xFFFF_FFFF;

/// One decoded trace-chain entry. Fixed layout across all versions, so it is
/// read directly with `scroll`'s derive rather than field by field.
#[repr(C)]
#[derive(Debug, Default, PartialEq, Clone, Copy)]
#[derive(Pread, Pwrite, SizeWith)]
pub struct TraceChainEntry {
    pub next_table_index: u32,
    pub block_load_count: u32,
    pub unknown1: u8,
    pub unknown2: u8,
    pub unknown3: u16,
}

impl TraceChainEntry {
    pub fn is_end_of_chain(&self) -> bool {
        self.next_table_index == END_OF_CHAIN
    }
}

/// Decode `count` entries starting at byte 0 of `bytes` (the caller has
/// already sliced the section out of the file).
pub(crate) fn parse_all(bytes: &[u8], count: usize) -> Result<Vec<TraceChainEntry>> {
    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let entry = slice(
            bytes,
            "trace_chain_array.entry",
            i * TRACE_CHAIN_STRIDE,
            TRACE_CHAIN_STRIDE,
        )?;
        let parsed: TraceChainEntry = entry
            .pread_with(0, scroll::LE)
            .map_err(Error::from)?;
        entries.push(parsed);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_entry() {
        let mut buf = vec![0u8; 12];
        buf[0..4].copy_from_slice(&END_OF_CHAIN.to_le_bytes());
        buf[4..8].copy_from_slice(&3u32.to_le_bytes());
        buf[8] = 1;
        buf[9] = 2;
        buf[10..12].copy_from_slice(&0x1234u16.to_le_bytes());

        let entries = parse_all(&buf, 1).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_end_of_chain());
        assert_eq!(entries[0].block_load_count, 3);
        assert_eq!(entries[0].unknown1, 1);
        assert_eq!(entries[0].unknown2, 2);
        assert_eq!(entries[0].unknown3, 0x1234);
    }

    #[test]
    fn rejects_truncated_array() {
        let buf = vec![0u8; 8];
        let err = parse_all(&buf, 1).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::OutOfBounds {
                what: "trace_chain_array.entry",
                ..
            }
        ));
    }
}
