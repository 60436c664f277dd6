//! The metrics array: one fixed-stride entry per file referenced during the
//! traced launch.

use crate::prefetch::primitive::{read_u32le, read_u64le, slice};
use crate::prefetch::version::Version;
use crate::prefetch::volume::FileRef;
use crate::error::Result;

/// One decoded metrics-array entry. Retained as a convenience; the base
/// profile only requires that the array's bounds and stride be validated.
#[derive(Debug, Clone)]
pub struct MetricsEntry {
    pub start_time_ms: u32,
    pub duration_ms: u32,
    /// v23/v26 only.
    pub average_duration_ms: Option<u32>,
    pub filename_string_offset: u32,
    pub filename_chars: u32,
    pub flags: u32,
    /// v23/v26 only; `None` both when the version lacks the field and when
    /// the raw value is the all-zero "absent" sentinel.
    pub file_reference: Option<FileRef>,
}

/// Decode `count` entries of `version`'s stride, starting at byte 0 of
/// `bytes` (the caller has already sliced the section out of the file).
pub(crate) fn parse_all(bytes: &[u8], version: Version, count: usize) -> Result<Vec<MetricsEntry>> {
    let stride = version.metrics_stride();
    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let entry = slice(bytes, "metrics_array.entry", i * stride, stride)?;
        entries.push(parse_one(entry, version)?);
    }
    Ok(entries)
}

fn parse_one(entry: &[u8], version: Version) -> Result<MetricsEntry> {
    let start_time_ms = read_u32le(entry, "metrics.start_time_ms", 0)?;
    let duration_ms = read_u32le(entry, "metrics.duration_ms", 4)?;

    if version.has_extended_metrics() {
        let average_duration_ms = read_u32le(entry, "metrics.average_duration_ms", 8)?;
        let filename_string_offset = read_u32le(entry, "metrics.filename_string_offset", 12)?;
        let filename_chars = read_u32le(entry, "metrics.filename_chars", 16)?;
        let flags = read_u32le(entry, "metrics.flags", 20)?;
        let raw_file_reference = read_u64le(entry, "metrics.file_reference", 24)?;
        Ok(MetricsEntry {
            start_time_ms,
            duration_ms,
            average_duration_ms: Some(average_duration_ms),
            filename_string_offset,
            filename_chars,
            flags,
            file_reference: FileRef::from_raw(raw_file_reference),
        })
    } else {
        let filename_string_offset = read_u32le(entry, "metrics.filename_string_offset", 8)?;
        let filename_chars = read_u32le(entry, "metrics.filename_chars", 12)?;
        let flags = read_u32le(entry, "metrics.flags", 16)?;
        Ok(MetricsEntry {
            start_time_ms,
            duration_ms,
            average_duration_ms: None,
            filename_string_offset,
            filename_chars,
            flags,
            file_reference: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_v17_stride() {
        let mut buf = vec![0u8; 20];
        buf[0..4].copy_from_slice(&10u32.to_le_bytes());
        buf[4..8].copy_from_slice(&20u32.to_le_bytes());
        buf[8..12].copy_from_slice(&0x40u32.to_le_bytes());
        buf[12..16].copy_from_slice(&8u32.to_le_bytes());
        buf[16..20].copy_from_slice(&1u32.to_le_bytes());

        let entries = parse_all(&buf, Version::V17, 1).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].start_time_ms, 10);
        assert_eq!(entries[0].duration_ms, 20);
        assert_eq!(entries[0].average_duration_ms, None);
        assert_eq!(entries[0].file_reference, None);
    }

    #[test]
    fn parses_v23_stride_with_file_reference() {
        let mut buf = vec![0u8; 32];
        buf[0..4].copy_from_slice(&10u32.to_le_bytes());
        buf[4..8].copy_from_slice(&20u32.to_le_bytes());
        buf[8..12].copy_from_slice(&15u32.to_le_bytes());
        buf[12..16].copy_from_slice(&0x40u32.to_le_bytes());
        buf[16..20].copy_from_slice(&8u32.to_le_bytes());
        buf[20..24].copy_from_slice(&1u32.to_le_bytes());
        let raw_ref: u64 = (1u64 << 48) | 42u64;
        buf[24..32].copy_from_slice(&raw_ref.to_le_bytes());

        let entries = parse_all(&buf, Version::V23, 1).unwrap();
        assert_eq!(entries[0].average_duration_ms, Some(15));
        let file_ref = entries[0].file_reference.unwrap();
        assert_eq!(file_ref.mft_entry, 42);
        assert_eq!(file_ref.sequence, 1);
    }

    #[test]
    fn rejects_truncated_array() {
        let buf = vec![0u8; 10];
        let err = parse_all(&buf, Version::V17, 1).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::OutOfBounds {
                what: "metrics_array.entry",
                ..
            }
        ));
    }
}
