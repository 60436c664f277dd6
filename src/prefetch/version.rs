//! The three wire formats this crate understands, and the layout constants
//! that differ between them.

use crate::error::{Error, Result};

/// A Prefetch file format version, as read from the header's `format_version`
/// field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// Windows XP / Server 2003.
    V17,
    /// Windows Vista / 7.
    V23,
    /// Windows 8 / 8.1 / 10 (non-compressed).
    V26,
}

impl Version {
    /// Map a raw `format_version` field to a known version, or
    /// `UnsupportedVersion` for anything else (including the compressed-era
    /// version numbers this crate does not decode).
    pub fn from_raw(raw: u32) -> Result<Self> {
        match raw {
            17 => Ok(Version::V17),
            23 => Ok(Version::V23),
            26 => Ok(Version::V26),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Version::V17 => 17,
            Version::V23 => 23,
            Version::V26 => 26,
        }
    }

    /// Size in bytes of the version-specific "information" block that
    /// immediately follows the 84-byte header.
    pub fn info_block_size(self) -> usize {
        match self {
            Version::V17 => 152,
            Version::V23 => 156,
            Version::V26 => 224,
        }
    }

    /// Stride in bytes of one entry in the metrics array.
    pub fn metrics_stride(self) -> usize {
        match self {
            Version::V17 => 20,
            Version::V23 | Version::V26 => 32,
        }
    }

    /// Stride in bytes of one entry in the trace chain array (same for all
    /// versions).
    pub fn trace_chain_stride(self) -> usize {
        12
    }

    /// Stride in bytes of one per-volume header in the volumes information
    /// block.
    pub fn volume_header_stride(self) -> usize {
        match self {
            Version::V17 => 40,
            Version::V23 | Version::V26 => 96,
        }
    }

    /// Whether the metrics entry carries the v23+ `average_duration` and
    /// `file_reference` fields.
    pub fn has_extended_metrics(self) -> bool {
        !matches!(self, Version::V17)
    }

    /// Whether the information block carries a `run_count` field (absent in
    /// v17, which stores only `last_run_time`).
    pub fn has_run_count(self) -> bool {
        !matches!(self, Version::V17)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_known_versions() {
        assert_eq!(Version::from_raw(17).unwrap(), Version::V17);
        assert_eq!(Version::from_raw(23).unwrap(), Version::V23);
        assert_eq!(Version::from_raw(26).unwrap(), Version::V26);
    }

    #[test]
    fn rejects_unknown_versions() {
        let err = Version::from_raw(30).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(30)));
    }

    #[test]
    fn strides_match_per_version_layout() {
        assert_eq!(Version::V17.metrics_stride(), 20);
        assert_eq!(Version::V23.metrics_stride(), 32);
        assert_eq!(Version::V26.metrics_stride(), 32);
        assert_eq!(Version::V17.volume_header_stride(), 40);
        assert_eq!(Version::V23.volume_header_stride(), 96);
        assert_eq!(Version::V26.volume_header_stride(), 96);
        assert_eq!(Version::V17.info_block_size(), 152);
        assert_eq!(Version::V23.info_block_size(), 156);
        assert_eq!(Version::V26.info_block_size(), 224);
    }
}
