//! The version-dependent "file information" block that immediately follows
//! the fixed header and carries every other section's offset/size/count.

use crate::prefetch::header::HEADER_SIZE;
use crate::prefetch::primitive::{read_u32le, read_u64le};
use crate::prefetch::version::Version;
use crate::error::{Error, Result};

/// The seven cross-section offsets/sizes/counts, plus the two timing fields,
/// unified across all three wire versions.
#[derive(Debug, Clone)]
pub struct Information {
    pub metrics_array_offset: u32,
    pub number_of_metrics_entries: u32,
    pub trace_chain_array_offset: u32,
    pub number_of_trace_chain_entries: u32,
    pub filename_strings_offset: u32,
    pub filename_strings_size: u32,
    pub volumes_information_offset: u32,
    pub number_of_volumes: u32,
    pub volumes_information_size: u32,
    pub last_run_time: u64,
    /// Absent (`0`) in v17, which has no `run_count` field.
    pub run_count: u32,
}

impl Information {
    /// Parse the information block. `bytes` must be exactly
    /// `version.info_block_size()` bytes, starting right after the header.
    pub fn parse(bytes: &[u8], version: Version) -> Result<Self> {
        let expected = version.info_block_size();
        if bytes.len() < expected {
            return Err(Error::ShortRead {
                offset: HEADER_SIZE as u64,
                requested: expected,
            });
        }

        let metrics_array_offset = read_u32le(bytes, "information.metrics_array_offset", 0)?;
        let number_of_metrics_entries =
            read_u32le(bytes, "information.number_of_metrics_entries", 4)?;
        let trace_chain_array_offset =
            read_u32le(bytes, "information.trace_chain_array_offset", 8)?;
        let number_of_trace_chain_entries =
            read_u32le(bytes, "information.number_of_trace_chain_entries", 12)?;
        let filename_strings_offset =
            read_u32le(bytes, "information.filename_strings_offset", 16)?;
        let filename_strings_size = read_u32le(bytes, "information.filename_strings_size", 20)?;
        let volumes_information_offset =
            read_u32le(bytes, "information.volumes_information_offset", 24)?;
        let number_of_volumes = read_u32le(bytes, "information.number_of_volumes", 28)?;
        let volumes_information_size =
            read_u32le(bytes, "information.volumes_information_size", 32)?;
        let last_run_time = read_u64le(bytes, "information.last_run_time", 36)?;
        let run_count = if version.has_run_count() {
            read_u32le(bytes, "information.run_count", 44)?
        } else {
            0
        };

        let info = Information {
            metrics_array_offset,
            number_of_metrics_entries,
            trace_chain_array_offset,
            number_of_trace_chain_entries,
            filename_strings_offset,
            filename_strings_size,
            volumes_information_offset,
            number_of_volumes,
            volumes_information_size,
            last_run_time,
            run_count,
        };

        #[cfg(feature = "log")]
        log::debug!("information: {info:?}");
        Ok(info)
    }

    /// Validate every declared (offset, size) pair against the bounds
    /// invariants in spec §3: non-zero offsets must be at or past the header,
    /// and `offset + size` must stay within both the declared file size and
    /// the actual source size. A zero offset must carry a zero size/count.
    pub fn validate(&self, declared_file_size: u32, actual_size: u64) -> Result<()> {
        let bound = u64::from(declared_file_size).min(actual_size);

        check_section(
            "metrics_array",
            self.metrics_array_offset,
            self.number_of_metrics_entries,
            bound,
        )?;
        check_section(
            "trace_chain_array",
            self.trace_chain_array_offset,
            self.number_of_trace_chain_entries,
            bound,
        )?;
        check_section_raw(
            "filename_strings",
            self.filename_strings_offset,
            self.filename_strings_size,
            bound,
        )?;
        check_section_raw(
            "volumes_information",
            self.volumes_information_offset,
            self.volumes_information_size,
            bound,
        )?;
        check_section(
            "volumes_information",
            self.volumes_information_offset,
            self.number_of_volumes,
            bound,
        )?;

        Ok(())
    }
}

/// Bounds-check a section whose declared "size" is an entry count, not yet
/// multiplied by a stride — the caller multiplies once the stride (which
/// depends on `Version`) is known. Here we only check the offset itself is
/// sane; the byte-accurate check happens when the stride is known.
fn check_section(what: &'static str, offset: u32, count: u32, bound: u64) -> Result<()> {
    if offset == 0 {
        if count != 0 {
            return Err(Error::OutOfBounds {
                what,
                offset: 0,
                size: count as u64,
                bound,
            });
        }
        return Ok(());
    }
    if (offset as u64) < HEADER_SIZE as u64 {
        return Err(Error::OutOfBounds {
            what,
            offset: offset as u64,
            size: 0,
            bound,
        });
    }
    Ok(())
}

fn check_section_raw(what: &'static str, offset: u32, size: u32, bound: u64) -> Result<()> {
    if offset == 0 {
        if size != 0 {
            return Err(Error::OutOfBounds {
                what,
                offset: 0,
                size: size as u64,
                bound,
            });
        }
        return Ok(());
    }
    if (offset as u64) < HEADER_SIZE as u64 {
        return Err(Error::OutOfBounds {
            what,
            offset: offset as u64,
            size: size as u64,
            bound,
        });
    }
    let end = offset as u64 + size as u64;
    if end > bound {
        return Err(Error::OutOfBounds {
            what,
            offset: offset as u64,
            size: size as u64,
            bound,
        });
    }
    Ok(())
}

/// Bounds-check a stride-multiplied section once the per-entry size is known.
pub(crate) fn check_strided_section(
    what: &'static str,
    offset: u32,
    count: u32,
    stride: usize,
    bound: u64,
) -> Result<()> {
    if offset == 0 {
        return Ok(());
    }
    let size = count as u64 * stride as u64;
    let end = offset as u64 + size;
    if end > bound {
        return Err(Error::OutOfBounds {
            what,
            offset: offset as u64,
            size,
            bound,
        });
    }
    Ok(())
}
