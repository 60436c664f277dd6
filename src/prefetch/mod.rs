//! The public facade: `PrefetchFile` owns the fully decoded model and
//! orchestrates every sub-decoder behind an explicit open/close lifecycle.

pub mod header;
pub mod information;
pub mod metrics;
pub mod primitive;
pub mod strings;
pub mod trace_chain;
pub mod version;
pub mod volume;

pub use metrics::MetricsEntry;
pub use strings::StringArray;
pub use trace_chain::TraceChainEntry;
pub use version::Version;
pub use volume::{FileRef, Volume};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::byte_source::ByteSource;
use crate::error::{Error, Result};
use crate::options::ParseOptions;

/// How a [`PrefetchFile`] was asked to be opened. Only [`Access::Read`] is
/// supported; this crate has no write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    Read,
}

/// The declared header file size disagreed with the byte source's actual
/// size. Non-fatal: the rest of the file is still parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMismatch {
    pub declared: u32,
    pub actual: u64,
}

/// A clonable, thread-shareable cooperative-cancellation flag.
///
/// `PrefetchFile::open` takes `&mut self`, so a genuinely concurrent abort
/// from another thread needs its own handle obtained via
/// [`PrefetchFile::abort_handle`] *before* calling `open`.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn new() -> Self {
        AbortHandle(Arc::new(AtomicBool::new(false)))
    }

    pub fn signal(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct Data {
    format_version: Version,
    prefetch_hash: u32,
    executable_name: Vec<u16>,
    declared_file_size: u32,
    size_mismatch: Option<SizeMismatch>,
    filenames: StringArray,
    volumes: Vec<Volume>,
    metrics: Vec<MetricsEntry>,
    trace_chain: Vec<TraceChainEntry>,
}

/// The decoded Prefetch file. Construct with [`PrefetchFile::new`], populate
/// with [`open`](PrefetchFile::open), and release with
/// [`close`](PrefetchFile::close).
pub struct PrefetchFile {
    abort: AbortHandle,
    options: ParseOptions,
    data: Option<Data>,
}

impl Default for PrefetchFile {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefetchFile {
    pub fn new() -> Self {
        PrefetchFile {
            abort: AbortHandle::new(),
            options: ParseOptions::default(),
            data: None,
        }
    }

    /// Construct a handle that parses in [`ParseMode::Permissive`](crate::options::ParseMode::Permissive).
    pub fn with_options(options: ParseOptions) -> Self {
        PrefetchFile {
            abort: AbortHandle::new(),
            options,
            data: None,
        }
    }

    /// Obtain a clonable handle that can signal abort from another thread
    /// while this thread is inside [`open`](PrefetchFile::open).
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Set the cooperative abort flag; observed at the next section boundary
    /// inside a running or future `open`.
    pub fn signal_abort(&self) {
        self.abort.signal();
    }

    /// Parse `source` into this handle. Fails with [`Error::AlreadyOpen`] if
    /// already open; only [`Access::Read`] is supported.
    pub fn open(&mut self, source: &dyn ByteSource, access: Access) -> Result<()> {
        if self.data.is_some() {
            return Err(Error::AlreadyOpen);
        }
        if access != Access::Read {
            return Err(Error::InvalidArgument(
                "unsupported access mode: only Read is supported".to_string(),
            ));
        }

        let actual_size = source.size();

        let mut header_buf = [0u8; header::HEADER_SIZE];
        source.read_at(0, &mut header_buf)?;
        let header = header::Header::parse(&header_buf)?;

        if self.abort.is_set() {
            return Err(Error::Aborted);
        }

        let info_size = header.format_version.info_block_size();
        let mut info_buf = vec![0u8; info_size];
        source.read_at(header::HEADER_SIZE as u64, &mut info_buf)?;
        let info = information::Information::parse(&info_buf, header.format_version)?;
        info.validate(header.declared_file_size, actual_size)?;

        let bound = u64::from(header.declared_file_size).min(actual_size);
        let metrics_stride = header.format_version.metrics_stride();
        information::check_strided_section(
            "metrics_array",
            info.metrics_array_offset,
            info.number_of_metrics_entries,
            metrics_stride,
            bound,
        )?;
        information::check_strided_section(
            "trace_chain_array",
            info.trace_chain_array_offset,
            info.number_of_trace_chain_entries,
            trace_chain::TRACE_CHAIN_STRIDE,
            bound,
        )?;

        if self.abort.is_set() {
            return Err(Error::Aborted);
        }

        let metrics = if info.metrics_array_offset != 0 {
            let len = metrics_stride * info.number_of_metrics_entries as usize;
            let mut buf = vec![0u8; len];
            source.read_at(info.metrics_array_offset as u64, &mut buf)?;
            metrics::parse_all(&buf, header.format_version, info.number_of_metrics_entries as usize)?
        } else {
            Vec::new()
        };

        if self.abort.is_set() {
            return Err(Error::Aborted);
        }

        let trace_chain = if info.trace_chain_array_offset != 0 {
            let len = trace_chain::TRACE_CHAIN_STRIDE * info.number_of_trace_chain_entries as usize;
            let mut buf = vec![0u8; len];
            source.read_at(info.trace_chain_array_offset as u64, &mut buf)?;
            trace_chain::parse_all(&buf, info.number_of_trace_chain_entries as usize)?
        } else {
            Vec::new()
        };

        if self.abort.is_set() {
            return Err(Error::Aborted);
        }

        let filenames = if info.filename_strings_offset != 0 {
            let mut buf = vec![0u8; info.filename_strings_size as usize];
            source.read_at(info.filename_strings_offset as u64, &mut buf)?;
            StringArray::parse(&buf)?
        } else {
            StringArray::empty()
        };

        if self.abort.is_set() {
            return Err(Error::Aborted);
        }

        let volumes = if info.volumes_information_offset != 0 {
            let mut buf = vec![0u8; info.volumes_information_size as usize];
            source.read_at(info.volumes_information_offset as u64, &mut buf)?;
            volume::parse_all(
                &buf,
                header.format_version,
                info.number_of_volumes as usize,
                &self.options,
            )?
        } else {
            Vec::new()
        };

        let size_mismatch = if u64::from(header.declared_file_size) != actual_size {
            #[cfg(feature = "log")]
            log::warn!(
                "declared file_size {} differs from source size {actual_size}",
                header.declared_file_size
            );
            Some(SizeMismatch {
                declared: header.declared_file_size,
                actual: actual_size,
            })
        } else {
            None
        };

        self.data = Some(Data {
            format_version: header.format_version,
            prefetch_hash: header.prefetch_hash,
            executable_name: header.executable_name,
            declared_file_size: header.declared_file_size,
            size_mismatch,
            filenames,
            volumes,
            metrics,
            trace_chain,
        });
        Ok(())
    }

    /// Release all decoded state. Idempotent: closing an already-closed
    /// handle succeeds silently, and resets the abort flag for the next
    /// `open`.
    pub fn close(&mut self) {
        self.data = None;
        self.abort = AbortHandle::new();
    }

    fn data(&self) -> Result<&Data> {
        self.data.as_ref().ok_or(Error::NotOpen)
    }

    pub fn format_version(&self) -> Result<u32> {
        Ok(self.data()?.format_version.as_u32())
    }

    pub fn prefetch_hash(&self) -> Result<u32> {
        Ok(self.data()?.prefetch_hash)
    }

    pub fn executable_name(&self) -> Result<&[u16]> {
        Ok(&self.data()?.executable_name)
    }

    pub fn declared_file_size(&self) -> Result<u32> {
        Ok(self.data()?.declared_file_size)
    }

    pub fn size_mismatch(&self) -> Result<Option<SizeMismatch>> {
        Ok(self.data()?.size_mismatch)
    }

    pub fn num_filenames(&self) -> Result<usize> {
        Ok(self.data()?.filenames.len())
    }

    pub fn filename(&self, i: usize) -> Result<Vec<u16>> {
        self.data()?.filenames.code_units(i)
    }

    pub fn filename_utf16_size(&self, i: usize) -> Result<usize> {
        self.data()?.filenames.utf16_size(i)
    }

    pub fn filename_utf8_size(&self, i: usize) -> Result<usize> {
        self.data()?.filenames.utf8_size(i)
    }

    pub fn copy_filename_utf16(&self, i: usize, buf: &mut [u16]) -> Result<usize> {
        self.data()?.filenames.copy_utf16(i, buf)
    }

    pub fn copy_filename_utf8(&self, i: usize, buf: &mut [u8]) -> Result<usize> {
        self.data()?.filenames.copy_utf8(i, buf)
    }

    pub fn num_volumes(&self) -> Result<usize> {
        Ok(self.data()?.volumes.len())
    }

    pub fn volume(&self, i: usize) -> Result<&Volume> {
        self.data()?
            .volumes
            .get(i)
            .ok_or_else(|| Error::InvalidArgument(format!("volume index {i} out of range")))
    }

    pub fn metrics(&self) -> Result<&[MetricsEntry]> {
        Ok(&self.data()?.metrics)
    }

    pub fn trace_chain(&self) -> Result<&[TraceChainEntry]> {
        Ok(&self.data()?.trace_chain)
    }
}
