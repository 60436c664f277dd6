//! The collaborator this crate consumes instead of doing its own I/O.
//!
//! `ByteSource` is a pure capability: read an exact range, report a size. This
//! crate does not build a general-purpose abstraction on top of it (memory
//! mapping, caching, decompression are all callers' business); it only ships
//! the two concrete backings needed to actually run the decoder end to end.

use std::sync::Mutex;

use crate::error::{Error, Result};

/// Random-access capability for reading a fixed byte range at an arbitrary offset.
pub trait ByteSource {
    /// Exact length of the underlying source, in bytes.
    fn size(&self) -> u64;

    /// Fill `buf` with bytes from `[offset, offset + buf.len())`.
    ///
    /// Implementations MUST fail with [`Error::ShortRead`] rather than
    /// returning partial data if the range extends past `size()`.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;
}

impl ByteSource for [u8] {
    fn size(&self) -> u64 {
        self.len() as u64
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let start = usize::try_from(offset).map_err(|_| Error::ShortRead {
            offset,
            requested: buf.len(),
        })?;
        let end = start.checked_add(buf.len()).ok_or(Error::ShortRead {
            offset,
            requested: buf.len(),
        })?;
        let src = self.get(start..end).ok_or(Error::ShortRead {
            offset,
            requested: buf.len(),
        })?;
        buf.copy_from_slice(src);
        Ok(())
    }
}

impl ByteSource for Vec<u8> {
    fn size(&self) -> u64 {
        self.as_slice().size()
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.as_slice().read_at(offset, buf)
    }
}

/// A [`ByteSource`] backed by an open file, guarded by a mutex so that a
/// `&FileSource` can be shared between threads (the file's cursor is private
/// state, not part of the public contract).
pub struct FileSource {
    file: Mutex<std::fs::File>,
    size: u64,
}

impl FileSource {
    /// Open `path` for reading.
    pub fn open(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        let size = file.metadata()?.len();
        Ok(FileSource {
            file: Mutex::new(file),
            size,
        })
    }
}

impl ByteSource for FileSource {
    fn size(&self) -> u64 {
        self.size
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        use std::io::{Read, Seek, SeekFrom};

        let end = offset.checked_add(buf.len() as u64).unwrap_or(u64::MAX);
        if end > self.size {
            return Err(Error::ShortRead {
                offset,
                requested: buf.len(),
            });
        }
        let mut file = self.file.lock().expect("file source mutex poisoned");
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf).map_err(|err| {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::ShortRead {
                    offset,
                    requested: buf.len(),
                }
            } else {
                Error::Io(err)
            }
        })
    }
}
