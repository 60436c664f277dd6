//! Error types returned by this crate's public API.

use core::fmt;
use std::result;

/// The result type returned by this crate's fallible operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors produced while decoding a prefetch file or driving its lifecycle.
#[derive(Debug)]
pub enum Error {
    /// A required argument was missing, out of range, or otherwise invalid
    /// (including an unsupported `open` access mode and an out-of-range
    /// accessor index).
    InvalidArgument(String),
    /// `open` was called on a handle that is already open.
    AlreadyOpen,
    /// An operation that requires an open file was called on a closed handle.
    NotOpen,
    /// The header signature did not read `SCCA`.
    InvalidSignature(u32),
    /// `format_version` was not 17, 23 or 26.
    UnsupportedVersion(u32),
    /// The byte source returned fewer bytes than requested.
    ShortRead { offset: u64, requested: usize },
    /// A declared offset/size escapes the declared file size or the actual
    /// source size, or otherwise violates a structural bound.
    OutOfBounds {
        what: &'static str,
        offset: u64,
        size: u64,
        bound: u64,
    },
    /// A UTF-16LE string array did not decode cleanly (odd byte length, or an
    /// unterminated run at the end of the array).
    MalformedStringArray(String),
    /// Fewer directory strings were recovered than the volume declared.
    TruncatedDirectoryStrings { expected: u32, found: u32 },
    /// `signal_abort` was observed at a section boundary.
    Aborted,
    /// Opaque I/O failure surfaced by a `ByteSource` implementation.
    Io(std::io::Error),
    /// A primitive read failed scroll's own bounds checking.
    Scroll(scroll::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Error::AlreadyOpen => write!(f, "file handle is already open"),
            Error::NotOpen => write!(f, "file handle is not open"),
            Error::InvalidSignature(magic) => {
                write!(f, "invalid signature: 0x{magic:08x}, expected \"SCCA\"")
            }
            Error::UnsupportedVersion(version) => {
                write!(f, "unsupported format_version: {version}")
            }
            Error::ShortRead { offset, requested } => write!(
                f,
                "short read at offset {offset}: requested {requested} bytes"
            ),
            Error::OutOfBounds {
                what,
                offset,
                size,
                bound,
            } => write!(
                f,
                "{what} out of bounds: offset {offset} + size {size} exceeds bound {bound}"
            ),
            Error::MalformedStringArray(msg) => write!(f, "malformed string array: {msg}"),
            Error::TruncatedDirectoryStrings { expected, found } => write!(
                f,
                "truncated directory strings: expected {expected}, recovered {found}"
            ),
            Error::Aborted => write!(f, "operation aborted"),
            Error::Io(err) => write!(f, "I/O error: {err}"),
            Error::Scroll(err) => write!(f, "decode error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Scroll(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<scroll::Error> for Error {
    fn from(err: scroll::Error) -> Self {
        Error::Scroll(err)
    }
}
