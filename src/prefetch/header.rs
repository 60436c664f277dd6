//! The fixed 84-byte file header shared by every wire format version.

use crate::prefetch::primitive::{read_u32le, slice, utf16_fixed_trim};
use crate::prefetch::version::Version;
use crate::error::{Error, Result};

/// Total size of the fixed header, in bytes.
pub const HEADER_SIZE: usize = 84;

const SIGNATURE: &[u8; 4] = b"SCCA";

/// The decoded fixed header.
#[derive(Debug, Clone)]
pub struct Header {
    pub format_version: Version,
    pub declared_file_size: u32,
    /// The executable's base name, decoded from the 60-byte UTF-16LE field
    /// and trimmed at the first NUL code unit.
    pub executable_name: Vec<u16>,
    pub prefetch_hash: u32,
}

impl Header {
    /// Decode the header from an 84-byte buffer.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::ShortRead {
                offset: 0,
                requested: HEADER_SIZE,
            });
        }

        let raw_version = read_u32le(bytes, "header.format_version", 0)?;
        let format_version = Version::from_raw(raw_version)?;

        let signature = slice(bytes, "header.signature", 4, 4)?;
        if signature != SIGNATURE {
            let magic = read_u32le(bytes, "header.signature", 4)?;
            return Err(Error::InvalidSignature(magic));
        }

        let declared_file_size = read_u32le(bytes, "header.file_size", 12)?;
        let executable_name = utf16_fixed_trim(slice(bytes, "header.executable_name", 16, 60)?);
        let prefetch_hash = read_u32le(bytes, "header.prefetch_hash", 76)?;

        #[cfg(feature = "log")]
        log::debug!(
            "header: version={:?} file_size={} hash=0x{:08x}",
            format_version,
            declared_file_size,
            prefetch_hash
        );

        Ok(Header {
            format_version,
            declared_file_size,
            executable_name,
            prefetch_hash,
        })
    }
}
