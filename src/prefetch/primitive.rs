//! Primitive little-endian decoders shared by every section of the format.

use scroll::Pread;

use crate::error::{Error, Result};

/// A bounds-checked sub-slice, reported as [`Error::OutOfBounds`] (not
/// scroll's own error) so callers get the section name in the failure.
pub(crate) fn slice<'a>(bytes: &'a [u8], what: &'static str, offset: usize, len: usize) -> Result<&'a [u8]> {
    let end = offset.checked_add(len).ok_or(Error::OutOfBounds {
        what,
        offset: offset as u64,
        size: len as u64,
        bound: bytes.len() as u64,
    })?;
    bytes.get(offset..end).ok_or(Error::OutOfBounds {
        what,
        offset: offset as u64,
        size: len as u64,
        bound: bytes.len() as u64,
    })
}

pub(crate) fn read_u32le(bytes: &[u8], what: &'static str, offset: usize) -> Result<u32> {
    let field = slice(bytes, what, offset, 4)?;
    Ok(field.pread_with(0, scroll::LE)?)
}

pub(crate) fn read_u64le(bytes: &[u8], what: &'static str, offset: usize) -> Result<u64> {
    let field = slice(bytes, what, offset, 8)?;
    Ok(field.pread_with(0, scroll::LE)?)
}

pub(crate) fn read_u16le(bytes: &[u8], what: &'static str, offset: usize) -> Result<u16> {
    let field = slice(bytes, what, offset, 2)?;
    Ok(field.pread_with(0, scroll::LE)?)
}

pub(crate) fn read_u8(bytes: &[u8], what: &'static str, offset: usize) -> Result<u8> {
    let field = slice(bytes, what, offset, 1)?;
    Ok(field[0])
}

/// Decode a fixed-size UTF-16LE field, trimming at the first NUL code unit (or
/// the end of the field if there is none).
pub(crate) fn utf16_fixed_trim(bytes: &[u8]) -> Vec<u16> {
    let mut out = Vec::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks_exact(2) {
        let unit = u16::from_le_bytes([pair[0], pair[1]]);
        if unit == 0 {
            break;
        }
        out.push(unit);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_at_first_nul() {
        let bytes = [b'A', 0, b'B', 0, 0, 0, 0xaa, 0xaa];
        assert_eq!(utf16_fixed_trim(&bytes), vec![b'A' as u16, b'B' as u16]);
    }

    #[test]
    fn slice_reports_out_of_bounds() {
        let bytes = [0u8; 4];
        let err = slice(&bytes, "test", 2, 4).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { what: "test", .. }));
    }
}
