//! The reusable UTF-16LE NUL-delimited string array, shared by the global
//! filename table and every volume's directory-strings sub-block.

use crate::error::{Error, Result};

/// An ordered, index-addressable sequence of NUL-terminated UTF-16LE strings
/// backed by one owned byte buffer.
#[derive(Debug, Clone, Default)]
pub struct StringArray {
    data: Vec<u8>,
    /// (byte_offset, byte_length_excluding_nul) into `data`, one per string.
    index: Vec<(usize, usize)>,
}

impl StringArray {
    /// An empty array — used when the corresponding section offset is zero.
    pub fn empty() -> Self {
        StringArray::default()
    }

    /// Scan `bytes` two at a time; each run terminated by a `0x0000` code
    /// unit becomes one string. An odd trailing byte or an unterminated final
    /// run is `MalformedStringArray`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 2 != 0 {
            return Err(Error::MalformedStringArray(format!(
                "odd-length buffer ({} bytes)",
                bytes.len()
            )));
        }

        let mut index = Vec::new();
        let mut start = 0usize;
        let mut pos = 0usize;
        while pos < bytes.len() {
            let unit = u16::from_le_bytes([bytes[pos], bytes[pos + 1]]);
            pos += 2;
            if unit == 0 {
                index.push((start, pos - 2 - start));
                start = pos;
            }
        }
        if start != bytes.len() {
            return Err(Error::MalformedStringArray(
                "unterminated string at end of array".to_string(),
            ));
        }

        Ok(StringArray {
            data: bytes.to_vec(),
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Discard all but the first `count` strings (used when a volume's
    /// directory-strings array overshoots its declared count because of
    /// trailing padding).
    pub fn truncate(&mut self, count: usize) {
        self.index.truncate(count);
    }

    fn bounds(&self, i: usize) -> Result<(usize, usize)> {
        self.index
            .get(i)
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("string index {i} out of range")))
    }

    /// Raw UTF-16LE bytes of string `i`, excluding the NUL terminator.
    pub fn raw(&self, i: usize) -> Result<&[u8]> {
        let (offset, len) = self.bounds(i)?;
        Ok(&self.data[offset..offset + len])
    }

    /// String `i` decoded into UTF-16 code units, excluding the NUL.
    pub fn code_units(&self, i: usize) -> Result<Vec<u16>> {
        Ok(self
            .raw(i)?
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect())
    }

    /// Size in UTF-16 code units, including the terminating NUL.
    pub fn utf16_size(&self, i: usize) -> Result<usize> {
        let (_, len) = self.bounds(i)?;
        Ok(len / 2 + 1)
    }

    /// Size in UTF-8 bytes, including a single terminating NUL byte.
    pub fn utf8_size(&self, i: usize) -> Result<usize> {
        let units = self.code_units(i)?;
        let byte_len: usize = char::decode_utf16(units)
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER).len_utf8())
            .sum();
        Ok(byte_len + 1)
    }

    /// Copy string `i`'s UTF-16 code units plus a terminating NUL into `buf`.
    /// Returns the number of code units written.
    pub fn copy_utf16(&self, i: usize, buf: &mut [u16]) -> Result<usize> {
        let units = self.code_units(i)?;
        let needed = units.len() + 1;
        if buf.len() < needed {
            return Err(Error::InvalidArgument(format!(
                "buffer too small: need {needed} code units, have {}",
                buf.len()
            )));
        }
        buf[..units.len()].copy_from_slice(&units);
        buf[units.len()] = 0;
        Ok(needed)
    }

    /// Copy string `i` transcoded to UTF-8 plus a terminating NUL byte into
    /// `buf`. Returns the number of bytes written.
    pub fn copy_utf8(&self, i: usize, buf: &mut [u8]) -> Result<usize> {
        let units = self.code_units(i)?;
        let text: String = char::decode_utf16(units)
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
        let needed = text.len() + 1;
        if buf.len() < needed {
            return Err(Error::InvalidArgument(format!(
                "buffer too small: need {needed} bytes, have {}",
                buf.len()
            )));
        }
        buf[..text.len()].copy_from_slice(text.as_bytes());
        buf[text.len()] = 0;
        Ok(needed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(strings: &[&str]) -> Vec<u8> {
        let mut out = Vec::new();
        for s in strings {
            for unit in s.encode_utf16() {
                out.extend_from_slice(&unit.to_le_bytes());
            }
            out.extend_from_slice(&0u16.to_le_bytes());
        }
        out
    }

    #[test]
    fn parses_two_strings() {
        let buf = encode(&["A.DLL", "B.DLL"]);
        let arr = StringArray::parse(&buf).unwrap();
        assert_eq!(arr.len(), 2);
        let first: String = char::decode_utf16(arr.code_units(0).unwrap())
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(first, "A.DLL");
        let second: String = char::decode_utf16(arr.code_units(1).unwrap())
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(second, "B.DLL");
    }

    #[test]
    fn empty_buffer_is_zero_strings() {
        let arr = StringArray::parse(&[]).unwrap();
        assert_eq!(arr.len(), 0);
    }

    #[test]
    fn rejects_odd_length() {
        let err = StringArray::parse(&[0u8; 3]).unwrap_err();
        assert!(matches!(err, Error::MalformedStringArray(_)));
    }

    #[test]
    fn rejects_unterminated_run() {
        let mut buf = encode(&["A"]);
        buf.pop();
        buf.pop(); // drop the terminating NUL
        let err = StringArray::parse(&buf).unwrap_err();
        assert!(matches!(err, Error::MalformedStringArray(_)));
    }

    #[test]
    fn sizes_include_terminator() {
        let buf = encode(&["AB"]);
        let arr = StringArray::parse(&buf).unwrap();
        assert_eq!(arr.utf16_size(0).unwrap(), 3); // 'A','B',NUL
        assert_eq!(arr.utf8_size(0).unwrap(), 3); // 'A','B',NUL
    }

    #[test]
    fn copy_into_buffer_round_trips() {
        let buf = encode(&["AB"]);
        let arr = StringArray::parse(&buf).unwrap();
        let mut utf8 = [0u8; 3];
        let written = arr.copy_utf8(0, &mut utf8).unwrap();
        assert_eq!(written, 3);
        assert_eq!(&utf8, b"AB\0");

        let mut utf16 = [0u16; 3];
        let written = arr.copy_utf16(0, &mut utf16).unwrap();
        assert_eq!(written, 3);
        assert_eq!(utf16, [b'A' as u16, b'B' as u16, 0]);
    }

    #[test]
    fn out_of_range_index_is_invalid_argument() {
        let arr = StringArray::parse(&[]).unwrap();
        let err = arr.raw(0).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
