//! Per-volume decoding: the fixed/version-dependent header, the device-path
//! slice, the file-references sub-block and the directory-strings array.

use crate::options::{ParseOptions, Permissive};
use crate::prefetch::primitive::{read_u32le, read_u64le, slice};
use crate::prefetch::strings::StringArray;
use crate::prefetch::version::Version;
use crate::error::{Error, Result};

/// An NTFS file reference: a Master File Table entry index plus its reuse
/// sequence number, packed into a 64-bit value as
/// `mft_entry | (sequence << 48)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRef {
    pub mft_entry: u64,
    pub sequence: u16,
}

impl FileRef {
    /// Split every bit of `raw` into its two fields, with no notion of an
    /// "absent" sentinel. Used for entries inside a volume's
    /// `file_references` list.
    pub fn split_raw(raw: u64) -> FileRef {
        FileRef {
            mft_entry: raw & 0xFFFF_FFFF_FFFF,
            sequence: (raw >> 48) as u16,
        }
    }

    /// Same split, but an all-zero raw value is treated as "absent" — used
    /// for the optional `file_reference` field on a metrics entry.
    pub fn from_raw(raw: u64) -> Option<FileRef> {
        if raw == 0 {
            None
        } else {
            Some(FileRef::split_raw(raw))
        }
    }
}

/// A decoded volume: the device it lives on, its directory strings, and the
/// files on it this trace referenced.
#[derive(Debug, Clone)]
pub struct Volume {
    pub device_path: Vec<u16>,
    pub device_path_chars: u32,
    pub creation_time: u64,
    pub serial_number: u32,
    /// Entry 0 of the on-disk sub-block is reserved and not included here.
    pub file_references: Vec<FileRef>,
    pub directory_strings: StringArray,
}

/// Decode `count` volumes from `blob` (the whole `volumes_information`
/// section, already sliced and bounds-checked against the file).
pub(crate) fn parse_all(
    blob: &[u8],
    version: Version,
    count: usize,
    options: &ParseOptions,
) -> Result<Vec<Volume>> {
    let stride = version.volume_header_stride();
    let mut volumes = Vec::with_capacity(count);
    for i in 0..count {
        let header = slice(blob, "volumes_information.header", i * stride, stride)?;
        volumes.push(parse_one(blob, header, options)?);
    }
    Ok(volumes)
}

fn parse_one(blob: &[u8], header: &[u8], options: &ParseOptions) -> Result<Volume> {
    let device_path_offset = read_u32le(header, "volume.device_path_offset", 0)?;
    let device_path_chars = read_u32le(header, "volume.device_path_chars", 4)?;
    let creation_time = read_u64le(header, "volume.creation_time", 8)?;
    let serial_number = read_u32le(header, "volume.serial_number", 16)?;
    let file_references_offset = read_u32le(header, "volume.file_references_offset", 20)?;
    let file_references_size = read_u32le(header, "volume.file_references_size", 24)?;
    let directory_strings_array_offset =
        read_u32le(header, "volume.directory_strings_array_offset", 28)?;
    let number_of_directory_strings = read_u32le(header, "volume.number_of_directory_strings", 32)?;

    let device_path = parse_device_path(blob, device_path_offset, device_path_chars)?;

    let file_references = if file_references_offset != 0 {
        parse_file_references(blob, file_references_offset, file_references_size)?
    } else {
        Vec::new()
    };

    let directory_strings = if directory_strings_array_offset != 0 {
        parse_directory_strings(
            blob,
            directory_strings_array_offset,
            number_of_directory_strings,
            options,
        )?
    } else {
        StringArray::empty()
    };

    #[cfg(feature = "log")]
    log::debug!(
        "volume: serial=0x{serial_number:08x} device_path_chars={device_path_chars} \
         file_references={} directory_strings={}",
        file_references.len(),
        directory_strings.len()
    );

    Ok(Volume {
        device_path,
        device_path_chars,
        creation_time,
        serial_number,
        file_references,
        directory_strings,
    })
}

fn parse_device_path(blob: &[u8], offset: u32, chars: u32) -> Result<Vec<u16>> {
    if offset == 0 {
        return Ok(Vec::new());
    }
    // The trailing `+ 2` accounts for the NUL terminator this crate does not
    // itself read, per the invariant in spec §3.
    let needed_with_nul = offset as u64 + 2 * chars as u64 + 2;
    if needed_with_nul > blob.len() as u64 {
        return Err(Error::OutOfBounds {
            what: "volume.device_path",
            offset: offset as u64,
            size: 2 * chars as u64 + 2,
            bound: blob.len() as u64,
        });
    }
    let raw = slice(blob, "volume.device_path", offset as usize, 2 * chars as usize)?;
    Ok(raw
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

fn parse_file_references(blob: &[u8], offset: u32, size: u32) -> Result<Vec<FileRef>> {
    const SUB_HEADER_SIZE: usize = 16; // version:u32, count:u32, reserved:u64
    const ENTRY_SIZE: usize = 8;

    let sub = slice(blob, "volume.file_references", offset as usize, size as usize)?;
    if sub.len() < SUB_HEADER_SIZE {
        return Err(Error::OutOfBounds {
            what: "volume.file_references.header",
            offset: offset as u64,
            size: SUB_HEADER_SIZE as u64,
            bound: sub.len() as u64,
        });
    }
    let count = read_u32le(sub, "volume.file_references.count", 4)? as usize;
    let needed = SUB_HEADER_SIZE + count * ENTRY_SIZE;
    if needed > sub.len() {
        return Err(Error::OutOfBounds {
            what: "volume.file_references.entries",
            offset: offset as u64,
            size: needed as u64,
            bound: sub.len() as u64,
        });
    }

    let mut references = Vec::with_capacity(count.saturating_sub(1));
    for i in 1..count {
        let raw = read_u64le(sub, "volume.file_references.entry", SUB_HEADER_SIZE + i * ENTRY_SIZE)?;
        references.push(FileRef::split_raw(raw));
    }
    Ok(references)
}

fn parse_directory_strings(
    blob: &[u8],
    offset: u32,
    expected: u32,
    options: &ParseOptions,
) -> Result<StringArray> {
    if offset as usize > blob.len() {
        return Err(Error::OutOfBounds {
            what: "volume.directory_strings",
            offset: offset as u64,
            size: 0,
            bound: blob.len() as u64,
        });
    }
    // The directory strings are assumed to run to the end of the volumes
    // blob: size = volumes_information_size - directory_strings_array_offset,
    // matching libscca's own assumption (see DESIGN.md).
    let tail = &blob[offset as usize..];
    let mut strings = StringArray::parse(tail)?;

    if (strings.len() as u32) < expected {
        let result: Result<()> = Err(Error::TruncatedDirectoryStrings {
            expected,
            found: strings.len() as u32,
        });
        result.or_permissive_and_default(options.parse_mode.is_permissive(), "volume.directory_strings")?;
    } else {
        strings.truncate(expected as usize);
    }

    Ok(strings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v23_header(
        device_path_offset: u32,
        device_path_chars: u32,
        serial_number: u32,
        file_references_offset: u32,
        file_references_size: u32,
        directory_strings_offset: u32,
        number_of_directory_strings: u32,
    ) -> Vec<u8> {
        let mut buf = vec![0u8; Version::V23.volume_header_stride()];
        buf[0..4].copy_from_slice(&device_path_offset.to_le_bytes());
        buf[4..8].copy_from_slice(&device_path_chars.to_le_bytes());
        buf[8..16].copy_from_slice(&0x01D4_A1B2_C3D4_E5F6u64.to_le_bytes());
        buf[16..20].copy_from_slice(&serial_number.to_le_bytes());
        buf[20..24].copy_from_slice(&file_references_offset.to_le_bytes());
        buf[24..28].copy_from_slice(&file_references_size.to_le_bytes());
        buf[28..32].copy_from_slice(&directory_strings_offset.to_le_bytes());
        buf[32..36].copy_from_slice(&number_of_directory_strings.to_le_bytes());
        buf
    }

    fn utf16_bytes(text: &str) -> Vec<u8> {
        let mut out = Vec::new();
        for unit in text.encode_utf16() {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out
    }

    #[test]
    fn parses_device_path_and_serial() {
        let device_path = "\\DEVICE\\HARDDISKVOLUME1";
        let chars = device_path.encode_utf16().count() as u32;
        let stride = Version::V23.volume_header_stride();
        let header = v23_header(stride as u32, chars, 0x1234_5678, 0, 0, 0, 0);

        let mut blob = header.clone();
        blob.extend_from_slice(&utf16_bytes(device_path));
        blob.extend_from_slice(&0u16.to_le_bytes()); // trailing NUL, per invariant

        let options = ParseOptions::default();
        let volumes = parse_all(&blob, Version::V23, 1, &options).unwrap();
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].serial_number, 0x1234_5678);
        let decoded: String = char::decode_utf16(volumes[0].device_path.iter().copied())
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(decoded, device_path);
    }

    #[test]
    fn file_references_skip_index_zero() {
        let stride = Version::V23.volume_header_stride();
        let file_refs_offset = stride as u32;
        let file_refs_size = 16 + 3 * 8;
        let header = v23_header(0, 0, 0, file_refs_offset, file_refs_size, 0, 0);

        let mut blob = header;
        blob.extend_from_slice(&3u32.to_le_bytes()); // version
        blob.extend_from_slice(&3u32.to_le_bytes()); // count
        blob.extend_from_slice(&0u64.to_le_bytes()); // reserved
        blob.extend_from_slice(&0u64.to_le_bytes()); // entry 0 (reserved, skipped)
        let entry1: u64 = (1u64 << 48) | 42;
        blob.extend_from_slice(&entry1.to_le_bytes());
        let entry2: u64 = (2u64 << 48) | 255;
        blob.extend_from_slice(&entry2.to_le_bytes());

        let options = ParseOptions::default();
        let volumes = parse_all(&blob, Version::V23, 1, &options).unwrap();
        let refs = &volumes[0].file_references;
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].mft_entry, 42);
        assert_eq!(refs[0].sequence, 1);
        assert_eq!(refs[1].mft_entry, 255);
        assert_eq!(refs[1].sequence, 2);
    }

    #[test]
    fn truncated_directory_strings_is_rejected_in_strict_mode() {
        let stride = Version::V23.volume_header_stride();
        let dir_offset = stride as u32;
        let header = v23_header(0, 0, 0, 0, 0, dir_offset, 5);

        let mut blob = header;
        blob.extend_from_slice(&utf16_bytes("ONE"));
        blob.extend_from_slice(&0u16.to_le_bytes());

        let options = ParseOptions::strict();
        let err = parse_all(&blob, Version::V23, 1, &options).unwrap_err();
        assert!(matches!(err, Error::TruncatedDirectoryStrings { .. }));
    }

    #[test]
    fn truncated_directory_strings_recovers_in_permissive_mode() {
        let stride = Version::V23.volume_header_stride();
        let dir_offset = stride as u32;
        let header = v23_header(0, 0, 0, 0, 0, dir_offset, 5);

        let mut blob = header;
        blob.extend_from_slice(&utf16_bytes("ONE"));
        blob.extend_from_slice(&0u16.to_le_bytes());

        let options = ParseOptions::permissive();
        let volumes = parse_all(&blob, Version::V23, 1, &options).unwrap();
        assert_eq!(volumes[0].directory_strings.len(), 1);
    }

    #[test]
    fn file_reference_split_matches_bit_layout() {
        let raw: u64 = (7u64 << 48) | 0x0000_DEAD_BEEFu64;
        let fref = FileRef::split_raw(raw);
        assert_eq!(fref.mft_entry, 0x0000_DEAD_BEEF);
        assert_eq!(fref.sequence, 7);
    }

    #[test]
    fn from_raw_treats_zero_as_absent() {
        assert_eq!(FileRef::from_raw(0), None);
        assert!(FileRef::from_raw(1).is_some());
    }
}
