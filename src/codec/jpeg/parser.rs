//! JPEG container segment parsing: APP1 (Exif/XMP) and APP2 (ICC/MPF), plus
//! the MPF (Multi-Picture Format) directory that points at the secondary
//! (gain map) image appended after the primary image's EOI marker.
//!
//! Grounded on the teacher's `jpeg/parser.rs`, which walked the same marker
//! stream by hand rather than pulling in a general JPEG metadata crate.

use crate::error::{Result, UhdrError};

const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const APP1: u8 = 0xE1;
const APP2: u8 = 0xE2;
const SOS: u8 = 0xDA;

const EXIF_ID: &[u8] = b"Exif\0\0";
const XMP_ID: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const MPF_ID: &[u8] = b"MPF\0";

/// One APPn segment as found in the byte stream, with its payload
/// (excluding the 2-byte length field and marker).
#[derive(Debug, Clone)]
pub struct Segment {
    pub marker: u8,
    pub payload: Vec<u8>,
}

/// Splits a JPEG byte stream into its leading marker segments, stopping at
/// the first Start-Of-Scan (compressed image data is not segment-structured
/// and this crate never needs to look inside it).
pub fn parse_segments(data: &[u8]) -> Result<Vec<Segment>> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != SOI {
        return Err(UhdrError::DecodeError("missing JPEG SOI marker".into()));
    }
    let mut segments = Vec::new();
    let mut pos = 2usize;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return Err(UhdrError::DecodeError(format!("expected marker prefix at offset {pos}")));
        }
        let marker = data[pos + 1];
        if marker == SOS || marker == EOI {
            break;
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if len < 2 || pos + 2 + len > data.len() {
            return Err(UhdrError::DecodeError(format!("invalid segment length at offset {pos}")));
        }
        let payload = data[pos + 4..pos + 2 + len].to_vec();
        segments.push(Segment { marker, payload });
        pos += 2 + len;
    }
    Ok(segments)
}

/// Finds the byte offset of the first Start-Of-Scan marker, i.e. where the
/// entropy-coded primary image data begins.
pub fn find_sos_offset(data: &[u8]) -> Result<usize> {
    let mut pos = 2usize;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return Err(UhdrError::DecodeError(format!("expected marker prefix at offset {pos}")));
        }
        let marker = data[pos + 1];
        if marker == SOS {
            return Ok(pos);
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        pos += 2 + len;
    }
    Err(UhdrError::DecodeError("no SOS marker found".into()))
}

/// Finds the byte offset of the first EOI marker at or after `from`.
pub fn find_eoi_offset(data: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    while pos + 1 < data.len() {
        if data[pos] == 0xFF && data[pos + 1] == EOI {
            return Some(pos);
        }
        pos += 1;
    }
    None
}

/// Extracts the raw EXIF TIFF payload from the first matching APP1 segment, if any.
pub fn extract_exif(segments: &[Segment]) -> Option<Vec<u8>> {
    segments
        .iter()
        .find(|s| s.marker == APP1 && s.payload.starts_with(EXIF_ID))
        .map(|s| s.payload[EXIF_ID.len()..].to_vec())
}

/// Extracts the raw XMP packet bytes from the first matching APP1 segment, if any.
pub fn extract_xmp(segments: &[Segment]) -> Option<Vec<u8>> {
    segments
        .iter()
        .find(|s| s.marker == APP1 && s.payload.starts_with(XMP_ID))
        .map(|s| s.payload[XMP_ID.len()..].to_vec())
}

/// One entry in an MPF index IFD: image type/size/offset/dependency fields.
#[derive(Debug, Clone, Copy)]
pub struct MpfImageEntry {
    pub image_data_size: u32,
    /// Offset of the secondary image, relative to the start of the MPF
    /// segment's payload (i.e. right after the `MPF\0` identifier).
    pub image_data_offset: u32,
}

/// Parses an APP2 MPF segment payload into its list of image entries. Only
/// the fields this crate needs (size + offset per image) are decoded; the
/// attribute/type flags in each entry are not interpreted since this crate
/// always treats entry 0 as primary and entry 1 as the gain map.
pub fn parse_mpf(payload: &[u8]) -> Result<Vec<MpfImageEntry>> {
    if !payload.starts_with(MPF_ID) {
        return Err(UhdrError::MetadataError("APP2 payload is not an MPF segment".into()));
    }
    let tiff = &payload[MPF_ID.len()..];
    if tiff.len() < 8 {
        return Err(UhdrError::MetadataError("MPF TIFF header truncated".into()));
    }
    let little_endian = &tiff[0..2] == b"II";
    let read_u16 = |b: &[u8]| -> u16 {
        if little_endian {
            u16::from_le_bytes([b[0], b[1]])
        } else {
            u16::from_be_bytes([b[0], b[1]])
        }
    };
    let read_u32 = |b: &[u8]| -> u32 {
        if little_endian {
            u32::from_le_bytes([b[0], b[1], b[2], b[3]])
        } else {
            u32::from_be_bytes([b[0], b[1], b[2], b[3]])
        }
    };

    let ifd_offset = read_u32(&tiff[4..8]) as usize;
    if ifd_offset + 2 > tiff.len() {
        return Err(UhdrError::MetadataError("MPF IFD offset out of range".into()));
    }
    let entry_count = read_u16(&tiff[ifd_offset..ifd_offset + 2]) as usize;
    let entries_start = ifd_offset + 2;

    // Tag 0xB002 (NumberOfImages) and 0xB003 (MPEntry) are what this crate
    // needs; everything else in the index IFD is skipped.
    let mut number_of_images = 0u32;
    let mut mp_entry_offset = None;
    let mut mp_entry_count = 0u32;

    for i in 0..entry_count {
        let entry_start = entries_start + i * 12;
        if entry_start + 12 > tiff.len() {
            break;
        }
        let tag = read_u16(&tiff[entry_start..entry_start + 2]);
        let count = read_u32(&tiff[entry_start + 4..entry_start + 8]);
        let value_offset = read_u32(&tiff[entry_start + 8..entry_start + 12]);
        match tag {
            0xB002 => number_of_images = value_offset,
            0xB003 => {
                mp_entry_offset = Some(value_offset as usize);
                mp_entry_count = count / 16; // each MP Entry record is 16 bytes
            }
            _ => {}
        }
    }

    let mp_entry_offset = mp_entry_offset.ok_or_else(|| UhdrError::MetadataError("MPF index missing MPEntry tag".into()))?;
    let n = mp_entry_count.max(number_of_images) as usize;
    let mut entries = Vec::with_capacity(n);
    for i in 0..n {
        let start = mp_entry_offset + i * 16;
        if start + 16 > tiff.len() {
            break;
        }
        let image_data_size = read_u32(&tiff[start + 4..start + 8]);
        let image_data_offset = read_u32(&tiff[start + 8..start + 12]);
        entries.push(MpfImageEntry {
            image_data_size,
            image_data_offset,
        });
    }
    if entries.is_empty() {
        return Err(UhdrError::GainMapImageNotFound);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_jpeg_with_app1_xmp(xmp: &[u8]) -> Vec<u8> {
        let mut out = vec![0xFF, SOI];
        let mut payload = XMP_ID.to_vec();
        payload.extend_from_slice(xmp);
        let len = (payload.len() + 2) as u16;
        out.push(0xFF);
        out.push(APP1);
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&[0xFF, SOS, 0x00, 0x02]);
        out.extend_from_slice(&[0xFF, EOI]);
        out
    }

    #[test]
    fn parses_app1_xmp_segment() {
        let data = minimal_jpeg_with_app1_xmp(b"<xmp/>");
        let segments = parse_segments(&data).unwrap();
        let xmp = extract_xmp(&segments).unwrap();
        assert_eq!(xmp, b"<xmp/>");
    }

    #[test]
    fn rejects_missing_soi() {
        let err = parse_segments(&[0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, UhdrError::DecodeError(_)));
    }

    #[test]
    fn find_sos_offset_locates_scan_marker() {
        let data = minimal_jpeg_with_app1_xmp(b"<xmp/>");
        let sos = find_sos_offset(&data).unwrap();
        assert_eq!(data[sos], 0xFF);
        assert_eq!(data[sos + 1], SOS);
    }
}
