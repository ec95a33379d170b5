//! JPEG container assembly: inserting APP1 (Exif/XMP) and APP2 (MPF)
//! segments into an encoded primary image, then appending the gain map
//! image as MPF's secondary picture.
//!
//! Grounded on the teacher's `jpeg/writer.rs`, which built the same segment
//! byte layout by hand.

use crate::error::{Result, UhdrError};

const SOI_LEN: usize = 2;
const APP1: u8 = 0xE1;
const APP2: u8 = 0xE2;
const EXIF_ID: &[u8] = b"Exif\0\0";
const XMP_ID: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const MPF_ID: &[u8] = b"MPF\0";

fn segment(marker: u8, payload: &[u8]) -> Result<Vec<u8>> {
    let len = payload.len() + 2;
    if len > u16::MAX as usize {
        return Err(UhdrError::EncodeError(format!("segment payload too large ({len} bytes)")));
    }
    let mut out = Vec::with_capacity(len + 2);
    out.push(0xFF);
    out.push(marker);
    out.extend_from_slice(&(len as u16).to_be_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

/// Builds an APP1 segment carrying an XMP packet.
pub fn build_app1_xmp(xmp_packet: &[u8]) -> Result<Vec<u8>> {
    let mut payload = XMP_ID.to_vec();
    payload.extend_from_slice(xmp_packet);
    segment(APP1, &payload)
}

/// Builds an APP1 segment carrying a raw EXIF TIFF payload.
pub fn build_app1_exif(exif: &[u8]) -> Result<Vec<u8>> {
    let mut payload = EXIF_ID.to_vec();
    payload.extend_from_slice(exif);
    segment(APP1, &payload)
}

/// Builds an APP2 MPF segment with two entries: the primary image (entry 0,
/// offset always 0) and the gain map image appended after it (entry 1, at
/// `gain_map_offset` bytes past the end of the primary image's EOI marker).
pub fn build_app2_mpf(gain_map_offset: u32, gain_map_size: u32, primary_size: u32) -> Result<Vec<u8>> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM"); // big-endian
    tiff.extend_from_slice(&0x002Au16.to_be_bytes());
    tiff.extend_from_slice(&8u32.to_be_bytes()); // IFD starts right after the 8-byte header

    // Index IFD: 3 entries (Version, NumberOfImages, MPEntry), no next-IFD offset.
    tiff.extend_from_slice(&3u16.to_be_bytes());

    // MPFVersion (0xB000), UNDEFINED[4], inline "0100".
    tiff.extend_from_slice(&0xB000u16.to_be_bytes());
    tiff.extend_from_slice(&7u16.to_be_bytes()); // type UNDEFINED
    tiff.extend_from_slice(&4u32.to_be_bytes());
    tiff.extend_from_slice(b"0100");

    // NumberOfImages (0xB002), LONG, value 2.
    tiff.extend_from_slice(&0xB002u16.to_be_bytes());
    tiff.extend_from_slice(&4u16.to_be_bytes());
    tiff.extend_from_slice(&1u32.to_be_bytes());
    tiff.extend_from_slice(&2u32.to_be_bytes());

    // MPEntry (0xB003): 2 records of 16 bytes each, stored out-of-line
    // right after the next-IFD-offset field below.
    let mp_entry_array_offset = (tiff.len() + 12 + 4) as u32;
    tiff.extend_from_slice(&0xB003u16.to_be_bytes());
    tiff.extend_from_slice(&7u16.to_be_bytes()); // UNDEFINED
    tiff.extend_from_slice(&32u32.to_be_bytes()); // 2 records * 16 bytes
    tiff.extend_from_slice(&mp_entry_array_offset.to_be_bytes());

    tiff.extend_from_slice(&0u32.to_be_bytes()); // no next IFD

    // MP Entry 0: primary image, representative, 0 offset.
    tiff.extend_from_slice(&0x0300_0000u32.to_be_bytes()); // attribute flags: representative image
    tiff.extend_from_slice(&primary_size.to_be_bytes());
    tiff.extend_from_slice(&0u32.to_be_bytes());
    tiff.extend_from_slice(&0u16.to_be_bytes());
    tiff.extend_from_slice(&0u16.to_be_bytes());

    // MP Entry 1: gain map image, not representative, offset relative to
    // this MPF segment's own position (the convention this crate's reader
    // in `jpeg::mod` resolves against the primary image's EOI).
    tiff.extend_from_slice(&0u32.to_be_bytes());
    tiff.extend_from_slice(&gain_map_size.to_be_bytes());
    tiff.extend_from_slice(&gain_map_offset.to_be_bytes());
    tiff.extend_from_slice(&0u16.to_be_bytes());
    tiff.extend_from_slice(&0u16.to_be_bytes());

    let mut payload = MPF_ID.to_vec();
    payload.extend_from_slice(&tiff);
    segment(APP2, &payload)
}

/// Inserts `segments` immediately after the SOI marker of `primary_jpeg`,
/// then appends `gain_map_jpeg` as a second, independent JPEG stream
/// (MPF's secondary image).
pub fn assemble_container(primary_jpeg: &[u8], segments: &[Vec<u8>], gain_map_jpeg: &[u8]) -> Result<Vec<u8>> {
    if primary_jpeg.len() < SOI_LEN || primary_jpeg[0] != 0xFF || primary_jpeg[1] != 0xD8 {
        return Err(UhdrError::EncodeError("primary image is not a valid JPEG stream".into()));
    }
    let mut out = Vec::with_capacity(primary_jpeg.len() + gain_map_jpeg.len() + 256);
    out.extend_from_slice(&primary_jpeg[0..SOI_LEN]);
    for s in segments {
        out.extend_from_slice(s);
    }
    out.extend_from_slice(&primary_jpeg[SOI_LEN..]);
    out.extend_from_slice(gain_map_jpeg);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xmp_segment_has_app1_marker() {
        let seg = build_app1_xmp(b"<xmp/>").unwrap();
        assert_eq!(seg[0], 0xFF);
        assert_eq!(seg[1], APP1);
    }

    #[test]
    fn mpf_segment_carries_identifier() {
        let seg = build_app2_mpf(100, 50, 200).unwrap();
        assert_eq!(&seg[4..8], MPF_ID);
    }

    #[test]
    fn assemble_places_segments_after_soi() {
        let primary = vec![0xFFu8, 0xD8, 0xFF, 0xD9];
        let seg = build_app1_xmp(b"x").unwrap();
        let out = assemble_container(&primary, &[seg.clone()], &[0xFF, 0xD8, 0xFF, 0xD9]).unwrap();
        assert_eq!(&out[0..2], &[0xFF, 0xD8]);
        assert_eq!(&out[2..2 + seg.len()], seg.as_slice());
    }
}
