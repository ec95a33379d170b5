//! High-level JPEG container operations used by the pipeline assembler:
//! decoding the SDR base and gain map out of a gain-map JPEG, and encoding
//! a fresh one.

pub mod collaborator;
pub mod parser;
pub mod writer;
pub mod xmp;

use crate::buffer::{ColorGamut, ColorTransfer, MonoImage, YuvImage};
use crate::colormath::transfer::srgb_oetf;
use crate::colormath::yuvrgb::{rgb_to_yuv, YuvMatrix};
use crate::error::{Result, UhdrError};
use crate::gainmap::GainMapMetadata;
use collaborator::{ImageCrateJpegCodec, JpegDecodeCollaborator, JpegEncodeCollaborator};

/// Decodes the primary (SDR base) image out of a gain-map JPEG's bytes.
/// SDR images decoded from JPEG always use the BT.601 YUV matrix
/// regardless of any declared gamut, per this crate's color-math rules.
pub fn decode_sdr(data: &[u8]) -> Result<YuvImage> {
    let codec = ImageCrateJpegCodec;
    let (width, height, rgb) = codec.decode_to_rgb8(data)?;
    rgb_to_yuv420(&rgb, width, height, ColorGamut::Bt709, ColorTransfer::Srgb)
}

/// Decodes the gain map image referenced by a gain-map JPEG's MPF
/// directory, along with the metadata recorded in its XMP packet.
pub fn decode_gain_map(data: &[u8]) -> Result<(MonoImage, GainMapMetadata)> {
    let segments = parser::parse_segments(data)?;
    let xmp = parser::extract_xmp(&segments).ok_or_else(|| {
        UhdrError::MetadataError("gain map JPEG has no XMP packet with hdrgm metadata".into())
    })?;
    let metadata = xmp::read_gain_map_xmp(&xmp)?;

    let mpf_payload = segments
        .iter()
        .find(|s| s.marker == 0xE2 && s.payload.starts_with(b"MPF\0"))
        .map(|s| s.payload.clone())
        .ok_or(UhdrError::GainMapImageNotFound)?;
    let entries = parser::parse_mpf(&mpf_payload)?;
    let gain_map_entry = entries.get(1).ok_or(UhdrError::GainMapImageNotFound)?;

    let primary_eoi = parser::find_eoi_offset(data, parser::find_sos_offset(data)?)
        .ok_or_else(|| UhdrError::DecodeError("primary image EOI not found".into()))?
        + 2;
    let start = primary_eoi + gain_map_entry.image_data_offset as usize;
    let end = start + gain_map_entry.image_data_size as usize;
    if end > data.len() {
        return Err(UhdrError::GainMapImageNotFound);
    }
    let gain_map_jpeg = &data[start..end];

    let codec = ImageCrateJpegCodec;
    let (width, height, rgb) = codec.decode_to_rgb8(gain_map_jpeg)?;
    let mut plane = vec![0u8; (width * height) as usize];
    for i in 0..(width * height) as usize {
        plane[i] = rgb[i * 3]; // encoded as r=g=b=gray, see encode_gain_map_jpeg
    }
    let map = MonoImage::new(width, height, width, plane)?;
    Ok((map, metadata))
}

fn rgb_to_yuv420(rgb: &[u8], width: u32, height: u32, gamut: ColorGamut, transfer: ColorTransfer) -> Result<YuvImage> {
    let mut y_plane = vec![0u8; (width * height) as usize];
    let cw = width / 2;
    let ch = height / 2;
    let mut u_acc = vec![0i32; (cw * ch) as usize];
    let mut v_acc = vec![0i32; (cw * ch) as usize];
    let mut counts = vec![0i32; (cw * ch) as usize];

    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            let r = f32::from(rgb[idx]) / 255.0;
            let g = f32::from(rgb[idx + 1]) / 255.0;
            let b = f32::from(rgb[idx + 2]) / 255.0;
            let (yv, u, v) = rgb_to_yuv(r, g, b, YuvMatrix::Bt601);
            y_plane[(y * width + x) as usize] = (yv.clamp(0.0, 1.0) * 255.0).round() as u8;
            let cidx = ((y / 2) * cw + (x / 2)) as usize;
            u_acc[cidx] += ((u + 0.5).clamp(0.0, 1.0) * 255.0).round() as i32;
            v_acc[cidx] += ((v + 0.5).clamp(0.0, 1.0) * 255.0).round() as i32;
            counts[cidx] += 1;
        }
    }
    let mut u_plane = vec![0u8; (cw * ch) as usize];
    let mut v_plane = vec![0u8; (cw * ch) as usize];
    for i in 0..u_plane.len() {
        let n = counts[i].max(1);
        u_plane[i] = (u_acc[i] / n) as u8;
        v_plane[i] = (v_acc[i] / n) as u8;
    }

    YuvImage::new(width, height, width, cw, cw, y_plane, u_plane, v_plane, gamut, transfer)
}

fn yuv420_to_rgb8(img: &YuvImage) -> Vec<u8> {
    let matrix = YuvMatrix::for_gamut(img.gamut);
    let mut rgb = vec![0u8; (img.width * img.height * 3) as usize];
    for y in 0..img.height {
        for x in 0..img.width {
            let yf = f32::from(img.y_at(x, y)) / 255.0;
            let (u, v) = img.chroma_at(x, y);
            let uf = f32::from(u) / 255.0 - 0.5;
            let vf = f32::from(v) / 255.0 - 0.5;
            let (r, g, b) = rgb_to_yuv_inverse(yf, uf, vf, matrix);
            let idx = ((y * img.width + x) * 3) as usize;
            rgb[idx] = (srgb_clamp(r) * 255.0).round() as u8;
            rgb[idx + 1] = (srgb_clamp(g) * 255.0).round() as u8;
            rgb[idx + 2] = (srgb_clamp(b) * 255.0).round() as u8;
        }
    }
    rgb
}

#[inline]
fn srgb_clamp(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

#[inline]
fn rgb_to_yuv_inverse(y: f32, u: f32, v: f32, matrix: YuvMatrix) -> (f32, f32, f32) {
    crate::colormath::yuvrgb::yuv_to_rgb(y, u, v, matrix)
}

/// Encodes a full gain-map JPEG container: the SDR base as the primary
/// image, `min(quality, 100)`-quality DCT compression, gain map metadata as
/// an XMP packet, an optional EXIF block, and the gain map itself appended
/// as MPF's secondary image.
pub fn encode_container(
    base: &YuvImage,
    gain_map: &MonoImage,
    metadata: &GainMapMetadata,
    quality: u8,
    exif: Option<&[u8]>,
) -> Result<Vec<u8>> {
    let codec = ImageCrateJpegCodec;
    let quality = quality.min(100);

    let base_rgb = yuv420_to_rgb8(base);
    let primary_jpeg = codec.encode_rgb8(base.width, base.height, &base_rgb, quality)?;

    let gain_map_jpeg = codec.encode_gray8(gain_map.width, gain_map.height, &gain_map.plane, quality)?;

    let xmp_body = xmp::write_gain_map_xmp(metadata)?;
    let xmp_packet = xmp::wrap_xmpmeta(&xmp_body)?;
    let mut segments = vec![writer::build_app1_xmp(&xmp_packet)?];
    if let Some(exif_bytes) = exif {
        segments.push(writer::build_app1_exif(exif_bytes)?);
    }
    let mpf_segment = writer::build_app2_mpf(0, gain_map_jpeg.len() as u32, primary_jpeg.len() as u32)?;
    segments.push(mpf_segment);

    writer::assemble_container(&primary_jpeg, &segments, &gain_map_jpeg)
}

/// Encodes a plain JPEG: just the base image, no gain map, no XMP/MPF
/// segments. Used for the non-`_R` output request (spec section 4.7 step 5).
pub fn encode_base_only(base: &YuvImage, quality: u8) -> Result<Vec<u8>> {
    let codec = ImageCrateJpegCodec;
    let quality = quality.min(100);
    let base_rgb = yuv420_to_rgb8(base);
    codec.encode_rgb8(base.width, base.height, &base_rgb, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{ColorGamut, ColorTransfer};

    fn sample_base(w: u32, h: u32) -> YuvImage {
        let y = vec![128u8; (w * h) as usize];
        let c = vec![128u8; ((w / 2) * (h / 2)) as usize];
        YuvImage::new(w, h, w, w / 2, w / 2, y, c.clone(), c, ColorGamut::Bt709, ColorTransfer::Srgb).unwrap()
    }

    #[test]
    fn yuv420_to_rgb8_produces_expected_length() {
        let base = sample_base(4, 4);
        let rgb = yuv420_to_rgb8(&base);
        assert_eq!(rgb.len(), 4 * 4 * 3);
    }

    #[test]
    fn encode_base_only_produces_nonempty_jpeg() {
        let base = sample_base(8, 8);
        let bytes = encode_base_only(&base, 90).unwrap();
        assert!(!bytes.is_empty());
    }
}
