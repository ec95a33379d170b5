//! Pluggable JPEG encode/decode backends.
//!
//! Grounded on the teacher's direct calls into the `image` and `zune-jpeg`
//! crates inside `jpeg/parser.rs`/`jpeg/writer.rs`; generalized here behind
//! traits so the container-format code (MPF/XMP assembly) does not care
//! which crate actually runs the DCT/entropy coding, matching the
//! `HeicAvifEncodeCollaborator`/`HeicAvifDecodeCollaborator` split used for
//! the codecs this crate does not bundle an implementation for.

use crate::error::{Result, UhdrError};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, GenericImageView};

/// Encodes raw 8-bit pixel planes into JPEG bytes.
pub trait JpegEncodeCollaborator {
    /// Encodes an interleaved RGB8 buffer (`width * height * 3` bytes).
    fn encode_rgb8(&self, width: u32, height: u32, rgb: &[u8], quality: u8) -> Result<Vec<u8>>;

    /// Encodes a single-channel 8-bit buffer (`width * height` bytes).
    fn encode_gray8(&self, width: u32, height: u32, gray: &[u8], quality: u8) -> Result<Vec<u8>>;
}

/// Decodes JPEG bytes into raw 8-bit pixel planes.
pub trait JpegDecodeCollaborator {
    /// Decodes JPEG bytes to an interleaved RGB8 buffer, returning
    /// `(width, height, pixels)`.
    fn decode_to_rgb8(&self, data: &[u8]) -> Result<(u32, u32, Vec<u8>)>;
}

/// The bundled collaborator, backed by the `image` crate for encode and
/// `zune-jpeg` for decode (the same two crates the teacher depended on).
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateJpegCodec;

impl JpegEncodeCollaborator for ImageCrateJpegCodec {
    fn encode_rgb8(&self, width: u32, height: u32, rgb: &[u8], quality: u8) -> Result<Vec<u8>> {
        let expected = (width as usize) * (height as usize) * 3;
        if rgb.len() < expected {
            return Err(UhdrError::BufferTooSmall("rgb buffer shorter than width*height*3".into()));
        }
        log::trace!("encoding {width}x{height} rgb8 at quality {quality} via image::codecs::jpeg");
        let mut out = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
        encoder
            .encode(rgb, width, height, ColorType::Rgb8.into())
            .map_err(|e| UhdrError::EncodeError(e.to_string()))?;
        Ok(out)
    }

    fn encode_gray8(&self, width: u32, height: u32, gray: &[u8], quality: u8) -> Result<Vec<u8>> {
        let expected = (width as usize) * (height as usize);
        if gray.len() < expected {
            return Err(UhdrError::BufferTooSmall("gray buffer shorter than width*height".into()));
        }
        let mut out = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
        encoder
            .encode(gray, width, height, ColorType::L8.into())
            .map_err(|e| UhdrError::EncodeError(e.to_string()))?;
        Ok(out)
    }
}

impl JpegDecodeCollaborator for ImageCrateJpegCodec {
    fn decode_to_rgb8(&self, data: &[u8]) -> Result<(u32, u32, Vec<u8>)> {
        log::trace!("decoding {} bytes of jpeg via zune-jpeg", data.len());
        let mut decoder = zune_jpeg::JpegDecoder::new(data);
        let pixels = decoder
            .decode()
            .map_err(|e| UhdrError::DecodeError(format!("{e:?}")))?;
        let info = decoder
            .info()
            .ok_or_else(|| UhdrError::DecodeError("zune-jpeg produced no image info".into()))?;
        let (width, height) = (u32::from(info.width), u32::from(info.height));

        let channels = pixels.len() / (width as usize * height as usize).max(1);
        let rgb = match channels {
            3 => pixels,
            1 => {
                let mut out = Vec::with_capacity(pixels.len() * 3);
                for g in pixels {
                    out.extend_from_slice(&[g, g, g]);
                }
                out
            }
            _ => {
                // Fall back to the `image` crate's own decoder for layouts
                // zune-jpeg surfaces differently (e.g. CMYK).
                let img = image::load_from_memory(data)?;
                let (w, h) = img.dimensions();
                return Ok((w, h, img.to_rgb8().into_raw()));
            }
        };
        Ok((width, height, rgb))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_rejects_short_buffer() {
        let codec = ImageCrateJpegCodec;
        let err = codec.encode_rgb8(4, 4, &[0u8; 4], 90).unwrap_err();
        assert!(matches!(err, UhdrError::BufferTooSmall(_)));
    }
}
