//! `convert`: the minimal-work dispatch algorithm tying generation,
//! application, and JPEG container I/O to whatever artifacts are already
//! present in a [`PipelineState`].
//!
//! Grounded on the teacher's `UltrahdrEncoder::encode`/`UltrahdrDecoder::decode`
//! entry points, which each ran a fixed sequence of steps; generalized here
//! into one dispatcher that only does the work a given `(state, config)`
//! pair actually requires, skipping any step whose target slot is already
//! filled.

use crate::assembler::config::{OutputCodec, PipelineConfig};
use crate::assembler::state::PipelineState;
use crate::buffer::{CompressedFormat, CompressedImage, HdrOutput};
use crate::codec::jpeg;
use crate::error::{Result, UhdrError};
use crate::gainmap::{apply_gain_map, generate_gain_map, ApplyConfig, GenerateConfig};
use crate::geometry::{add_effects, apply_effects_to_yuv};

/// What `convert` produced.
#[derive(Debug, Clone)]
pub enum ConvertOutput {
    Jpeg(Vec<u8>),
    Pixels(HdrOutput),
}

/// Runs the pipeline described by `config` against `state`, materializing
/// only the intermediate artifacts the requested output needs, then writes
/// the result into `out`.
///
/// Step order:
/// 1. Decode `sdr_compressed` into `sdr_raw` if the latter is missing.
/// 2. Decode `hdr_compressed` into `hdr_raw` if the latter is missing and a
///    gain map still needs to be generated.
/// 3. Materialize `gain_map_raw`/`gain_map_metadata`: decode from
///    `gain_map_compressed` if present, else generate from `sdr_raw` +
///    `hdr_raw`.
/// 4. Apply any requested geometric effects to the base image and gain map
///    together.
/// 5. Produce the requested output: apply the gain map for a raw pixel
///    request, or encode a JPEG container (base + gain map + metadata +
///    EXIF) for a JPEG request.
/// 6. Cache whatever was freshly computed back into `state` so a second
///    `convert` call against the same state reuses it.
pub fn convert(state: &mut PipelineState, config: &PipelineConfig) -> Result<ConvertOutput> {
    config.validate()?;
    log::debug!("convert: output={:?}", config.output);

    // Step 1: decode SDR base if needed.
    if state.sdr_raw.is_none() {
        if let Some(compressed) = state.sdr_compressed.clone() {
            log::trace!("decoding sdr_raw from sdr_compressed ({} bytes)", compressed.data.len());
            let decoded = jpeg::decode_sdr(&compressed.data)?;
            state.add_sdr_raw(decoded);
        }
    }

    // Plain JPEG never materializes a gain map: encode only the base and
    // return early (spec section 4.7 step 5).
    if matches!(config.output, OutputCodec::Jpeg) {
        let mut base = state
            .sdr_raw
            .clone()
            .ok_or_else(|| UhdrError::InsufficientResource("sdr_raw required to encode a base JPEG".into()))?;
        if !config.effects.is_empty() {
            base = apply_effects_to_yuv(base, &config.effects)?;
            state.sdr_compressed = None;
        }
        log::trace!("encoding base-only JPEG ({}x{})", base.width, base.height);
        let bytes = jpeg::encode_base_only(&base, config.quality)?;
        state.sdr_raw = Some(base.clone());
        state.add_sdr_compressed(CompressedImage::new(CompressedFormat::Jpeg, base.width, base.height, bytes.clone()));
        return Ok(ConvertOutput::Jpeg(bytes));
    }

    // Step 2 + 3: gain map + metadata.
    if state.gain_map_raw.is_none() || state.gain_map_metadata.is_none() {
        if let Some(compressed) = state.gain_map_compressed.clone() {
            log::trace!("decoding gain_map_raw from gain_map_compressed ({} bytes)", compressed.data.len());
            let (map, metadata) = jpeg::decode_gain_map(&compressed.data)?;
            state.add_gain_map_raw(map);
            state.add_gain_map_metadata(metadata);
        } else {
            if state.hdr_raw.is_none() && state.hdr_compressed.is_some() {
                return Err(UhdrError::UnsupportedFeature(
                    "decoding a compressed HDR base image requires an HEIC/AVIF collaborator".into(),
                ));
            }
            let sdr_raw = state
                .sdr_raw
                .clone()
                .ok_or_else(|| UhdrError::InsufficientResource("sdr_raw required to generate a gain map".into()))?;
            let hdr_raw = state
                .hdr_raw
                .clone()
                .ok_or_else(|| UhdrError::InsufficientResource("hdr_raw required to generate a gain map".into()))?;
            log::trace!("generating gain_map_raw from sdr_raw + hdr_raw");
            let (map, metadata) = generate_gain_map(&sdr_raw, &hdr_raw, GenerateConfig::default())?;
            state.add_gain_map_raw(map);
            state.add_gain_map_metadata(metadata);
        }
    }

    // Step 4: geometric effects, applied once to the pair together.
    if !config.effects.is_empty() {
        let base = state
            .sdr_raw
            .clone()
            .ok_or_else(|| UhdrError::InsufficientResource("sdr_raw required to apply effects".into()))?;
        let map = state
            .gain_map_raw
            .clone()
            .ok_or_else(|| UhdrError::InsufficientResource("gain_map_raw required to apply effects".into()))?;
        let (base, map) = add_effects(base, map, &config.effects)?;
        state.sdr_raw = Some(base);
        state.gain_map_raw = Some(map);
        // Effects invalidate any previously compressed renditions.
        state.sdr_compressed = None;
        state.gain_map_compressed = None;
    }

    let base = state.sdr_raw.clone().ok_or(UhdrError::NoImagesFound)?;
    let map = state.gain_map_raw.clone().ok_or(UhdrError::GainMapImageNotFound)?;
    let metadata = state
        .gain_map_metadata
        .clone()
        .ok_or_else(|| UhdrError::BadMetadata("missing gain map metadata".into()))?;

    // Step 5: produce the requested output.
    match config.output {
        OutputCodec::RawPixels(layout) => {
            let apply_config = ApplyConfig {
                display_boost: config.display_boost,
                output_layout: layout,
                output_gamut: config.output_gamut,
                output_transfer: config.output_transfer,
            };
            let output = apply_gain_map(&base, &map, &metadata, apply_config)?;
            Ok(ConvertOutput::Pixels(output))
        }
        OutputCodec::JpegR => {
            let bytes = jpeg::encode_container(&base, &map, &metadata, config.quality, state.exif.as_deref())?;
            // Step 6: cache the freshly built compressed artifacts.
            state.add_sdr_compressed(CompressedImage::new(
                CompressedFormat::Jpeg,
                base.width,
                base.height,
                bytes.clone(),
            ));
            Ok(ConvertOutput::Jpeg(bytes))
        }
        OutputCodec::Jpeg => unreachable!("plain JPEG output returns early above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{ColorGamut, ColorTransfer, P010Image, PixelLayout, YuvImage};

    fn sdr(w: u32, h: u32) -> YuvImage {
        let y = vec![128u8; (w * h) as usize];
        let c = vec![128u8; ((w / 2) * (h / 2)) as usize];
        YuvImage::new(w, h, w, w / 2, w / 2, y, c.clone(), c, ColorGamut::Bt709, ColorTransfer::Srgb).unwrap()
    }

    fn hdr(w: u32, h: u32) -> P010Image {
        let y = vec![700u16 << 6; (w * h) as usize];
        let uv = vec![512u16 << 6; (w * (h / 2)) as usize];
        P010Image::new(w, h, w, w, y, uv, ColorGamut::Bt2100, ColorTransfer::Pq).unwrap()
    }

    #[test]
    fn generates_gain_map_when_only_raw_images_present() {
        let mut state = PipelineState::new();
        state.add_sdr_raw(sdr(8, 8));
        state.add_hdr_raw(hdr(8, 8));
        let config = PipelineConfig {
            output: OutputCodec::RawPixels(PixelLayout::Rgba8888),
            ..PipelineConfig::default()
        };
        let result = convert(&mut state, &config).unwrap();
        match result {
            ConvertOutput::Pixels(out) => {
                assert_eq!(out.width(), 8);
            }
            _ => panic!("expected pixel output"),
        }
        assert!(state.gain_map_raw.is_some());
    }

    #[test]
    fn fails_without_enough_artifacts() {
        let mut state = PipelineState::new();
        state.add_sdr_raw(sdr(8, 8));
        let config = PipelineConfig {
            output: OutputCodec::RawPixels(PixelLayout::Rgba8888),
            ..PipelineConfig::default()
        };
        assert!(convert(&mut state, &config).is_err());
    }

    #[test]
    fn plain_jpeg_output_never_materializes_a_gain_map() {
        let mut state = PipelineState::new();
        state.add_sdr_raw(sdr(8, 8));
        let config = PipelineConfig {
            output: OutputCodec::Jpeg,
            ..PipelineConfig::default()
        };
        let result = convert(&mut state, &config).unwrap();
        assert!(matches!(result, ConvertOutput::Jpeg(bytes) if !bytes.is_empty()));
        assert!(state.gain_map_raw.is_none());
        assert!(state.gain_map_metadata.is_none());
    }

    #[test]
    fn jpeg_r_output_encodes_a_gain_map_container() {
        let mut state = PipelineState::new();
        state.add_sdr_raw(sdr(8, 8));
        state.add_hdr_raw(hdr(8, 8));
        let config = PipelineConfig {
            output: OutputCodec::JpegR,
            ..PipelineConfig::default()
        };
        let result = convert(&mut state, &config).unwrap();
        assert!(matches!(result, ConvertOutput::Jpeg(bytes) if !bytes.is_empty()));
        assert!(state.gain_map_raw.is_some());
    }
}
