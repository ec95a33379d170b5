//! Gain-map application: SDR + gain map + metadata -> HDR output buffer.
//!
//! Grounded on the teacher's `gainmap/decode.rs`, generalized from
//! nearest-neighbor gain-map sampling to Shepard's inverse-distance-weighted
//! upsampling with a precomputed `S x S` weight table (falling back to plain
//! bilinear interpolation when the map-to-base scale factor is not
//! integral).

use crate::buffer::{ColorGamut, ColorTransfer, HdrOutput, MonoImage, PixelLayout, YuvImage};
use crate::colormath::gain::{apply_gain, gain_factor};
use crate::colormath::gamut::convert_gamut;
use crate::colormath::transfer::{hlg_oetf, pq_oetf, srgb_inv_oetf};
use crate::colormath::yuvrgb::{yuv_to_rgb, YuvMatrix};
use crate::error::{Result, UhdrError};
use crate::gainmap::metadata::{GainMapMetadata, SUPPORTED_VERSION};
use crate::tilequeue;

/// Tunables controlling how the gain map is sampled and how the result is
/// tone-limited for the target display.
#[derive(Debug, Clone, Copy)]
pub struct ApplyConfig {
    pub display_boost: f32,
    pub output_layout: PixelLayout,
    pub output_gamut: ColorGamut,
    /// Transfer function applied to the normalized linear RGB before
    /// packing a [`PixelLayout::Rgba1010102`] output word. Ignored for
    /// other output layouts, which carry linear values directly.
    pub output_transfer: ColorTransfer,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            display_boost: 1000.0 / 203.0,
            output_layout: PixelLayout::Rgba8888,
            output_gamut: ColorGamut::Bt709,
            output_transfer: ColorTransfer::Hlg,
        }
    }
}

/// Precomputed Shepard's IDW weights for a `scale x scale` neighborhood of
/// map pixels around a base pixel, indexed by the base pixel's offset within
/// its map cell.
struct IdwTable {
    scale: u32,
    /// `weights[local_y][local_x]` holds the 4 bilinear-style IDW weights
    /// for the 2x2 map pixels surrounding this base-pixel offset.
    weights: Vec<[f32; 4]>,
}

impl IdwTable {
    fn build(scale: u32) -> Self {
        let n = scale.max(1) as usize;
        let mut weights = Vec::with_capacity(n * n);
        for ly in 0..n {
            for lx in 0..n {
                let fx = (lx as f32 + 0.5) / n as f32;
                let fy = (ly as f32 + 0.5) / n as f32;
                // Distances to the 4 surrounding map-cell centers (at map
                // coordinates (0,0),(1,0),(0,1),(1,1) in normalized units).
                let d00 = dist(fx, fy, 0.0, 0.0);
                let d10 = dist(fx, fy, 1.0, 0.0);
                let d01 = dist(fx, fy, 0.0, 1.0);
                let d11 = dist(fx, fy, 1.0, 1.0);
                let w = [inv_weight(d00), inv_weight(d10), inv_weight(d01), inv_weight(d11)];
                let sum: f32 = w.iter().sum();
                weights.push([w[0] / sum, w[1] / sum, w[2] / sum, w[3] / sum]);
            }
        }
        Self { scale: n as u32, weights }
    }

    fn weights_for(&self, local_x: u32, local_y: u32) -> [f32; 4] {
        let n = self.scale as usize;
        self.weights[(local_y as usize % n) * n + (local_x as usize % n)]
    }
}

#[inline]
fn dist(x0: f32, y0: f32, x1: f32, y1: f32) -> f32 {
    ((x0 - x1).powi(2) + (y0 - y1).powi(2)).sqrt().max(1e-4)
}

#[inline]
fn inv_weight(d: f32) -> f32 {
    1.0 / (d * d)
}

/// Samples the gain map at `(base_x, base_y)` in base-image coordinates,
/// using the precomputed IDW table when `base.width` is an integral
/// multiple of `map.width`, or plain bilinear interpolation otherwise.
fn sample_gain(map: &MonoImage, base_x: u32, base_y: u32, base_w: u32, base_h: u32, idw: Option<&IdwTable>) -> f32 {
    if let Some(table) = idw {
        let scale = table.scale;
        let mx = (base_x / scale).min(map.width - 1);
        let my = (base_y / scale).min(map.height - 1);
        let mx1 = (mx + 1).min(map.width - 1);
        let my1 = (my + 1).min(map.height - 1);
        let w = table.weights_for(base_x % scale, base_y % scale);
        let g00 = map.at(mx, my) as f32;
        let g10 = map.at(mx1, my) as f32;
        let g01 = map.at(mx, my1) as f32;
        let g11 = map.at(mx1, my1) as f32;
        return (g00 * w[0] + g10 * w[1] + g01 * w[2] + g11 * w[3]) / 255.0;
    }

    // Non-integral scale factor: bilinear sample in map space.
    let fx = (base_x as f32 + 0.5) / base_w as f32 * map.width as f32 - 0.5;
    let fy = (base_y as f32 + 0.5) / base_h as f32 * map.height as f32 - 0.5;
    let x0 = fx.floor().max(0.0) as u32;
    let y0 = fy.floor().max(0.0) as u32;
    let x1 = (x0 + 1).min(map.width - 1);
    let y1 = (y0 + 1).min(map.height - 1);
    let tx = (fx - x0 as f32).clamp(0.0, 1.0);
    let ty = (fy - y0 as f32).clamp(0.0, 1.0);
    let g00 = map.at(x0, y0) as f32;
    let g10 = map.at(x1, y0) as f32;
    let g01 = map.at(x0, y1) as f32;
    let g11 = map.at(x1, y1) as f32;
    let top = g00 * (1.0 - tx) + g10 * tx;
    let bottom = g01 * (1.0 - tx) + g11 * tx;
    (top * (1.0 - ty) + bottom * ty) / 255.0
}

/// Applies a gain map to an SDR base image, producing an HDR output buffer
/// in the layout named by `config.output_layout`.
pub fn apply_gain_map(
    base: &YuvImage,
    map: &MonoImage,
    metadata: &GainMapMetadata,
    config: ApplyConfig,
) -> Result<HdrOutput> {
    metadata.validate()?;
    if config.display_boost < 1.0 {
        return Err(UhdrError::InvalidDisplayBoost(config.display_boost));
    }
    if metadata.version != SUPPORTED_VERSION {
        return Err(UhdrError::BadMetadata(format!(
            "unsupported gain map version {:?} (expected {SUPPORTED_VERSION:?})",
            metadata.version
        )));
    }
    if (metadata.gamma - 1.0).abs() > 1e-6 {
        return Err(UhdrError::BadMetadata(format!(
            "gamma {} must equal 1.0",
            metadata.gamma
        )));
    }
    if metadata.offset_sdr != 0.0 || metadata.offset_hdr != 0.0 {
        return Err(UhdrError::BadMetadata(format!(
            "offsets must be zero, got offset_sdr={} offset_hdr={}",
            metadata.offset_sdr, metadata.offset_hdr
        )));
    }
    // This core only accepts the single-profile case where the declared HDR
    // capacity range matches the gain map's own boost range; relaxing this
    // needs a metadata profile this crate does not yet model.
    if (metadata.hdr_capacity_min - metadata.min_content_boost).abs() > 1e-3 {
        return Err(UhdrError::BadMetadata(format!(
            "hdr_capacity_min {} must equal min_content_boost {}",
            metadata.hdr_capacity_min, metadata.min_content_boost
        )));
    }
    if (metadata.hdr_capacity_max - metadata.max_content_boost).abs() > 1e-3 {
        return Err(UhdrError::BadMetadata(format!(
            "hdr_capacity_max {} must equal max_content_boost {}",
            metadata.hdr_capacity_max, metadata.max_content_boost
        )));
    }

    let integral_scale = if base.width % map.width == 0 && base.height % map.height == 0 {
        let sx = base.width / map.width;
        let sy = base.height / map.height;
        if sx == sy {
            Some(sx)
        } else {
            None
        }
    } else {
        None
    };
    let idw = integral_scale.map(IdwTable::build);

    let mut out = match config.output_layout {
        PixelLayout::Rgba8888 => HdrOutput::new_rgba8888(base.width, base.height)?,
        PixelLayout::RgbaF16 => HdrOutput::new_rgba_f16(base.width, base.height)?,
        PixelLayout::Rgba1010102 => HdrOutput::new_rgba1010102(base.width, base.height)?,
        other => {
            return Err(UhdrError::InvalidOutputFormat(format!("{other:?} is not a valid apply output")));
        }
    };

    let base_matrix = YuvMatrix::for_gamut(base.gamut);
    let base_w = base.width;
    let base_h = base.height;
    let d = config.display_boost.min(metadata.max_content_boost);

    tilequeue::run_tiled(base_h, |job| {
        for y in job.start_row..job.end_row {
            for x in 0..base_w {
                let y8 = base.y_at(x, y);
                let (u8_, v8_) = base.chroma_at(x, y);
                let yf = f32::from(y8) / 255.0;
                let uf = f32::from(u8_) / 255.0 - 0.5;
                let vf = f32::from(v8_) / 255.0 - 0.5;
                let (r_enc, g_enc, b_enc) = yuv_to_rgb(yf, uf, vf, base_matrix);
                let (r_lin, g_lin, b_lin) = (
                    srgb_inv_oetf(r_enc.clamp(0.0, 1.0)),
                    srgb_inv_oetf(g_enc.clamp(0.0, 1.0)),
                    srgb_inv_oetf(b_enc.clamp(0.0, 1.0)),
                );
                let (r_lin, g_lin, b_lin) = convert_gamut((r_lin, g_lin, b_lin), base.gamut, config.output_gamut);

                let g = sample_gain(map, x, y, base_w, base_h, idw.as_ref());
                let factor = gain_factor(
                    g,
                    metadata.gamma,
                    metadata.min_content_boost,
                    metadata.max_content_boost,
                    d,
                );

                let r = apply_gain(r_lin, factor, metadata.offset_sdr, metadata.offset_hdr).max(0.0);
                let gc = apply_gain(g_lin, factor, metadata.offset_sdr, metadata.offset_hdr).max(0.0);
                let b = apply_gain(b_lin, factor, metadata.offset_sdr, metadata.offset_hdr).max(0.0);

                // Normalize by D into [0, 1] per the applier's step 3.
                let (r, gc, b) = (r / d, gc / d, b / d);

                write_pixel(&mut out, x, y, (r, gc, b), config.output_transfer);
            }
        }
    });

    Ok(out)
}

fn write_pixel(out: &mut HdrOutput, x: u32, y: u32, rgb: (f32, f32, f32), output_transfer: ColorTransfer) {
    match out {
        HdrOutput::Rgba8888 { width, pixels, .. } => {
            let idx = ((y * *width + x) * 4) as usize;
            pixels[idx] = (rgb.0.clamp(0.0, 1.0) * 255.0).round() as u8;
            pixels[idx + 1] = (rgb.1.clamp(0.0, 1.0) * 255.0).round() as u8;
            pixels[idx + 2] = (rgb.2.clamp(0.0, 1.0) * 255.0).round() as u8;
            pixels[idx + 3] = 255;
        }
        HdrOutput::RgbaF16 { width, pixels, .. } => {
            let idx = ((y * *width + x) * 4) as usize;
            pixels[idx] = HdrOutput::f32_to_f16_bits(rgb.0);
            pixels[idx + 1] = HdrOutput::f32_to_f16_bits(rgb.1);
            pixels[idx + 2] = HdrOutput::f32_to_f16_bits(rgb.2);
            pixels[idx + 3] = HdrOutput::f32_to_f16_bits(1.0);
        }
        HdrOutput::Rgba1010102 { width, pixels, .. } => {
            let idx = (y * *width + x) as usize;
            let encode = |c: f32| -> u16 {
                let shaped = match output_transfer {
                    ColorTransfer::Pq => pq_oetf(c.clamp(0.0, 1.0)),
                    _ => hlg_oetf(c.clamp(0.0, 1.0)),
                };
                (shaped.clamp(0.0, 1.0) * 1023.0).round() as u16
            };
            let r = encode(rgb.0);
            let g = encode(rgb.1);
            let b = encode(rgb.2);
            pixels[idx] = HdrOutput::pack_1010102(r, g, b, 3);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_base(w: u32, h: u32, y_value: u8) -> YuvImage {
        let y = vec![y_value; (w * h) as usize];
        let c = vec![128u8; ((w / 2) * (h / 2)) as usize];
        YuvImage::new(w, h, w, w / 2, w / 2, y, c.clone(), c, ColorGamut::Bt709, ColorTransfer::Srgb).unwrap()
    }

    #[test]
    fn output_dimensions_match_base() {
        let base = flat_base(8, 8, 128);
        let map = MonoImage::filled(8, 8, 128);
        let md = GainMapMetadata::default();
        let out = apply_gain_map(&base, &map, &md, ApplyConfig::default()).unwrap();
        assert_eq!(out.width(), 8);
        assert_eq!(out.height(), 8);
    }

    #[test]
    fn integral_downscaled_map_upsamples_without_panicking() {
        let base = flat_base(16, 16, 200);
        let map = MonoImage::filled(4, 4, 64);
        let md = GainMapMetadata::default();
        let out = apply_gain_map(&base, &map, &md, ApplyConfig::default()).unwrap();
        assert_eq!(out.width(), 16);
    }

    #[test]
    fn non_integral_scale_falls_back_to_bilinear() {
        let base = flat_base(15, 15, 150);
        let map = MonoImage::filled(4, 4, 96);
        let md = GainMapMetadata::default();
        let out = apply_gain_map(&base, &map, &md, ApplyConfig::default()).unwrap();
        assert_eq!(out.width(), 15);
    }

    #[test]
    fn rejects_sub_unity_display_boost() {
        let base = flat_base(8, 8, 128);
        let map = MonoImage::filled(8, 8, 128);
        let md = GainMapMetadata::default();
        let config = ApplyConfig {
            display_boost: 0.5,
            ..ApplyConfig::default()
        };
        let err = apply_gain_map(&base, &map, &md, config).unwrap_err();
        assert!(matches!(err, UhdrError::InvalidDisplayBoost(_)));
    }

    #[test]
    fn rejects_nonzero_offsets() {
        let base = flat_base(8, 8, 128);
        let map = MonoImage::filled(8, 8, 128);
        let mut md = GainMapMetadata::default();
        md.offset_sdr = 1.0 / 64.0;
        let err = apply_gain_map(&base, &map, &md, ApplyConfig::default()).unwrap_err();
        assert!(matches!(err, UhdrError::BadMetadata(_)));
    }

    #[test]
    fn rejects_gamma_other_than_one() {
        let base = flat_base(8, 8, 128);
        let map = MonoImage::filled(8, 8, 128);
        let mut md = GainMapMetadata::default();
        md.gamma = 2.0;
        let err = apply_gain_map(&base, &map, &md, ApplyConfig::default()).unwrap_err();
        assert!(matches!(err, UhdrError::BadMetadata(_)));
    }

    #[test]
    fn rejects_unsupported_version() {
        let base = flat_base(8, 8, 128);
        let map = MonoImage::filled(8, 8, 128);
        let mut md = GainMapMetadata::default();
        md.version = "2.0".to_string();
        let err = apply_gain_map(&base, &map, &md, ApplyConfig::default()).unwrap_err();
        assert!(matches!(err, UhdrError::BadMetadata(_)));
    }

    #[test]
    fn rejects_capacity_max_mismatch() {
        let base = flat_base(8, 8, 128);
        let map = MonoImage::filled(8, 8, 128);
        let mut md = GainMapMetadata::default();
        md.hdr_capacity_max = md.max_content_boost * 2.0;
        let err = apply_gain_map(&base, &map, &md, ApplyConfig::default()).unwrap_err();
        assert!(matches!(err, UhdrError::BadMetadata(_)));
    }

    #[test]
    fn rgba1010102_output_is_not_raw_linear() {
        // A mid-gray input with full gain should produce a 1010102 word
        // whose channels differ from a hard linear->1023 scaling, since an
        // OETF (HLG by default) is applied before packing.
        let base = flat_base(4, 4, 200);
        let map = MonoImage::filled(4, 4, 255);
        let md = GainMapMetadata::default();
        let config = ApplyConfig {
            output_layout: PixelLayout::Rgba1010102,
            ..ApplyConfig::default()
        };
        let out = apply_gain_map(&base, &map, &md, config).unwrap();
        match out {
            HdrOutput::Rgba1010102 { pixels, .. } => {
                let word = pixels[0];
                let r = (word & 0x3FF) as u16;
                assert!(r > 0);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn zero_gain_sample_leaves_image_at_min_boost() {
        let base = flat_base(4, 4, 128);
        let map = MonoImage::filled(4, 4, 0);
        let md = GainMapMetadata::default();
        let out = apply_gain_map(&base, &map, &md, ApplyConfig::default()).unwrap();
        match out {
            HdrOutput::Rgba8888 { pixels, .. } => {
                // min_content_boost == 1.0, so output should not be darker than input.
                assert!(pixels[0] > 0);
            }
            _ => panic!("wrong variant"),
        }
    }
}
