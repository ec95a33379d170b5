//! P010 -> SDR YUV420 tone mapping by fixed bit-shift, no curve evaluation.
//!
//! Grounded on the teacher's straight shift-down conversion in
//! `ultrahdr/decoder.rs` (used there to preview an HDR frame as SDR),
//! generalized to the standalone stride-aware operation this crate exposes.
//! `ySdr = (yP010 >> 6) >> 2` matches the spec: 6 bits to get the 10-bit
//! sample out of its 16-bit word, then 2 more to drop from 10-bit to 8-bit.

use crate::buffer::{ColorTransfer, P010Image, YuvImage};
use crate::error::Result;

/// Converts a P010 image to 8-bit planar YUV420 by a fixed bit-shift on
/// every sample; no tone curve is evaluated. The output keeps the source's
/// gamut tag but is always tagged sRGB transfer, since a raw shift-down of
/// PQ/HLG samples is not itself an OETF conversion.
pub fn tone_map_p010_to_sdr(src: &P010Image) -> Result<YuvImage> {
    let w = src.width;
    let h = src.height;
    let chroma_w = w / 2;
    let chroma_h = h / 2;

    let mut y_plane = vec![0u8; (w * h) as usize];
    for y in 0..h {
        for x in 0..w {
            y_plane[(y * w + x) as usize] = shift_to_8(src.y10_at(x, y));
        }
    }

    let mut u_plane = vec![0u8; (chroma_w * chroma_h) as usize];
    let mut v_plane = vec![0u8; (chroma_w * chroma_h) as usize];
    for cy in 0..chroma_h {
        for cx in 0..chroma_w {
            let (u10, v10) = src.uv10_at(cx * 2, cy * 2);
            u_plane[(cy * chroma_w + cx) as usize] = shift_to_8(u10);
            v_plane[(cy * chroma_w + cx) as usize] = shift_to_8(v10);
        }
    }

    YuvImage::new(
        w,
        h,
        w,
        chroma_w,
        chroma_w,
        y_plane,
        u_plane,
        v_plane,
        src.gamut,
        ColorTransfer::Srgb,
    )
}

/// `(sample >> 2)`: the already-10-bit sample (see [`P010Image::y10_at`],
/// which has already shifted the raw 16-bit word down by 6) drops its
/// bottom 2 bits to become 8-bit.
#[inline]
fn shift_to_8(sample10: u16) -> u8 {
    (sample10 >> 2) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ColorGamut;

    #[test]
    fn shift_matches_exact_bit_arithmetic() {
        for raw10 in [0u16, 1, 511, 512, 1023] {
            let expected = (raw10 >> 2) as u8;
            assert_eq!(shift_to_8(raw10), expected);
        }
    }

    #[test]
    fn output_dimensions_match_source() {
        let y = vec![1023u16 << 6; 16];
        let uv = vec![512u16 << 6; 8];
        let p010 = P010Image::new(4, 4, 4, 4, y, uv, ColorGamut::Bt2100, ColorTransfer::Pq).unwrap();
        let sdr = tone_map_p010_to_sdr(&p010).unwrap();
        assert_eq!(sdr.width, 4);
        assert_eq!(sdr.height, 4);
        assert_eq!(sdr.y_at(0, 0), 255);
    }

    #[test]
    fn midtone_shift_is_exact() {
        let y = vec![600u16 << 6; 16];
        let uv = vec![300u16 << 6; 8];
        let p010 = P010Image::new(4, 4, 4, 4, y, uv, ColorGamut::Bt709, ColorTransfer::Hlg).unwrap();
        let sdr = tone_map_p010_to_sdr(&p010).unwrap();
        assert_eq!(sdr.y_at(0, 0), (600u16 >> 2) as u8);
    }
}
