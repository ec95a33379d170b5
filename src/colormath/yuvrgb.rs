//! Full-range YUV <-> RGB conversion matrices (BT.601, BT.709, BT.2020).
//!
//! New relative to the teacher crate (which only ever handled already-decoded
//! RGB bytes from the `image` crate); grounded on the standard full-range
//! YCbCr matrices referenced by spec section 4.1, with chroma samples
//! centered at 0 (i.e. callers pass `u - 0.5`, `v - 0.5`).

use crate::buffer::ColorGamut;

/// Which YUV matrix family to use. `Bt601` is forced for SDR images decoded
/// from JPEG regardless of declared gamut (spec section 4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YuvMatrix {
    Bt601,
    Bt709,
    Bt2020,
}

impl YuvMatrix {
    /// Picks the matrix family for a declared gamut.
    pub fn for_gamut(gamut: ColorGamut) -> Self {
        match gamut {
            ColorGamut::Bt2100 => YuvMatrix::Bt2020,
            ColorGamut::P3 | ColorGamut::Bt709 | ColorGamut::Unspecified => YuvMatrix::Bt709,
        }
    }
}

/// Full-range YUV (Y in `[0,1]`, U/V centered, in `[-0.5,0.5]`) to linear-light-agnostic RGB.
/// The result is still transfer-encoded (not linear); callers apply the
/// relevant inverse OETF afterward.
#[inline]
pub fn yuv_to_rgb(y: f32, u: f32, v: f32, matrix: YuvMatrix) -> (f32, f32, f32) {
    let (kr, kb) = match matrix {
        YuvMatrix::Bt601 => (0.299, 0.114),
        YuvMatrix::Bt709 => (0.2126, 0.0722),
        YuvMatrix::Bt2020 => (0.2627, 0.0593),
    };
    let kg = 1.0 - kr - kb;
    let r = y + 2.0 * (1.0 - kr) * v;
    let b = y + 2.0 * (1.0 - kb) * u;
    let g = (y - kr * r - kb * b) / kg;
    (r, g, b)
}

/// Inverse of [`yuv_to_rgb`]: RGB (transfer-encoded) to full-range YUV.
#[inline]
pub fn rgb_to_yuv(r: f32, g: f32, b: f32, matrix: YuvMatrix) -> (f32, f32, f32) {
    let (kr, kb) = match matrix {
        YuvMatrix::Bt601 => (0.299, 0.114),
        YuvMatrix::Bt709 => (0.2126, 0.0722),
        YuvMatrix::Bt2020 => (0.2627, 0.0593),
    };
    let kg = 1.0 - kr - kb;
    let y = kr * r + kg * g + kb * b;
    let u = (b - y) / (2.0 * (1.0 - kb));
    let v = (r - y) / (2.0 * (1.0 - kr));
    (y, u, v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_bt709() {
        let rgb = (0.7, 0.2, 0.4);
        let (y, u, v) = rgb_to_yuv(rgb.0, rgb.1, rgb.2, YuvMatrix::Bt709);
        let back = yuv_to_rgb(y, u, v, YuvMatrix::Bt709);
        assert!((rgb.0 - back.0).abs() < 1e-4);
        assert!((rgb.1 - back.1).abs() < 1e-4);
        assert!((rgb.2 - back.2).abs() < 1e-4);
    }

    #[test]
    fn gray_has_zero_chroma() {
        let (_, u, v) = rgb_to_yuv(0.5, 0.5, 0.5, YuvMatrix::Bt601);
        assert!(u.abs() < 1e-6);
        assert!(v.abs() < 1e-6);
    }

    #[test]
    fn for_gamut_forces_bt2020_for_bt2100() {
        assert_eq!(YuvMatrix::for_gamut(ColorGamut::Bt2100), YuvMatrix::Bt2020);
        assert_eq!(YuvMatrix::for_gamut(ColorGamut::Bt709), YuvMatrix::Bt709);
    }
}
