//! Gamut conversion matrices and luminance weights.
//!
//! Grounded on the teacher's XYZ-pivoted conversion matrices in
//! `gainmap/math.rs`, generalized to a `Gamut` enum selection function per
//! spec section 4.1 ("Selection returns a function that applies the
//! appropriate matrix").

use crate::buffer::ColorGamut;

/// sRGB (BT.709 primaries) to XYZ, D65.
#[rustfmt::skip]
const BT709_TO_XYZ: [[f32; 3]; 3] = [
    [0.4124564, 0.3575761, 0.1804375],
    [0.2126729, 0.7151522, 0.0721750],
    [0.0193339, 0.1191920, 0.9503041],
];

#[rustfmt::skip]
const XYZ_TO_BT709: [[f32; 3]; 3] = [
    [ 3.2404542, -1.5371385, -0.4985314],
    [-0.9692660,  1.8760108,  0.0415560],
    [ 0.0556434, -0.2040259,  1.0572252],
];

#[rustfmt::skip]
const P3_TO_XYZ: [[f32; 3]; 3] = [
    [0.4865709, 0.2656677, 0.1982173],
    [0.2289746, 0.6917385, 0.0792869],
    [0.0000000, 0.0451134, 1.0439444],
];

#[rustfmt::skip]
const XYZ_TO_P3: [[f32; 3]; 3] = [
    [ 2.4934969, -0.9313836, -0.4027108],
    [-0.8294890,  1.7626641,  0.0236247],
    [ 0.0358458, -0.0761724,  0.9568845],
];

#[rustfmt::skip]
const BT2100_TO_XYZ: [[f32; 3]; 3] = [
    [0.6369580, 0.1446169, 0.1688810],
    [0.2627002, 0.6779981, 0.0593017],
    [0.0000000, 0.0280727, 1.0609851],
];

#[rustfmt::skip]
const XYZ_TO_BT2100: [[f32; 3]; 3] = [
    [ 1.7166512, -0.3556708, -0.2533663],
    [-0.6666844,  1.6164812,  0.0157685],
    [ 0.0176399, -0.0427706,  0.9421031],
];

const IDENTITY: [[f32; 3]; 3] = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];

/// Applies a 3x3 matrix to a linear RGB triple.
#[inline]
pub fn apply_matrix(rgb: (f32, f32, f32), m: &[[f32; 3]; 3]) -> (f32, f32, f32) {
    let (r, g, b) = rgb;
    (
        m[0][0] * r + m[0][1] * g + m[0][2] * b,
        m[1][0] * r + m[1][1] * g + m[1][2] * b,
        m[2][0] * r + m[2][1] * g + m[2][2] * b,
    )
}

fn to_xyz(g: ColorGamut) -> [[f32; 3]; 3] {
    match g {
        ColorGamut::Bt709 => BT709_TO_XYZ,
        ColorGamut::P3 => P3_TO_XYZ,
        ColorGamut::Bt2100 => BT2100_TO_XYZ,
        ColorGamut::Unspecified => BT709_TO_XYZ,
    }
}

fn from_xyz(g: ColorGamut) -> [[f32; 3]; 3] {
    match g {
        ColorGamut::Bt709 => XYZ_TO_BT709,
        ColorGamut::P3 => XYZ_TO_P3,
        ColorGamut::Bt2100 => XYZ_TO_BT2100,
        ColorGamut::Unspecified => XYZ_TO_BT709,
    }
}

/// Converts a linear RGB triple from `src` gamut primaries to `dst` gamut
/// primaries via an XYZ pivot. Identity when `src == dst`.
pub fn convert_gamut(rgb: (f32, f32, f32), src: ColorGamut, dst: ColorGamut) -> (f32, f32, f32) {
    if src == dst {
        return rgb;
    }
    let xyz = apply_matrix(rgb, &to_xyz(src));
    apply_matrix(xyz, &from_xyz(dst))
}

/// Returns the constant 3x3 matrix that converts `src` primaries to `dst`
/// primaries, for callers that want to cache/reuse it across many pixels.
pub fn gamut_matrix(src: ColorGamut, dst: ColorGamut) -> [[f32; 3]; 3] {
    if src == dst {
        return IDENTITY;
    }
    let to = to_xyz(src);
    let from = from_xyz(dst);
    let mut out = [[0.0f32; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = from[i][0] * to[0][j] + from[i][1] * to[1][j] + from[i][2] * to[2][j];
        }
    }
    out
}

/// BT.709/sRGB luminance coefficients.
pub const LUMA_BT709: (f32, f32, f32) = (0.2126, 0.7152, 0.0722);
/// Display P3 luminance coefficients (D65 white).
pub const LUMA_P3: (f32, f32, f32) = (0.2289, 0.6917, 0.0793);
/// BT.2020/BT.2100 luminance coefficients.
pub const LUMA_BT2100: (f32, f32, f32) = (0.2627, 0.6780, 0.0593);

/// Computes linear luminance from a linear RGB triple using the weights for `gamut`.
#[inline]
pub fn luminance(rgb: (f32, f32, f32), gamut: ColorGamut) -> f32 {
    let (wr, wg, wb) = match gamut {
        ColorGamut::Bt709 | ColorGamut::Unspecified => LUMA_BT709,
        ColorGamut::P3 => LUMA_P3,
        ColorGamut::Bt2100 => LUMA_BT2100,
    };
    wr * rgb.0 + wg * rgb.1 + wb * rgb.2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_when_same_gamut() {
        let rgb = (0.3, 0.5, 0.8);
        let out = convert_gamut(rgb, ColorGamut::P3, ColorGamut::P3);
        assert_eq!(rgb, out);
    }

    #[test]
    fn roundtrip_bt709_to_p3_and_back() {
        let rgb = (0.2, 0.6, 0.9);
        let p3 = convert_gamut(rgb, ColorGamut::Bt709, ColorGamut::P3);
        let back = convert_gamut(p3, ColorGamut::P3, ColorGamut::Bt709);
        assert!((rgb.0 - back.0).abs() < 1e-4);
        assert!((rgb.1 - back.1).abs() < 1e-4);
        assert!((rgb.2 - back.2).abs() < 1e-4);
    }

    #[test]
    fn luminance_of_white_is_one() {
        let l = luminance((1.0, 1.0, 1.0), ColorGamut::Bt709);
        assert!((l - 1.0).abs() < 1e-5);
    }

    #[test]
    fn luminance_of_black_is_zero() {
        assert_eq!(luminance((0.0, 0.0, 0.0), ColorGamut::Bt2100), 0.0);
    }
}
