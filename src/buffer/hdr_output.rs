use crate::error::{Result, UhdrError};

/// An output HDR (or SDR) pixel buffer, in one of the three formats the
/// applier and tone mapper can emit. Unlike the decode-side layouts, these
/// are always tightly packed (`stride == width`) since they are produced,
/// not ingested, by this crate.
#[derive(Debug, Clone)]
pub enum HdrOutput {
    Rgba8888 {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
    RgbaF16 {
        width: u32,
        height: u32,
        /// Raw IEEE 754 half-precision bit patterns, 4 per pixel (R,G,B,A).
        pixels: Vec<u16>,
    },
    Rgba1010102 {
        width: u32,
        height: u32,
        /// One packed u32 per pixel: R10 G10 B10 A2, per ISO 21496-1 Annex layout.
        pixels: Vec<u32>,
    },
}

impl HdrOutput {
    pub fn width(&self) -> u32 {
        match self {
            HdrOutput::Rgba8888 { width, .. }
            | HdrOutput::RgbaF16 { width, .. }
            | HdrOutput::Rgba1010102 { width, .. } => *width,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            HdrOutput::Rgba8888 { height, .. }
            | HdrOutput::RgbaF16 { height, .. }
            | HdrOutput::Rgba1010102 { height, .. } => *height,
        }
    }

    pub fn new_rgba8888(width: u32, height: u32) -> Result<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| UhdrError::UnsupportedWidthHeight(format!("{width}x{height}")))?;
        Ok(HdrOutput::Rgba8888 {
            width,
            height,
            pixels: vec![0u8; len],
        })
    }

    pub fn new_rgba_f16(width: u32, height: u32) -> Result<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| UhdrError::UnsupportedWidthHeight(format!("{width}x{height}")))?;
        Ok(HdrOutput::RgbaF16 {
            width,
            height,
            pixels: vec![0u16; len],
        })
    }

    pub fn new_rgba1010102(width: u32, height: u32) -> Result<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| UhdrError::UnsupportedWidthHeight(format!("{width}x{height}")))?;
        Ok(HdrOutput::Rgba1010102 {
            width,
            height,
            pixels: vec![0u32; len],
        })
    }

    /// Packs a linear (R10,G10,B10,A2) tuple into the RGBA1010102 word layout.
    #[inline]
    pub fn pack_1010102(r: u16, g: u16, b: u16, a: u8) -> u32 {
        (u32::from(r) & 0x3ff)
            | ((u32::from(g) & 0x3ff) << 10)
            | ((u32::from(b) & 0x3ff) << 20)
            | ((u32::from(a) & 0x3) << 30)
    }

    /// Converts an f32 linear/display value in `[0, 1]` to an IEEE-754 half
    /// bit pattern. Used when emitting [`HdrOutput::RgbaF16`].
    #[inline]
    pub fn f32_to_f16_bits(v: f32) -> u16 {
        half_from_f32(v)
    }
}

/// Minimal f32 -> f16 conversion (round-to-nearest-even), so this crate does
/// not need an extra half-precision-float dependency for a handful of
/// packing call sites.
fn half_from_f32(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let mantissa = bits & 0x007f_ffff;
    let exp = ((bits >> 23) & 0xff) as i32;

    if exp == 0xff {
        let nan_bit = if mantissa != 0 { 0x0200 } else { 0 };
        return sign | 0x7c00 | nan_bit;
    }

    let half_exp = exp - 127 + 15;
    if half_exp >= 0x1f {
        return sign | 0x7c00; // overflow to infinity
    }
    if half_exp <= 0 {
        if half_exp < -10 {
            return sign; // underflow to zero
        }
        let m = (mantissa | 0x0080_0000) >> (14 - half_exp);
        return sign | (m as u16);
    }
    let m = mantissa >> 13;
    sign | ((half_exp as u16) << 10) | (m as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_1010102_roundtrips_fields() {
        let packed = HdrOutput::pack_1010102(1023, 512, 3, 1);
        assert_eq!(packed & 0x3ff, 1023);
        assert_eq!((packed >> 10) & 0x3ff, 512);
        assert_eq!((packed >> 20) & 0x3ff, 3);
        assert_eq!((packed >> 30) & 0x3, 1);
    }

    #[test]
    fn new_rgba8888_allocates_zeroed() {
        let out = HdrOutput::new_rgba8888(2, 2).unwrap();
        match out {
            HdrOutput::Rgba8888 { pixels, .. } => assert_eq!(pixels.len(), 16),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn f16_zero_and_one() {
        assert_eq!(half_from_f32(0.0), 0);
        assert_eq!(half_from_f32(1.0), 0x3c00);
    }
}
