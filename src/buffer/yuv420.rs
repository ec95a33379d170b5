use crate::buffer::{ColorGamut, ColorTransfer};
use crate::error::{Result, UhdrError};

/// Planar 8-bit YUV 4:2:0 image: one luma plane at full resolution, two
/// chroma planes at half width and half height, each with its own stride.
#[derive(Debug, Clone)]
pub struct YuvImage {
    pub width: u32,
    pub height: u32,
    pub y_stride: u32,
    pub u_stride: u32,
    pub v_stride: u32,
    pub y_plane: Vec<u8>,
    pub u_plane: Vec<u8>,
    pub v_plane: Vec<u8>,
    pub gamut: ColorGamut,
    pub transfer: ColorTransfer,
}

impl YuvImage {
    /// Builds a new image, validating dimensions and stride invariants.
    ///
    /// `width`/`height` must be even (4:2:0 subsampling requires whole
    /// chroma samples), and each stride must be at least as wide as its
    /// plane's row in bytes.
    pub fn new(
        width: u32,
        height: u32,
        y_stride: u32,
        u_stride: u32,
        v_stride: u32,
        y_plane: Vec<u8>,
        u_plane: Vec<u8>,
        v_plane: Vec<u8>,
        gamut: ColorGamut,
        transfer: ColorTransfer,
    ) -> Result<Self> {
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(UhdrError::UnsupportedWidthHeight(format!(
                "{width}x{height} (must be nonzero and even for 4:2:0)"
            )));
        }
        if y_stride < width {
            return Err(UhdrError::InvalidStride(format!(
                "y_stride {y_stride} < width {width}"
            )));
        }
        let chroma_w = width / 2;
        if u_stride < chroma_w || v_stride < chroma_w {
            return Err(UhdrError::InvalidStride(format!(
                "chroma stride ({u_stride}, {v_stride}) < chroma width {chroma_w}"
            )));
        }
        let chroma_h = (height / 2) as usize;
        if y_plane.len() < (y_stride as usize) * (height as usize) {
            return Err(UhdrError::BufferTooSmall("y_plane".into()));
        }
        if u_plane.len() < (u_stride as usize) * chroma_h || v_plane.len() < (v_stride as usize) * chroma_h {
            return Err(UhdrError::BufferTooSmall("chroma plane".into()));
        }
        Ok(Self {
            width,
            height,
            y_stride,
            u_stride,
            v_stride,
            y_plane,
            u_plane,
            v_plane,
            gamut,
            transfer,
        })
    }

    /// Reads the luma sample at `(x, y)`.
    #[inline]
    pub fn y_at(&self, x: u32, y: u32) -> u8 {
        self.y_plane[(y * self.y_stride + x) as usize]
    }

    /// Reads the (U, V) chroma pair for the 2x2 block containing pixel `(x, y)`.
    #[inline]
    pub fn chroma_at(&self, x: u32, y: u32) -> (u8, u8) {
        let cx = x / 2;
        let cy = y / 2;
        let u = self.u_plane[(cy * self.u_stride + cx) as usize];
        let v = self.v_plane[(cy * self.v_stride + cx) as usize];
        (u, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(w: u32, h: u32) -> Vec<u8> {
        vec![0u8; (w * h) as usize]
    }

    #[test]
    fn rejects_odd_dimensions() {
        let y = make(4, 4);
        let c = make(2, 2);
        let err = YuvImage::new(
            3,
            4,
            4,
            2,
            2,
            y.clone(),
            c.clone(),
            c,
            ColorGamut::Bt709,
            ColorTransfer::Srgb,
        )
        .unwrap_err();
        assert!(matches!(err, UhdrError::UnsupportedWidthHeight(_)));
    }

    #[test]
    fn accepts_well_formed_buffer() {
        let y = make(4, 4);
        let c = make(2, 2);
        let img = YuvImage::new(4, 4, 4, 2, 2, y, c.clone(), c, ColorGamut::Bt709, ColorTransfer::Srgb)
            .unwrap();
        assert_eq!(img.y_at(0, 0), 0);
        assert_eq!(img.chroma_at(3, 3), (0, 0));
    }

    #[test]
    fn rejects_short_stride() {
        let y = make(4, 4);
        let c = make(2, 2);
        let err = YuvImage::new(4, 4, 3, 2, 2, y, c.clone(), c, ColorGamut::Bt709, ColorTransfer::Srgb)
            .unwrap_err();
        assert!(matches!(err, UhdrError::InvalidStride(_)));
    }
}
