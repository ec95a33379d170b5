//! Pixel buffer types: one strongly-typed struct per supported layout,
//! instead of a single generic byte-stride descriptor.
//!
//! Grounded on the teacher's `types.rs` (which wrapped `image::ImageBuffer`
//! for each logical image role) generalized to the layouts this crate needs:
//! semi-planar 10-bit P010, planar 8-bit YUV420, single-channel monochrome,
//! and the three HDR output pixel formats from section 3 of the spec this
//! crate implements.

mod compressed;
mod hdr_output;
mod mono;
mod p010;
mod yuv420;

pub use compressed::CompressedImage;
pub use hdr_output::HdrOutput;
pub use mono::MonoImage;
pub use p010::P010Image;
pub use yuv420::YuvImage;

/// Color primaries/gamut tag carried alongside pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorGamut {
    Bt709,
    P3,
    Bt2100,
    Unspecified,
}

/// Transfer characteristic tag carried alongside pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorTransfer {
    Srgb,
    Linear,
    Hlg,
    Pq,
    Unspecified,
}

impl ColorTransfer {
    /// Maps this tag to the HDR transfer function family used by
    /// [`crate::colormath::transfer`], when it names one of the three
    /// recognized HDR curves.
    pub fn as_hdr_transfer(self) -> Option<crate::colormath::transfer::HdrTransferFunction> {
        use crate::colormath::transfer::HdrTransferFunction;
        match self {
            ColorTransfer::Linear => Some(HdrTransferFunction::Linear),
            ColorTransfer::Hlg => Some(HdrTransferFunction::Hlg),
            ColorTransfer::Pq => Some(HdrTransferFunction::Pq),
            ColorTransfer::Srgb | ColorTransfer::Unspecified => None,
        }
    }
}

/// Which raw pixel layout a buffer uses. Mirrors the layout tags the
/// assembler and codec collaborators dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    Yuv420,
    P010,
    Monochrome,
    Rgba8888,
    RgbaF16,
    Rgba1010102,
}
