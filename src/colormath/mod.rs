//! Color science: transfer functions, gamut conversion, YUV/RGB matrices,
//! and gain-map scalar math.

pub mod gain;
pub mod gamut;
pub mod transfer;
pub mod yuvrgb;

pub use gain::{apply_gain, encode_gain, gain_factor};
pub use gamut::{convert_gamut, gamut_matrix, luminance};
pub use transfer::{hdr_inv_oetf, hdr_oetf, HdrTransferFunction, TransferLut};
pub use yuvrgb::{rgb_to_yuv, yuv_to_rgb, YuvMatrix};
