//! Error types for UltraHDR gain-map operations.

use thiserror::Error;

/// Errors that can occur anywhere in the gain-map pipeline.
#[derive(Error, Debug)]
pub enum UhdrError {
    /// A required pointer/buffer argument was null or empty.
    #[error("bad pointer: {0}")]
    BadPointer(String),

    /// Width or height is unsupported (e.g. odd dimensions where even is required).
    #[error("unsupported width/height: {0}")]
    UnsupportedWidthHeight(String),

    /// A color gamut tag was `Unspecified` where a concrete gamut is required.
    #[error("invalid gamut: {0}")]
    InvalidGamut(String),

    /// A stride violates the minimum-stride invariant for its layout.
    #[error("invalid stride: {0}")]
    InvalidStride(String),

    /// An HDR transfer function tag was unrecognized or unsupported in context.
    #[error("invalid transfer function: {0}")]
    InvalidTransfer(String),

    /// Two images that must share dimensions did not.
    #[error("resolution mismatch: {0}")]
    ResolutionMismatch(String),

    /// A JPEG quality value was outside `[0, 100]`.
    #[error("invalid quality: {0} (must be 0-100)")]
    InvalidQuality(u8),

    /// A requested display boost was less than 1.0.
    #[error("invalid display boost: {0} (must be >= 1.0)")]
    InvalidDisplayBoost(f32),

    /// The requested output pixel format is not valid for the request.
    #[error("invalid output format: {0}")]
    InvalidOutputFormat(String),

    /// Gain-map metadata failed validation.
    #[error("bad metadata: {0}")]
    BadMetadata(String),

    /// A crop rectangle or rotation angle was invalid.
    #[error("invalid cropping/transform: {0}")]
    InvalidCropping(String),

    /// A codec collaborator failed to encode.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// A codec collaborator failed to decode.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// A gain-map image was expected but not found in a container.
    #[error("gain map image not found")]
    GainMapImageNotFound,

    /// A caller-supplied output buffer was too small.
    #[error("buffer too small: {0}")]
    BufferTooSmall(String),

    /// Metadata (XMP/rational record) could not be parsed.
    #[error("metadata error: {0}")]
    MetadataError(String),

    /// No images were found while probing a container.
    #[error("no images found")]
    NoImagesFound,

    /// More than one EXIF block was found where exactly one (or zero) was expected.
    #[error("multiple exif blocks found")]
    MultipleExifs,

    /// The observed `baseW/mapW` : `baseH/mapH` ratio was not supported.
    #[error("unsupported map scale factor: {0}")]
    UnsupportedMapScaleFactor(String),

    /// A requested combination of options is not supported.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// A requested operation lacks the prerequisite artifacts to proceed.
    #[error("insufficient resource: {0}")]
    InsufficientResource(String),

    /// Catch-all for conditions that don't fit another variant.
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Result type alias used throughout this crate.
pub type Result<T> = std::result::Result<T, UhdrError>;

impl From<std::io::Error> for UhdrError {
    fn from(err: std::io::Error) -> Self {
        UhdrError::Unknown(err.to_string())
    }
}

impl From<quick_xml::Error> for UhdrError {
    fn from(err: quick_xml::Error) -> Self {
        UhdrError::MetadataError(err.to_string())
    }
}

impl From<image::ImageError> for UhdrError {
    fn from(err: image::ImageError) -> Self {
        UhdrError::DecodeError(err.to_string())
    }
}
