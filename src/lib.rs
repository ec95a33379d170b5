//! UltraHDR gain map core.
//!
//! Implements the ISO 21496-1 gain map pipeline: generating a monochrome
//! gain map from an SDR base and its HDR counterpart, applying a gain map
//! back onto an SDR base to reconstruct HDR output, tone-mapping HDR down
//! to SDR by a fixed bit shift, geometric editing of a base image and its
//! gain map together, and assembling/parsing the JPEG container that ties
//! all of it together with MPF and XMP.
//!
//! Start at [`assembler::convert`] for the high-level entry point, or use
//! the individual [`gainmap`], [`tonemap`], and [`geometry`] modules
//! directly.

pub mod assembler;
pub mod buffer;
pub mod codec;
pub mod colormath;
pub mod error;
pub mod gainmap;
pub mod geometry;
pub mod tilequeue;
pub mod tonemap;

pub use assembler::{convert, ConvertOutput, OutputCodec, PipelineConfig, PipelineState};
pub use buffer::{ColorGamut, ColorTransfer, CompressedImage, HdrOutput, MonoImage, P010Image, PixelLayout, YuvImage};
pub use error::{Result, UhdrError};
pub use gainmap::{apply_gain_map, generate_gain_map, ApplyConfig, GainMapMetadata, GenerateConfig};
pub use geometry::{add_effects, EditEffect};
pub use tonemap::tone_map_p010_to_sdr;
