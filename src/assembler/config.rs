//! Pipeline configuration: requested output and encode/decode parameters.
//!
//! Grounded on the teacher's `ultrahdr::encoder`/`decoder` option structs
//! (which exposed quality, gamut, and transfer setters individually),
//! generalized into one `PipelineConfig` the assembler's dispatch algorithm
//! consumes directly.

use crate::buffer::{ColorGamut, ColorTransfer, PixelLayout};
use crate::error::{Result, UhdrError};
use crate::geometry::EditEffect;

/// Which container format `convert` should emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputCodec {
    /// Plain base-image JPEG: no gain map is generated or embedded.
    Jpeg,
    /// JPEG_R: a base JPEG plus an embedded gain map and XMP/MPF metadata.
    JpegR,
    RawPixels(PixelLayout),
}

/// Full set of knobs for one `convert` call.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output: OutputCodec,
    pub quality: u8,
    pub display_boost: f32,
    pub output_gamut: ColorGamut,
    pub output_transfer: ColorTransfer,
    pub effects: Vec<EditEffect>,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.quality > 100 {
            return Err(UhdrError::InvalidQuality(self.quality));
        }
        if self.display_boost < 1.0 {
            return Err(UhdrError::InvalidDisplayBoost(self.display_boost));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output: OutputCodec::JpegR,
            quality: 95,
            display_boost: 1000.0 / 203.0,
            output_gamut: ColorGamut::Bt709,
            output_transfer: ColorTransfer::Srgb,
            effects: Vec::new(),
        }
    }
}

/// Parses a rotation given in degrees (clockwise) into a discrete
/// [`EditEffect`]. Only `0`, `90`, `180`, and `270` are valid; any other
/// value (including full-turn-plus values like `900`) is rejected rather
/// than normalized modulo 360, since a caller passing such a value is
/// almost certainly confused about units rather than asking for four
/// spins and a quarter turn.
pub fn rotation_from_degrees(degrees: i32) -> Result<Option<EditEffect>> {
    match degrees {
        0 => Ok(None),
        90 => Ok(Some(EditEffect::Rotate90)),
        180 => Ok(Some(EditEffect::Rotate180)),
        270 => Ok(Some(EditEffect::Rotate270)),
        other => Err(UhdrError::InvalidCropping(format!(
            "rotation must be 0, 90, 180, or 270 degrees, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_quality_over_100() {
        let config = PipelineConfig {
            quality: 101,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(UhdrError::InvalidQuality(101))));
    }

    #[test]
    fn rotation_accepts_right_angles() {
        assert!(matches!(rotation_from_degrees(90), Ok(Some(EditEffect::Rotate90))));
        assert!(matches!(rotation_from_degrees(0), Ok(None)));
    }

    #[test]
    fn rotation_rejects_large_multiples() {
        assert!(rotation_from_degrees(900).is_err());
    }
}
