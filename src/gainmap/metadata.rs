//! Scalar gain-map metadata (ISO 21496-1 `hdrgm` values), single-channel.
//!
//! Grounded on the teacher's `gainmap/metadata.rs`, which stored three gain
//! values (one per channel) plus XMP serialization helpers. This crate's
//! gain map is monochrome, so the per-channel vectors collapse to scalars.

use crate::error::{Result, UhdrError};
use serde::{Deserialize, Serialize};

/// The only `hdrgm:Version` value this crate emits or accepts on apply.
pub const SUPPORTED_VERSION: &str = "1.0";

/// Gain-map metadata, always scalar (one value per field, not per channel)
/// because this crate only ever produces monochrome gain maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainMapMetadata {
    pub version: String,
    pub max_content_boost: f32,
    pub min_content_boost: f32,
    pub gamma: f32,
    pub offset_sdr: f32,
    pub offset_hdr: f32,
    pub hdr_capacity_min: f32,
    pub hdr_capacity_max: f32,
    pub use_base_color_space: bool,
}

impl Default for GainMapMetadata {
    /// Fixed metadata on emit: `version = "1.0"`, `gamma = 1.0`,
    /// `offsetSdr = offsetHdr = 0`, `minContentBoost = hdrCapacityMin = 1.0`,
    /// `maxContentBoost = hdrCapacityMax = 1000/203`.
    fn default() -> Self {
        Self {
            version: SUPPORTED_VERSION.to_string(),
            max_content_boost: 1000.0 / 203.0,
            min_content_boost: 1.0,
            gamma: 1.0,
            offset_sdr: 0.0,
            offset_hdr: 0.0,
            hdr_capacity_min: 1.0,
            hdr_capacity_max: 1000.0 / 203.0,
            use_base_color_space: true,
        }
    }
}

impl GainMapMetadata {
    /// Validates the invariants this metadata must hold to be usable by the
    /// applier: positive boosts, `min <= max`, capacity range ordered and
    /// within `[min_content_boost, max_content_boost]`, finite gamma.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_content_boost.is_finite() && self.max_content_boost > 0.0) {
            return Err(UhdrError::BadMetadata("max_content_boost must be finite and positive".into()));
        }
        if !(self.min_content_boost.is_finite() && self.min_content_boost > 0.0) {
            return Err(UhdrError::BadMetadata("min_content_boost must be finite and positive".into()));
        }
        if self.min_content_boost > self.max_content_boost {
            return Err(UhdrError::BadMetadata(format!(
                "min_content_boost {} > max_content_boost {}",
                self.min_content_boost, self.max_content_boost
            )));
        }
        if !self.gamma.is_finite() || self.gamma <= 0.0 {
            return Err(UhdrError::BadMetadata("gamma must be finite and positive".into()));
        }
        if !(self.offset_sdr.is_finite() && self.offset_sdr >= 0.0) {
            return Err(UhdrError::BadMetadata("offset_sdr must be finite and non-negative".into()));
        }
        if !(self.offset_hdr.is_finite() && self.offset_hdr >= 0.0) {
            return Err(UhdrError::BadMetadata("offset_hdr must be finite and non-negative".into()));
        }
        if self.hdr_capacity_min > self.hdr_capacity_max {
            return Err(UhdrError::BadMetadata(format!(
                "hdr_capacity_min {} > hdr_capacity_max {}",
                self.hdr_capacity_min, self.hdr_capacity_max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        GainMapMetadata::default().validate().unwrap();
    }

    #[test]
    fn default_max_content_boost_matches_known_constant() {
        let m = GainMapMetadata::default();
        assert!((m.max_content_boost - 4.926_108).abs() < 1e-3);
    }

    #[test]
    fn rejects_min_greater_than_max() {
        let mut m = GainMapMetadata::default();
        m.min_content_boost = 10.0;
        m.max_content_boost = 2.0;
        assert!(matches!(m.validate(), Err(UhdrError::BadMetadata(_))));
    }

    #[test]
    fn rejects_non_positive_gamma() {
        let mut m = GainMapMetadata::default();
        m.gamma = 0.0;
        assert!(m.validate().is_err());
    }
}
