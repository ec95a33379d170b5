//! Scalar gain-map encode/apply math.
//!
//! Grounded on the teacher's `gainmap/math.rs`, which worked per-channel on
//! an RGB triple. This crate's gain map is a single monochrome channel, so
//! the formulas here operate on luminance ratios rather than per-component
//! ratios (see the design notes on monochrome-only gain maps).

/// Computes a single gain-map sample given the SDR and HDR luminances (in
/// `[0, 1]`, both already linearized) of the same logical pixel, using the
/// encode-side offsets and boost range.
///
/// `ratio = (yHdr + offset_hdr) / (ySdr + offset_sdr)`, `L = log2(ratio)`,
/// normalized against `[log2(min_boost), log2(max_boost)]`, raised to
/// `1/gamma` (a no-op when `gamma == 1`), and quantized to `[0, 255]`.
#[inline]
pub fn encode_gain(
    y_sdr: f32,
    y_hdr: f32,
    offset_sdr: f32,
    offset_hdr: f32,
    min_boost: f32,
    max_boost: f32,
    gamma: f32,
) -> u8 {
    let ratio = (y_hdr + offset_hdr) / (y_sdr + offset_sdr);
    let log_ratio = ratio.max(f32::MIN_POSITIVE).log2();
    let log_min = min_boost.log2();
    let log_max = max_boost.log2();
    let normalized = if (log_max - log_min).abs() < f32::EPSILON {
        0.0
    } else {
        (log_ratio - log_min) / (log_max - log_min)
    };
    let shaped = normalized.clamp(0.0, 1.0).powf(1.0 / gamma);
    (shaped.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Computes the multiplicative gain factor to apply to an SDR pixel given a
/// normalized gain-map sample `g` in `[0, 1]`, the `gamma` weighting, the
/// boost range, and the display's `max_display_boost` capability.
///
/// `gainFactor = 2^(lerp(log2(min_boost), log2(max_boost), g^gamma))`,
/// `effective = min(gainFactor, display_boost)`.
#[inline]
pub fn gain_factor(g: f32, gamma: f32, min_boost: f32, max_boost: f32, display_boost: f32) -> f32 {
    let log_min = min_boost.log2();
    let log_max = max_boost.log2();
    let weighted = g.clamp(0.0, 1.0).powf(gamma);
    let log_gain = log_min + (log_max - log_min) * weighted;
    let gain = 2f32.powf(log_gain);
    gain.min(display_boost)
}

/// Applies a precomputed gain factor to an SDR sample (linear, `[0, 1]`)
/// with the encode-side offsets: `(sdr + offset_sdr) * factor - offset_hdr`.
#[inline]
pub fn apply_gain(sdr_linear: f32, factor: f32, offset_sdr: f32, offset_hdr: f32) -> f32 {
    (sdr_linear + offset_sdr) * factor - offset_hdr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_gain_is_midpoint_when_ratio_equals_sqrt_of_range() {
        // ratio such that log2(ratio) sits exactly halfway between bounds.
        let min_boost = 1.0;
        let max_boost = 8.0; // log2 range [0, 3]
        let mid_ratio = 2f32.powf(1.5);
        let g = encode_gain(1.0, mid_ratio, 0.0, 0.0, min_boost, max_boost, 1.0);
        assert!((g as i32 - 128).abs() <= 1);
    }

    #[test]
    fn encode_gain_clamps_below_min_boost_to_zero() {
        let g = encode_gain(1.0, 0.5, 0.0, 0.0, 1.0, 4.0, 1.0);
        assert_eq!(g, 0);
    }

    #[test]
    fn encode_gain_applies_inverse_gamma_exponent() {
        // At the exact midpoint (normalized == 0.5), gamma != 1 still maps
        // to the same quantized sample since 0.5^(1/gamma) only shifts
        // values away from the midpoint, not at it, for gamma == 2 the
        // shift is visible off-center.
        let min_boost = 1.0;
        let max_boost = 16.0; // log2 range [0, 4]
        let quarter_ratio = 2f32.powf(1.0); // normalized = 1/4
        let linear = encode_gain(1.0, quarter_ratio, 0.0, 0.0, min_boost, max_boost, 1.0);
        let shaped = encode_gain(1.0, quarter_ratio, 0.0, 0.0, min_boost, max_boost, 2.0);
        // gamma=2 raises the normalized value (0.25) to the power 1/2,
        // i.e. 0.5, which quantizes higher than the unshaped 0.25.
        assert!(shaped > linear);
    }

    #[test]
    fn gain_factor_respects_display_boost_cap() {
        let factor = gain_factor(1.0, 1.0, 1.0, 1000.0 / 203.0, 2.0);
        assert!((factor - 2.0).abs() < 1e-4);
    }

    #[test]
    fn apply_gain_matches_direct_formula() {
        let factor = gain_factor(0.5, 1.0, 1.0, 4.0, 100.0);
        let out = apply_gain(0.3, factor, 0.0, 0.0);
        assert!((out - 0.3 * factor).abs() < 1e-5);
    }
}
