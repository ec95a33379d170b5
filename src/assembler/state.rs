//! Pipeline state: the eight lazily-materialized optional artifact slots.
//!
//! Grounded on the teacher's `UltrahdrEncoder`/`UltrahdrDecoder` structs,
//! which accumulated a handful of `Option<...>` fields as encode/decode
//! proceeded. Generalized here into one shared state object the assembler's
//! dispatch algorithm reads and writes, with first-writer-wins semantics:
//! once a slot is set, later writes are silently ignored rather than
//! overwriting already-computed work.

use crate::buffer::{CompressedImage, MonoImage, P010Image, YuvImage};
use crate::gainmap::GainMapMetadata;

/// All artifacts a pipeline run may have produced or been given, in any
/// combination. Each slot is filled at most once.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub sdr_compressed: Option<CompressedImage>,
    pub hdr_compressed: Option<CompressedImage>,
    pub sdr_raw: Option<YuvImage>,
    pub hdr_raw: Option<P010Image>,
    pub gain_map_raw: Option<MonoImage>,
    pub gain_map_compressed: Option<CompressedImage>,
    pub gain_map_metadata: Option<GainMapMetadata>,
    pub exif: Option<Vec<u8>>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `sdr_compressed` if empty; no-op otherwise. Returns whether the
    /// write took effect.
    pub fn add_sdr_compressed(&mut self, image: CompressedImage) -> bool {
        set_if_empty(&mut self.sdr_compressed, image)
    }

    pub fn add_hdr_compressed(&mut self, image: CompressedImage) -> bool {
        set_if_empty(&mut self.hdr_compressed, image)
    }

    pub fn add_sdr_raw(&mut self, image: YuvImage) -> bool {
        set_if_empty(&mut self.sdr_raw, image)
    }

    pub fn add_hdr_raw(&mut self, image: P010Image) -> bool {
        set_if_empty(&mut self.hdr_raw, image)
    }

    pub fn add_gain_map_raw(&mut self, image: MonoImage) -> bool {
        set_if_empty(&mut self.gain_map_raw, image)
    }

    pub fn add_gain_map_compressed(&mut self, image: CompressedImage) -> bool {
        set_if_empty(&mut self.gain_map_compressed, image)
    }

    pub fn add_gain_map_metadata(&mut self, metadata: GainMapMetadata) -> bool {
        set_if_empty(&mut self.gain_map_metadata, metadata)
    }

    pub fn add_exif(&mut self, exif: Vec<u8>) -> bool {
        set_if_empty(&mut self.exif, exif)
    }
}

fn set_if_empty<T>(slot: &mut Option<T>, value: T) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::CompressedFormat;

    #[test]
    fn first_write_wins() {
        let mut state = PipelineState::new();
        let first = CompressedImage::new(CompressedFormat::Jpeg, 1, 1, vec![1]);
        let second = CompressedImage::new(CompressedFormat::Jpeg, 2, 2, vec![2]);
        assert!(state.add_sdr_compressed(first));
        assert!(!state.add_sdr_compressed(second));
        assert_eq!(state.sdr_compressed.unwrap().width, 1);
    }

    #[test]
    fn empty_state_has_no_slots_filled() {
        let state = PipelineState::new();
        assert!(state.sdr_compressed.is_none());
        assert!(state.exif.is_none());
    }
}
