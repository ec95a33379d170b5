//! Gain-map generation, application, and metadata.

pub mod apply;
pub mod generate;
pub mod metadata;

pub use apply::{apply_gain_map, ApplyConfig};
pub use generate::{generate_gain_map, GenerateConfig};
pub use metadata::GainMapMetadata;
