//! The pipeline assembler: optional-slot state plus the minimal-work
//! dispatch algorithm that fills in whatever a requested `convert` needs.

pub mod config;
pub mod dispatch;
pub mod state;

pub use config::{rotation_from_degrees, OutputCodec, PipelineConfig};
pub use dispatch::{convert, ConvertOutput};
pub use state::PipelineState;
