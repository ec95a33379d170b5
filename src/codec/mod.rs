//! Container codec support: JPEG (implemented) and HEIC/AVIF (collaborator
//! traits only, see [`heic_avif`]).

pub mod heic_avif;
pub mod jpeg;
