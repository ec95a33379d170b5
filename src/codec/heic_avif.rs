//! HEIC/AVIF codec collaborator traits.
//!
//! No implementation ships in this crate: encoding/decoding HEVC or AV1
//! bitstreams needs a real hardware- or software-codec dependency (e.g.
//! `libheif`/`dav1d` bindings) that isn't part of this crate's dependency
//! stack. Callers who need HEIC/AVIF containers implement these traits
//! against whatever codec crate their application already depends on and
//! pass it into the assembler; see [`crate::codec::jpeg::collaborator`] for
//! the JPEG equivalent that does ship a default implementation.

use crate::error::Result;

/// Encodes raw pixel planes into an HEIC or AVIF bitstream.
pub trait HeicAvifEncodeCollaborator {
    fn encode_rgb8(&self, width: u32, height: u32, rgb: &[u8], quality: u8) -> Result<Vec<u8>>;
    fn encode_gray8(&self, width: u32, height: u32, gray: &[u8], quality: u8) -> Result<Vec<u8>>;
}

/// Decodes an HEIC or AVIF bitstream into raw pixel planes.
pub trait HeicAvifDecodeCollaborator {
    fn decode_to_rgb8(&self, data: &[u8]) -> Result<(u32, u32, Vec<u8>)>;
}
