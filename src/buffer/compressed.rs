/// Which container codec a compressed image is stored as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressedFormat {
    Jpeg,
    Heic,
    Avif,
}

/// An already-encoded image (JPEG/HEIC/AVIF bytes), plus just enough
/// geometry to reason about it without decoding. Used for the
/// lazily-materialized compressed slots in the pipeline assembler.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub format: CompressedFormat,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl CompressedImage {
    pub fn new(format: CompressedFormat, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            format,
            width,
            height,
            data,
        }
    }
}
