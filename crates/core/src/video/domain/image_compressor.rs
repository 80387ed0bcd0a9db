use std::path::Path;

/// Final compression step of the image path: re-encodes the output file
/// in place at the configured quality.
pub trait ImageCompressor: Send {
    fn compress(&self, path: &Path, quality: u8) -> Result<(), Box<dyn std::error::Error>>;
}
