use std::fs;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;

use crate::video::domain::image_compressor::ImageCompressor;

/// Re-encodes the final output image in place at the configured quality.
///
/// Quality only applies to JPEG; lossless formats are left untouched.
/// The re-encode goes through a temp file and rename so a failure never
/// corrupts the output.
pub struct ImageFileCompressor;

impl ImageCompressor for ImageFileCompressor {
    fn compress(&self, path: &Path, quality: u8) -> Result<(), Box<dyn std::error::Error>> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();
        if extension != "jpg" && extension != "jpeg" {
            return Ok(());
        }

        let image = image::open(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?
            .to_rgb8();

        let temp_path = path.with_extension("part");
        let file = fs::File::create(&temp_path)
            .map_err(|e| format!("failed to create {}: {e}", temp_path.display()))?;
        let mut encoder = JpegEncoder::new_with_quality(file, quality.clamp(1, 100));
        encoder.encode_image(&image)?;

        fs::rename(&temp_path, path)
            .map_err(|e| format!("failed to replace {}: {e}", path.display()))?;
        Ok(())
    }
}
