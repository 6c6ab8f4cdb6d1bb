// src/services/image_processor.rs
use image::ImageFormat;

use crate::errors::RestyleError;

/// Per-file upload cap. Bria rejects larger payloads anyway, so oversized
/// files fail here before any outbound call.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Checks the size cap and sniffs the actual format from the file
    /// signature; the multipart content-type header is not trusted.
    pub fn validate_image(&self, data: &[u8]) -> Result<ImageFormat, RestyleError> {
        if data.is_empty() {
            return Err(RestyleError::ImageProcessing(
                "empty image payload".to_string(),
            ));
        }

        if data.len() > MAX_IMAGE_BYTES {
            return Err(RestyleError::ImageProcessing(format!(
                "image is {} bytes, limit is {} bytes",
                data.len(),
                MAX_IMAGE_BYTES
            )));
        }

        let format = image::guess_format(data).map_err(|e| {
            RestyleError::ImageProcessing(format!("unrecognized image format: {}", e))
        })?;

        match format {
            ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP => Ok(format),
            other => Err(RestyleError::ImageProcessing(format!(
                "unsupported image format {:?}; accepted formats are JPEG, PNG and WebP",
                other
            ))),
        }
    }
}
