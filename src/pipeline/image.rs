//! Image normalization for OCR
//!
//! Uploaded label photos are validated, capped in dimension, and re-encoded
//! as JPEG before being sent to the vision backend. Normalization bounds
//! both memory use and the payload the backend bills for.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use serde::Deserialize;
use thiserror::Error;

/// Limits applied to uploaded images
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ImagePolicy {
    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    /// Longest edge after resizing, in pixels
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// JPEG re-encode quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_max_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_max_dimension() -> u32 {
    2048
}

fn default_jpeg_quality() -> u8 {
    95
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            max_dimension: default_max_dimension(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Errors from image normalization
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image exceeds {max} bytes (got {got})")]
    TooLarge { max: usize, got: usize },

    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("could not encode image: {0}")]
    Encode(String),
}

/// Validate, downscale, and re-encode an uploaded image as JPEG
///
/// Images already within the dimension cap are still re-encoded, which
/// normalizes format and strips metadata before the bytes leave the service.
pub fn normalize_image(bytes: &[u8], policy: &ImagePolicy) -> Result<Vec<u8>, ImageError> {
    if bytes.len() > policy.max_bytes {
        return Err(ImageError::TooLarge {
            max: policy.max_bytes,
            got: bytes.len(),
        });
    }

    let decoded = image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;

    let (width, height) = (decoded.width(), decoded.height());
    let resized = if width.max(height) > policy.max_dimension {
        decoded.resize(
            policy.max_dimension,
            policy.max_dimension,
            FilterType::Lanczos3,
        )
    } else {
        decoded
    };

    let rgb = resized.to_rgb8();
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, policy.jpeg_quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| ImageError::Encode(e.to_string()))?;

    Ok(out)
}
