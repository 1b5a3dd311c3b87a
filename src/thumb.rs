//! Decoded thumbnail values and the decode policy.
//!
//! Decode always honors a requested target dimension when one is supplied
//! (downscale-on-load), but never upscales: an artifact smaller than the
//! target is returned as-is.

use base64::Engine;
use image::DynamicImage;
use std::path::Path;

use crate::error::ThumbnailError;

/// A decoded image ready for display: RGBA8 bytes plus pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl Thumbnail {
    fn from_dynamic(img: DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            pixels: rgba.into_raw(),
        }
    }
}

/// Apply the downscale-on-load target. No-op when the image already fits.
fn scale_to_target(img: DynamicImage, target_dim: Option<u32>) -> DynamicImage {
    match target_dim {
        Some(dim) if dim > 0 && img.width().max(img.height()) > dim => img.thumbnail(dim, dim),
        _ => img,
    }
}

/// Decode an image file, optionally downscaling to `target_dim`.
pub fn decode_file(path: &Path, target_dim: Option<u32>) -> Result<Thumbnail, ThumbnailError> {
    let img = image::open(path).map_err(|e| ThumbnailError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(Thumbnail::from_dynamic(scale_to_target(img, target_dim)))
}

/// Decode an inline base64 placeholder payload.
pub fn decode_placeholder(
    base64_payload: &str,
    target_dim: Option<u32>,
) -> Result<Thumbnail, ThumbnailError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(base64_payload.trim())
        .map_err(|e| ThumbnailError::BadPlaceholder(e.to_string()))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| ThumbnailError::BadPlaceholder(e.to_string()))?;
    Ok(Thumbnail::from_dynamic(scale_to_target(img, target_dim)))
}
