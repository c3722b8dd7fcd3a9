//! Turning a selected image into the opaque `image` string stored on items.
//!
//! Size is checked against the source bytes at selection time, so an
//! oversized image is rejected before it gets anywhere near the store.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::ImageError;

/// Mime type for a file name, by extension.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Encode `bytes` as a `data:` URL, rejecting sources over `max_bytes`.
pub fn encode_data_url(bytes: &[u8], mime: &str, max_bytes: usize) -> Result<String, ImageError> {
    if bytes.len() > max_bytes {
        return Err(ImageError::TooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

/// Read and encode an image file. The size check uses file metadata so an
/// oversized file is never read into memory.
pub fn load_image(path: &Path, max_bytes: usize) -> Result<String, ImageError> {
    let size = std::fs::metadata(path)?.len();
    if size > max_bytes as u64 {
        return Err(ImageError::TooLarge {
            size: usize::try_from(size).unwrap_or(usize::MAX),
            limit: max_bytes,
        });
    }
    let bytes = std::fs::read(path)?;
    encode_data_url(&bytes, mime_for(path), max_bytes)
}
