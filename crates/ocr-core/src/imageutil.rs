//! MIME sniffing and canonical re-encoding for uploaded image bytes.
//!
//! Supported types are sniffed from content, never trusted from a client
//! header: `image/jpeg`, `image/png`, `image/tiff`. Anything else is
//! rejected with [`ImageUtilError::UnsupportedType`].

use thiserror::Error;

/// Image-utility errors, reserved range `[50001, 59999]`.
#[derive(Debug, Error)]
pub enum ImageUtilError {
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("could not determine image type from content")]
    SniffFailed,

    #[error("failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("failed to encode image: {0}")]
    EncodeFailed(String),
}

impl ImageUtilError {
    pub fn code(&self) -> u32 {
        match self {
            ImageUtilError::UnsupportedType(_) => 50001,
            ImageUtilError::SniffFailed => 50002,
            ImageUtilError::DecodeFailed(_) => 50003,
            ImageUtilError::EncodeFailed(_) => 50004,
        }
    }
}

const SUPPORTED_MIMES: &[&str] = &["image/jpeg", "image/png", "image/tiff"];

/// Sniff the MIME type of `content` by its bytes, rejecting anything not in
/// [`SUPPORTED_MIMES`].
pub fn sniff_mime(content: &[u8]) -> Result<&'static str, ImageUtilError> {
    let kind = infer::get(content).ok_or(ImageUtilError::SniffFailed)?;
    let mime = kind.mime_type();
    SUPPORTED_MIMES
        .iter()
        .find(|&&supported| supported == mime)
        .copied()
        .ok_or_else(|| ImageUtilError::UnsupportedType(mime.to_string()))
}

/// Decode `content` (already sniffed as one of the supported formats) and
/// re-encode it as a canonical JPEG buffer.
///
/// The original implementation re-encodes jpeg -> jpeg, png -> png, and
/// tiff -> jpeg; this always normalizes to JPEG. A single re-encode target
/// means the OCR adapter only ever writes one file extension to disk, and
/// the engine binding only needs to cope with one input format — see
/// DESIGN.md, Open Question OQ-1.
pub fn reencode_canonical(content: &[u8]) -> Result<Vec<u8>, ImageUtilError> {
    let format = image::guess_format(content).map_err(|e| ImageUtilError::DecodeFailed(e.to_string()))?;
    let decoded =
        image::load_from_memory_with_format(content, format).map_err(|e| ImageUtilError::DecodeFailed(e.to_string()))?;

    let mut out = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut out);
    decoded
        .write_to(&mut cursor, image::ImageFormat::Jpeg)
        .map_err(|e| ImageUtilError::EncodeFailed(e.to_string()))?;
    Ok(out)
}
