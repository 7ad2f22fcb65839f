//! OCR adapter: sniff, re-encode to a canonical on-disk file, hand that file
//! to the OCR engine, return the extracted text.
//!
//! One [`tesseract::Tesseract`] instance is constructed per call rather than
//! held as a shared field on [`OcrAdapter`] — the engine binding is not
//! `Send`-friendly to share across a pool of workers behind `&self`, and
//! constructing fresh per call is exactly the "one engine per worker"
//! guidance this system follows to keep worker tasks independent of each
//! other's engine state.

use uuid::Uuid;

use crate::error::ServiceError;
use crate::imageutil::{reencode_canonical, sniff_mime};

/// Applies OCR to raw uploaded bytes. Supported types only: `image/jpeg`,
/// `image/png`, `image/tiff`, sniffed from content.
#[derive(Debug, Default, Clone, Copy)]
pub struct OcrAdapter;

impl OcrAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Sniff, re-encode to a canonical JPEG temp file, run the OCR engine
    /// over it, and return the extracted text. The temp file is best-effort
    /// removed afterward; a failure to remove it is logged, not returned —
    /// this system makes no cleanup guarantee on crash, matching the
    /// original adapter's behavior.
    pub async fn apply_ocr(&self, content: &[u8]) -> Result<String, ServiceError> {
        sniff_mime(content)?;
        let canonical = reencode_canonical(content)?;

        let path = std::env::temp_dir().join(format!("{}.jpg", Uuid::now_v7()));
        tokio::fs::write(&path, &canonical)
            .await
            .map_err(|e| ServiceError::SaveImageFailed(e.to_string()))?;

        let path_for_engine = path.clone();
        let text = tokio::task::spawn_blocking(move || run_engine(&path_for_engine))
            .await
            .map_err(|e| ServiceError::ApplyOcrFailed(e.to_string()))??;

        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(error = %e, path = %path.display(), "failed to remove OCR temp file");
        }

        Ok(text)
    }
}

fn run_engine(path: &std::path::Path) -> Result<String, ServiceError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| ServiceError::ApplyOcrFailed("temp file path is not valid UTF-8".into()))?;

    let mut engine = tesseract::Tesseract::new(None, Some("eng"))
        .map_err(|e| ServiceError::ApplyOcrFailed(e.to_string()))?
        .set_image(path_str)
        .map_err(|e| ServiceError::ApplyOcrFailed(e.to_string()))?;

    engine
        .get_text()
        .map_err(|e| ServiceError::ApplyOcrFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_unsupported_content_before_touching_disk() {
        let adapter = OcrAdapter::new();
        let err = adapter.apply_ocr(b"not an image").await.unwrap_err();
        assert!(matches!(err, ServiceError::UnsupportedImageType(_)));
    }
}
