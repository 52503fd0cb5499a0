//! OCR extraction: turns uploaded resume bytes into text.
//!
//! Dispatch is by declared content type: PDFs are rasterized page by page
//! (see `pdf`) and each page image goes through the recognizer; PNG/JPEG
//! bytes go through the recognizer directly.
//!
//! `AppState` carries the recognizer as `Arc<dyn TextRecognizer>`, so tests
//! can substitute a stub without touching the pipeline.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::warn;

pub mod pdf;
pub mod tesseract;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("Could not read PDF document: {0}")]
    PdfDocument(String),

    #[error("Text recognition failed: {0}")]
    Recognition(String),

    #[error("OCR engine is not available: {0}")]
    EngineUnavailable(String),
}

/// Pixel-to-text backend. Implementations receive encoded image bytes
/// (PNG or JPEG) and return the recognized text.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError>;
}

/// Extracts text from one uploaded file, routed by its declared content type.
///
/// Content types are validated upstream, so `UnsupportedType` only fires if a
/// caller bypasses validation.
pub async fn extract_text(
    recognizer: &dyn TextRecognizer,
    content_type: &str,
    data: Bytes,
    dpi: u32,
) -> Result<String, OcrError> {
    match content_type {
        "application/pdf" => {
            let pages = pdf::render_pages(data, dpi).await?;
            let text = recognize_pages(recognizer, &pages).await;
            Ok(text.trim().to_string())
        }
        "image/png" | "image/jpeg" => {
            let text = recognizer.recognize(&data).await?;
            Ok(text.trim().to_string())
        }
        other => Err(OcrError::UnsupportedType(other.to_string())),
    }
}

/// Runs the recognizer over rendered pages and joins the results with page
/// separators. A page that failed to render (`None`) or whose recognition
/// fails contributes a failure marker; extraction always continues with the
/// next page.
async fn recognize_pages(recognizer: &dyn TextRecognizer, pages: &[Option<Vec<u8>>]) -> String {
    let mut full_text = String::new();

    for (idx, page) in pages.iter().enumerate() {
        let number = idx + 1;
        let recognized = match page {
            Some(image_bytes) => recognizer.recognize(image_bytes).await,
            None => Err(OcrError::Recognition("page did not render".to_string())),
        };

        match recognized {
            Ok(text) => {
                full_text.push_str(&page_separator(number));
                full_text.push_str(text.trim());
            }
            Err(e) => {
                warn!("OCR failed on page {number}: {e}");
                full_text.push_str(&failed_page_marker(number));
            }
        }
    }

    full_text
}

fn page_separator(page: usize) -> String {
    format!("\n--- Page {page} ---\n")
}

fn failed_page_marker(page: usize) -> String {
    format!("\n--- Page {page} (extraction failed) ---\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Maps page bytes to text; fails when handed `b"bad"`.
    struct MappingRecognizer;

    #[async_trait]
    impl TextRecognizer for MappingRecognizer {
        async fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
            if image_bytes == b"bad" {
                return Err(OcrError::Recognition("simulated failure".to_string()));
            }
            Ok(format!("text:{}", String::from_utf8_lossy(image_bytes)))
        }
    }

    #[test]
    fn test_page_separator_format() {
        assert_eq!(page_separator(1), "\n--- Page 1 ---\n");
        assert_eq!(page_separator(12), "\n--- Page 12 ---\n");
    }

    #[test]
    fn test_failed_page_marker_format() {
        assert_eq!(
            failed_page_marker(3),
            "\n--- Page 3 (extraction failed) ---\n"
        );
    }

    #[tokio::test]
    async fn test_extract_text_rejects_unsupported_type() {
        let result = extract_text(
            &MappingRecognizer,
            "text/plain",
            Bytes::from_static(b"hello"),
            200,
        )
        .await;
        assert!(matches!(result, Err(OcrError::UnsupportedType(t)) if t == "text/plain"));
    }

    #[tokio::test]
    async fn test_extract_text_image_trims_output() {
        let text = extract_text(
            &MappingRecognizer,
            "image/png",
            Bytes::from_static(b"  cv  "),
            200,
        )
        .await
        .unwrap();
        assert_eq!(text, "text:  cv");
    }

    #[tokio::test]
    async fn test_recognize_pages_joins_with_separators() {
        let pages = vec![Some(b"one".to_vec()), Some(b"two".to_vec())];
        let text = recognize_pages(&MappingRecognizer, &pages).await;
        assert_eq!(
            text,
            "\n--- Page 1 ---\ntext:one\n--- Page 2 ---\ntext:two"
        );
    }

    #[tokio::test]
    async fn test_recognize_pages_marks_failed_page_and_continues() {
        let pages = vec![
            Some(b"one".to_vec()),
            Some(b"bad".to_vec()),
            Some(b"three".to_vec()),
        ];
        let text = recognize_pages(&MappingRecognizer, &pages).await;
        assert!(text.contains("--- Page 1 ---\ntext:one"));
        assert!(text.contains("--- Page 2 (extraction failed) ---"));
        assert!(text.contains("--- Page 3 ---\ntext:three"));
    }

    #[tokio::test]
    async fn test_recognize_pages_marks_unrendered_page() {
        let pages = vec![None, Some(b"two".to_vec())];
        let text = recognize_pages(&MappingRecognizer, &pages).await;
        assert!(text.starts_with("\n--- Page 1 (extraction failed) ---\n"));
        assert!(text.contains("--- Page 2 ---\ntext:two"));
    }

    #[tokio::test]
    async fn test_recognize_pages_empty_document() {
        let text = recognize_pages(&MappingRecognizer, &[]).await;
        assert!(text.is_empty());
    }
}
