//! Tesseract-backed recognizer. Shells out to the `tesseract` CLI with the
//! image written to a temp file, reading the recognized text from stdout.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::ocr::{OcrError, TextRecognizer};

/// Page segmentation mode 3: fully automatic, no orientation detection.
/// Suits whole-page resume scans.
const PAGE_SEG_MODE: &str = "3";

pub struct TesseractCli {
    binary: String,
    languages: String,
}

impl TesseractCli {
    pub fn new(binary: impl Into<String>, languages: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            languages: languages.into(),
        }
    }

    /// Probes `tesseract --version`. Used at startup to warn early when the
    /// binary is missing; extraction itself reports per-file errors later.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl TextRecognizer for TesseractCli {
    async fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        let input = tempfile::Builder::new()
            .prefix("resume-page-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Recognition(format!("could not create temp file: {e}")))?;

        tokio::fs::write(input.path(), image_bytes)
            .await
            .map_err(|e| OcrError::Recognition(format!("could not write temp file: {e}")))?;

        debug!("Running {} on {}", self.binary, input.path().display());

        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .arg("--psm")
            .arg(PAGE_SEG_MODE)
            .output()
            .await
            .map_err(|e| {
                OcrError::EngineUnavailable(format!("failed to run '{}': {e}", self.binary))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
