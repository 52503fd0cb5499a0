use std::sync::Arc;

use crate::config::Config;
use crate::llm::InferenceEngine;
use crate::ocr::TextRecognizer;
use crate::resumes::usage::UsageSink;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Usage log destination. The Postgres sink degrades to a no-op when
    /// the service runs without persistence.
    pub usage: Arc<dyn UsageSink>,
    /// Pluggable OCR backend. Default: Tesseract via its CLI.
    pub recognizer: Arc<dyn TextRecognizer>,
    /// Inference backend behind the lazily-loaded local checkpoint.
    pub engine: Arc<dyn InferenceEngine>,
    pub config: Config,
}
