//! Inference: summarization and query answering over extracted resume text.
//!
//! `AppState` holds an `Arc<dyn InferenceEngine>`; the production backend is
//! `T5Engine`, which loads a local checkpoint at most once, off the async
//! executor, the first time inference is needed. A failed load leaves the
//! engine degraded: every call reports unavailability and lands in the
//! per-file result slot instead of taking the service down.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

pub mod model;
pub mod prompts;

use model::TextGenerator;

/// Input window for summarization prompts (t5-small limit).
pub const SUMMARY_INPUT_TOKENS: usize = 512;
/// Wider window for analysis prompts, which carry the query as well.
pub const ANALYSIS_INPUT_TOKENS: usize = 1024;
/// Generation cap for summaries.
pub const SUMMARY_MAX_NEW_TOKENS: usize = 150;
/// Generation cap for analysis answers.
pub const ANALYSIS_MAX_NEW_TOKENS: usize = 200;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Inference model is not available")]
    Unavailable,

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Generation failed: {0}")]
    Generation(String),
}

impl From<candle_core::Error> for InferenceError {
    fn from(e: candle_core::Error) -> Self {
        InferenceError::Generation(e.to_string())
    }
}

/// The inference seam. Implement this to swap backends without touching the
/// endpoint or handler code.
///
/// Carried in `AppState` as `Arc<dyn InferenceEngine>`.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Summarizes extracted resume text.
    async fn summarize(&self, text: &str) -> Result<String, InferenceError>;

    /// Answers a caller query against extracted resume text.
    async fn answer(&self, text: &str, query: &str) -> Result<String, InferenceError>;
}

/// Candle-backed T5 engine. The checkpoint directory comes from `MODEL_DIR`;
/// the generator cell resolves once and is shared by every request.
pub struct T5Engine {
    model_dir: Option<PathBuf>,
    generator: OnceCell<Option<Arc<TextGenerator>>>,
}

impl T5Engine {
    pub fn new(model_dir: Option<PathBuf>) -> Self {
        Self {
            model_dir,
            generator: OnceCell::new(),
        }
    }

    /// Triggers the checkpoint load without waiting for a request. Called in
    /// the background at startup so the first upload does not pay the load.
    pub async fn warm_up(&self) {
        let _ = self.resolve().await;
    }

    async fn resolve(&self) -> Option<Arc<TextGenerator>> {
        self.generator
            .get_or_init(|| async {
                let Some(dir) = self.model_dir.clone() else {
                    warn!("MODEL_DIR is not set; inference disabled");
                    return None;
                };

                info!("Loading inference model from {}", dir.display());
                let loaded =
                    tokio::task::spawn_blocking(move || TextGenerator::load(&dir)).await;

                match loaded {
                    Ok(Ok(generator)) => {
                        info!("Inference model loaded");
                        Some(Arc::new(generator))
                    }
                    Ok(Err(e)) => {
                        warn!("Failed to load inference model: {e:#}");
                        None
                    }
                    Err(e) => {
                        warn!("Model load task failed: {e}");
                        None
                    }
                }
            })
            .await
            .clone()
    }

    async fn generate(
        &self,
        prompt: String,
        input_cap: usize,
        max_new_tokens: usize,
    ) -> Result<String, InferenceError> {
        let generator = self.resolve().await.ok_or(InferenceError::Unavailable)?;

        tokio::task::spawn_blocking(move || generator.generate(&prompt, input_cap, max_new_tokens))
            .await
            .map_err(|e| InferenceError::Generation(format!("inference task failed: {e}")))?
    }
}

#[async_trait]
impl InferenceEngine for T5Engine {
    async fn summarize(&self, text: &str) -> Result<String, InferenceError> {
        let prompt = prompts::build_summarize_prompt(text);
        self.generate(prompt, SUMMARY_INPUT_TOKENS, SUMMARY_MAX_NEW_TOKENS)
            .await
    }

    async fn answer(&self, text: &str, query: &str) -> Result<String, InferenceError> {
        let prompt = prompts::build_analysis_prompt(text, query);
        self.generate(prompt, ANALYSIS_INPUT_TOKENS, ANALYSIS_MAX_NEW_TOKENS)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_engine_without_model_dir_is_unavailable() {
        let engine = T5Engine::new(None);
        let result = engine.summarize("some resume text").await;
        assert!(matches!(result, Err(InferenceError::Unavailable)));
    }

    #[tokio::test]
    async fn test_engine_with_bogus_model_dir_is_unavailable() {
        let engine = T5Engine::new(Some(PathBuf::from("/nonexistent/model/dir")));
        let result = engine.answer("text", "query").await;
        assert!(matches!(result, Err(InferenceError::Unavailable)));
    }

    #[tokio::test]
    async fn test_failed_load_is_cached_across_calls() {
        let engine = T5Engine::new(Some(PathBuf::from("/nonexistent/model/dir")));
        let _ = engine.summarize("first").await;
        let second = engine.summarize("second").await;
        assert!(matches!(second, Err(InferenceError::Unavailable)));
    }

    #[test]
    fn test_unavailable_message() {
        assert_eq!(
            InferenceError::Unavailable.to_string(),
            "Inference model is not available"
        );
    }
}
