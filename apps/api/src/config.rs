use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable is optional: missing backends (database, model checkpoint)
/// put the service into a degraded mode instead of failing startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres URL for usage logging. Absent → usage logs are skipped.
    pub database_url: Option<String>,
    /// Directory holding the seq2seq checkpoint (config.json, tokenizer.json,
    /// model.safetensors). Absent → inference reports unavailability per file.
    pub model_dir: Option<String>,
    pub tesseract_path: String,
    pub ocr_languages: String,
    pub pdf_render_dpi: u32,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            model_dir: optional_env("MODEL_DIR"),
            tesseract_path: std::env::var("TESSERACT_PATH")
                .unwrap_or_else(|_| "tesseract".to_string()),
            ocr_languages: std::env::var("OCR_LANGUAGES")
                .unwrap_or_else(|_| "por+eng".to_string()),
            pdf_render_dpi: std::env::var("PDF_RENDER_DPI")
                .unwrap_or_else(|_| "200".to_string())
                .parse::<u32>()
                .context("PDF_RENDER_DPI must be a positive integer")?,
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| "20971520".to_string()) // 20 MiB
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
