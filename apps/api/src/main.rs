mod config;
mod db;
mod errors;
mod llm;
mod ocr;
mod resumes;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::llm::{InferenceEngine, T5Engine};
use crate::ocr::tesseract::TesseractCli;
use crate::ocr::TextRecognizer;
use crate::resumes::usage::{PgUsageSink, UsageSink};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Analyzer API v{}", env!("CARGO_PKG_VERSION"));

    // Postgres is optional: without it the service runs but skips usage logs.
    let db = match &config.database_url {
        Some(url) => match create_pool(url).await {
            Ok(pool) => match ensure_schema(&pool).await {
                Ok(()) => {
                    info!("Usage log schema ready");
                    Some(pool)
                }
                Err(e) => {
                    warn!("Could not prepare usage log schema, usage logging disabled: {e:#}");
                    None
                }
            },
            Err(e) => {
                warn!("Could not connect to PostgreSQL, usage logging disabled: {e:#}");
                None
            }
        },
        None => {
            warn!("DATABASE_URL is not set; usage logging disabled");
            None
        }
    };

    // OCR backend: Tesseract via CLI. A missing binary degrades to per-file
    // extraction errors, so startup only warns.
    let tesseract = TesseractCli::new(config.tesseract_path.clone(), config.ocr_languages.clone());
    if tesseract.is_available().await {
        info!(
            "Tesseract available at '{}' (languages: {})",
            config.tesseract_path, config.ocr_languages
        );
    } else {
        warn!(
            "Tesseract binary '{}' not found; text extraction will fail per file",
            config.tesseract_path
        );
    }
    let recognizer: Arc<dyn TextRecognizer> = Arc::new(tesseract);

    // Inference engine: the checkpoint loads lazily; warm it in the
    // background so the first upload does not pay for the load.
    let t5 = Arc::new(T5Engine::new(config.model_dir.clone().map(PathBuf::from)));
    {
        let warm = t5.clone();
        tokio::spawn(async move { warm.warm_up().await });
    }
    let engine: Arc<dyn InferenceEngine> = t5;

    let usage: Arc<dyn UsageSink> = Arc::new(PgUsageSink::new(db));

    let state = AppState {
        usage,
        recognizer,
        engine,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
