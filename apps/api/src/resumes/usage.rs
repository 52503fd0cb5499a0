//! Usage logging: one row per request, written after the response body is
//! decided. Failures are logged and swallowed; the caller's response never
//! depends on the write.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;

/// `summary` when no query was supplied, `analysis` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Summary,
    Analysis,
}

impl OperationType {
    /// Mode selection. Only a present, non-empty query switches to analysis;
    /// a whitespace-only query still counts as present.
    pub fn from_query(query: Option<&str>) -> Self {
        match query {
            Some(q) if !q.is_empty() => OperationType::Analysis,
            _ => OperationType::Summary,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Summary => "summary",
            OperationType::Analysis => "analysis",
        }
    }
}

/// Metadata recorded for one processing request.
#[derive(Debug, Clone)]
pub struct UsageLog {
    pub request_id: Uuid,
    pub user_id: String,
    pub query_text: Option<String>,
    pub files_processed: i32,
    pub files_failed: i32,
    pub operation: OperationType,
}

/// Destination for usage records. Carried in `AppState` as
/// `Arc<dyn UsageSink>`, the same seam shape as the OCR and inference
/// backends.
#[async_trait]
pub trait UsageSink: Send + Sync {
    async fn record(&self, log: &UsageLog) -> Result<(), AppError>;
}

/// Postgres-backed sink. Without a pool every write is skipped, so the
/// service keeps serving when no database is configured.
pub struct PgUsageSink {
    pool: Option<PgPool>,
}

impl PgUsageSink {
    pub fn new(pool: Option<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageSink for PgUsageSink {
    async fn record(&self, log: &UsageLog) -> Result<(), AppError> {
        let Some(pool) = &self.pool else {
            debug!(
                "No database configured; skipping usage log for request {}",
                log.request_id
            );
            return Ok(());
        };
        record_usage(pool, log).await
    }
}

pub async fn record_usage(pool: &PgPool, log: &UsageLog) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO usage_logs
            (request_id, user_id, logged_at, query_text, files_processed, files_failed, operation_type)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(log.request_id)
    .bind(&log.user_id)
    .bind(Utc::now())
    .bind(&log.query_text)
    .bind(log.files_processed)
    .bind(log.files_failed)
    .bind(log.operation.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Fire-and-forget write. The caller's response never waits on it.
pub fn spawn_usage_log(sink: Arc<dyn UsageSink>, log: UsageLog) {
    tokio::spawn(async move {
        if let Err(e) = sink.record(&log).await {
            warn!("Failed to record usage for request {}: {e}", log.request_id);
        }
    });
}
