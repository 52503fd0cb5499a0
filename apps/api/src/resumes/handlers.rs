//! POST /process_resumes: multipart intake and the per-file pipeline.
//!
//! Flow per request:
//! 1. Buffer every multipart part (field order on the wire is arbitrary).
//! 2. Reject if required fields are missing or no files arrived.
//! 3. Validate every file before extracting anything.
//! 4. Per file, in upload order: OCR → inference, substituting an error
//!    message into the file's result slot on failure. One bad file never
//!    aborts the batch.
//! 5. Fire-and-forget usage log, then respond in the mode the query picked.

use axum::extract::{Multipart, State};
use axum::Json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::ocr;
use crate::resumes::models::{
    AnalysisResponse, ProcessResponse, ResumeAnalysis, ResumeSummary, SummaryResponse,
    UploadedFile,
};
use crate::resumes::usage::{spawn_usage_log, OperationType, UsageLog};
use crate::resumes::validation::validate_uploads;
use crate::state::AppState;

/// Slot message for a file whose extraction produced nothing.
const NO_TEXT_MESSAGE: &str = "No text could be extracted from the file.";

struct ProcessRequest {
    files: Vec<UploadedFile>,
    user_id: String,
    request_id: Uuid,
    query: Option<String>,
}

/// POST /process_resumes
pub async fn process_resumes(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ProcessResponse>, AppError> {
    let request = collect_request(&mut multipart).await?;
    let operation = OperationType::from_query(request.query.as_deref());

    info!(
        "Request {} from '{}': {} file(s), mode {}",
        request.request_id,
        request.user_id,
        request.files.len(),
        operation.as_str()
    );

    validate_uploads(&request.files).map_err(AppError::Validation)?;

    let mut summaries = Vec::new();
    let mut analyses = Vec::new();
    let mut files_processed = 0i32;
    let mut files_failed = 0i32;

    for file in &request.files {
        debug!(
            "Processing file '{}' for request {}",
            file.file_name, request.request_id
        );

        let slot = match process_file(&state, file, operation, request.query.as_deref()).await {
            Ok(text) => {
                files_processed += 1;
                text
            }
            Err(message) => {
                warn!(
                    "File '{}' failed for request {}: {message}",
                    file.file_name, request.request_id
                );
                files_failed += 1;
                message
            }
        };

        match operation {
            OperationType::Analysis => analyses.push(ResumeAnalysis {
                file_name: file.file_name.clone(),
                analysis: slot,
            }),
            OperationType::Summary => summaries.push(ResumeSummary {
                file_name: file.file_name.clone(),
                summary: slot,
            }),
        }
    }

    spawn_usage_log(
        state.usage.clone(),
        UsageLog {
            request_id: request.request_id,
            user_id: request.user_id,
            query_text: request.query.clone(),
            files_processed,
            files_failed,
            operation,
        },
    );

    let response = match operation {
        OperationType::Analysis => ProcessResponse::Analysis(AnalysisResponse {
            request_id: request.request_id,
            query_used: request.query.unwrap_or_default(),
            results: analyses,
        }),
        OperationType::Summary => ProcessResponse::Summary(SummaryResponse {
            request_id: request.request_id,
            results: summaries,
        }),
    };

    Ok(Json(response))
}

/// Buffers the whole multipart body into `ProcessRequest`, rejecting requests
/// with missing or malformed required fields. Unknown field names are
/// ignored.
async fn collect_request(multipart: &mut Multipart) -> Result<ProcessRequest, AppError> {
    let mut files = Vec::new();
    let mut user_id: Option<String> = None;
    let mut request_id_raw: Option<String> = None;
    let mut query: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("files") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                files.push(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            Some("user_id") => user_id = Some(field.text().await?),
            Some("request_id") => request_id_raw = Some(field.text().await?),
            Some("query") => query = Some(field.text().await?),
            other => {
                debug!("Ignoring unknown multipart field {other:?}");
            }
        }
    }

    let user_id = user_id.ok_or_else(|| {
        AppError::UnprocessableEntity("Missing required field 'user_id'".to_string())
    })?;
    let request_id_raw = request_id_raw.ok_or_else(|| {
        AppError::UnprocessableEntity("Missing required field 'request_id'".to_string())
    })?;
    let request_id = Uuid::parse_str(request_id_raw.trim()).map_err(|_| {
        AppError::UnprocessableEntity(format!(
            "Field 'request_id' must be a UUID, got '{request_id_raw}'"
        ))
    })?;

    if files.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "At least one file is required in field 'files'".to_string(),
        ));
    }

    Ok(ProcessRequest {
        files,
        user_id,
        request_id,
        query,
    })
}

/// Runs one file through extraction and inference. The `Err` side carries
/// the message that goes into the file's result slot.
async fn process_file(
    state: &AppState,
    file: &UploadedFile,
    operation: OperationType,
    query: Option<&str>,
) -> Result<String, String> {
    let text = ocr::extract_text(
        state.recognizer.as_ref(),
        &file.content_type,
        file.data.clone(),
        state.config.pdf_render_dpi,
    )
    .await
    .map_err(|e| format!("Error processing file: {e}"))?;

    if text.trim().is_empty() {
        return Err(NO_TEXT_MESSAGE.to_string());
    }

    let generated = match operation {
        OperationType::Analysis => {
            // Analysis mode implies a non-empty query; see OperationType::from_query.
            let q = query.unwrap_or_default();
            state.engine.answer(&text, q).await
        }
        OperationType::Summary => state.engine.summarize(&text).await,
    };

    generated.map_err(|e| format!("Error processing file: {e}"))
}
