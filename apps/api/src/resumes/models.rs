//! Request and response shapes for resume processing.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One multipart file part, buffered in memory for the duration of the
/// request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Per-file outcome in summary mode. Error messages occupy `summary` too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeSummary {
    pub file_name: String,
    pub summary: String,
}

/// Per-file outcome in analysis mode. Error messages occupy `analysis` too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeAnalysis {
    pub file_name: String,
    pub analysis: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub request_id: Uuid,
    pub results: Vec<ResumeSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub request_id: Uuid,
    pub query_used: String,
    pub results: Vec<ResumeAnalysis>,
}

/// The endpoint returns one of two shapes depending on whether a query was
/// supplied. Untagged so clients see the plain object.
///
/// `Analysis` must stay first: it carries the extra `query_used` field, so
/// untagged deserialization tries the stricter shape before the looser one.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessResponse {
    Analysis(AnalysisResponse),
    Summary(SummaryResponse),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_response_shape() {
        let response = SummaryResponse {
            request_id: Uuid::nil(),
            results: vec![ResumeSummary {
                file_name: "cv.pdf".to_string(),
                summary: "a summary".to_string(),
            }],
        };
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["results"][0]["file_name"], "cv.pdf");
        assert_eq!(json["results"][0]["summary"], "a summary");
        assert!(json.get("query_used").is_none());
    }

    #[test]
    fn test_analysis_response_shape() {
        let response = AnalysisResponse {
            request_id: Uuid::nil(),
            query_used: "Rust experience?".to_string(),
            results: vec![ResumeAnalysis {
                file_name: "cv.png".to_string(),
                analysis: "an answer".to_string(),
            }],
        };
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["query_used"], "Rust experience?");
        assert_eq!(json["results"][0]["analysis"], "an answer");
    }

    #[test]
    fn test_untagged_response_serializes_flat() {
        let response = ProcessResponse::Summary(SummaryResponse {
            request_id: Uuid::nil(),
            results: vec![],
        });
        let json = serde_json::to_value(&response).unwrap();

        // No enum tag: the wrapped object is the whole body.
        assert!(json.get("Summary").is_none());
        assert!(json.get("request_id").is_some());
    }

    #[test]
    fn test_untagged_deserialize_picks_analysis() {
        let json = serde_json::json!({
            "request_id": Uuid::nil(),
            "query_used": "q",
            "results": [{"file_name": "cv.pdf", "analysis": "a"}]
        });
        let parsed: ProcessResponse = serde_json::from_value(json).unwrap();
        assert!(matches!(parsed, ProcessResponse::Analysis(_)));
    }

    #[test]
    fn test_untagged_deserialize_picks_summary() {
        let json = serde_json::json!({
            "request_id": Uuid::nil(),
            "results": [{"file_name": "cv.pdf", "summary": "s"}]
        });
        let parsed: ProcessResponse = serde_json::from_value(json).unwrap();
        assert!(matches!(parsed, ProcessResponse::Summary(_)));
    }
}
