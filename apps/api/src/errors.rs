use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractError;
use crate::resumes::pipeline::PipelineError;
use crate::resumes::store::StoreError;
use crate::upload::UploadRejection;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Upload(#[from] UploadRejection),

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error("{0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate { .. } => AppError::Conflict(e.to_string()),
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Rejected(e) => AppError::Upload(e),
            PipelineError::Extraction(e) => AppError::Extraction(e),
        }
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Upload(rejection) => {
                let (status, code) = match rejection {
                    UploadRejection::EmptyFile => (StatusCode::BAD_REQUEST, "EMPTY_FILE"),
                    UploadRejection::TooLarge { .. } => {
                        (StatusCode::PAYLOAD_TOO_LARGE, "FILE_SIZE_EXCEEDED")
                    }
                    UploadRejection::UnsafeFilename { .. }
                    | UploadRejection::UnsupportedMimeType { .. }
                    | UploadRejection::UnsupportedExtension { .. } => {
                        (StatusCode::BAD_REQUEST, "INVALID_REQUEST")
                    }
                };
                (status, code, rejection.to_string())
            }
            AppError::Extraction(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "FILE_PROCESSING_ERROR",
                e.to_string(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "DUPLICATE_APPLICATION", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use crate::extraction::DocumentFormat;

    use super::*;

    #[test]
    fn test_upload_rejections_map_to_statuses() {
        let cases = [
            (UploadRejection::EmptyFile, StatusCode::BAD_REQUEST, "EMPTY_FILE"),
            (
                UploadRejection::TooLarge { limit_mb: 10 },
                StatusCode::PAYLOAD_TOO_LARGE,
                "FILE_SIZE_EXCEEDED",
            ),
            (
                UploadRejection::UnsupportedMimeType {
                    mime_type: "image/png".into(),
                },
                StatusCode::BAD_REQUEST,
                "INVALID_REQUEST",
            ),
        ];
        for (rejection, status, code) in cases {
            let (got_status, got_code, _) = AppError::from(rejection).parts();
            assert_eq!(got_status, status);
            assert_eq!(got_code, code);
        }
    }

    #[test]
    fn test_too_large_message_reports_limit() {
        let (_, _, message) = AppError::from(UploadRejection::TooLarge { limit_mb: 10 }).parts();
        assert_eq!(message, "File size exceeds maximum allowed size of 10MB");
    }

    #[test]
    fn test_extraction_failure_is_unprocessable() {
        let err = AppError::from(ExtractError::failed(DocumentFormat::Pdf, "bad xref"));
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, "FILE_PROCESSING_ERROR");
        assert!(message.contains("pdf"));
    }

    #[test]
    fn test_duplicate_store_error_is_conflict() {
        let err = AppError::from(StoreError::Duplicate {
            candidate_email: "a@b.c".into(),
            job_posting_id: 7,
        });
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "DUPLICATE_APPLICATION");
        assert!(message.contains("a@b.c"));
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let err = AppError::Storage("/var/uploads: permission denied".into());
        let (status, _, message) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("permission"));
    }
}
