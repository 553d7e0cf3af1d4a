use std::collections::BTreeMap;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ResumeRow, ResumeStatus};
use crate::resumes::service::{
    count_resumes_by_status, delete_resume, get_resume, list_resumes, submit_resume,
    update_resume_status, ResumeSubmission,
};
use crate::state::AppState;
use crate::upload::{RawUpload, UploadRejection};

/// Success envelope shared by the resume endpoints.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl<T> ApiResponse<T> {
    fn ok(message: &str, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
            data,
            timestamp: Utc::now().timestamp_millis(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeUploadResponse {
    pub id: Uuid,
    pub job_posting_id: i64,
    pub candidate_name: String,
    pub candidate_email: String,
    pub candidate_phone: Option<String>,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: Option<String>,
    pub years_of_experience: Option<i32>,
    pub skills: Option<String>,
    pub education: Option<String>,
    pub work_experience: Option<String>,
    pub certifications: Option<String>,
    pub status: ResumeStatus,
    pub status_display: &'static str,
    pub submission_date: DateTime<Utc>,
}

impl TryFrom<ResumeRow> for ResumeUploadResponse {
    type Error = AppError;

    fn try_from(row: ResumeRow) -> Result<Self, Self::Error> {
        let status: ResumeStatus = row
            .status
            .parse()
            .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;
        Ok(Self {
            id: row.id,
            job_posting_id: row.job_posting_id,
            candidate_name: row.candidate_name,
            candidate_email: row.candidate_email,
            candidate_phone: row.candidate_phone,
            file_name: row.file_name,
            file_size: row.file_size,
            content_type: row.content_type,
            years_of_experience: row.years_of_experience,
            skills: row.skills,
            education: row.education,
            work_experience: row.work_experience,
            certifications: row.certifications,
            status_display: status.display_name(),
            status,
            submission_date: row.submission_date,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadInfo {
    pub max_file_size: String,
    pub max_file_size_bytes: u64,
    pub allowed_types: Vec<String>,
    pub allowed_mime_types: Vec<String>,
}

/// POST /api/v1/resumes/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ResumeUploadResponse>>, AppError> {
    let limit_mb = state.policy.max_megabytes();
    let read_err = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::Upload(UploadRejection::TooLarge { limit_mb })
        } else {
            AppError::Validation(format!("Failed to read multipart body: {}", e.body_text()))
        }
    };

    let mut job_posting_id = None;
    let mut candidate_name = None;
    let mut candidate_email = None;
    let mut candidate_phone = None;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(read_err)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "jobPostingId" => {
                let raw = field.text().await.map_err(read_err)?;
                let id = raw.trim().parse::<i64>().map_err(|_| {
                    AppError::Validation(format!("jobPostingId must be an integer, got '{raw}'"))
                })?;
                job_posting_id = Some(id);
            }
            "candidateName" => candidate_name = Some(field.text().await.map_err(read_err)?),
            "candidateEmail" => candidate_email = Some(field.text().await.map_err(read_err)?),
            "candidatePhone" => {
                let phone = field.text().await.map_err(read_err)?;
                candidate_phone = Some(phone).filter(|p| !p.trim().is_empty());
            }
            "file" => {
                let filename = field.file_name().map(str::to_string);
                let mime_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(read_err)?;
                upload = Some(RawUpload::new(bytes, filename, mime_type));
            }
            _ => {}
        }
    }

    let submission = ResumeSubmission {
        job_posting_id: job_posting_id.ok_or_else(|| missing("jobPostingId"))?,
        candidate_name: required_text(candidate_name, "candidateName")?,
        candidate_email: required_text(candidate_email, "candidateEmail")?,
        candidate_phone,
        upload: upload.ok_or_else(|| missing("file"))?,
    };

    let row = submit_resume(&state, submission).await?;
    Ok(ApiResponse::ok(
        "Resume uploaded successfully",
        ResumeUploadResponse::try_from(row)?,
    ))
}

/// GET /api/v1/resumes/upload-info
pub async fn handle_upload_info(State(state): State<AppState>) -> Json<ApiResponse<UploadInfo>> {
    let policy = &state.policy;
    ApiResponse::ok(
        "Upload information retrieved successfully",
        UploadInfo {
            max_file_size: format!("{}MB", policy.max_megabytes()),
            max_file_size_bytes: policy.max_bytes(),
            allowed_types: policy.extensions().map(str::to_uppercase).collect(),
            allowed_mime_types: policy.mime_types().map(str::to_string).collect(),
        },
    )
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: String,
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ResumeUploadResponse>>, AppError> {
    let row = get_resume(&state, id).await?;
    Ok(ApiResponse::ok(
        "Resume retrieved successfully",
        ResumeUploadResponse::try_from(row)?,
    ))
}

/// GET /api/v1/resumes/job/:job_posting_id
pub async fn handle_list_for_job_posting(
    State(state): State<AppState>,
    Path(job_posting_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<ResumeUploadResponse>>>, AppError> {
    let rows = list_resumes(&state, job_posting_id, None).await?;
    Ok(ApiResponse::ok("Resumes retrieved successfully", to_responses(rows)?))
}

/// GET /api/v1/resumes/job/:job_posting_id/status/:status
pub async fn handle_list_by_status(
    State(state): State<AppState>,
    Path((job_posting_id, status)): Path<(i64, String)>,
) -> Result<Json<ApiResponse<Vec<ResumeUploadResponse>>>, AppError> {
    let status = parse_status(&status)?;
    let rows = list_resumes(&state, job_posting_id, Some(status)).await?;
    Ok(ApiResponse::ok("Resumes retrieved successfully", to_responses(rows)?))
}

/// PUT /api/v1/resumes/:id/status?status=SHORTLISTED
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ApiResponse<ResumeUploadResponse>>, AppError> {
    let status = parse_status(&query.status)?;
    let row = update_resume_status(&state, id, status).await?;
    Ok(ApiResponse::ok(
        "Resume status updated successfully",
        ResumeUploadResponse::try_from(row)?,
    ))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    delete_resume(&state, id).await?;
    Ok(ApiResponse::ok("Resume deleted successfully", ()))
}

/// GET /api/v1/resumes/job/:job_posting_id/count
pub async fn handle_count_by_status(
    State(state): State<AppState>,
    Path(job_posting_id): Path<i64>,
) -> Result<Json<ApiResponse<BTreeMap<String, i64>>>, AppError> {
    let counts = count_resumes_by_status(&state, job_posting_id).await?;
    Ok(ApiResponse::ok("Resume counts retrieved successfully", counts))
}

fn parse_status(raw: &str) -> Result<ResumeStatus, AppError> {
    raw.trim()
        .to_uppercase()
        .parse()
        .map_err(AppError::Validation)
}

fn to_responses(rows: Vec<ResumeRow>) -> Result<Vec<ResumeUploadResponse>, AppError> {
    rows.into_iter().map(ResumeUploadResponse::try_from).collect()
}

fn missing(field: &str) -> AppError {
    AppError::Validation(format!("{field} is required"))
}

fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing(field))
}
