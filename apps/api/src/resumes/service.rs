use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::inference::InferredFields;
use crate::models::resume::{NewResume, ResumeRow, ResumeStatus};
use crate::resumes::pipeline::process_upload;
use crate::resumes::store::StoreError;
use crate::state::AppState;
use crate::upload::RawUpload;

/// A candidate's application for one job posting.
#[derive(Debug, Clone)]
pub struct ResumeSubmission {
    pub job_posting_id: i64,
    pub candidate_name: String,
    pub candidate_email: String,
    pub candidate_phone: Option<String>,
    pub upload: RawUpload,
}

/// Accepts a resume: posting lookup, duplicate guard, validate -> extract ->
/// infer, file storage, then the database row.
pub async fn submit_resume(
    state: &AppState,
    submission: ResumeSubmission,
) -> Result<ResumeRow, AppError> {
    let ResumeSubmission {
        job_posting_id,
        candidate_name,
        candidate_email,
        candidate_phone,
        upload,
    } = submission;

    ensure_job_posting(state, job_posting_id).await?;
    if state
        .store
        .resume_exists(&candidate_email, job_posting_id)
        .await?
    {
        return Err(AppError::Conflict(
            "Candidate has already applied for this job posting".to_string(),
        ));
    }

    let policy = Arc::clone(&state.policy);
    let pending = upload.clone();
    let processed = tokio::task::spawn_blocking(move || process_upload(&pending, &policy))
        .await
        .map_err(|e| anyhow!("upload processing task failed: {e}"))??;

    let stored = state
        .files
        .store(&processed.filename, &upload.bytes)
        .await
        .map_err(|e| AppError::Storage(format!("Could not store file: {e}")))?;

    let new_resume = NewResume {
        job_posting_id,
        candidate_name,
        candidate_email,
        candidate_phone,
        file_name: processed.filename,
        file_path: stored.path.to_string_lossy().into_owned(),
        file_size: processed.extraction.byte_length as i64,
        content_type: processed.content_type,
        extracted_text: without_nul(processed.extraction.text),
        fields: InferredFields {
            skills: processed.fields.skills.map(without_nul),
            education: processed.fields.education.map(without_nul),
            work_experience: processed.fields.work_experience.map(without_nul),
            certifications: processed.fields.certifications.map(without_nul),
            ..processed.fields
        },
        status: ResumeStatus::Submitted,
    };

    match state.store.insert(new_resume).await {
        Ok(row) => {
            info!(
                "Resume uploaded successfully with ID: {} (stored as {})",
                row.id, stored.stored_filename
            );
            Ok(row)
        }
        Err(e) => {
            if let Err(cleanup) = state.files.delete(&stored.stored_filename).await {
                warn!(
                    "Could not remove orphaned file {}: {cleanup}",
                    stored.stored_filename
                );
            }
            if matches!(e, StoreError::Duplicate { .. }) {
                warn!("Duplicate application lost insert race: {e}");
            }
            Err(e.into())
        }
    }
}

/// PostgreSQL `TEXT` cannot hold NUL.
fn without_nul(text: String) -> String {
    if text.contains('\0') {
        text.replace('\0', "")
    } else {
        text
    }
}

pub async fn get_resume(state: &AppState, id: Uuid) -> Result<ResumeRow, AppError> {
    state
        .store
        .get(id)
        .await?
        .ok_or_else(|| resume_not_found(id))
}

/// Resumes submitted for a posting, optionally only those in `status`.
pub async fn list_resumes(
    state: &AppState,
    job_posting_id: i64,
    status: Option<ResumeStatus>,
) -> Result<Vec<ResumeRow>, AppError> {
    ensure_job_posting(state, job_posting_id).await?;
    Ok(state
        .store
        .list_for_job_posting(job_posting_id, status)
        .await?)
}

pub async fn update_resume_status(
    state: &AppState,
    id: Uuid,
    status: ResumeStatus,
) -> Result<ResumeRow, AppError> {
    let row = state
        .store
        .update_status(id, status)
        .await?
        .ok_or_else(|| resume_not_found(id))?;
    info!("Resume {id} moved to {}", status.as_str());
    Ok(row)
}

/// Deletes the row, then its stored file. A file that is already gone is
/// only logged.
pub async fn delete_resume(state: &AppState, id: Uuid) -> Result<(), AppError> {
    let row = state
        .store
        .delete(id)
        .await?
        .ok_or_else(|| resume_not_found(id))?;

    match Path::new(&row.file_path).file_name().and_then(|n| n.to_str()) {
        Some(stored_filename) => match state.files.delete(stored_filename).await {
            Ok(true) => {}
            Ok(false) => warn!("Stored file for resume {id} was already missing: {stored_filename}"),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Could not delete file {stored_filename}: {e}"
                )))
            }
        },
        None => warn!("Resume {id} has no usable file path: {}", row.file_path),
    }

    info!("Resume deleted successfully with ID: {id}");
    Ok(())
}

/// Count for every status, zeros included, keyed by the storage name.
pub async fn count_resumes_by_status(
    state: &AppState,
    job_posting_id: i64,
) -> Result<BTreeMap<String, i64>, AppError> {
    ensure_job_posting(state, job_posting_id).await?;

    let mut counts: BTreeMap<String, i64> = ResumeStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    for (status, count) in state.store.count_by_status(job_posting_id).await? {
        counts.insert(status, count);
    }
    Ok(counts)
}

async fn ensure_job_posting(state: &AppState, job_posting_id: i64) -> Result<(), AppError> {
    if state.store.job_posting_exists(job_posting_id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!(
            "Job posting not found with ID: {job_posting_id}"
        )))
    }
}

fn resume_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Resume not found with ID: {id}"))
}
