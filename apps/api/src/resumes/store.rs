use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::resume::{NewResume, ResumeRow, ResumeStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Candidate {candidate_email} has already applied for job posting {job_posting_id}")]
    Duplicate {
        candidate_email: String,
        job_posting_id: i64,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence seam for resume submissions.
///
/// Carried in `AppState` as `Arc<dyn ResumeStore>`. `insert` must refuse a
/// second resume for the same (email, job posting) pair even if the caller's
/// earlier `resume_exists` check raced with another submission.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn job_posting_exists(&self, job_posting_id: i64) -> Result<bool, StoreError>;

    /// Exact, case-sensitive match on the email.
    async fn resume_exists(
        &self,
        candidate_email: &str,
        job_posting_id: i64,
    ) -> Result<bool, StoreError>;

    async fn insert(&self, resume: NewResume) -> Result<ResumeRow, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<ResumeRow>, StoreError>;

    /// Oldest submission first. `status` narrows the list when given.
    async fn list_for_job_posting(
        &self,
        job_posting_id: i64,
        status: Option<ResumeStatus>,
    ) -> Result<Vec<ResumeRow>, StoreError>;

    /// `None` if no resume has this id.
    async fn update_status(
        &self,
        id: Uuid,
        status: ResumeStatus,
    ) -> Result<Option<ResumeRow>, StoreError>;

    /// Removes the row and hands it back so the caller can clean up its file.
    async fn delete(&self, id: Uuid) -> Result<Option<ResumeRow>, StoreError>;

    /// `(status, count)` for every status present on the posting.
    async fn count_by_status(&self, job_posting_id: i64) -> Result<Vec<(String, i64)>, StoreError>;
}

/// PostgreSQL-backed store. The unique index on
/// `(candidate_email, job_posting_id)` is the final word on duplicates.
#[derive(Clone)]
pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn job_posting_exists(&self, job_posting_id: i64) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM job_postings WHERE id = $1)")
                .bind(job_posting_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn resume_exists(
        &self,
        candidate_email: &str,
        job_posting_id: i64,
    ) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM resumes WHERE candidate_email = $1 AND job_posting_id = $2)",
        )
        .bind(candidate_email)
        .bind(job_posting_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert(&self, resume: NewResume) -> Result<ResumeRow, StoreError> {
        let candidate_email = resume.candidate_email.clone();
        let job_posting_id = resume.job_posting_id;
        let row = resume.into_row(Uuid::new_v4(), Utc::now());

        let inserted = sqlx::query_as::<_, ResumeRow>(
            r#"
            INSERT INTO resumes
                (id, job_posting_id, candidate_name, candidate_email, candidate_phone,
                 file_name, file_path, file_size, content_type, extracted_text,
                 years_of_experience, skills, education, work_experience, certifications,
                 status, submission_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING *
            "#,
        )
        .bind(row.id)
        .bind(row.job_posting_id)
        .bind(&row.candidate_name)
        .bind(&row.candidate_email)
        .bind(&row.candidate_phone)
        .bind(&row.file_name)
        .bind(&row.file_path)
        .bind(row.file_size)
        .bind(&row.content_type)
        .bind(&row.extracted_text)
        .bind(row.years_of_experience)
        .bind(&row.skills)
        .bind(&row.education)
        .bind(&row.work_experience)
        .bind(&row.certifications)
        .bind(&row.status)
        .bind(row.submission_date)
        .bind(row.created_at)
        .bind(row.updated_at)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::Duplicate {
                    candidate_email,
                    job_posting_id,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<ResumeRow>, StoreError> {
        let row = sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_for_job_posting(
        &self,
        job_posting_id: i64,
        status: Option<ResumeStatus>,
    ) -> Result<Vec<ResumeRow>, StoreError> {
        let rows = sqlx::query_as::<_, ResumeRow>(
            r#"
            SELECT * FROM resumes
            WHERE job_posting_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY submission_date, id
            "#,
        )
        .bind(job_posting_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ResumeStatus,
    ) -> Result<Option<ResumeRow>, StoreError> {
        let row = sqlx::query_as::<_, ResumeRow>(
            "UPDATE resumes SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<ResumeRow>, StoreError> {
        let row = sqlx::query_as::<_, ResumeRow>("DELETE FROM resumes WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn count_by_status(&self, job_posting_id: i64) -> Result<Vec<(String, i64)>, StoreError> {
        let counts = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM resumes WHERE job_posting_id = $1 GROUP BY status",
        )
        .bind(job_posting_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }
}
