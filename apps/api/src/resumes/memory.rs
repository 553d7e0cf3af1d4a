use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::resume::{NewResume, ResumeRow, ResumeStatus};
use crate::resumes::store::{ResumeStore, StoreError};

#[derive(Default)]
struct Inner {
    job_postings: HashSet<i64>,
    resumes: Vec<ResumeRow>,
}

/// In-process `ResumeStore` for tests; same duplicate rules as Postgres.
#[derive(Default)]
pub struct InMemoryResumeStore {
    inner: RwLock<Inner>,
}

impl InMemoryResumeStore {
    pub fn with_job_postings(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                job_postings: ids.into_iter().collect(),
                resumes: Vec::new(),
            }),
        }
    }

    pub async fn resumes(&self) -> Vec<ResumeRow> {
        self.inner.read().await.resumes.clone()
    }
}

#[async_trait]
impl ResumeStore for InMemoryResumeStore {
    async fn job_posting_exists(&self, job_posting_id: i64) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.job_postings.contains(&job_posting_id))
    }

    async fn resume_exists(
        &self,
        candidate_email: &str,
        job_posting_id: i64,
    ) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .resumes
            .iter()
            .any(|r| r.candidate_email == candidate_email && r.job_posting_id == job_posting_id))
    }

    async fn insert(&self, resume: NewResume) -> Result<ResumeRow, StoreError> {
        let mut inner = self.inner.write().await;
        let duplicate = inner.resumes.iter().any(|r| {
            r.candidate_email == resume.candidate_email && r.job_posting_id == resume.job_posting_id
        });
        if duplicate {
            return Err(StoreError::Duplicate {
                candidate_email: resume.candidate_email,
                job_posting_id: resume.job_posting_id,
            });
        }

        let row = resume.into_row(Uuid::new_v4(), Utc::now());
        inner.resumes.push(row.clone());
        Ok(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ResumeRow>, StoreError> {
        Ok(self.inner.read().await.resumes.iter().find(|r| r.id == id).cloned())
    }

    async fn list_for_job_posting(
        &self,
        job_posting_id: i64,
        status: Option<ResumeStatus>,
    ) -> Result<Vec<ResumeRow>, StoreError> {
        let mut rows: Vec<ResumeRow> = self
            .inner
            .read()
            .await
            .resumes
            .iter()
            .filter(|r| r.job_posting_id == job_posting_id)
            .filter(|r| status.map_or(true, |s| r.status == s.as_str()))
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.submission_date, r.id));
        Ok(rows)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ResumeStatus,
    ) -> Result<Option<ResumeRow>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.resumes.iter_mut().find(|r| r.id == id).map(|row| {
            row.status = status.as_str().to_string();
            row.updated_at = Utc::now();
            row.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<ResumeRow>, StoreError> {
        let mut inner = self.inner.write().await;
        let position = inner.resumes.iter().position(|r| r.id == id);
        Ok(position.map(|idx| inner.resumes.remove(idx)))
    }

    async fn count_by_status(&self, job_posting_id: i64) -> Result<Vec<(String, i64)>, StoreError> {
        let mut counts: HashMap<String, i64> = HashMap::new();
        for row in &self.inner.read().await.resumes {
            if row.job_posting_id == job_posting_id {
                *counts.entry(row.status.clone()).or_default() += 1;
            }
        }
        Ok(counts.into_iter().collect())
    }
}
