use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::inference::InferredFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResumeStatus {
    Submitted,
    UnderReview,
    Screened,
    Shortlisted,
    Rejected,
    InterviewScheduled,
    Hired,
    Withdrawn,
}

impl ResumeStatus {
    pub const ALL: [ResumeStatus; 8] = [
        Self::Submitted,
        Self::UnderReview,
        Self::Screened,
        Self::Shortlisted,
        Self::Rejected,
        Self::InterviewScheduled,
        Self::Hired,
        Self::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Screened => "SCREENED",
            Self::Shortlisted => "SHORTLISTED",
            Self::Rejected => "REJECTED",
            Self::InterviewScheduled => "INTERVIEW_SCHEDULED",
            Self::Hired => "HIRED",
            Self::Withdrawn => "WITHDRAWN",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::UnderReview => "Under Review",
            Self::Screened => "Screened",
            Self::Shortlisted => "Shortlisted",
            Self::Rejected => "Rejected",
            Self::InterviewScheduled => "Interview Scheduled",
            Self::Hired => "Hired",
            Self::Withdrawn => "Withdrawn",
        }
    }
}

impl fmt::Display for ResumeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ResumeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUBMITTED" => Ok(Self::Submitted),
            "UNDER_REVIEW" => Ok(Self::UnderReview),
            "SCREENED" => Ok(Self::Screened),
            "SHORTLISTED" => Ok(Self::Shortlisted),
            "REJECTED" => Ok(Self::Rejected),
            "INTERVIEW_SCHEDULED" => Ok(Self::InterviewScheduled),
            "HIRED" => Ok(Self::Hired),
            "WITHDRAWN" => Ok(Self::Withdrawn),
            other => Err(format!("unknown resume status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub job_posting_id: i64,
    pub candidate_name: String,
    pub candidate_email: String,
    pub candidate_phone: Option<String>,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_type: Option<String>,
    pub extracted_text: String,
    pub years_of_experience: Option<i32>,
    pub skills: Option<String>,
    pub education: Option<String>,
    pub work_experience: Option<String>,
    pub certifications: Option<String>,
    pub status: String,
    pub submission_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to insert a resume; ids and timestamps are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewResume {
    pub job_posting_id: i64,
    pub candidate_name: String,
    pub candidate_email: String,
    pub candidate_phone: Option<String>,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_type: Option<String>,
    pub extracted_text: String,
    pub fields: InferredFields,
    pub status: ResumeStatus,
}

impl NewResume {
    pub fn into_row(self, id: Uuid, now: DateTime<Utc>) -> ResumeRow {
        ResumeRow {
            id,
            job_posting_id: self.job_posting_id,
            candidate_name: self.candidate_name,
            candidate_email: self.candidate_email,
            candidate_phone: self.candidate_phone,
            file_name: self.file_name,
            file_path: self.file_path,
            file_size: self.file_size,
            content_type: self.content_type,
            extracted_text: self.extracted_text,
            years_of_experience: self.fields.years_of_experience,
            skills: self.fields.skills,
            education: self.fields.education,
            work_experience: self.fields.work_experience,
            certifications: self.fields.certifications,
            status: self.status.as_str().to_string(),
            submission_date: now,
            created_at: now,
            updated_at: now,
        }
    }
}
