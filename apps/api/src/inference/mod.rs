//! Pattern heuristics over extracted resume text.
//!
//! Resumes have no fixed schema, so every field is a low-precision,
//! high-recall guess: a number pattern for years of experience and
//! heading-anchored line windows for the text sections. Each heuristic fails
//! soft: an internal error is logged and the field is left absent.

pub mod experience;
pub mod sections;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::inference::sections::{CERTIFICATIONS, EDUCATION, SKILLS, WORK_EXPERIENCE};

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("'{0}' is not a representable number of years")]
    YearsOutOfRange(String),
}

/// Structured attributes guessed from resume text. Absent means the
/// heuristic found nothing (or failed).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferredFields {
    pub years_of_experience: Option<i32>,
    pub skills: Option<String>,
    pub education: Option<String>,
    pub work_experience: Option<String>,
    pub certifications: Option<String>,
}

/// Runs all five heuristics independently over the same text.
pub fn infer_fields(text: &str) -> InferredFields {
    InferredFields {
        years_of_experience: soft(
            "years_of_experience",
            experience::years_of_experience(text),
        ),
        skills: soft(SKILLS.field, SKILLS.capture(text)),
        education: soft(EDUCATION.field, EDUCATION.capture(text)),
        work_experience: soft(WORK_EXPERIENCE.field, WORK_EXPERIENCE.capture(text)),
        certifications: soft(CERTIFICATIONS.field, CERTIFICATIONS.capture(text)),
    }
}

fn soft<T>(field: &str, result: Result<Option<T>, InferenceError>) -> Option<T> {
    result.unwrap_or_else(|e| {
        warn!("Error extracting {field}: {e}");
        None
    })
}
