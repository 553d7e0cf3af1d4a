use thiserror::Error;

use crate::extraction::{self, ExtractError, ExtractionResult};
use crate::inference::{infer_fields, InferredFields};
use crate::upload::{validate, RawUpload, UploadPolicy, UploadRejection};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Rejected(#[from] UploadRejection),

    #[error(transparent)]
    Extraction(#[from] ExtractError),
}

/// Outcome of validate -> extract -> infer for one upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub extraction: ExtractionResult,
    pub fields: InferredFields,
}

/// Runs the gate, the extractor and the inference engine in sequence.
///
/// Blocking: PDF and DOC decoding are CPU-bound, so async callers should
/// go through `spawn_blocking`.
pub fn process_upload(
    upload: &RawUpload,
    policy: &UploadPolicy,
) -> Result<ProcessedUpload, PipelineError> {
    let target = validate(upload, policy)?;
    let extraction = extraction::extract(&upload.bytes, &target.extension)?;

    let fields = if extraction.text.trim().is_empty() {
        InferredFields::default()
    } else {
        infer_fields(&extraction.text)
    };

    Ok(ProcessedUpload {
        filename: target.filename,
        content_type: upload.mime_type.clone(),
        extraction,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txt(body: &str) -> RawUpload {
        RawUpload::new(
            body.as_bytes().to_vec(),
            Some("cv.txt".into()),
            Some("text/plain".into()),
        )
    }

    #[test]
    fn test_txt_upload_runs_every_stage() {
        let upload = txt("Backend developer, 3 years experience\nlater 7+ years of exp\nSkills: Java, Python, SQL\nMore text\n");
        let processed = process_upload(&upload, &UploadPolicy::default()).unwrap();

        assert_eq!(processed.filename, "cv.txt");
        assert_eq!(processed.content_type.as_deref(), Some("text/plain"));
        assert_eq!(processed.extraction.extension, "txt");
        assert_eq!(processed.fields.years_of_experience, Some(7));
        assert!(processed
            .fields
            .skills
            .as_deref()
            .unwrap()
            .starts_with("Java, Python, SQL"));
    }

    #[test]
    fn test_rejection_happens_before_decoding() {
        let upload = RawUpload::new(
            b"%PDF garbage".to_vec(),
            Some("../cv.pdf".into()),
            Some("application/pdf".into()),
        );
        let err = process_upload(&upload, &UploadPolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Rejected(UploadRejection::UnsafeFilename { .. })
        ));
    }

    #[test]
    fn test_corrupt_pdf_is_extraction_error() {
        let upload = RawUpload::new(
            b"not really a pdf".to_vec(),
            Some("cv.pdf".into()),
            Some("application/pdf".into()),
        );
        let err = process_upload(&upload, &UploadPolicy::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));
    }

    #[test]
    fn test_blank_text_infers_nothing() {
        let processed = process_upload(&txt(" \n\t\n"), &UploadPolicy::default()).unwrap();
        assert_eq!(processed.fields, InferredFields::default());
    }

    #[test]
    fn test_pdf_upload_reaches_inference() {
        let bytes = crate::extraction::pdf_with_pages(&[
            "Backend engineer with 6 years of experience",
            "Education: MSc Computer Science",
        ]);
        let upload = RawUpload::new(bytes, Some("cv.pdf".into()), Some("application/pdf".into()));

        let processed = process_upload(&upload, &UploadPolicy::default()).unwrap();

        assert_eq!(processed.extraction.extension, "pdf");
        assert_eq!(processed.fields.years_of_experience, Some(6));
        assert!(processed
            .fields
            .education
            .as_deref()
            .unwrap()
            .starts_with("MSc Computer Science"));
    }
}
