//! Turns raw upload bytes into plain text.
//!
//! Dispatch is on the lower-cased extension only; the declared MIME type is
//! never consulted. A supported format whose content fails to decode is a
//! hard `ExtractionFailed`, while an unknown extension yields empty text.

mod doc;
mod docx;
mod pdf;
mod text;

#[cfg(test)]
pub(crate) use pdf::pdf_with_pages;

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Doc,
    Docx,
    Txt,
}

impl DocumentFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "doc" => Some(Self::Doc),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Txt => "txt",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to extract text from {format} file: {detail}")]
    ExtractionFailed {
        format: DocumentFormat,
        detail: String,
    },
}

impl ExtractError {
    pub(crate) fn failed(format: DocumentFormat, detail: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            format,
            detail: detail.into(),
        }
    }
}

/// Text pulled from one upload. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub text: String,
    pub byte_length: usize,
    pub extension: String,
}

/// Extracts text and wraps it with the upload's size and extension.
pub fn extract(bytes: &[u8], extension: &str) -> Result<ExtractionResult, ExtractError> {
    let text = extract_text(bytes, extension)?;
    Ok(ExtractionResult {
        text,
        byte_length: bytes.len(),
        extension: extension.to_lowercase(),
    })
}

pub fn extract_text(bytes: &[u8], extension: &str) -> Result<String, ExtractError> {
    let Some(format) = DocumentFormat::from_extension(extension) else {
        warn!("Unsupported file type for text extraction: {extension}");
        return Ok(String::new());
    };

    let result = match format {
        DocumentFormat::Pdf => pdf::extract(bytes),
        DocumentFormat::Doc => doc::extract(bytes),
        DocumentFormat::Docx => docx::extract(bytes),
        DocumentFormat::Txt => text::extract(bytes),
    };

    if let Err(e) = &result {
        error!("Error extracting text from file: {e}");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txt_round_trip_appends_separator() {
        let result = extract(b"line1\nline2", "txt").unwrap();
        assert_eq!(result.text, "line1\nline2\n");
        assert_eq!(result.byte_length, 11);
        assert_eq!(result.extension, "txt");
    }

    #[test]
    fn test_extension_dispatch_is_case_insensitive() {
        let result = extract(b"hello", "TXT").unwrap();
        assert_eq!(result.text, "hello\n");
        assert_eq!(result.extension, "txt");
    }

    #[test]
    fn test_unknown_extension_yields_empty_text() {
        let result = extract(b"\x89PNG\r\n\x1a\n", "png").unwrap();
        assert!(result.text.is_empty());
        assert_eq!(result.byte_length, 8);
    }

    #[test]
    fn test_pdf_dispatch_returns_page_text() {
        let result = extract(&pdf_with_pages(&["Jane Roe"]), "PDF").unwrap();
        assert!(result.text.contains("Jane Roe"));
        assert_eq!(result.extension, "pdf");
    }

    #[test]
    fn test_corrupt_pdf_is_extraction_failure() {
        let err = extract(b"definitely not a pdf document", "pdf").unwrap_err();
        let ExtractError::ExtractionFailed { format, .. } = err;
        assert_eq!(format, DocumentFormat::Pdf);
    }

    #[test]
    fn test_corrupt_docx_is_extraction_failure() {
        let err = extract(b"PK\x03\x04 truncated zip", "docx").unwrap_err();
        assert!(err.to_string().contains("docx"));
    }

    #[test]
    fn test_corrupt_doc_is_extraction_failure() {
        let err = extract(b"not an OLE2 compound file", "doc").unwrap_err();
        assert!(err.to_string().contains("doc"));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_extension("Docx"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_extension("rtf"), None);
        assert_eq!(DocumentFormat::from_extension(""), None);
    }
}
