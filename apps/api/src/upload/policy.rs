use std::collections::BTreeSet;

use thiserror::Error;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

pub const DEFAULT_SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("max upload size must be greater than zero")]
    ZeroMaxSize,

    #[error("at least one MIME type must be accepted")]
    NoMimeTypes,

    #[error("at least one file extension must be accepted")]
    NoExtensions,
}

/// Immutable upload policy shared by every validation call.
///
/// MIME types are matched exactly; extensions are stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    max_bytes: u64,
    mime_types: BTreeSet<String>,
    extensions: BTreeSet<String>,
}

impl UploadPolicy {
    pub fn new<M, E>(max_bytes: u64, mime_types: M, extensions: E) -> Result<Self, PolicyError>
    where
        M: IntoIterator,
        M::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        if max_bytes == 0 {
            return Err(PolicyError::ZeroMaxSize);
        }

        let mime_types: BTreeSet<String> = mime_types
            .into_iter()
            .map(Into::into)
            .filter(|m| !m.is_empty())
            .collect();
        if mime_types.is_empty() {
            return Err(PolicyError::NoMimeTypes);
        }

        let extensions: BTreeSet<String> = extensions
            .into_iter()
            .map(|e| e.into().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        if extensions.is_empty() {
            return Err(PolicyError::NoExtensions);
        }

        Ok(Self {
            max_bytes,
            mime_types,
            extensions,
        })
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// The configured limit in whole megabytes, as reported to uploaders.
    pub fn max_megabytes(&self) -> u64 {
        self.max_bytes / 1024 / 1024
    }

    pub fn accepts_mime_type(&self, mime_type: &str) -> bool {
        self.mime_types.contains(mime_type)
    }

    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }

    pub fn mime_types(&self) -> impl Iterator<Item = &str> {
        self.mime_types.iter().map(String::as_str)
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|m| m.to_string())
                .collect(),
            extensions: DEFAULT_SUPPORTED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}
