use bytes::Bytes;
use thiserror::Error;

use crate::upload::policy::UploadPolicy;

/// A single uploaded file as received from the client. Nothing here is
/// verified: filename and MIME type are whatever the uploader declared.
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub bytes: Bytes,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
}

impl RawUpload {
    pub fn new(
        bytes: impl Into<Bytes>,
        filename: Option<String>,
        mime_type: Option<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            filename,
            mime_type,
        }
    }

    pub fn byte_len(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Input errors. Always reported before any decoding is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("Cannot store empty file")]
    EmptyFile,

    #[error("File size exceeds maximum allowed size of {limit_mb}MB")]
    TooLarge { limit_mb: u64 },

    #[error("Invalid filename: {reason}")]
    UnsafeFilename { reason: String },

    #[error("File type not supported: {mime_type}")]
    UnsupportedMimeType { mime_type: String },

    #[error("Unsupported file extension: '{extension}'. Supported extensions are: {supported}")]
    UnsupportedExtension {
        extension: String,
        supported: String,
    },
}

/// What the gate hands forward on success: the normalized filename and the
/// extension the extractor will dispatch on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub filename: String,
    pub extension: String,
}

/// Checks an upload against the policy, short-circuiting on the first failure.
///
/// Order: empty → size → filename → MIME type → extension.
pub fn validate(upload: &RawUpload, policy: &UploadPolicy) -> Result<UploadTarget, UploadRejection> {
    let size = upload.byte_len();
    if size == 0 {
        return Err(UploadRejection::EmptyFile);
    }
    if size > policy.max_bytes() {
        return Err(UploadRejection::TooLarge {
            limit_mb: policy.max_megabytes(),
        });
    }

    let raw_name = upload
        .filename
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| UploadRejection::UnsafeFilename {
            reason: "file must have a name".to_string(),
        })?;
    let filename = clean_path(raw_name);
    if filename.split('/').any(|segment| segment == "..") {
        return Err(UploadRejection::UnsafeFilename {
            reason: format!("'{filename}' contains a '..' path segment"),
        });
    }

    let mime_type = upload.mime_type.as_deref().unwrap_or_default();
    if !policy.accepts_mime_type(mime_type) {
        return Err(UploadRejection::UnsupportedMimeType {
            mime_type: mime_type.to_string(),
        });
    }

    let extension = file_extension(&filename);
    if !policy.accepts_extension(&extension) {
        return Err(UploadRejection::UnsupportedExtension {
            extension,
            supported: policy.extensions().collect::<Vec<_>>().join(", "),
        });
    }

    Ok(UploadTarget {
        filename,
        extension,
    })
}

/// Normalizes a client-supplied path: backslashes become `/`, empty and `.`
/// segments are dropped. `..` segments are kept so the caller can see them.
pub fn clean_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');
    let joined = unified
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Lower-cased text after the last `.` of the final path segment; empty when
/// the name has no `.`.
pub fn file_extension(filename: &str) -> String {
    let name = filename.rsplit('/').next().unwrap_or(filename);
    name.rfind('.')
        .map(|idx| name[idx + 1..].to_lowercase())
        .unwrap_or_default()
}
