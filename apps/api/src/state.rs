use std::sync::Arc;

use crate::resumes::files::FileStore;
use crate::resumes::store::ResumeStore;
use crate::upload::UploadPolicy;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres in production; swapped for an in-memory store in tests.
    pub store: Arc<dyn ResumeStore>,
    pub files: FileStore,
    pub policy: Arc<UploadPolicy>,
}

#[cfg(test)]
impl AppState {
    /// In-memory store, files under `upload_dir`, 1MB limit, pdf and txt only.
    pub fn for_tests(store: Arc<dyn ResumeStore>, upload_dir: &std::path::Path) -> Self {
        let config = crate::config::Config {
            database_url: "postgres://unused".to_string(),
            upload_dir: upload_dir.to_path_buf(),
            max_upload_bytes: 1024 * 1024,
            allowed_mime_types: vec!["application/pdf".into(), "text/plain".into()],
            supported_extensions: vec!["pdf".into(), "txt".into()],
            port: 0,
            rust_log: "info".to_string(),
        };
        let policy = config
            .upload_policy()
            .expect("test upload policy is valid");
        Self {
            store,
            files: FileStore::new(upload_dir),
            policy: Arc::new(policy),
        }
    }
}
