use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::upload::policy::{
    UploadPolicy, DEFAULT_ALLOWED_MIME_TYPES, DEFAULT_MAX_UPLOAD_BYTES,
    DEFAULT_SUPPORTED_EXTENSIONS,
};

/// Application configuration loaded from environment variables.
/// Startup aborts if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub allowed_mime_types: Vec<String>,
    pub supported_extensions: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_source(|key| std::env::var(key).ok())
    }

    fn from_source(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            upload_dir: lookup("FILE_UPLOAD_DIR")
                .unwrap_or_else(|| "./uploads".to_string())
                .into(),
            max_upload_bytes: match lookup("FILE_UPLOAD_MAX_SIZE") {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .context("FILE_UPLOAD_MAX_SIZE must be a number of bytes")?,
                None => DEFAULT_MAX_UPLOAD_BYTES,
            },
            allowed_mime_types: lookup("FILE_UPLOAD_ALLOWED_TYPES")
                .map(|raw| parse_list(&raw))
                .unwrap_or_else(|| to_strings(DEFAULT_ALLOWED_MIME_TYPES)),
            supported_extensions: lookup("FILE_UPLOAD_SUPPORTED_EXTENSIONS")
                .map(|raw| parse_list(&raw.to_lowercase()))
                .unwrap_or_else(|| to_strings(DEFAULT_SUPPORTED_EXTENSIONS)),
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn upload_policy(&self) -> Result<UploadPolicy> {
        UploadPolicy::new(
            self.max_upload_bytes,
            self.allowed_mime_types.iter().cloned(),
            self.supported_extensions.iter().cloned(),
        )
        .context("Invalid file upload configuration")
    }
}

/// Comma-separated list; items trimmed, blanks dropped.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
