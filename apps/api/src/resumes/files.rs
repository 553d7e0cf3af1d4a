use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::info;
use uuid::Uuid;

/// Where an accepted upload was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub stored_filename: String,
    pub path: PathBuf,
}

/// Local content store rooted at the configured upload directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` under a fresh unique name, creating the directory on
    /// first use.
    pub async fn store(&self, original_filename: &str, bytes: &[u8]) -> io::Result<StoredFile> {
        tokio::fs::create_dir_all(&self.root).await?;

        let stored_filename = unique_filename(original_filename);
        let path = self.root.join(&stored_filename);
        tokio::fs::write(&path, bytes).await?;

        info!("File stored successfully: {stored_filename}");
        Ok(StoredFile {
            stored_filename,
            path,
        })
    }

    /// Removes a previously stored file. Returns `false` if it was already gone.
    pub async fn delete(&self, stored_filename: &str) -> io::Result<bool> {
        if stored_filename.is_empty()
            || stored_filename.contains(['/', '\\'])
            || stored_filename == ".."
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{stored_filename}' is not a plain file name"),
            ));
        }

        match tokio::fs::remove_file(self.root.join(stored_filename)).await {
            Ok(()) => {
                info!("File deleted successfully: {stored_filename}");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// `<base>_<yyyyMMdd_HHmmss>_<8 hex>.<ext>` with the base reduced to
/// `[A-Za-z0-9._-]`.
pub fn unique_filename(original_filename: &str) -> String {
    build_filename(original_filename, Local::now().naive_local(), Uuid::new_v4())
}

fn build_filename(original_filename: &str, at: NaiveDateTime, id: Uuid) -> String {
    let name = original_filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_filename);
    let (base, extension) = match name.rfind('.') {
        Some(idx) => (&name[..idx], Some(&name[idx + 1..])),
        None => (name, None),
    };

    let base: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let timestamp = at.format("%Y%m%d_%H%M%S");
    let short_id = &id.simple().to_string()[..8];

    match extension {
        Some(ext) if !ext.is_empty() => format!("{base}_{timestamp}_{short_id}.{ext}"),
        _ => format!("{base}_{timestamp}_{short_id}"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap()
    }

    fn id() -> Uuid {
        Uuid::parse_str("1b4e28ba-2fa1-11d2-883f-0016d3cca427").unwrap()
    }

    #[test]
    fn test_build_filename_shape() {
        assert_eq!(
            build_filename("Jane Roe (CV).pdf", at(), id()),
            "Jane_Roe__CV__20240309_140507_1b4e28ba.pdf"
        );
    }

    #[test]
    fn test_build_filename_keeps_only_last_segment() {
        assert_eq!(
            build_filename("docs/2024/cv.v2.docx", at(), id()),
            "cv.v2_20240309_140507_1b4e28ba.docx"
        );
    }

    #[test]
    fn test_build_filename_without_extension() {
        assert_eq!(build_filename("resume", at(), id()), "resume_20240309_140507_1b4e28ba");
    }

    #[test]
    fn test_unique_filenames_differ() {
        assert_ne!(unique_filename("cv.txt"), unique_filename("cv.txt"));
    }

    #[tokio::test]
    async fn test_store_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("uploads"));

        let stored = store.store("cv.txt", b"hello").await.unwrap();
        assert!(stored.stored_filename.ends_with(".txt"));
        assert_eq!(tokio::fs::read(&stored.path).await.unwrap(), b"hello");

        assert!(store.delete(&stored.stored_filename).await.unwrap());
        assert!(!store.delete(&stored.stored_filename).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_refuses_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        for name in ["../escape.txt", "a/b.txt", "..", ""] {
            let err = store.delete(name).await.unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        }
    }
}
