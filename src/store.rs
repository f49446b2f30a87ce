//! Persisting rendered documents under the uploads directory.
//!
//! Files are written to a temporary file in the target directory and renamed
//! into place only once every byte is on disk, so a failed write never leaves
//! a truncated PDF behind under the final name.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::config::OutputConfig;
use crate::error::{PagewrightError, Result};
use crate::layout::RenderedDocument;

/// What the caller files away after a successful save.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub filename: String,
    pub path: PathBuf,
    pub url: String,
    pub document_id: String,
    pub page_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub deleted: usize,
    pub failed: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct PdfStore {
    directory: PathBuf,
    url_prefix: String,
}

impl PdfStore {
    pub fn new(directory: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(&config.directory, config.url_prefix.clone())
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Write `document` as `<prefix>-<unix-millis>-<short-id>.pdf`.
    pub fn save(&self, document: &RenderedDocument, prefix: &str) -> Result<StoredDocument> {
        std::fs::create_dir_all(&self.directory)
            .map_err(|e| PagewrightError::io(&self.directory, e))?;

        let id = document.document_id.simple().to_string();
        let filename = format!(
            "{}-{}-{}.pdf",
            sanitize_prefix(prefix),
            Utc::now().timestamp_millis(),
            &id[..8]
        );
        let path = self.directory.join(&filename);

        let mut file =
            NamedTempFile::new_in(&self.directory).map_err(|e| PagewrightError::io(&self.directory, e))?;
        file.write_all(&document.bytes)
            .and_then(|_| file.flush())
            .map_err(|e| PagewrightError::io(file.path(), e))?;
        file.persist(&path)
            .map_err(|e| PagewrightError::io(&path, e.error))?;

        info!(
            "saved {} ({} pages, {} bytes)",
            path.display(),
            document.page_count,
            document.bytes.len()
        );
        Ok(StoredDocument {
            url: format!("{}/{}", self.url_prefix, filename),
            filename,
            path,
            document_id: document.document_id.to_string(),
            page_count: document.page_count,
        })
    }

    /// Delete stored documents by URL or bare filename. Only the last path
    /// segment is used, so nothing outside the store directory is touched.
    pub fn delete(&self, urls: &[String]) -> DeleteSummary {
        let mut summary = DeleteSummary {
            total: urls.len(),
            ..DeleteSummary::default()
        };
        for url in urls {
            if self.delete_one(url) {
                summary.deleted += 1;
            } else {
                summary.failed += 1;
            }
        }
        info!(
            "deleted {} of {} documents ({} failed)",
            summary.deleted, summary.total, summary.failed
        );
        summary
    }

    fn delete_one(&self, url: &str) -> bool {
        let filename = url.rsplit('/').next().unwrap_or_default();
        if filename.is_empty() || filename == "." || filename == ".." || filename.contains('\\') {
            warn!("refusing to delete {:?}", url);
            return false;
        }
        let path = self.directory.join(filename);
        if !path.is_file() {
            return false;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!("deleted {}", path.display());
                true
            }
            Err(e) => {
                warn!("could not delete {}: {}", path.display(), e);
                false
            }
        }
    }
}

fn sanitize_prefix(prefix: &str) -> String {
    let cleaned: String = prefix
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('-');
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn rendered() -> RenderedDocument {
        RenderedDocument {
            bytes: b"%PDF-1.7\n%%EOF\n".to_vec(),
            page_count: 2,
            document_id: Uuid::new_v4(),
            title: "Document Information".into(),
            generated_at: Utc::now(),
            placements: Vec::new(),
        }
    }

    #[test]
    fn save_names_and_writes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = PdfStore::new(dir.path().join("pdfs"), "/uploads/pdfs/");
        let doc = rendered();
        let stored = store.save(&doc, "project-42").unwrap();

        assert!(stored.filename.starts_with("project-42-"));
        assert!(stored.filename.ends_with(".pdf"));
        assert!(stored.filename.contains(&doc.document_id.simple().to_string()[..8]));
        assert_eq!(stored.url, format!("/uploads/pdfs/{}", stored.filename));
        assert_eq!(stored.page_count, 2);
        assert_eq!(std::fs::read(&stored.path).unwrap(), doc.bytes);
        // Only the final file is left in the directory.
        assert_eq!(std::fs::read_dir(store.directory()).unwrap().count(), 1);
    }

    #[test]
    fn odd_prefixes_are_cleaned() {
        assert_eq!(sanitize_prefix("../etc/passwd"), "etc-passwd");
        assert_eq!(sanitize_prefix("  "), "document");
        assert_eq!(sanitize_prefix("ai_report"), "ai_report");
    }

    #[test]
    fn delete_counts_hits_and_misses() {
        let dir = tempfile::tempdir().unwrap();
        let store = PdfStore::new(dir.path(), "/uploads/pdfs");
        let a = store.save(&rendered(), "a").unwrap();
        let b = store.save(&rendered(), "b").unwrap();

        let summary = store.delete(&[a.url.clone(), b.filename.clone(), "/uploads/pdfs/missing.pdf".into()]);
        assert_eq!(
            summary,
            DeleteSummary {
                deleted: 2,
                failed: 1,
                total: 3
            }
        );
        assert!(!a.path.exists());
        assert!(!b.path.exists());
    }

    #[test]
    fn delete_stays_inside_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("keep.pdf");
        std::fs::write(&outside, b"x").unwrap();
        let store = PdfStore::new(dir.path().join("pdfs"), "/uploads/pdfs");
        let summary = store.delete(&["..".into(), "".into(), "..\\keep.pdf".into()]);
        assert_eq!(summary.deleted, 0);
        assert_eq!(summary.failed, 3);
        assert!(outside.exists());
    }

    #[test]
    fn unwritable_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a dir").unwrap();
        let store = PdfStore::new(blocker.join("pdfs"), "/u");
        assert!(matches!(
            store.save(&rendered(), "x"),
            Err(PagewrightError::Io { .. })
        ));
    }
}
