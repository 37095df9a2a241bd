//! Input resolution: read a user-supplied local PDF path into memory.
//!
//! Uploaded bytes only live as long as extraction needs them; nothing is
//! copied to disk.

use crate::error::ExtractionError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A document read from disk, ready for extraction.
#[derive(Debug)]
pub struct LocalDocument {
    /// File name used as the document name.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Read a local file, mapping I/O failures to [`ExtractionError`].
pub async fn read_local(path: impl AsRef<Path>) -> Result<LocalDocument, ExtractionError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| map_io_error(path, &e))?;

    debug!("Read {} bytes from {}", bytes.len(), path.display());

    Ok(LocalDocument {
        name: document_name(path),
        bytes,
    })
}

/// Name a document after its file name, falling back to the full path.
pub fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn map_io_error(path: &Path, err: &std::io::Error) -> ExtractionError {
    let path: PathBuf = path.to_path_buf();
    match err.kind() {
        std::io::ErrorKind::NotFound => ExtractionError::FileNotFound { path },
        std::io::ErrorKind::PermissionDenied => ExtractionError::PermissionDenied { path },
        _ => ExtractionError::Io {
            path,
            detail: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_name_uses_file_name() {
        assert_eq!(document_name(Path::new("/tmp/papers/attention.pdf")), "attention.pdf");
        assert_eq!(document_name(Path::new("report.pdf")), "report.pdf");
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = read_local("/definitely/not/here.pdf").await.unwrap_err();
        assert!(matches!(err, ExtractionError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn directory_is_an_io_error_not_a_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_local(dir.path()).await.unwrap_err();
        match err {
            ExtractionError::Io { path, detail } => {
                assert_eq!(path, dir.path());
                assert!(!detail.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn reads_bytes_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"%PDF-1.5 stub").unwrap();

        let doc = read_local(&path).await.unwrap();
        assert_eq!(doc.name, "notes.pdf");
        assert_eq!(doc.bytes, b"%PDF-1.5 stub");
    }
}
