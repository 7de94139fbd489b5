//! File intake: turn a user-selected path into a [`DocumentHandle`].
//!
//! Selection is filtered by extension only, the way a file-picker `accept`
//! filter works. Whether the bytes decode is the renderer's business and
//! surfaces later as a load failure.

use crate::error::ViewerError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::debug;

/// A reference to the user-selected document.
///
/// Cheap to clone. A handle built from in-memory bytes keeps its backing
/// temp file alive for as long as any clone exists.
#[derive(Debug, Clone)]
pub struct DocumentHandle {
    path: PathBuf,
    name: String,
    size_bytes: u64,
    _backing: Option<Arc<NamedTempFile>>,
}

impl DocumentHandle {
    /// Build a handle without touching the file system.
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        let path = path.into();
        let name = display_name(&path);
        Self {
            path,
            name,
            size_bytes,
            _backing: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name shown to the user.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

impl PartialEq for DocumentHandle {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.size_bytes == other.size_bytes
    }
}

/// Extension filter applied at selection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    extensions: Vec<String>,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::new(["pdf"])
    }
}

impl FileFilter {
    /// Accept the given extensions (case-insensitive, leading dot optional).
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_ascii_lowercase();
                self.extensions.iter().any(|x| *x == e)
            })
            .unwrap_or(false)
    }

    /// Comma-separated `.ext` list, as shown in error messages.
    pub fn describe(&self) -> String {
        self.extensions
            .iter()
            .map(|e| format!(".{e}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

/// Open a local file as a document handle.
///
/// Validates existence, read permission, and the extension filter.
pub fn open_document(path: impl AsRef<Path>, filter: &FileFilter) -> Result<DocumentHandle, ViewerError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(ViewerError::FileNotFound { path });
    }

    if !filter.accepts(&path) {
        return Err(ViewerError::UnsupportedFileType {
            accepted: filter.describe(),
            path,
        });
    }

    let size_bytes = match std::fs::File::open(&path) {
        Ok(f) => f.metadata().map(|m| m.len()).unwrap_or(0),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ViewerError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ViewerError::FileNotFound { path });
        }
    };

    debug!("Selected document: {} ({} bytes)", path.display(), size_bytes);
    Ok(DocumentHandle::new(path, size_bytes))
}

/// Wrap in-memory PDF bytes in a handle backed by a managed temp file.
///
/// The temp file is deleted once the last clone of the handle is dropped.
pub fn document_from_bytes(bytes: &[u8]) -> Result<DocumentHandle, ViewerError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("pdfmap-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| ViewerError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| ViewerError::Internal(format!("tempfile write: {e}")))?;

    let mut handle = DocumentHandle::new(tmp.path().to_path_buf(), bytes.len() as u64);
    handle._backing = Some(Arc::new(tmp));
    Ok(handle)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_is_case_insensitive() {
        let f = FileFilter::default();
        assert!(f.accepts(Path::new("map.pdf")));
        assert!(f.accepts(Path::new("MAP.PDF")));
        assert!(!f.accepts(Path::new("map.png")));
        assert!(!f.accepts(Path::new("map")));
    }

    #[test]
    fn filter_normalises_leading_dots() {
        let f = FileFilter::new([".PDF", "djvu", ""]);
        assert!(f.accepts(Path::new("a.djvu")));
        assert_eq!(f.describe(), ".pdf, .djvu");
    }

    #[test]
    fn open_missing_file() {
        let err = open_document("/definitely/not/here.pdf", &FileFilter::default()).unwrap_err();
        assert!(matches!(err, ViewerError::FileNotFound { .. }));
    }

    #[test]
    fn open_rejects_wrong_extension() {
        let tmp = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let err = open_document(tmp.path(), &FileFilter::default()).unwrap_err();
        assert!(matches!(err, ViewerError::UnsupportedFileType { .. }));
    }

    #[test]
    fn open_accepts_without_content_check() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"not really a pdf").unwrap();
        let handle = open_document(tmp.path(), &FileFilter::default()).unwrap();
        assert_eq!(handle.size_bytes(), 16);
        assert!(handle.name().ends_with(".pdf"));
    }

    #[test]
    fn bytes_handle_keeps_file_alive_while_cloned() {
        let handle = document_from_bytes(b"%PDF-1.7").unwrap();
        let path = handle.path().to_path_buf();
        let clone = handle.clone();
        drop(handle);
        assert!(path.exists());
        drop(clone);
        assert!(!path.exists());
    }
}
