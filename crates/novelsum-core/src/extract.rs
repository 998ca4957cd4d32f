//! PDF text extraction front door.

use std::path::Path;
use std::time::Instant;

use crate::ExtractedText;
use crate::backend::{BackendError, PdfBackend};

/// Extract the text of the PDF at `path`.
///
/// Pages are concatenated in page order with no separator. A document with
/// no text layer yields an empty (or whitespace-only) text, not an error.
pub fn extract_text(
    path: &Path,
    filename: &str,
    backend: &dyn PdfBackend,
) -> Result<ExtractedText, BackendError> {
    let start = Instant::now();
    let pages = backend.extract_pages(path)?;
    let text = pages.concat();

    tracing::debug!(
        filename,
        pages = pages.len(),
        chars = text.chars().count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "extracted text"
    );

    Ok(ExtractedText {
        filename: filename.to_string(),
        pages: pages.len(),
        text,
    })
}

/// Extract text from an in-memory PDF.
///
/// The bytes are written to a temporary directory that is removed when this
/// function returns.
pub fn extract_text_from_bytes(
    filename: &str,
    data: &[u8],
    backend: &dyn PdfBackend,
) -> Result<ExtractedText, BackendError> {
    let temp_dir = tempfile::tempdir()?;
    let pdf_path = temp_dir.path().join("upload.pdf");
    std::fs::write(&pdf_path, data)?;
    extract_text(&pdf_path, filename, backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns canned pages and remembers what it was asked to read.
    struct FakeBackend {
        pages: Vec<String>,
        seen: Mutex<Option<Vec<u8>>>,
    }

    impl FakeBackend {
        fn new(pages: &[&str]) -> Self {
            Self {
                pages: pages.iter().map(|p| p.to_string()).collect(),
                seen: Mutex::new(None),
            }
        }
    }

    impl PdfBackend for FakeBackend {
        fn extract_pages(&self, path: &Path) -> Result<Vec<String>, BackendError> {
            *self.seen.lock().unwrap() = Some(std::fs::read(path)?);
            Ok(self.pages.clone())
        }
    }

    struct BrokenBackend;

    impl PdfBackend for BrokenBackend {
        fn extract_pages(&self, _path: &Path) -> Result<Vec<String>, BackendError> {
            Err(BackendError::OpenError("no objects found".into()))
        }
    }

    #[test]
    fn test_pages_concatenated_in_order() {
        let backend = FakeBackend::new(&["Chapter 1\n", "It began.\n", "The end.\n"]);
        let doc = extract_text_from_bytes("novel.pdf", b"%PDF-1.4", &backend).unwrap();
        assert_eq!(doc.text, "Chapter 1\nIt began.\nThe end.\n");
        assert_eq!(doc.pages, 3);
        assert_eq!(doc.filename, "novel.pdf");
        assert!(!doc.is_empty());
    }

    #[test]
    fn test_bytes_reach_backend() {
        let backend = FakeBackend::new(&["x"]);
        extract_text_from_bytes("a.pdf", b"%PDF-1.7 payload", &backend).unwrap();
        assert_eq!(
            backend.seen.lock().unwrap().as_deref(),
            Some(&b"%PDF-1.7 payload"[..])
        );
    }

    #[test]
    fn test_whitespace_only_text_is_empty_not_error() {
        let backend = FakeBackend::new(&["", "  \n", "\n"]);
        let doc = extract_text_from_bytes("scan.pdf", b"%PDF-1.4", &backend).unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.pages, 3);
    }

    #[test]
    fn test_backend_error_propagates() {
        let err = extract_text_from_bytes("bad.pdf", b"garbage", &BrokenBackend).unwrap_err();
        assert!(matches!(err, BackendError::OpenError(_)));
    }
}
