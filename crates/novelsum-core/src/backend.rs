use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF text extraction backends.
///
/// Implementors return the text of every page, in page order, exactly as the
/// underlying library produces it. Joining and the empty-text check live in
/// [`crate::extract`].
pub trait PdfBackend: Send + Sync {
    /// Extract the text of each page of a PDF file.
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, BackendError>;
}
