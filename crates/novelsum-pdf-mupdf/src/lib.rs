use std::path::Path;

use mupdf::{Document, Page, TextPageFlags};

use novelsum_core::{BackendError, Config, PdfBackend};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island. It isolates the mupdf dependency
/// (which is AGPL-3.0) so that the rest of the workspace does not
/// transitively depend on it.
///
/// Every page is read in full by default. Running headers and page-number
/// footers can be dropped by setting an exclusion ratio.
#[derive(Debug, Clone, Default)]
pub struct MupdfBackend {
    /// Fraction of page height from bottom to exclude as footer (0.0–1.0).
    footer_exclusion_ratio: Option<f32>,
    /// Fraction of page height from top to exclude as header (0.0–1.0).
    header_exclusion_ratio: Option<f32>,
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        let mut backend = Self::new();
        if let Some(r) = config.footer_exclusion {
            backend = backend.with_footer_exclusion(r);
        }
        if let Some(r) = config.header_exclusion {
            backend = backend.with_header_exclusion(r);
        }
        backend
    }

    /// Set the footer exclusion ratio. Pass `0.0` to disable.
    pub fn with_footer_exclusion(mut self, ratio: f32) -> Self {
        self.footer_exclusion_ratio = (ratio > 0.0).then_some(ratio.min(1.0));
        self
    }

    /// Set the header exclusion ratio. Pass `0.0` to disable.
    pub fn with_header_exclusion(mut self, ratio: f32) -> Self {
        self.header_exclusion_ratio = (ratio > 0.0).then_some(ratio.min(1.0));
        self
    }
}

impl MupdfBackend {
    /// Text of one page, one line per MuPDF text line, margins applied.
    fn page_text(&self, page: &Page) -> Result<String, mupdf::Error> {
        let bounds = page.bounds()?;
        let band = KeptBand::new(
            bounds.y0,
            bounds.y1,
            self.header_exclusion_ratio,
            self.footer_exclusion_ratio,
        );

        let text_page = page.to_text_page(TextPageFlags::empty())?;
        let mut text = String::new();
        for block in text_page.blocks().filter(|b| band.keeps(b.bounds().y0, b.bounds().y1)) {
            for line in block.lines() {
                text.extend(line.chars().map(|c| c.char().unwrap_or('\u{FFFD}')));
                text.push('\n');
            }
        }
        Ok(text)
    }
}

impl PdfBackend for MupdfBackend {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let pages = document
            .pages()
            .and_then(|pages| {
                pages
                    .map(|page| self.page_text(&page?))
                    .collect::<Result<Vec<_>, _>>()
            })
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

        tracing::debug!(path = %path.display(), pages = pages.len(), "mupdf extraction done");
        Ok(pages)
    }
}

/// Vertical span of a page whose text blocks are kept.
#[derive(Debug, Clone, Copy, PartialEq)]
struct KeptBand {
    top: Option<f32>,
    bottom: Option<f32>,
}

impl KeptBand {
    fn new(page_top: f32, page_bottom: f32, header: Option<f32>, footer: Option<f32>) -> Self {
        let height = page_bottom - page_top;
        Self {
            top: header.map(|r| page_top + height * r),
            bottom: footer.map(|r| page_bottom - height * r),
        }
    }

    /// Blocks are dropped only when they sit entirely inside a margin.
    fn keeps(&self, block_top: f32, block_bottom: f32) -> bool {
        !self.top.is_some_and(|t| block_bottom <= t) && !self.bottom.is_some_and(|b| block_top >= b)
    }
}
