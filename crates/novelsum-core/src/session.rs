//! Per-user session state.
//!
//! A session moves through four observable states:
//!
//! ```text
//! NoFile ──upload──▶ NoExtractableText
//!    │                    │ upload
//!    └──────upload──────▶ Ready ◀──set_params── Summarized
//!                           └──record_summaries──▶ ┘
//! ```
//!
//! Uploading is allowed from every state and always discards earlier
//! summaries. Parameters belong to the session and survive uploads, but can
//! only be changed while a readable document is loaded.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::{ExtractedText, SummaryOutputs, SummaryParams};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no document has been uploaded")]
    NoFile,
    #[error("the uploaded file does not contain extractable text")]
    NoExtractableText,
    #[error("the document or parameters changed while summaries were being generated")]
    Stale,
}

#[derive(Debug, Clone)]
pub enum SessionState {
    NoFile,
    NoExtractableText {
        filename: String,
        pages: usize,
    },
    Ready {
        document: Arc<ExtractedText>,
    },
    Summarized {
        document: Arc<ExtractedText>,
        outputs: SummaryOutputs,
    },
}

impl SessionState {
    /// Stable machine-readable name of the state.
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::NoFile => "no_file",
            SessionState::NoExtractableText { .. } => "no_extractable_text",
            SessionState::Ready { .. } => "text_extracted",
            SessionState::Summarized { .. } => "summaries_generated",
        }
    }

    /// The loaded document, if it has text.
    pub fn document(&self) -> Option<&Arc<ExtractedText>> {
        match self {
            SessionState::Ready { document } | SessionState::Summarized { document, .. } => {
                Some(document)
            }
            _ => None,
        }
    }

    pub fn outputs(&self) -> Option<&SummaryOutputs> {
        match self {
            SessionState::Summarized { outputs, .. } => Some(outputs),
            _ => None,
        }
    }
}

/// Everything the generate step needs, captured at the moment it starts.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    pub document: Arc<ExtractedText>,
    pub params: SummaryParams,
}

#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    params: SummaryParams,
    last_active: Instant,
}

impl Session {
    pub fn new(params: SummaryParams) -> Self {
        Self {
            state: SessionState::NoFile,
            params,
            last_active: Instant::now(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn params(&self) -> SummaryParams {
        self.params
    }

    /// Replace the document. Empty text lands in `NoExtractableText`.
    pub fn upload(&mut self, document: ExtractedText) -> &SessionState {
        self.touch();
        self.state = if document.is_empty() {
            SessionState::NoExtractableText {
                filename: document.filename,
                pages: document.pages,
            }
        } else {
            SessionState::Ready {
                document: Arc::new(document),
            }
        };
        &self.state
    }

    /// Drop the document and any summaries; parameters are kept.
    pub fn clear(&mut self) {
        self.touch();
        self.state = SessionState::NoFile;
    }

    /// Change summarization parameters. Invalidates existing summaries.
    pub fn set_params(&mut self, params: SummaryParams) -> Result<(), SessionError> {
        self.touch();
        let document = self.require_document()?.clone();
        if params != self.params {
            self.state = SessionState::Ready { document };
        }
        self.params = params;
        Ok(())
    }

    /// Capture the document and parameters for a generate request.
    pub fn begin_generation(&mut self) -> Result<GenerationTicket, SessionError> {
        self.touch();
        let document = self.require_document()?.clone();
        Ok(GenerationTicket {
            document,
            params: self.params,
        })
    }

    /// Store finished summaries, unless the session moved on meanwhile.
    pub fn record_summaries(
        &mut self,
        ticket: &GenerationTicket,
        outputs: SummaryOutputs,
    ) -> Result<(), SessionError> {
        self.touch();
        let document = self.require_document()?;
        if !Arc::ptr_eq(document, &ticket.document) || ticket.params != self.params {
            return Err(SessionError::Stale);
        }
        self.state = SessionState::Summarized {
            document: document.clone(),
            outputs,
        };
        Ok(())
    }

    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }

    fn require_document(&self) -> Result<&Arc<ExtractedText>, SessionError> {
        match &self.state {
            SessionState::NoFile => Err(SessionError::NoFile),
            SessionState::NoExtractableText { .. } => Err(SessionError::NoExtractableText),
            SessionState::Ready { document } | SessionState::Summarized { document, .. } => {
                Ok(document)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> ExtractedText {
        ExtractedText {
            filename: "novel.pdf".into(),
            pages: 2,
            text: text.into(),
        }
    }

    fn outputs() -> SummaryOutputs {
        SummaryOutputs {
            neural: "neural".into(),
            graph_rank: "graph".into(),
        }
    }

    #[test]
    fn test_starts_without_file() {
        let s = Session::new(SummaryParams::default());
        assert_eq!(s.state().name(), "no_file");
        assert!(s.state().document().is_none());
    }

    #[test]
    fn test_empty_upload_gates_controls() {
        let mut s = Session::new(SummaryParams::default());
        assert_eq!(s.upload(doc("  \n ")).name(), "no_extractable_text");
        assert_eq!(
            s.set_params(SummaryParams::new(100, 0.3).unwrap()),
            Err(SessionError::NoExtractableText)
        );
        assert_eq!(
            s.begin_generation().unwrap_err(),
            SessionError::NoExtractableText
        );
    }

    #[test]
    fn test_generate_without_file_refused() {
        let mut s = Session::new(SummaryParams::default());
        assert_eq!(s.begin_generation().unwrap_err(), SessionError::NoFile);
    }

    #[test]
    fn test_full_cycle() {
        let mut s = Session::new(SummaryParams::default());
        assert_eq!(s.upload(doc("Some text.")).name(), "text_extracted");

        let ticket = s.begin_generation().unwrap();
        assert_eq!(ticket.params, SummaryParams::default());
        s.record_summaries(&ticket, outputs()).unwrap();
        assert_eq!(s.state().name(), "summaries_generated");
        assert_eq!(s.state().outputs().unwrap().graph_rank, "graph");
    }

    #[test]
    fn test_clear_drops_document_keeps_params() {
        let params = SummaryParams::new(200, 0.3).unwrap();
        let mut s = Session::new(params);
        s.upload(doc("Some text."));
        let ticket = s.begin_generation().unwrap();
        s.record_summaries(&ticket, outputs()).unwrap();

        s.clear();
        assert_eq!(s.state().name(), "no_file");
        assert!(s.state().document().is_none());
        assert_eq!(s.params(), params);
        assert!(matches!(s.begin_generation(), Err(SessionError::NoFile)));
    }

    #[test]
    fn test_param_change_invalidates_outputs() {
        let mut s = Session::new(SummaryParams::default());
        s.upload(doc("Some text."));
        let ticket = s.begin_generation().unwrap();
        s.record_summaries(&ticket, outputs()).unwrap();

        s.set_params(SummaryParams::new(200, 0.25).unwrap()).unwrap();
        assert_eq!(s.state().name(), "text_extracted");
        assert_eq!(s.params().max_length, 200);
    }

    #[test]
    fn test_same_params_keep_outputs() {
        let mut s = Session::new(SummaryParams::default());
        s.upload(doc("Some text."));
        let ticket = s.begin_generation().unwrap();
        s.record_summaries(&ticket, outputs()).unwrap();

        s.set_params(SummaryParams::default()).unwrap();
        assert_eq!(s.state().name(), "summaries_generated");
    }

    #[test]
    fn test_new_upload_discards_outputs_keeps_params() {
        let mut s = Session::new(SummaryParams::default());
        s.upload(doc("Some text."));
        s.set_params(SummaryParams::new(60, 0.1).unwrap()).unwrap();
        let ticket = s.begin_generation().unwrap();
        s.record_summaries(&ticket, outputs()).unwrap();

        s.upload(doc("Another book."));
        assert_eq!(s.state().name(), "text_extracted");
        assert_eq!(s.params().max_length, 60);
    }

    #[test]
    fn test_stale_results_rejected() {
        let mut s = Session::new(SummaryParams::default());
        s.upload(doc("First book."));
        let ticket = s.begin_generation().unwrap();

        s.upload(doc("Second book."));
        assert_eq!(
            s.record_summaries(&ticket, outputs()),
            Err(SessionError::Stale)
        );
        assert_eq!(s.state().name(), "text_extracted");

        let ticket = s.begin_generation().unwrap();
        s.set_params(SummaryParams::new(90, 0.2).unwrap()).unwrap();
        assert_eq!(
            s.record_summaries(&ticket, outputs()),
            Err(SessionError::Stale)
        );
    }

    #[test]
    fn test_reupload_after_empty() {
        let mut s = Session::new(SummaryParams::default());
        s.upload(doc(""));
        assert_eq!(s.upload(doc("Readable now.")).name(), "text_extracted");
    }
}
