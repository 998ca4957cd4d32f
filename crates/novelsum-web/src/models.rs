use axum::response::sse::Event;
use novelsum_core::{Session, SessionState, SummaryOutputs, SummaryParams};
use serde::{Deserialize, Serialize};

/// Shown when an upload has no text layer.
pub const NO_TEXT_MESSAGE: &str = "The uploaded file does not contain extractable text!";
pub const NEURAL_PROGRESS: &str = "Generating neural summary...";
pub const GRAPH_PROGRESS: &str = "Generating TextRank summary...";

// ── Request bodies ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ParamsRequest {
    pub max_length: usize,
    pub ratio: f64,
}

// ── Responses ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedSession {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentJson {
    pub filename: String,
    pub pages: usize,
    pub chars: usize,
}

/// Snapshot of one session, returned by every session route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionJson {
    pub session_id: String,
    pub state: String,
    pub params: SummaryParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<SummaryOutputs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SessionJson {
    pub fn from_session(id: &str, session: &Session) -> Self {
        let state = session.state();
        let (document, message) = match state {
            SessionState::NoFile => (None, None),
            SessionState::NoExtractableText { filename, pages } => (
                Some(DocumentJson {
                    filename: filename.clone(),
                    pages: *pages,
                    chars: 0,
                }),
                Some(NO_TEXT_MESSAGE.to_string()),
            ),
            SessionState::Ready { document } | SessionState::Summarized { document, .. } => (
                Some(DocumentJson {
                    filename: document.filename.clone(),
                    pages: document.pages,
                    chars: document.char_count(),
                }),
                None,
            ),
        };
        Self {
            session_id: id.to_string(),
            state: state.name().to_string(),
            params: session.params(),
            document,
            outputs: state.outputs().cloned(),
            message,
        }
    }
}

// ── SSE events ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ProgressEventJson {
    pub stage: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryEventJson {
    pub summary: String,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompleteEvent {
    pub neural: String,
    pub graph_rank: String,
    /// False when the session changed while generating and the outputs
    /// were not kept.
    pub stored: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    pub message: String,
}

/// Create an SSE event with the given type and JSON-serialized data.
pub fn sse_event<T: Serialize>(event_type: &str, data: &T) -> Event {
    Event::default()
        .event(event_type)
        .data(serde_json::to_string(data).unwrap_or_default())
}
