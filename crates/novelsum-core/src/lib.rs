use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub mod backend;
pub mod config_file;
pub mod extract;
pub mod graph_rank;
pub mod neural;
pub mod session;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend};
pub use config_file::ConfigFile;
pub use extract::{extract_text, extract_text_from_bytes};
pub use graph_rank::GraphRankSummarizer;
pub use neural::{AbstractiveBackend, GenerationParams, HfInferenceBackend, NeuralError, NeuralSummarizer};
pub use novelsum_textrank::{SummaryLength, TextRankError};
pub use session::{GenerationTicket, Session, SessionError, SessionState};

/// Text pulled out of an uploaded PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub filename: String,
    pub pages: usize,
    /// All pages concatenated in page order.
    pub text: String,
}

impl ExtractedText {
    /// True when the document has no text beyond whitespace.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// User-controlled summarization parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryParams {
    /// Upper bound on the neural summary length, in model tokens.
    pub max_length: usize,
    /// Fraction of sentences the graph-rank summary keeps.
    pub ratio: f64,
}

impl SummaryParams {
    pub const MIN_MAX_LENGTH: usize = 50;
    pub const MAX_MAX_LENGTH: usize = 300;
    pub const DEFAULT_MAX_LENGTH: usize = 130;
    pub const MIN_RATIO: f64 = 0.1;
    pub const MAX_RATIO: f64 = 0.5;
    pub const RATIO_STEP: f64 = 0.05;
    pub const DEFAULT_RATIO: f64 = 0.2;

    /// Validated constructor. Values outside the slider ranges are rejected.
    pub fn new(max_length: usize, ratio: f64) -> Result<Self, CoreError> {
        const EPS: f64 = 1e-9;
        if !(Self::MIN_MAX_LENGTH..=Self::MAX_MAX_LENGTH).contains(&max_length) {
            return Err(CoreError::InvalidParams(format!(
                "max_length must be between {} and {}, got {max_length}",
                Self::MIN_MAX_LENGTH,
                Self::MAX_MAX_LENGTH
            )));
        }
        if !ratio.is_finite() || ratio < Self::MIN_RATIO - EPS || ratio > Self::MAX_RATIO + EPS {
            return Err(CoreError::InvalidParams(format!(
                "ratio must be between {} and {}, got {ratio}",
                Self::MIN_RATIO,
                Self::MAX_RATIO
            )));
        }
        Ok(Self { max_length, ratio })
    }
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            max_length: Self::DEFAULT_MAX_LENGTH,
            ratio: Self::DEFAULT_RATIO,
        }
    }
}

/// The two summaries produced by one generate request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryOutputs {
    pub neural: String,
    pub graph_rank: String,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("PDF error: {0}")]
    Backend(#[from] BackendError),
    #[error("neural summarizer error: {0}")]
    Neural(#[from] NeuralError),
    #[error("graph-rank summarizer error: {0}")]
    GraphRank(#[from] TextRankError),
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    #[error("background task failed: {0}")]
    Join(String),
    #[error("cancelled")]
    Cancelled,
}

/// Progress events emitted while generating summaries.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    NeuralStarted {
        input_chars: usize,
    },
    NeuralComplete {
        summary: String,
        elapsed: Duration,
    },
    GraphRankStarted {
        input_chars: usize,
    },
    GraphRankComplete {
        summary: String,
        elapsed: Duration,
    },
}

/// Resolved runtime configuration.
#[derive(Clone)]
pub struct Config {
    /// Base URL of the summarization inference endpoint.
    pub inference_url: String,
    pub model: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    /// Ask the endpoint to block while a cold model loads.
    pub wait_for_model: bool,
    /// Characters of the document handed to the neural model.
    pub max_input_chars: usize,
    pub min_length: usize,
    pub default_params: SummaryParams,
    /// Stopword list language for graph-rank tokenization.
    pub language: String,
    pub additional_stopwords: Vec<String>,
    /// Join hard-wrapped lines before sentence splitting.
    pub unwrap_lines: bool,
    pub footer_exclusion: Option<f32>,
    pub header_exclusion: Option<f32>,
    pub bind: String,
    pub max_upload_mb: usize,
    pub session_ttl_secs: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("inference_url", &self.inference_url)
            .field("model", &self.model)
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("wait_for_model", &self.wait_for_model)
            .field("max_input_chars", &self.max_input_chars)
            .field("min_length", &self.min_length)
            .field("default_params", &self.default_params)
            .field("language", &self.language)
            .field("additional_stopwords", &self.additional_stopwords)
            .field("unwrap_lines", &self.unwrap_lines)
            .field("footer_exclusion", &self.footer_exclusion)
            .field("header_exclusion", &self.header_exclusion)
            .field("bind", &self.bind)
            .field("max_upload_mb", &self.max_upload_mb)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inference_url: neural::hf::DEFAULT_INFERENCE_URL.to_string(),
            model: neural::hf::DEFAULT_MODEL.to_string(),
            api_token: None,
            request_timeout_secs: neural::hf::DEFAULT_TIMEOUT_SECS,
            wait_for_model: true,
            max_input_chars: neural::DEFAULT_MAX_INPUT_CHARS,
            min_length: neural::DEFAULT_MIN_LENGTH,
            default_params: SummaryParams::default(),
            language: "en".to_string(),
            additional_stopwords: vec![],
            unwrap_lines: false,
            footer_exclusion: None,
            header_exclusion: None,
            bind: "0.0.0.0:5001".to_string(),
            max_upload_mb: 200,
            session_ttl_secs: 3600,
        }
    }
}

impl Config {
    /// Apply environment overrides, reading variables through `lookup`.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("HF_API_TOKEN").filter(|t| !t.is_empty()) {
            self.api_token = Some(token);
        }
        if let Some(url) = lookup("NOVELSUM_INFERENCE_URL") {
            self.inference_url = url;
        }
        if let Some(model) = lookup("NOVELSUM_MODEL") {
            self.model = model;
        }
        if let Some(bind) = lookup("NOVELSUM_BIND") {
            self.bind = bind;
        }
        if let Some(raw) = lookup("NOVELSUM_MAX_INPUT_CHARS") {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => self.max_input_chars = n,
                _ => tracing::warn!(value = %raw, "ignoring invalid NOVELSUM_MAX_INPUT_CHARS"),
            }
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

/// Produce both summaries of `document`, neural first.
///
/// Progress is reported through the callback. If `cancel` fires after the
/// neural summary, the graph-rank step is skipped.
pub async fn generate_summaries(
    document: Arc<ExtractedText>,
    params: SummaryParams,
    neural: &NeuralSummarizer,
    graph_rank: &GraphRankSummarizer,
    progress: impl Fn(ProgressEvent),
    cancel: CancellationToken,
) -> Result<SummaryOutputs, CoreError> {
    progress(ProgressEvent::NeuralStarted {
        input_chars: document.char_count().min(neural.max_input_chars()),
    });
    let start = Instant::now();
    let neural_summary = tokio::select! {
        result = neural.summarize(&document.text, params.max_length) => result?,
        _ = cancel.cancelled() => return Err(CoreError::Cancelled),
    };
    progress(ProgressEvent::NeuralComplete {
        summary: neural_summary.clone(),
        elapsed: start.elapsed(),
    });

    if cancel.is_cancelled() {
        return Err(CoreError::Cancelled);
    }

    progress(ProgressEvent::GraphRankStarted {
        input_chars: document.char_count(),
    });
    let start = Instant::now();
    let graph_summary = graph_rank
        .summarize_document(document.clone(), params.ratio)
        .await?;
    progress(ProgressEvent::GraphRankComplete {
        summary: graph_summary.clone(),
        elapsed: start.elapsed(),
    });

    tracing::info!(
        filename = %document.filename,
        max_length = params.max_length,
        ratio = params.ratio,
        "summaries generated"
    );

    Ok(SummaryOutputs {
        neural: neural_summary,
        graph_rank: graph_summary,
    })
}
