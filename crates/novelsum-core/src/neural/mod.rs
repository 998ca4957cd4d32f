//! Neural (abstractive) summarization through a pluggable inference backend.

pub mod hf;
pub mod mock;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

pub use hf::HfInferenceBackend;

/// Lower bound on generated summary length, in model tokens.
pub const DEFAULT_MIN_LENGTH: usize = 30;
/// Input prefix handed to the model, in characters.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 1024;

#[derive(Error, Debug)]
pub enum NeuralError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("inference endpoint returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("model {model} is still loading (estimated {estimated_secs:.0}s)")]
    ModelLoading { model: String, estimated_secs: f64 },
    #[error("inference endpoint returned no summary")]
    EmptyResponse,
    #[error("unexpected inference response: {0}")]
    Decode(String),
    #[error("{0}")]
    Other(String),
}

/// Generation settings sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationParams {
    pub max_length: usize,
    pub min_length: usize,
    pub do_sample: bool,
}

/// A sequence-to-sequence summarization model.
pub trait AbstractiveBackend: Send + Sync {
    /// Name shown in logs (e.g. the model id).
    fn name(&self) -> &str;

    /// Run one inference call and return the first generated summary.
    fn summarize<'a>(
        &'a self,
        text: &'a str,
        params: &'a GenerationParams,
    ) -> Pin<Box<dyn Future<Output = Result<String, NeuralError>> + Send + 'a>>;
}

/// Return the first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Adapter that applies the input truncation policy and fixed generation
/// settings before calling the backend.
#[derive(Clone)]
pub struct NeuralSummarizer {
    backend: Arc<dyn AbstractiveBackend>,
    max_input_chars: usize,
    min_length: usize,
}

impl std::fmt::Debug for NeuralSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeuralSummarizer")
            .field("backend", &self.backend.name())
            .field("max_input_chars", &self.max_input_chars)
            .field("min_length", &self.min_length)
            .finish()
    }
}

impl NeuralSummarizer {
    pub fn new(backend: Arc<dyn AbstractiveBackend>) -> Self {
        Self {
            backend,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            min_length: DEFAULT_MIN_LENGTH,
        }
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    /// The settings a request with `max_length` is sent with.
    pub fn generation_params(&self, max_length: usize) -> GenerationParams {
        GenerationParams {
            max_length,
            min_length: self.min_length.min(max_length),
            do_sample: false,
        }
    }

    /// Summarize the leading `max_input_chars` characters of `text`.
    ///
    /// Everything past the prefix is ignored.
    pub async fn summarize(&self, text: &str, max_length: usize) -> Result<String, NeuralError> {
        let input = truncate_chars(text, self.max_input_chars);
        let params = self.generation_params(max_length);
        let start = Instant::now();

        let result = self.backend.summarize(input, &params).await;

        match &result {
            Ok(summary) => tracing::debug!(
                backend = self.backend.name(),
                input_chars = input.chars().count(),
                max_length,
                summary_chars = summary.chars().count(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "neural summary complete"
            ),
            Err(e) => tracing::warn!(
                backend = self.backend.name(),
                error = %e,
                "neural summary failed"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MockBackend, MockResponse};
    use super::*;

    #[test]
    fn test_truncate_chars_ascii() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("ab", 10), "ab");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_truncate_chars_counts_chars_not_bytes() {
        let text = "éàü✓xyz";
        assert_eq!(truncate_chars(text, 4), "éàü✓");
    }

    #[tokio::test]
    async fn test_backend_never_sees_more_than_prefix() {
        let mock = Arc::new(MockBackend::new(MockResponse::Summary("short".into())));
        let summarizer = NeuralSummarizer::new(mock.clone()).with_max_input_chars(1024);

        let long = "word ".repeat(10_000);
        summarizer.summarize(&long, 130).await.unwrap();
        assert_eq!(mock.last_input().unwrap().chars().count(), 1024);

        summarizer.summarize("tiny input", 130).await.unwrap();
        assert_eq!(mock.last_input().unwrap(), "tiny input");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_generation_params_fixed() {
        let mock = Arc::new(MockBackend::new(MockResponse::Summary("ok".into())));
        let summarizer = NeuralSummarizer::new(mock.clone());
        summarizer.summarize("text", 130).await.unwrap();
        assert_eq!(
            mock.last_params(),
            Some(GenerationParams {
                max_length: 130,
                min_length: 30,
                do_sample: false,
            })
        );
    }

    #[test]
    fn test_min_length_never_exceeds_max() {
        let mock = Arc::new(MockBackend::new(MockResponse::Summary("ok".into())));
        let summarizer = NeuralSummarizer::new(mock).with_min_length(80);
        assert_eq!(summarizer.generation_params(50).min_length, 50);
        assert_eq!(summarizer.generation_params(300).min_length, 80);
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let mock = Arc::new(MockBackend::new(MockResponse::Error("boom".into())));
        let summarizer = NeuralSummarizer::new(mock);
        let err = summarizer.summarize("text", 130).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
