use std::sync::Arc;
use std::time::Instant;

use novelsum_textrank::{StopwordFilter, SummaryLength, TextRank, TextRankError};

use crate::{Config, CoreError, ExtractedText};

/// Graph-rank (TextRank) adapter. Takes the full text, no truncation.
#[derive(Debug, Clone, Default)]
pub struct GraphRankSummarizer {
    textrank: Arc<TextRank>,
}

impl GraphRankSummarizer {
    pub fn new(textrank: TextRank) -> Self {
        Self {
            textrank: Arc::new(textrank),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut stopwords = StopwordFilter::new(&config.language);
        stopwords.add_stopwords(&config.additional_stopwords);
        Self::new(
            TextRank::new()
                .with_stopwords(stopwords)
                .with_unwrap_lines(config.unwrap_lines),
        )
    }

    /// Keep `ratio` of the sentences, joined by newlines in document order.
    pub fn summarize(&self, text: &str, ratio: f64) -> Result<String, TextRankError> {
        self.summarize_with(text, SummaryLength::Ratio(ratio))
    }

    pub fn summarize_with(&self, text: &str, length: SummaryLength) -> Result<String, TextRankError> {
        let start = Instant::now();
        let summary = self.textrank.summarize(text, length)?;
        tracing::debug!(
            ?length,
            input_chars = text.chars().count(),
            summary_lines = summary.lines().count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "graph-rank summary complete"
        );
        Ok(summary)
    }

    /// Run [`summarize`](Self::summarize) on the blocking thread pool.
    pub async fn summarize_document(
        &self,
        document: Arc<ExtractedText>,
        ratio: f64,
    ) -> Result<String, CoreError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.summarize(&document.text, ratio))
            .await
            .map_err(|e| CoreError::Join(e.to_string()))?
            .map_err(CoreError::from)
    }
}
