//! Graph-based extractive summarization.
//!
//! The document is split into sentences, each sentence becomes a node in a
//! similarity graph, PageRank scores the nodes, and the top-scoring
//! sentences are returned in their original order.
//!
//! ```
//! use novelsum_textrank::{SummaryLength, TextRank};
//!
//! let text = "The wolf crossed the river. The wolf slept in the forest. \
//!             Rain fell on the river and the forest.";
//! let summary = TextRank::new()
//!     .summarize(text, SummaryLength::Ratio(0.4))
//!     .unwrap();
//! assert_eq!(summary.lines().count(), 1);
//! ```

use thiserror::Error;

pub mod graph;
pub mod pagerank;
pub mod sentence;
pub mod stopwords;
pub mod summarizer;

pub use pagerank::{PageRank, PageRankResult};
pub use sentence::{Sentence, split_sentences};
pub use stopwords::{Language, StopwordFilter};
pub use summarizer::{ScoredSentence, SummaryLength, TextRank};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TextRankError {
    #[error("ratio must be in (0, 1], got {0}")]
    InvalidRatio(f64),
}

/// Summarize `text` keeping `ratio` of its sentences, with default settings.
pub fn summarize(text: &str, ratio: f64) -> Result<String, TextRankError> {
    TextRank::new().summarize(text, SummaryLength::Ratio(ratio))
}
