//! Sentence ranking and selection.

use std::cmp::Ordering;

use crate::TextRankError;
use crate::graph::SentenceGraph;
use crate::pagerank::PageRank;
use crate::sentence::{self, Sentence};
use crate::stopwords::StopwordFilter;

/// How much of the document to keep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SummaryLength {
    /// Fraction of the sentence count, in `(0, 1]`.
    Ratio(f64),
    /// Approximate word budget; sentences are added while they bring the
    /// total closer to the target.
    Words(usize),
}

/// A sentence with its PageRank score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSentence {
    pub index: usize,
    pub text: String,
    pub score: f64,
}

/// TextRank extractive summarizer.
#[derive(Debug, Clone)]
pub struct TextRank {
    stopwords: StopwordFilter,
    pagerank: PageRank,
    unwrap_lines: bool,
}

impl Default for TextRank {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRank {
    /// English stopwords, default PageRank, line breaks honored.
    pub fn new() -> Self {
        Self {
            stopwords: StopwordFilter::default(),
            pagerank: PageRank::default(),
            unwrap_lines: false,
        }
    }

    pub fn with_stopwords(mut self, stopwords: StopwordFilter) -> Self {
        self.stopwords = stopwords;
        self
    }

    pub fn with_additional_stopwords<S: AsRef<str>>(mut self, words: &[S]) -> Self {
        self.stopwords.add_stopwords(words);
        self
    }

    pub fn with_pagerank(mut self, pagerank: PageRank) -> Self {
        self.pagerank = pagerank;
        self
    }

    /// Reflow hard-wrapped lines before splitting into sentences.
    pub fn with_unwrap_lines(mut self, unwrap_lines: bool) -> Self {
        self.unwrap_lines = unwrap_lines;
        self
    }

    /// Score every sentence of `text`, in document order.
    ///
    /// Sentences that share no content word with any other score 0, unless
    /// no sentence shares one, in which case all score alike.
    pub fn rank(&self, text: &str) -> Vec<ScoredSentence> {
        let sentences = self.sentences(text);
        let graph = SentenceGraph::from_sentences(&sentences);
        let result = self.pagerank.run(&graph);

        tracing::debug!(
            sentences = sentences.len(),
            nodes = graph.num_nodes,
            edges = graph.num_edges(),
            iterations = result.iterations,
            converged = result.converged,
            "textrank scored"
        );

        sentences
            .into_iter()
            .map(|s| {
                let score = graph.node_for(&s).map(|n| result.score(n)).unwrap_or(0.0);
                ScoredSentence {
                    index: s.index,
                    text: s.text,
                    score,
                }
            })
            .collect()
    }

    /// Select the most important sentences, returned in document order.
    pub fn summarize_scored(
        &self,
        text: &str,
        length: SummaryLength,
    ) -> Result<Vec<ScoredSentence>, TextRankError> {
        validate(length)?;

        let mut ranked = self.rank(text);
        if ranked.iter().all(|s| s.score == 0.0) {
            // Empty graph: nothing connects, nothing to rank.
            return Ok(Vec::new());
        }

        let total = ranked.len();
        // Stable sort keeps document order among equal scores.
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        let mut selected = match length {
            SummaryLength::Ratio(ratio) => {
                let keep = (total as f64 * ratio) as usize;
                ranked.truncate(keep);
                ranked
            }
            SummaryLength::Words(words) => select_by_word_count(ranked, words),
        };

        selected.sort_by_key(|s| s.index);
        Ok(selected)
    }

    /// Summarize `text`, joining the selected sentences with newlines.
    pub fn summarize(&self, text: &str, length: SummaryLength) -> Result<String, TextRankError> {
        let selected = self.summarize_scored(text, length)?;
        Ok(selected
            .into_iter()
            .map(|s| s.text)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn sentences(&self, text: &str) -> Vec<Sentence> {
        if self.unwrap_lines {
            sentence::tokenize(&sentence::unwrap_lines(text), &self.stopwords)
        } else {
            sentence::tokenize(text, &self.stopwords)
        }
    }
}

fn validate(length: SummaryLength) -> Result<(), TextRankError> {
    match length {
        SummaryLength::Ratio(r) if !(r > 0.0 && r <= 1.0) => Err(TextRankError::InvalidRatio(r)),
        _ => Ok(()),
    }
}

fn select_by_word_count(ranked: Vec<ScoredSentence>, words: usize) -> Vec<ScoredSentence> {
    let target = words as i64;
    let mut length: i64 = 0;
    let mut selected = Vec::new();
    for s in ranked {
        let n = s.text.split_whitespace().count() as i64;
        // Stop once another sentence would move us further from the target.
        if (target - length - n).abs() > (target - length).abs() {
            break;
        }
        length += n;
        selected.push(s);
    }
    selected
}
