//! Sentence splitting and token cleaning.
//!
//! A sentence is a run of text starting at a non-space character and ending
//! at `.`, `!` or `?` followed by whitespace (or end of text). Text that never
//! reaches a terminator ends at the line break. Sentences never span a line
//! break, so callers that want prose reflowed should unwrap lines first.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_stemmers::Stemmer;

use crate::stopwords::StopwordFilter;

/// Placeholder that temporarily replaces the space after an abbreviation.
const SEPARATOR: &str = "@";

/// Tokens shorter than this (in chars) are dropped after cleaning.
pub const MIN_TOKEN_CHARS: usize = 3;

/// Title-like abbreviations: `Mr. Smith`, `Dr. Who`, `St. Paul`.
static AB_SENIOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z][a-z]{1,2}\.)\s(\w)").unwrap());
/// Dotted acronyms: `U.S. Army`.
static AB_ACRONYM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\.[a-zA-Z]\.)\s(\w)").unwrap());
static UNDO_AB_SENIOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z][a-z]{1,2}\.)@(\w)").unwrap());
static UNDO_AB_ACRONYM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\.[a-zA-Z]\.)@(\w)").unwrap());

static HYPHEN_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w)-\n(\w)").unwrap());
static SINGLE_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([^\n])\n([^\n])").unwrap());

/// A sentence of the source text with its cleaned tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    /// Position in document order (0-based).
    pub index: usize,
    /// Original sentence text.
    pub text: String,
    /// Lowercased, stopword-filtered, stemmed tokens.
    pub tokens: Vec<String>,
}

impl Sentence {
    /// Number of whitespace-separated words in the original text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Token sequence joined with single spaces; identical keys share a graph node.
    pub fn token_key(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Split `text` into sentences, keeping their original wording.
pub fn split_sentences(text: &str) -> Vec<String> {
    let protected = AB_SENIOR.replace_all(text, format!("${{1}}{SEPARATOR}${{2}}").as_str());
    let protected = AB_ACRONYM.replace_all(&protected, format!("${{1}}{SEPARATOR}${{2}}").as_str());

    raw_sentences(&protected)
        .into_iter()
        .map(|s| {
            let s = UNDO_AB_SENIOR.replace_all(s, "${1} ${2}");
            UNDO_AB_ACRONYM.replace_all(&s, "${1} ${2}").into_owned()
        })
        .collect()
}

/// Join hard-wrapped lines: hyphenated breaks are glued, single line breaks
/// become spaces, and blank lines (paragraph breaks) are kept.
pub fn unwrap_lines(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let text = HYPHEN_BREAK.replace_all(&text, "${1}${2}");
    // Two passes: a match consumes the character after the newline, so
    // alternating single-char lines need a second sweep.
    let text = SINGLE_NEWLINE.replace_all(&text, "${1} ${2}");
    SINGLE_NEWLINE.replace_all(&text, "${1} ${2}").into_owned()
}

fn raw_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for line in text.split('\n') {
        let chars: Vec<(usize, char)> = line.char_indices().collect();
        let mut i = 0;
        while i < chars.len() {
            if chars[i].1.is_whitespace() {
                i += 1;
                continue;
            }
            // A sentence needs at least two characters.
            if i + 1 >= chars.len() {
                break;
            }
            let start = chars[i].0;
            let terminator = (i + 2..chars.len()).find(|&j| {
                matches!(chars[j].1, '.' | '!' | '?')
                    && chars.get(j + 1).is_none_or(|(_, c)| c.is_whitespace())
            });
            match terminator {
                Some(j) => {
                    let end = chars[j].0 + chars[j].1.len_utf8();
                    out.push(&line[start..end]);
                    i = j + 1;
                }
                None => {
                    let s = line[start..].trim_end();
                    if s.chars().count() >= 2 {
                        out.push(s);
                    }
                    break;
                }
            }
        }
    }
    out
}

/// Lowercase, strip punctuation and digits, drop stopwords and short tokens,
/// then stem what is left in the filter's language.
pub fn clean_tokens(sentence: &str, stopwords: &StopwordFilter) -> Vec<String> {
    clean_with(sentence, stopwords, &stopwords.language().stemmer())
}

fn clean_with(sentence: &str, stopwords: &StopwordFilter, stemmer: &Stemmer) -> Vec<String> {
    sentence
        .to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| w.chars().count() >= MIN_TOKEN_CHARS)
        .filter(|w| !stopwords.is_stopword(w))
        .map(|w| stemmer.stem(w).into_owned())
        .collect()
}

/// Split and clean `text` into indexed sentences.
pub fn tokenize(text: &str, stopwords: &StopwordFilter) -> Vec<Sentence> {
    let stemmer = stopwords.language().stemmer();
    split_sentences(text)
        .into_iter()
        .enumerate()
        .map(|(index, text)| {
            let tokens = clean_with(&text, stopwords, &stemmer);
            Sentence {
                index,
                text,
                tokens,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_terminators() {
        let s = split_sentences("The cat sat. The dog ran! Did it rain? Yes.");
        assert_eq!(s, vec!["The cat sat.", "The dog ran!", "Did it rain?", "Yes."]);
    }

    #[test]
    fn test_abbreviations_are_protected() {
        let s = split_sentences("Mr. Darcy arrived at noon. Mrs. Bennet was pleased.");
        assert_eq!(
            s,
            vec!["Mr. Darcy arrived at noon.", "Mrs. Bennet was pleased."]
        );
    }

    #[test]
    fn test_acronyms_are_protected() {
        let s = split_sentences("He served in the U.S. Army for years. Then he left.");
        assert_eq!(
            s,
            vec!["He served in the U.S. Army for years.", "Then he left."]
        );
    }

    #[test]
    fn test_unterminated_text_ends_at_line_break() {
        let s = split_sentences("Chapter One\nIt was a dark night. The end");
        assert_eq!(s, vec!["Chapter One", "It was a dark night.", "The end"]);
    }

    #[test]
    fn test_sentences_never_span_lines() {
        let s = split_sentences("It was the best of\ntimes. It was the worst.");
        assert_eq!(s, vec!["It was the best of", "times.", "It was the worst."]);
    }

    #[test]
    fn test_single_char_fragments_dropped() {
        let s = split_sentences("a\n\nHello there.");
        assert_eq!(s, vec!["Hello there."]);
    }

    #[test]
    fn test_decimal_point_not_a_terminator() {
        let s = split_sentences("It cost 3.50 pounds. Cheap.");
        assert_eq!(s, vec!["It cost 3.50 pounds.", "Cheap."]);
    }

    #[test]
    fn test_unwrap_lines_keeps_paragraphs() {
        let text = "It was the best of\ntimes, it was the worst of ti-\nmes.\n\nNext paragraph.";
        assert_eq!(
            unwrap_lines(text),
            "It was the best of times, it was the worst of times.\n\nNext paragraph."
        );
    }

    #[test]
    fn test_clean_tokens_filters() {
        let stop = StopwordFilter::from_list(&["the", "at"]);
        let tokens = clean_tokens("The 3 wolves, howling at the MOON!", &stop);
        assert_eq!(tokens, vec!["wolv", "howl", "moon"]);
    }

    #[test]
    fn test_stopwords_checked_before_stemming() {
        let stop = StopwordFilter::from_list(&["hunted"]);
        assert_eq!(clean_tokens("Hunted hunts", &stop), vec!["hunt"]);
    }

    #[test]
    fn test_tokenize_indexes_in_order() {
        let stop = StopwordFilter::from_list(&["the"]);
        let sentences = tokenize("Wolves howl. Ravens croak.", &stop);
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].index, 0);
        assert_eq!(sentences[1].index, 1);
        assert_eq!(sentences[1].token_key(), "raven croak");
        assert_eq!(sentences[0].word_count(), 2);
    }
}
