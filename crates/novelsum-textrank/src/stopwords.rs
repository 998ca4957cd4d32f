//! Stopword filtering backed by the `stop-words` crate, and the Snowball
//! stemmer for the same language.

use rustc_hash::FxHashSet;
use rust_stemmers::{Algorithm, Stemmer};
use stop_words::{LANGUAGE, get};

/// Languages with both a stopword list and a Snowball stemmer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    German,
    French,
    Spanish,
    Italian,
    Portuguese,
    Dutch,
    Russian,
    Swedish,
}

impl Language {
    /// Parse a language code or name. Unknown languages fall back to English.
    pub fn parse(language: &str) -> Self {
        match language.to_lowercase().as_str() {
            "de" | "german" => Language::German,
            "fr" | "french" => Language::French,
            "es" | "spanish" => Language::Spanish,
            "it" | "italian" => Language::Italian,
            "pt" | "portuguese" => Language::Portuguese,
            "nl" | "dutch" => Language::Dutch,
            "ru" | "russian" => Language::Russian,
            "sv" | "swedish" => Language::Swedish,
            _ => Language::English,
        }
    }

    /// Snowball stemmer for this language.
    pub fn stemmer(self) -> Stemmer {
        Stemmer::create(match self {
            Language::English => Algorithm::English,
            Language::German => Algorithm::German,
            Language::French => Algorithm::French,
            Language::Spanish => Algorithm::Spanish,
            Language::Italian => Algorithm::Italian,
            Language::Portuguese => Algorithm::Portuguese,
            Language::Dutch => Algorithm::Dutch,
            Language::Russian => Algorithm::Russian,
            Language::Swedish => Algorithm::Swedish,
        })
    }

    fn stopword_list(self) -> Vec<String> {
        let lang = match self {
            Language::English => LANGUAGE::English,
            Language::German => LANGUAGE::German,
            Language::French => LANGUAGE::French,
            Language::Spanish => LANGUAGE::Spanish,
            Language::Italian => LANGUAGE::Italian,
            Language::Portuguese => LANGUAGE::Portuguese,
            Language::Dutch => LANGUAGE::Dutch,
            Language::Russian => LANGUAGE::Russian,
            Language::Swedish => LANGUAGE::Swedish,
        };
        get(lang).iter().map(|s| s.to_string()).collect()
    }
}

/// A lowercase stopword set for one language.
#[derive(Debug, Clone)]
pub struct StopwordFilter {
    stopwords: FxHashSet<String>,
    language: Language,
}

impl Default for StopwordFilter {
    fn default() -> Self {
        Self::new("en")
    }
}

impl StopwordFilter {
    /// Create a filter for the given language code or name.
    ///
    /// Unknown languages fall back to English.
    pub fn new(language: &str) -> Self {
        let language = Language::parse(language);
        Self {
            stopwords: language.stopword_list().into_iter().collect(),
            language,
        }
    }

    /// Create a filter from a custom list; tokens are stemmed as English.
    pub fn from_list(words: &[&str]) -> Self {
        Self {
            stopwords: words.iter().map(|w| w.to_lowercase()).collect(),
            language: Language::English,
        }
    }

    /// Add more stopwords on top of the current set.
    pub fn add_stopwords<S: AsRef<str>>(&mut self, words: &[S]) {
        for word in words {
            self.stopwords.insert(word.as_ref().to_lowercase());
        }
    }

    /// Check whether `word` is a stopword (case-insensitive).
    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(&word.to_lowercase())
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn len(&self) -> usize {
        self.stopwords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stopwords.is_empty()
    }
}
