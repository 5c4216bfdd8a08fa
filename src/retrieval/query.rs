//! Query normalization and engine query descriptions

use serde::{Deserialize, Serialize};

/// A visitor utterance prepared for retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedQuery {
    /// Input exactly as received
    pub raw: String,

    /// Trimmed and lower-cased form; also the cache key
    pub normalized: String,

    /// Whitespace-delimited words of the normalized form
    pub words: Vec<String>,
}

impl NormalizedQuery {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        let words = normalized.split_whitespace().map(str::to_string).collect();

        Self {
            raw: raw.to_string(),
            normalized,
            words,
        }
    }

    /// Nothing to search for
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Words with duplicates removed, first occurrence kept
    pub fn distinct_words(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.words
            .iter()
            .map(String::as_str)
            .filter(|word| seen.insert(*word))
            .collect()
    }

    /// Bag-of-words query requiring every term
    pub fn all_terms(&self) -> TextQuery {
        TextQuery::new(self.normalized.clone(), TermMode::All)
    }

    /// Bag-of-words query satisfied by any single word
    pub fn any_term(&self) -> TextQuery {
        TextQuery::new(self.words.join(" "), TermMode::Any)
    }
}

/// How analyzed terms of a text query combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermMode {
    /// Every term must match (plain text-search semantics)
    All,
    /// At least one term must match
    Any,
}

/// Text handed to the search engine together with its term semantics.
///
/// Tokenizing, stemming and stop-word removal belong to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextQuery {
    pub text: String,
    pub mode: TermMode,
}

impl TextQuery {
    pub fn new(text: impl Into<String>, mode: TermMode) -> Self {
        Self {
            text: text.into(),
            mode,
        }
    }
}
