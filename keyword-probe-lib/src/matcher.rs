//! Keyword classification of response bodies.
//!
//! The vocabulary is built once and shared read-only between all workers.
//! Matching is a case-insensitive literal substring test, evaluated in
//! vocabulary order.

use crate::error::ScanError;
use serde::Serialize;
use std::sync::Arc;

/// Built-in vocabulary, in reporting order.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    " ai ",
    " ai\n",
    "artificial intelligence",
    "machine learning",
    "deep learning",
    "neural network",
    "computer vision",
    "natural language processing",
    "nlp",
    "reinforcement learning",
    "robotics",
    "chatbot",
    "automation",
    "algorithm",
    "predictive analytics",
    "big data",
    "cognitive computing",
    "data science",
    "supervised learning",
    "unsupervised learning",
];

lazy_static::lazy_static! {
    static ref BUILTIN_VOCABULARY: Arc<KeywordVocabulary> =
        Arc::new(KeywordVocabulary::from_static(DEFAULT_KEYWORDS));
}

/// Outcome of classifying one body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub matched: bool,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone)]
struct Entry {
    keyword: String,
    needle: String,
}

/// Ordered, immutable list of keywords.
#[derive(Debug, Clone)]
pub struct KeywordVocabulary {
    entries: Vec<Entry>,
}

impl KeywordVocabulary {
    /// The shared built-in vocabulary.
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN_VOCABULARY)
    }

    /// Build a vocabulary from user-supplied keywords.
    ///
    /// Empty entries are rejected, as is an empty list. Duplicates (ignoring
    /// case) keep their first position.
    pub fn new<I, S>(keywords: I) -> Result<Self, ScanError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries: Vec<Entry> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.into();
            if keyword.trim().is_empty() {
                return Err(ScanError::config("Vocabulary keywords cannot be empty"));
            }
            let needle = keyword.to_lowercase();
            if entries.iter().any(|e| e.needle == needle) {
                continue;
            }
            entries.push(Entry { keyword, needle });
        }

        if entries.is_empty() {
            return Err(ScanError::config("Vocabulary must contain at least one keyword"));
        }

        Ok(Self { entries })
    }

    fn from_static(keywords: &[&str]) -> Self {
        Self {
            entries: keywords
                .iter()
                .map(|k| Entry {
                    keyword: k.to_string(),
                    needle: k.to_lowercase(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keywords in vocabulary order, as originally written.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.keyword.as_str())
    }

    /// Classify a response body.
    ///
    /// Bytes that are not valid UTF-8 are replaced before matching, so a
    /// binary body simply matches nothing.
    pub fn classify(&self, body: &[u8]) -> Classification {
        if body.is_empty() {
            return Classification {
                matched: false,
                keywords: Vec::new(),
            };
        }

        let text = String::from_utf8_lossy(body).to_lowercase();
        let keywords: Vec<String> = self
            .entries
            .iter()
            .filter(|e| text.contains(&e.needle))
            .map(|e| e.keyword.clone())
            .collect();

        Classification {
            matched: !keywords.is_empty(),
            keywords,
        }
    }
}
