//! Query normalization for the text-search branch.
//!
//! The text engine indexes stemmed tokens but has no notion of stemming at
//! query highlight time, so one pass here produces both sides: the
//! normalized search string (tokenized, lowercased, stopwords removed) and
//! the highlight-term set (surface tokens plus their stems, stopwords
//! included). Highlight terms are derived *before* stopword removal; the
//! stopword list only shapes the string sent to the engine.

use std::collections::HashSet;

use crate::analysis::stem::{PorterStemmer, Stemmer};
use crate::analysis::stop::StopFilter;
use crate::analysis::tokenizer::WordTokenizer;
use crate::error::Result;

/// The output of query normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuery {
    /// Normalized search string handed to the text engine.
    pub query: String,
    /// Case-folded, de-duplicated highlight terms: surface tokens and stems.
    pub highlight_terms: Vec<String>,
}

/// Normalizes raw free text into a search string and highlight terms.
#[derive(Debug, Clone)]
pub struct QueryNormalizer {
    tokenizer: WordTokenizer,
    stemmer: PorterStemmer,
    stop_filter: StopFilter,
}

impl QueryNormalizer {
    /// Create a normalizer with the default tokenizer, Porter stemmer, and
    /// English stopword list.
    pub fn new() -> Result<Self> {
        Ok(QueryNormalizer {
            tokenizer: WordTokenizer::new()?,
            stemmer: PorterStemmer::new(),
            stop_filter: StopFilter::new(),
        })
    }

    /// Create a normalizer with a custom stopword filter.
    pub fn with_stop_filter(stop_filter: StopFilter) -> Result<Self> {
        Ok(QueryNormalizer {
            tokenizer: WordTokenizer::new()?,
            stemmer: PorterStemmer::new(),
            stop_filter,
        })
    }

    /// Normalize `text` into a search string and highlight terms.
    ///
    /// Normalizing an already-normalized query string yields the same
    /// string: tokens are already lowercased, de-duplicated, and
    /// stopword-free, and every step here is idempotent on that form.
    pub fn normalize(&self, text: &str) -> NormalizedQuery {
        let tokens: Vec<String> = self
            .tokenizer
            .tokenize(text)
            .into_iter()
            .map(|t| t.to_lowercase())
            .collect();

        // Highlight terms first: surface forms and stems, before any
        // stopword removal.
        let mut seen = HashSet::new();
        let mut highlight_terms = Vec::new();
        for token in &tokens {
            if seen.insert(token.clone()) {
                highlight_terms.push(token.clone());
            }
            let stem = self.stemmer.stem(token);
            if seen.insert(stem.clone()) {
                highlight_terms.push(stem);
            }
        }

        // Search string: surviving tokens, original order, de-duplicated.
        let mut emitted = HashSet::new();
        let mut surviving = Vec::new();
        for token in &tokens {
            if self.stop_filter.is_stop_word(token) {
                continue;
            }
            if emitted.insert(token.clone()) {
                surviving.push(token.as_str());
            }
        }

        NormalizedQuery {
            query: surviving.join(" "),
            highlight_terms,
        }
    }
}
