//! Regex-based word tokenizer.

use std::sync::Arc;

use regex::Regex;

use crate::error::{Result, TrialSearchError};

/// A regex-based tokenizer that extracts word tokens.
///
/// The default pattern `\w+` matches runs of word characters, which also
/// strips punctuation and other non-alphanumeric characters from the input.
#[derive(Clone, Debug)]
pub struct WordTokenizer {
    /// The regex pattern used to extract tokens
    pattern: Arc<Regex>,
}

impl WordTokenizer {
    /// Create a new tokenizer with the default `\w+` pattern.
    pub fn new() -> Result<Self> {
        Self::with_pattern(r"\w+")
    }

    /// Create a new tokenizer with a custom pattern.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| TrialSearchError::analysis(format!("Invalid regex pattern: {e}")))?;

        Ok(WordTokenizer {
            pattern: Arc::new(regex),
        })
    }

    /// Get the regex pattern used by this tokenizer.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Extract tokens from `text` in order of appearance.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.pattern
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

impl Default for WordTokenizer {
    fn default() -> Self {
        Self::new().expect("Default tokenizer pattern should be valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_words() {
        let tokenizer = WordTokenizer::new().unwrap();
        let tokens = tokenizer.tokenize("Hello, world! This is a test.");

        assert_eq!(tokens, vec!["Hello", "world", "This", "is", "a", "test"]);
    }

    #[test]
    fn test_tokenize_strips_punctuation() {
        let tokenizer = WordTokenizer::new().unwrap();
        let tokens = tokenizer.tokenize("double-blind (phase-3) trial; n=120");

        assert_eq!(
            tokens,
            vec!["double", "blind", "phase", "3", "trial", "n", "120"]
        );
    }

    #[test]
    fn test_tokenize_empty_input() {
        let tokenizer = WordTokenizer::new().unwrap();
        assert!(tokenizer.tokenize("").is_empty());
        assert!(tokenizer.tokenize("...!?").is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(WordTokenizer::with_pattern("(unclosed").is_err());
    }
}
