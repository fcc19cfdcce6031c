//! Text analysis for query normalization.
//!
//! This module provides the pieces the search path needs to turn raw free
//! text into something the text engine and the highlighter can use:
//! tokenization, Porter stemming, stopword removal, and the
//! [`QueryNormalizer`](normalize::QueryNormalizer) that composes them.

pub mod normalize;
pub mod stem;
pub mod stop;
pub mod tokenizer;

pub use normalize::{NormalizedQuery, QueryNormalizer};
pub use stem::{PorterStemmer, Stemmer};
pub use stop::StopFilter;
pub use tokenizer::WordTokenizer;
