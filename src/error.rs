//! Error types for the trialsearch service.
//!
//! All fallible operations return [`Result`], with [`TrialSearchError`]
//! categorizing what went wrong. Recoverable per-filter conditions (a date
//! that fails to parse, for example) are *not* errors — they surface as
//! alerts in the response payload. Errors here are the fatal kind: backend
//! failures, malformed internal expressions, I/O.

use std::io;

use thiserror::Error;

/// The main error type for trialsearch operations.
#[derive(Error, Debug)]
pub enum TrialSearchError {
    /// I/O errors (corpus loading, network binding, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Analysis-related errors (tokenization, normalization)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Query-related errors (parsing, invalid expressions)
    #[error("Query error: {0}")]
    Query(String),

    /// Backend errors (structured store or text engine)
    #[error("Backend error: {0}")]
    Backend(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with TrialSearchError.
pub type Result<T> = std::result::Result<T, TrialSearchError>;

impl TrialSearchError {
    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        TrialSearchError::Analysis(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        TrialSearchError::Query(msg.into())
    }

    /// Create a new backend error.
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        TrialSearchError::Backend(msg.into())
    }
}
