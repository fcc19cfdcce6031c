//! # Trialsearch
//!
//! A search service over aggregated clinical-trial registry records.
//!
//! The interesting part lives in [`search`]: one logical request is compiled
//! into two backend-specific representations (a structured document store
//! and a full-text engine with its own filter syntax), free text is
//! normalized through tokenization/stemming/stopword removal to drive
//! stemming-aware highlighting, and the heterogeneous result shapes are
//! merged into a single response contract.
//!
//! ## Modules
//!
//! - [`analysis`] - tokenization, Porter stemming, stopwords, query
//!   normalization
//! - [`search`] - command parsing, filter compilation, query execution,
//!   result postprocessing, pagination
//! - [`backend`] - structured-store and text-engine interfaces plus an
//!   in-memory implementation
//! - [`server`] - the HTTP layer

pub mod analysis;
pub mod backend;
pub mod error;
pub mod search;
pub mod server;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
