//! Backend interfaces for the two query targets.
//!
//! The search path reads from two external collaborators: a structured
//! document store (exact field predicates, offset/limit, exact counts) and
//! a full-text engine (relevance search plus its own filter-expression
//! syntax). Both are modeled as injected trait objects so the executor can
//! be tested against fakes; the production implementations live outside
//! this repository, fed by the ingestion pipeline.
//!
//! Both handles are long-lived, shared across in-flight requests, and used
//! read-only here; calls are blocking with no local retry.

use serde_json::Value;

use crate::error::Result;
use crate::search::filter::StorePredicate;

pub mod memory;

/// The primary structured document store.
pub trait StructuredStore: Send + Sync {
    /// Fetch records matching the conjunction of `predicates`, with
    /// offset/limit pagination. An empty predicate list matches everything.
    fn query(&self, predicates: &[StorePredicate], offset: usize, limit: usize)
    -> Result<Vec<Value>>;

    /// Exact count of records matching the conjunction of `predicates`.
    fn count(&self, predicates: &[StorePredicate]) -> Result<u64>;
}

/// One page of hits from the text-search engine.
#[derive(Debug, Clone, Default)]
pub struct EngineHits {
    /// Matching records in engine order.
    pub hits: Vec<Value>,
    /// Engine-reported total. Known to be unreliable in the presence of
    /// filters; the executor never uses it.
    pub total_hits: Option<u64>,
    /// Engine-reported processing time in milliseconds.
    pub processing_time_ms: Option<u64>,
}

/// The secondary full-text search engine.
pub trait TextSearchEngine: Send + Sync {
    /// Run a relevance search for `query`, constrained by an optional
    /// filter expression (fragments joined with ` AND `, string values
    /// double-quoted and escaped).
    fn search(
        &self,
        query: &str,
        filter: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<EngineHits>;
}
