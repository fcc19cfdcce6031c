//! Query execution against the two backends.
//!
//! One branch is chosen per request, by whether any free text remains after
//! directive stripping:
//!
//! - no free text: the structured store answers with exact predicates,
//!   offset/limit pagination, and an exact total count (no timing signal);
//! - free text: the text engine answers with the normalized query plus the
//!   compiled filter expression. Its total-hit count ignores filters and is
//!   discarded; only its processing time is kept.
//!
//! Collaborator failures are not retried here; they are wrapped as backend
//! errors and propagate to the HTTP boundary.

use std::cmp::Reverse;
use std::sync::Arc;

use serde_json::Value;

use crate::analysis::normalize::{NormalizedQuery, QueryNormalizer};
use crate::backend::{StructuredStore, TextSearchEngine};
use crate::error::{Result, TrialSearchError};
use crate::search::filter::FilterSpec;
use crate::search::postprocess::timestamp_of;

/// The raw outcome of one executed query, before postprocessing.
#[derive(Debug)]
pub struct ExecutedQuery {
    /// Backend-native records, not yet postprocessed.
    pub records: Vec<Value>,
    /// Exact total hits; present only on the structured branch.
    pub total_hits: Option<u64>,
    /// Engine processing time; present only on the text branch.
    pub query_time_ms: Option<u64>,
    /// The normalizer output; present only on the text branch, where it
    /// drives highlighting.
    pub normalized: Option<NormalizedQuery>,
}

/// Routes one request to the structured store or the text engine.
pub struct QueryExecutor {
    store: Arc<dyn StructuredStore>,
    engine: Arc<dyn TextSearchEngine>,
    normalizer: QueryNormalizer,
    page_size: usize,
}

impl QueryExecutor {
    /// Create an executor over injected backend handles.
    pub fn new(
        store: Arc<dyn StructuredStore>,
        engine: Arc<dyn TextSearchEngine>,
        page_size: usize,
    ) -> Result<Self> {
        Ok(QueryExecutor {
            store,
            engine,
            normalizer: QueryNormalizer::new()?,
            page_size,
        })
    }

    /// The fixed page size this executor paginates with.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Execute the request described by the stripped free-text `query`,
    /// the compiled `specs`, and the requested `page`.
    pub fn execute(&self, query: &str, specs: &[FilterSpec], page: u32) -> Result<ExecutedQuery> {
        let offset = page.saturating_sub(1) as usize * self.page_size;

        if query.trim().is_empty() {
            let predicates: Vec<_> = specs.iter().map(|s| s.store.clone()).collect();
            let records = self
                .store
                .query(&predicates, offset, self.page_size)
                .map_err(|e| TrialSearchError::backend(format!("store query failed: {e}")))?;
            let total = self
                .store
                .count(&predicates)
                .map_err(|e| TrialSearchError::backend(format!("store count failed: {e}")))?;
            tracing::debug!(
                branch = "structured",
                filters = specs.len(),
                total,
                returned = records.len(),
                "executed store query"
            );

            Ok(ExecutedQuery {
                records,
                total_hits: Some(total),
                query_time_ms: None,
                normalized: None,
            })
        } else {
            let normalized = self.normalizer.normalize(query);
            let filter = if specs.is_empty() {
                None
            } else {
                Some(
                    specs
                        .iter()
                        .map(|s| s.engine.as_str())
                        .collect::<Vec<_>>()
                        .join(" AND "),
                )
            };

            let response = self
                .engine
                .search(&normalized.query, filter.as_deref(), offset, self.page_size)
                .map_err(|e| TrialSearchError::backend(format!("engine search failed: {e}")))?;
            tracing::debug!(
                branch = "text",
                filters = specs.len(),
                returned = response.hits.len(),
                query_time_ms = response.processing_time_ms,
                "executed engine query"
            );

            // Newest first; engine order is relevance, which the response
            // contract does not use.
            let mut hits = response.hits;
            hits.sort_by_key(|record| Reverse(timestamp_of(record)));

            // The engine's count ignores filters, so it is unusable for
            // pagination or stats.
            Ok(ExecutedQuery {
                records: hits,
                total_hits: None,
                query_time_ms: response.processing_time_ms,
                normalized: Some(normalized),
            })
        }
    }
}
