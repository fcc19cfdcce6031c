//! The search pipeline, end to end.
//!
//! [`SearchService`] owns the per-request flow: directive parsing, filter
//! compilation (request filters merged with directive overrides), branch
//! execution, postprocessing, pagination, and stats/alert assembly. All
//! state is request-scoped except the injected backend handles.

use std::sync::Arc;

use crate::backend::{StructuredStore, TextSearchEngine};
use crate::error::Result;
use crate::search::command::CommandParser;
use crate::search::executor::QueryExecutor;
use crate::search::filter::FilterCompiler;
use crate::search::paginate::resolve_page;
use crate::search::postprocess::{Highlighter, postprocess_records};
use crate::search::types::{Alert, DEFAULT_PAGE_SIZE, RawQuery, SearchResponse};

/// A complete search pipeline over a pair of backend handles.
pub struct SearchService {
    commands: CommandParser,
    compiler: FilterCompiler,
    executor: QueryExecutor,
    page_size: usize,
}

impl SearchService {
    /// Create a service with the default page size.
    pub fn new(store: Arc<dyn StructuredStore>, engine: Arc<dyn TextSearchEngine>) -> Result<Self> {
        Self::with_page_size(store, engine, DEFAULT_PAGE_SIZE)
    }

    /// Create a service with a custom page size.
    pub fn with_page_size(
        store: Arc<dyn StructuredStore>,
        engine: Arc<dyn TextSearchEngine>,
        page_size: usize,
    ) -> Result<Self> {
        Ok(SearchService {
            commands: CommandParser::new()?,
            compiler: FilterCompiler::new(),
            executor: QueryExecutor::new(store, engine, page_size)?,
            page_size,
        })
    }

    /// Serve one search request.
    pub fn search(&self, raw: &RawQuery) -> Result<SearchResponse> {
        let (stripped, overrides) = self.commands.parse(&raw.q);

        // Directive overrides win over request filters for the same key.
        let mut merged = raw.filters.clone();
        merged.extend(overrides);

        let (specs, mut alerts) = self.compiler.compile(&merged);
        let executed = self.executor.execute(&stripped, &specs, raw.page)?;

        let highlighter = match &executed.normalized {
            Some(normalized) => Highlighter::compile(&normalized.highlight_terms)?,
            None => None,
        };

        let mut papers = executed.records;
        postprocess_records(&mut papers, highlighter.as_ref());

        let page = resolve_page(raw.page, papers.len(), self.page_size);

        if raw.page == 1 && papers.is_empty() {
            alerts.push(Alert::warning(
                "No results found. Try rephrasing your query or loosening the filters.",
            ));
        }

        let stats = build_stats(executed.total_hits, executed.query_time_ms);
        tracing::info!(
            query = %raw.q,
            page = raw.page,
            returned = papers.len(),
            alerts = alerts.len(),
            "served search request"
        );

        Ok(SearchResponse {
            page,
            papers,
            stats,
            alerts,
        })
    }
}

/// Assemble the human-readable stats line from whatever signals are
/// available. A zero count reads the same as an absent one; the empty-page
/// warning alert already covers that case.
fn build_stats(total_hits: Option<u64>, query_time_ms: Option<u64>) -> String {
    let mut stats = String::from("returned");
    if let Some(total) = total_hits.filter(|total| *total > 0) {
        let plural = if total == 1 { "" } else { "s" };
        stats.push_str(&format!(" {total} result{plural}"));
    }
    if let Some(elapsed) = query_time_ms {
        stats.push_str(&format!(" in {elapsed}ms"));
    }
    stats
}
