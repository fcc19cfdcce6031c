//! In-memory backend implementing both collaborator interfaces.
//!
//! Backs the test suite and the demo binary with one shared record list.
//! The store side evaluates typed predicates directly; the engine side
//! parses the same filter-expression syntax the compiler emits
//! (`field *= "value"`, `field >= n`, fragments joined with ` AND `), so
//! the full encode/decode round trip is exercised without a real engine.
//!
//! Matching here is deliberately simple — substring containment, no
//! scoring — which is all the search pipeline's contract requires of a
//! fake.

use std::sync::LazyLock;
use std::time::Instant;

use parking_lot::RwLock;
use regex::Regex;
use serde_json::Value;

use crate::backend::{EngineHits, StructuredStore, TextSearchEngine};
use crate::error::{Result, TrialSearchError};
use crate::search::filter::{FilterOp, StorePredicate, StoreValue};
use crate::search::postprocess::timestamp_of;

/// `field op value` with the engine's three operators.
static CLAUSE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\w+)\s*(\*=|>=|<=)\s*(.+?)\s*$").expect("clause pattern is valid")
});

/// A shared in-memory record list serving as both backends.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: RwLock<Vec<Value>>,
}

/// One parsed clause of an engine filter expression.
#[derive(Debug, Clone, PartialEq)]
struct EngineClause {
    field: String,
    op: FilterOp,
    value: ClauseValue,
}

#[derive(Debug, Clone, PartialEq)]
enum ClauseValue {
    Str(String),
    Num(i64),
}

impl MemoryBackend {
    /// Create a backend over an initial record list.
    pub fn new(records: Vec<Value>) -> Self {
        MemoryBackend {
            records: RwLock::new(records),
        }
    }

    /// Append records (ingestion happens before serving; this exists for
    /// test setup and corpus loading).
    pub fn add_records(&self, records: Vec<Value>) {
        self.records.write().extend(records);
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check whether the backend holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl StructuredStore for MemoryBackend {
    fn query(
        &self,
        predicates: &[StorePredicate],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Value>> {
        let records = self.records.read();
        Ok(records
            .iter()
            .filter(|r| predicates.iter().all(|p| matches_predicate(r, p)))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn count(&self, predicates: &[StorePredicate]) -> Result<u64> {
        let records = self.records.read();
        Ok(records
            .iter()
            .filter(|r| predicates.iter().all(|p| matches_predicate(r, p)))
            .count() as u64)
    }
}

impl TextSearchEngine for MemoryBackend {
    fn search(
        &self,
        query: &str,
        filter: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<EngineHits> {
        let started = Instant::now();
        let clauses = match filter {
            Some(expr) => parse_filter_expression(expr)?,
            None => Vec::new(),
        };
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();

        let records = self.records.read();
        let matching: Vec<&Value> = records
            .iter()
            .filter(|r| clauses.iter().all(|c| matches_clause(r, c)) && matches_terms(r, &terms))
            .collect();

        let total = matching.len() as u64;
        let hits = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(EngineHits {
            hits,
            total_hits: Some(total),
            processing_time_ms: Some(started.elapsed().as_millis() as u64),
        })
    }
}

/// Parse an ` AND `-joined filter expression into clauses.
///
/// The separator is only recognized outside quoted values, so a quoted
/// string value may itself embed ` AND ` (or escaped quotes) literally.
fn parse_filter_expression(expr: &str) -> Result<Vec<EngineClause>> {
    split_clauses(expr).into_iter().map(parse_clause).collect()
}

/// Split `expr` at every top-level ` AND `, tracking quote and escape
/// state so separators inside quoted values are left intact.
fn split_clauses(expr: &str) -> Vec<&str> {
    const SEPARATOR: &[u8] = b" AND ";

    let bytes = expr.as_bytes();
    let mut fragments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        if escaped {
            escaped = false;
        } else if in_quotes && bytes[i] == b'\\' {
            escaped = true;
        } else if bytes[i] == b'"' {
            in_quotes = !in_quotes;
        } else if !in_quotes && bytes[i..].starts_with(SEPARATOR) {
            fragments.push(&expr[start..i]);
            i += SEPARATOR.len();
            start = i;
            continue;
        }
        i += 1;
    }
    fragments.push(&expr[start..]);

    fragments
}

fn parse_clause(fragment: &str) -> Result<EngineClause> {
    let caps = CLAUSE_PATTERN
        .captures(fragment)
        .ok_or_else(|| TrialSearchError::query(format!("malformed filter clause: {fragment}")))?;

    let field = caps[1].to_string();
    let op = match &caps[2] {
        "*=" => FilterOp::Contains,
        ">=" => FilterOp::Gte,
        "<=" => FilterOp::Lte,
        other => {
            return Err(TrialSearchError::query(format!(
                "unknown filter operator: {other}"
            )));
        }
    };
    let raw = &caps[3];

    let value = if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        ClauseValue::Str(raw[1..raw.len() - 1].replace("\\\"", "\""))
    } else {
        ClauseValue::Num(raw.parse::<i64>().map_err(|_| {
            TrialSearchError::query(format!("unquoted filter value is not numeric: {raw}"))
        })?)
    };

    Ok(EngineClause { field, op, value })
}

fn matches_predicate(record: &Value, predicate: &StorePredicate) -> bool {
    match (&predicate.op, &predicate.value) {
        (FilterOp::Contains, StoreValue::Text(needle)) => {
            field_contains(record, &predicate.field, needle)
        }
        (FilterOp::Gte, StoreValue::Int(bound) | StoreValue::Timestamp(bound)) => {
            numeric_field(record, &predicate.field).is_some_and(|v| v >= *bound)
        }
        (FilterOp::Lte, StoreValue::Int(bound) | StoreValue::Timestamp(bound)) => {
            numeric_field(record, &predicate.field).is_some_and(|v| v <= *bound)
        }
        // The compiler never pairs contains with a numeric value or a
        // range operator with text.
        _ => false,
    }
}

fn matches_clause(record: &Value, clause: &EngineClause) -> bool {
    match (&clause.op, &clause.value) {
        (FilterOp::Contains, ClauseValue::Str(needle)) => {
            field_contains(record, &clause.field, needle)
        }
        (FilterOp::Gte, ClauseValue::Num(bound)) => {
            engine_numeric_field(record, &clause.field).is_some_and(|v| v >= *bound)
        }
        (FilterOp::Lte, ClauseValue::Num(bound)) => {
            engine_numeric_field(record, &clause.field).is_some_and(|v| v <= *bound)
        }
        _ => false,
    }
}

/// Any-term containment over the record's string fields.
fn matches_terms(record: &Value, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let Value::Object(fields) = record else {
        return false;
    };

    terms.iter().any(|term| {
        fields.values().any(|value| match value {
            Value::String(s) => s.to_lowercase().contains(term),
            Value::Array(items) => items.iter().any(|item| {
                item.as_str()
                    .is_some_and(|s| s.to_lowercase().contains(term))
            }),
            _ => false,
        })
    })
}

fn field_contains(record: &Value, field: &str, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    match record.get(field) {
        Some(Value::String(s)) => s.to_lowercase().contains(&needle),
        Some(Value::Array(items)) => items.iter().any(|item| {
            item.as_str()
                .is_some_and(|s| s.to_lowercase().contains(&needle))
        }),
        _ => false,
    }
}

/// Store-side numeric lookup; the `timestamp` field may still be wrapped.
fn numeric_field(record: &Value, field: &str) -> Option<i64> {
    if field == "timestamp" {
        let ts = timestamp_of(record);
        return (ts >= 0).then_some(ts);
    }
    record.get(field).and_then(Value::as_i64)
}

/// Engine-side numeric lookup; `parsed_timestamp` aliases the record
/// timestamp.
fn engine_numeric_field(record: &Value, field: &str) -> Option<i64> {
    if field == "parsed_timestamp" {
        let ts = timestamp_of(record);
        return (ts >= 0).then_some(ts);
    }
    record.get(field).and_then(Value::as_i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend() -> MemoryBackend {
        MemoryBackend::new(vec![
            json!({
                "title": "Remdesivir trial",
                "sponsor": "NIH",
                "timestamp": 1_600_000_000,
                "sample_size": 120,
                "location": ["Boston", "New York"],
            }),
            json!({
                "title": "Vaccine study",
                "sponsor": "Oxford",
                "timestamp": {"$date": 1_620_000_000},
                "sample_size": 40,
                "location": ["Paris"],
            }),
            json!({
                "title": "Aspirin follow-up",
                "sponsor": "nih collaboration",
                "sample_size": 15,
            }),
        ])
    }

    fn contains(field: &str, value: &str) -> StorePredicate {
        StorePredicate {
            field: field.to_string(),
            op: FilterOp::Contains,
            value: StoreValue::Text(value.to_string()),
        }
    }

    #[test]
    fn test_store_contains_is_case_insensitive() {
        let backend = backend();
        let hits = backend.query(&[contains("sponsor", "nih")], 0, 10).unwrap();

        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_store_contains_matches_list_elements() {
        let backend = backend();
        let hits = backend
            .query(&[contains("location", "boston")], 0, 10)
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["title"], "Remdesivir trial");
    }

    #[test]
    fn test_store_range_over_wrapped_timestamp() {
        let backend = backend();
        let predicate = StorePredicate {
            field: "timestamp".to_string(),
            op: FilterOp::Gte,
            value: StoreValue::Timestamp(1_610_000_000),
        };
        let hits = backend.query(&[predicate.clone()], 0, 10).unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["title"], "Vaccine study");
        assert_eq!(backend.count(&[predicate]).unwrap(), 1);
    }

    #[test]
    fn test_store_missing_field_fails_range() {
        let backend = backend();
        let predicate = StorePredicate {
            field: "timestamp".to_string(),
            op: FilterOp::Lte,
            value: StoreValue::Timestamp(2_000_000_000),
        };
        // The aspirin record has no timestamp at all.
        assert_eq!(backend.count(&[predicate]).unwrap(), 2);
    }

    #[test]
    fn test_store_offset_limit() {
        let backend = backend();
        let page = backend.query(&[], 1, 1).unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["title"], "Vaccine study");
        assert_eq!(backend.count(&[]).unwrap(), 3);
    }

    #[test]
    fn test_engine_parses_compiler_fragments() {
        let backend = backend();
        let hits = backend
            .search(
                "trial",
                Some(r#"sponsor *= "NIH" AND sample_size >= 100"#),
                0,
                10,
            )
            .unwrap();

        assert_eq!(hits.hits.len(), 1);
        assert_eq!(hits.hits[0]["title"], "Remdesivir trial");
        assert!(hits.processing_time_ms.is_some());
    }

    #[test]
    fn test_engine_parsed_timestamp_clause() {
        let backend = backend();
        let hits = backend
            .search("", Some("parsed_timestamp >= 1610000000"), 0, 10)
            .unwrap();

        assert_eq!(hits.hits.len(), 1);
        assert_eq!(hits.hits[0]["title"], "Vaccine study");
    }

    #[test]
    fn test_engine_and_inside_quoted_value() {
        let backend = MemoryBackend::new(vec![
            json!({
                "title": "Vaccine trial",
                "sponsor": "Johnson AND Johnson",
                "sample_size": 500,
            }),
            json!({"title": "Other trial", "sponsor": "NIH", "sample_size": 500}),
        ]);
        let hits = backend
            .search(
                "trial",
                Some(r#"sponsor *= "Johnson AND Johnson" AND sample_size >= 100"#),
                0,
                10,
            )
            .unwrap();

        assert_eq!(hits.hits.len(), 1);
        assert_eq!(hits.hits[0]["sponsor"], "Johnson AND Johnson");
    }

    #[test]
    fn test_quoted_separator_not_split() {
        let clauses =
            parse_filter_expression(r#"sponsor *= "A AND B" AND sample_size >= 1"#).unwrap();

        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].value, ClauseValue::Str("A AND B".to_string()));
        assert_eq!(clauses[1].value, ClauseValue::Num(1));
    }

    #[test]
    fn test_engine_escaped_quote_in_value() {
        let clause = parse_clause(r#"sponsor *= "St. \"Jude\"""#).unwrap();

        assert_eq!(clause.value, ClauseValue::Str(r#"St. "Jude""#.to_string()));
    }

    #[test]
    fn test_engine_rejects_malformed_clause() {
        assert!(parse_filter_expression("sponsor ~ oops").is_err());
        assert!(parse_filter_expression(r#"sponsor *= unquoted"#).is_err());
    }

    #[test]
    fn test_engine_empty_query_matches_within_filters() {
        let backend = backend();
        let hits = backend.search("", None, 0, 10).unwrap();

        assert_eq!(hits.hits.len(), 3);
    }
}
