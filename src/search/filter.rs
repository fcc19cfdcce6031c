//! Filter compilation.
//!
//! One logical filter set has to be answerable by two backends with
//! different query languages: the structured store takes typed field
//! predicates, the text engine takes a string filter expression. Each
//! allow-listed filter is compiled once into a [`FilterSpec`] carrying both
//! encodings, so the executor can pick whichever side matches the chosen
//! branch without re-deriving anything.
//!
//! Operators are selected by a naming convention on the filter key:
//! `min-` means `>=`, `max-` means `<=`, and everything else is a
//! case-insensitive contains match. Duplicate field/operator pairs cannot
//! occur because the input is a merged map; when request filters and
//! directive overrides collide on a key, the override (the later write)
//! wins.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::search::types::Alert;

/// Filter keys accepted from the request; everything else is silently
/// ignored.
pub const ACCEPTED_FILTER_KEYS: &[&str] = &[
    "sponsor",
    "target_disease",
    "intervention",
    "location",
    "recruiting_status",
    "min-timestamp",
    "max-timestamp",
    "min-sample_size",
    "max-sample_size",
];

/// The engine's pre-parsed numeric field standing in for the store's rich
/// `timestamp` date field, which the engine cannot filter on.
const ENGINE_TIMESTAMP_FIELD: &str = "parsed_timestamp";

/// Date formats accepted for human-entered timestamp filters.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Comparison operator of one compiled filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Case-insensitive substring match.
    Contains,
    /// Greater than or equal.
    Gte,
    /// Less than or equal.
    Lte,
}

impl FilterOp {
    /// The operator symbol in the text engine's filter-expression syntax.
    pub fn engine_symbol(&self) -> &'static str {
        match self {
            FilterOp::Contains => "*=",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
        }
    }
}

/// A typed predicate value for the structured store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    /// Raw string for a contains match.
    Text(String),
    /// Integer bound (sample size).
    Int(i64),
    /// Epoch-seconds bound against the store's date field.
    Timestamp(i64),
}

/// One field predicate in the structured store's query language.
#[derive(Debug, Clone, PartialEq)]
pub struct StorePredicate {
    pub field: String,
    pub op: FilterOp,
    pub value: StoreValue,
}

/// One compiled filter, dual-encoded for both backends.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    /// Canonical field name (prefix stripped).
    pub field: String,
    pub op: FilterOp,
    /// Structured-store encoding.
    pub store: StorePredicate,
    /// Text-engine filter-expression fragment, e.g. `sponsor *= "NIH"`.
    pub engine: String,
}

/// Compiles the merged raw filter map into an ordered list of
/// [`FilterSpec`]s.
#[derive(Debug, Clone, Default)]
pub struct FilterCompiler;

impl FilterCompiler {
    /// Create a new compiler over the fixed allow-list.
    pub fn new() -> Self {
        FilterCompiler
    }

    /// Compile every allow-listed, non-empty filter.
    ///
    /// Malformed date values drop their filter and emit an `error` alert;
    /// malformed or negative sample sizes are coerced to zero instead of
    /// being dropped. Keys outside the allow-list are skipped silently.
    pub fn compile(&self, filters: &BTreeMap<String, String>) -> (Vec<FilterSpec>, Vec<Alert>) {
        let mut specs = Vec::new();
        let mut alerts = Vec::new();

        for (key, value) in filters {
            if value.is_empty() || !ACCEPTED_FILTER_KEYS.contains(&key.as_str()) {
                continue;
            }

            let (op, field) = split_operator(key);
            match field {
                "timestamp" => match parse_human_date(value) {
                    Some(epoch) => specs.push(FilterSpec {
                        field: field.to_string(),
                        op,
                        store: StorePredicate {
                            field: "timestamp".to_string(),
                            op,
                            value: StoreValue::Timestamp(epoch),
                        },
                        engine: format!(
                            "{ENGINE_TIMESTAMP_FIELD} {} {epoch}",
                            op.engine_symbol()
                        ),
                    }),
                    None => {
                        tracing::debug!(value = %value, "dropping unparsable date filter");
                        alerts.push(Alert::error(format!(
                            "Could not parse date value '{value}'; filter ignored."
                        )));
                    }
                },
                "sample_size" => {
                    // Unparsable or negative sizes become zero rather than
                    // dropping the filter.
                    let size = value.trim().parse::<i64>().unwrap_or(0).max(0);
                    specs.push(FilterSpec {
                        field: field.to_string(),
                        op,
                        store: StorePredicate {
                            field: "sample_size".to_string(),
                            op,
                            value: StoreValue::Int(size),
                        },
                        engine: format!("sample_size {} {size}", op.engine_symbol()),
                    });
                }
                _ => specs.push(FilterSpec {
                    field: field.to_string(),
                    op,
                    store: StorePredicate {
                        field: field.to_string(),
                        op,
                        value: StoreValue::Text(value.clone()),
                    },
                    engine: format!(
                        "{field} {} \"{}\"",
                        op.engine_symbol(),
                        escape_engine_value(value)
                    ),
                }),
            }
        }

        (specs, alerts)
    }
}

/// Determine the operator from the key's `min-`/`max-` prefix and strip it.
fn split_operator(key: &str) -> (FilterOp, &str) {
    if let Some(field) = key.strip_prefix("min-") {
        (FilterOp::Gte, field)
    } else if let Some(field) = key.strip_prefix("max-") {
        (FilterOp::Lte, field)
    } else {
        (FilterOp::Contains, key)
    }
}

/// Escape embedded double quotes in a value inserted into the engine's
/// filter expression.
fn escape_engine_value(value: &str) -> String {
    value.replace('"', "\\\"")
}

/// Parse a human-entered calendar date into epoch seconds (UTC midnight for
/// date-only forms).
pub fn parse_human_date(value: &str) -> Option<i64> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp());
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date.and_time(NaiveTime::MIN).and_utc().timestamp());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::types::AlertKind;

    fn filters(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_contains_filter_dual_encoding() {
        let compiler = FilterCompiler::new();
        let (specs, alerts) = compiler.compile(&filters(&[("sponsor", "NIH")]));

        assert!(alerts.is_empty());
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].field, "sponsor");
        assert_eq!(specs[0].op, FilterOp::Contains);
        assert_eq!(specs[0].store.value, StoreValue::Text("NIH".to_string()));
        assert_eq!(specs[0].engine, r#"sponsor *= "NIH""#);
    }

    #[test]
    fn test_engine_value_quotes_escaped() {
        let compiler = FilterCompiler::new();
        let (specs, _) = compiler.compile(&filters(&[("sponsor", r#"St. "Jude""#)]));

        assert_eq!(specs[0].engine, r#"sponsor *= "St. \"Jude\"""#);
    }

    #[test]
    fn test_timestamp_filter_encodes_epoch_on_both_sides() {
        let compiler = FilterCompiler::new();
        let (specs, alerts) = compiler.compile(&filters(&[("min-timestamp", "2021-06-01")]));

        assert!(alerts.is_empty());
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].op, FilterOp::Gte);

        let epoch = parse_human_date("2021-06-01").unwrap();
        assert_eq!(specs[0].store.field, "timestamp");
        assert_eq!(specs[0].store.value, StoreValue::Timestamp(epoch));
        assert_eq!(specs[0].engine, format!("parsed_timestamp >= {epoch}"));
    }

    #[test]
    fn test_unparsable_date_dropped_with_error_alert() {
        let compiler = FilterCompiler::new();
        let (specs, alerts) = compiler.compile(&filters(&[("min-timestamp", "not-a-date")]));

        assert!(specs.is_empty());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Error);
        assert!(alerts[0].message.contains("not-a-date"));
    }

    #[test]
    fn test_negative_sample_size_clamped_to_zero() {
        let compiler = FilterCompiler::new();
        let (specs, alerts) = compiler.compile(&filters(&[("min-sample_size", "-5")]));

        assert!(alerts.is_empty());
        assert_eq!(specs[0].store.value, StoreValue::Int(0));
        assert_eq!(specs[0].engine, "sample_size >= 0");
    }

    #[test]
    fn test_unparsable_sample_size_becomes_zero() {
        let compiler = FilterCompiler::new();
        let (specs, alerts) = compiler.compile(&filters(&[("max-sample_size", "many")]));

        assert!(alerts.is_empty());
        assert_eq!(specs[0].op, FilterOp::Lte);
        assert_eq!(specs[0].store.value, StoreValue::Int(0));
        assert_eq!(specs[0].engine, "sample_size <= 0");
    }

    #[test]
    fn test_unknown_and_empty_filters_skipped() {
        let compiler = FilterCompiler::new();
        let (specs, alerts) = compiler.compile(&filters(&[
            ("sponsor", ""),
            ("favorite_color", "blue"),
            ("location", "Boston"),
        ]));

        assert!(alerts.is_empty());
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].field, "location");
    }

    #[test]
    fn test_human_date_formats() {
        let iso = parse_human_date("2021-06-01").unwrap();

        assert_eq!(parse_human_date("2021/06/01"), Some(iso));
        assert_eq!(parse_human_date("06/01/2021"), Some(iso));
        assert_eq!(parse_human_date("June 1, 2021"), Some(iso));
        assert_eq!(parse_human_date("1 June 2021"), Some(iso));
        assert_eq!(parse_human_date(" 2021-06-01 "), Some(iso));
        assert_eq!(parse_human_date("not a date"), None);
    }
}
