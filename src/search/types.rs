//! Request and response types for the search pipeline.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed number of records per page.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Sentinel page value meaning "the last page has already been returned".
pub const LAST_PAGE: i64 = -1;

/// A client-supplied search request, constructed once per request.
#[derive(Debug, Clone, Default)]
pub struct RawQuery {
    /// Free-text query, possibly empty and possibly carrying directives.
    pub q: String,
    /// Requested page number, always >= 1.
    pub page: u32,
    /// Raw filter-field name -> raw string value. Allow-listing happens in
    /// the filter compiler.
    pub filters: BTreeMap<String, String>,
}

impl RawQuery {
    /// Build a request from HTTP query parameters.
    ///
    /// A malformed or missing `page` defaults to 1; every parameter other
    /// than `q` and `page` is treated as a candidate filter.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let q = params.get("q").cloned().unwrap_or_default();
        let page = params
            .get("page")
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let filters = params
            .iter()
            .filter(|(key, _)| key.as_str() != "q" && key.as_str() != "page")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        RawQuery { q, page, filters }
    }
}

/// Severity of an [`Alert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Warning,
    Error,
}

/// A recoverable condition surfaced to the client in the JSON payload.
///
/// Alerts cover dropped filters and empty first pages. Fatal conditions
/// (backend failures) never ride in alerts; they become HTTP errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    /// Create a warning alert.
    pub fn warning<S: Into<String>>(message: S) -> Self {
        Alert {
            kind: AlertKind::Warning,
            message: message.into(),
        }
    }

    /// Create an error alert.
    pub fn error<S: Into<String>>(message: S) -> Self {
        Alert {
            kind: AlertKind::Error,
            message: message.into(),
        }
    }
}

/// The JSON response contract of the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Page number echoed back, or [`LAST_PAGE`] when no further pages exist.
    pub page: i64,
    /// Postprocessed trial records.
    pub papers: Vec<Value>,
    /// Human-readable summary assembled from whatever of total-hit count
    /// and query time is available.
    pub stats: String,
    /// Recoverable conditions encountered while serving the request.
    pub alerts: Vec<Alert>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_raw_query_defaults() {
        let raw = RawQuery::from_params(&params(&[]));

        assert_eq!(raw.q, "");
        assert_eq!(raw.page, 1);
        assert!(raw.filters.is_empty());
    }

    #[test]
    fn test_malformed_page_defaults_to_one() {
        for bad in ["abc", "-3", "0", "1.5", ""] {
            let raw = RawQuery::from_params(&params(&[("page", bad)]));
            assert_eq!(raw.page, 1, "page={bad:?}");
        }
    }

    #[test]
    fn test_filters_exclude_q_and_page() {
        let raw = RawQuery::from_params(&params(&[
            ("q", "cancer"),
            ("page", "2"),
            ("sponsor", "NIH"),
        ]));

        assert_eq!(raw.q, "cancer");
        assert_eq!(raw.page, 2);
        assert_eq!(raw.filters.get("sponsor").map(String::as_str), Some("NIH"));
        assert!(!raw.filters.contains_key("q"));
        assert!(!raw.filters.contains_key("page"));
    }

    #[test]
    fn test_alert_serialization() {
        let alert = Alert::warning("no results");
        let json = serde_json::to_value(&alert).unwrap();

        assert_eq!(json["type"], "warning");
        assert_eq!(json["message"], "no results");
    }
}
