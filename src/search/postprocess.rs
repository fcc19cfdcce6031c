//! Result postprocessing: timestamp flattening, HTML escaping, summary
//! truncation, and stemming-aware highlighting.
//!
//! Order matters. Escaping must run on the raw value before highlighting
//! injects `<em>` markup; escaping afterwards would mangle the markup
//! itself. Records from either backend leave here in the same shape, so
//! downstream code never branches on result origin.

use regex::Regex;
use serde_json::Value;

use crate::error::{Result, TrialSearchError};

/// Fields eligible for highlighting.
pub const HIGHLIGHT_FIELDS: &[&str] = &[
    "title",
    "recruiting_status",
    "sex",
    "target_disease",
    "intervention",
    "sponsor",
    "summary",
    "location",
    "institution",
    "contact",
    "abandoned_reason",
];

/// The narrative field subject to truncation.
const SUMMARY_FIELD: &str = "summary";

/// Maximum summary length in characters, before the ellipsis marker.
const SUMMARY_MAX_CHARS: usize = 500;

const ELLIPSIS: &str = "...";

/// Wraps occurrences of highlight terms in emphasis markers.
///
/// The alternation pattern orders terms by descending length so a longer
/// term is always matched before any of its substrings: with terms
/// `{"trial", "trials"}`, the text `Trials ongoing` becomes
/// `<em>Trials</em> ongoing`, never `<em>Trial</em>s ongoing`. Matching is
/// case-insensitive and replacement preserves the matched casing.
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Regex,
}

impl Highlighter {
    /// Compile an alternation over `terms`; `None` when there is nothing
    /// to highlight.
    pub fn compile(terms: &[String]) -> Result<Option<Self>> {
        if terms.is_empty() {
            return Ok(None);
        }

        let mut ordered: Vec<&String> = terms.iter().collect();
        // Descending length so longer terms win over their substrings;
        // lexicographic tiebreak keeps the pattern deterministic.
        ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let alternation = ordered
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!("(?i)(?:{alternation})"))
            .map_err(|e| TrialSearchError::query(format!("invalid highlight pattern: {e}")))?;

        Ok(Some(Highlighter { pattern }))
    }

    /// Wrap every occurrence of any term in `<em>...</em>`.
    pub fn highlight(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &regex::Captures| {
                format!("<em>{}</em>", &caps[0])
            })
            .into_owned()
    }
}

/// Mutate raw backend records into the public response shape.
///
/// Highlighting runs only when a highlighter is supplied (the text-search
/// branch); everything else applies uniformly to both branches.
pub fn postprocess_records(records: &mut [Value], highlighter: Option<&Highlighter>) {
    for record in records.iter_mut() {
        let Value::Object(fields) = record else {
            continue;
        };

        flatten_timestamp(fields);

        for (_, value) in fields.iter_mut() {
            escape_value(value);
        }

        truncate_summary(fields);

        if let Some(highlighter) = highlighter {
            for field in HIGHLIGHT_FIELDS {
                if let Some(Value::String(text)) = fields.get_mut(*field) {
                    *text = highlighter.highlight(text);
                }
            }
        }
    }
}

/// Get a record's timestamp as a scalar, handling both the flattened form
/// and the store's nested `{"$date": n}` wrapper. Missing or malformed
/// timestamps sort as `-1`.
pub fn timestamp_of(record: &Value) -> i64 {
    scalar_timestamp(record.get("timestamp"))
}

fn scalar_timestamp(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(-1),
        Some(Value::Object(wrapper)) => wrapper
            .get("$date")
            .and_then(Value::as_i64)
            .unwrap_or(-1),
        _ => -1,
    }
}

/// Normalize the timestamp field to a scalar epoch integer.
fn flatten_timestamp(fields: &mut serde_json::Map<String, Value>) {
    let scalar = scalar_timestamp(fields.get("timestamp"));
    fields.insert("timestamp".to_string(), Value::from(scalar));
}

/// HTML-escape every string in a value, recursing through lists and
/// nested objects.
fn escape_value(value: &mut Value) {
    match value {
        Value::String(s) => *s = escape_html(s),
        Value::Array(items) => {
            for item in items {
                escape_value(item);
            }
        }
        Value::Object(fields) => {
            for (_, item) in fields.iter_mut() {
                escape_value(item);
            }
        }
        _ => {}
    }
}

/// Escape HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Cut an over-long summary at the character limit and append an ellipsis.
fn truncate_summary(fields: &mut serde_json::Map<String, Value>) {
    if let Some(Value::String(summary)) = fields.get_mut(SUMMARY_FIELD) {
        if summary.chars().count() > SUMMARY_MAX_CHARS {
            let mut cut: String = summary.chars().take(SUMMARY_MAX_CHARS).collect();
            cut.push_str(ELLIPSIS);
            *summary = cut;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_longer_term_wins_over_substring() {
        let terms = vec!["trial".to_string(), "trials".to_string()];
        let highlighter = Highlighter::compile(&terms).unwrap().unwrap();

        assert_eq!(
            highlighter.highlight("Trials ongoing"),
            "<em>Trials</em> ongoing"
        );
    }

    #[test]
    fn test_highlight_preserves_casing() {
        let terms = vec!["cancer".to_string()];
        let highlighter = Highlighter::compile(&terms).unwrap().unwrap();

        assert_eq!(
            highlighter.highlight("CANCER and cancer"),
            "<em>CANCER</em> and <em>cancer</em>"
        );
    }

    #[test]
    fn test_empty_terms_compile_to_none() {
        assert!(Highlighter::compile(&[]).unwrap().is_none());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x&y")</script>"#),
            "&lt;script&gt;alert(&quot;x&amp;y&quot;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_escaping_precedes_highlighting() {
        let mut records = vec![json!({"title": "<script>trial</script>"})];
        let terms = vec!["trial".to_string()];
        let highlighter = Highlighter::compile(&terms).unwrap().unwrap();

        postprocess_records(&mut records, Some(&highlighter));

        assert_eq!(
            records[0]["title"],
            "&lt;script&gt;<em>trial</em>&lt;/script&gt;"
        );
    }

    #[test]
    fn test_nested_values_escaped() {
        let mut records = vec![json!({
            "location": ["<b>Boston</b>", "Paris"],
            "contact": {"name": "A <i> B"},
        })];

        postprocess_records(&mut records, None);

        assert_eq!(records[0]["location"][0], "&lt;b&gt;Boston&lt;/b&gt;");
        assert_eq!(records[0]["location"][1], "Paris");
        assert_eq!(records[0]["contact"]["name"], "A &lt;i&gt; B");
    }

    #[test]
    fn test_timestamp_wrapper_flattened() {
        let mut records = vec![
            json!({"timestamp": {"$date": 1622505600}}),
            json!({"timestamp": 1622505600}),
            json!({"title": "no timestamp"}),
        ];

        postprocess_records(&mut records, None);

        assert_eq!(records[0]["timestamp"], 1622505600);
        assert_eq!(records[1]["timestamp"], 1622505600);
        assert_eq!(records[2]["timestamp"], -1);
    }

    #[test]
    fn test_timestamp_of_handles_both_shapes() {
        assert_eq!(timestamp_of(&json!({"timestamp": 5})), 5);
        assert_eq!(timestamp_of(&json!({"timestamp": {"$date": 7}})), 7);
        assert_eq!(timestamp_of(&json!({})), -1);
    }

    #[test]
    fn test_summary_truncated_with_ellipsis() {
        let long = "x".repeat(600);
        let mut records = vec![json!({"summary": long})];

        postprocess_records(&mut records, None);

        let summary = records[0]["summary"].as_str().unwrap();
        assert_eq!(summary.chars().count(), 503);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_short_summary_untouched() {
        let mut records = vec![json!({"summary": "brief"})];

        postprocess_records(&mut records, None);

        assert_eq!(records[0]["summary"], "brief");
    }
}
