//! Embedded query directives.
//!
//! Free text may carry directives of the shape `directive:value`, where the
//! value is a double-quoted phrase, a single-quoted phrase, or a bare
//! token (`mindate:"2020-01-01"`, `maxdate:'June 2021'`,
//! `mindate:2020-01-01`). Each recognized directive is cut out of the query
//! and recorded as a filter override.
//!
//! This is a best-effort scan over a small, explicit rule list, not a
//! strict grammar: unrecognized text is left alone and an absent directive
//! is not an error.

use std::collections::BTreeMap;

use regex::Regex;

use crate::error::{Result, TrialSearchError};

/// One directive rule: a pattern and the filter key its value overrides.
#[derive(Debug)]
struct DirectiveRule {
    pattern: Regex,
    target: &'static str,
}

/// Directive names and the filter keys they override, in scan order.
const DIRECTIVES: &[(&str, &str)] = &[("mindate", "min-timestamp"), ("maxdate", "max-timestamp")];

/// Extracts embedded directives from raw query text.
#[derive(Debug)]
pub struct CommandParser {
    rules: Vec<DirectiveRule>,
}

impl CommandParser {
    /// Create a parser for the fixed directive set.
    pub fn new() -> Result<Self> {
        let rules = DIRECTIVES
            .iter()
            .map(|(name, target)| {
                // Three value alternatives: double-quoted, single-quoted,
                // bare token.
                let pattern = format!(r#"{name}:(?:"([^"]*)"|'([^']*)'|([^\s"']\S*))"#);
                let pattern = Regex::new(&pattern).map_err(|e| {
                    TrialSearchError::query(format!("invalid directive pattern: {e}"))
                })?;
                Ok(DirectiveRule { pattern, target })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CommandParser { rules })
    }

    /// Scan `query` for directives.
    ///
    /// Returns the query with every matched directive span removed (and the
    /// result trimmed), plus the extracted overrides keyed by filter name.
    /// When the same override key is hit more than once, the last match
    /// wins. A match whose captured value is empty removes the span but
    /// records nothing.
    pub fn parse(&self, query: &str) -> (String, BTreeMap<String, String>) {
        let mut overrides = BTreeMap::new();
        let mut stripped = query.to_string();

        for rule in &self.rules {
            stripped = rule
                .pattern
                .replace_all(&stripped, |caps: &regex::Captures| {
                    let value = caps
                        .get(1)
                        .or_else(|| caps.get(2))
                        .or_else(|| caps.get(3))
                        .map(|m| m.as_str())
                        .unwrap_or("");
                    if !value.is_empty() {
                        overrides.insert(rule.target.to_string(), value.to_string());
                    }
                    ""
                })
                .into_owned();
        }

        (stripped.trim().to_string(), overrides)
    }
}
