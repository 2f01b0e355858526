//! Recovery of JSON objects from free-form LLM output
//!
//! Models asked for "only JSON" still wrap it in markdown fences, prepend
//! commentary or leave trailing commas. Strategies are tried in order and the
//! first successful parse wins.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{Error, Result};

/// Maximum characters of offending output written to logs
const LOG_EXCERPT_CHARS: usize = 500;

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json|JSON)?\s*([\s\S]*?)```").expect("Invalid regex"));
static OUTER_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("Invalid regex"));
static TRAILING_COMMA_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*\}").expect("Invalid regex"));
static TRAILING_COMMA_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*\]").expect("Invalid regex"));

/// Extract a JSON value from raw model text
pub fn extract_json(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Err(Error::invalid_response("Empty response from LLM"));
    }

    // 1. Direct parse
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        return Ok(value);
    }

    // 2. Markdown code fence
    if let Some(inner) = FENCE.captures(text).and_then(|c| c.get(1)) {
        if let Ok(value) = serde_json::from_str::<Value>(inner.as_str().trim()) {
            return Ok(value);
        }
    }

    // 3. Outermost { ... } span
    let Some(span) = OUTER_OBJECT.find(text) else {
        tracing::error!("No JSON found in LLM response: {}", excerpt(text));
        return Err(Error::invalid_response("No JSON found in LLM response"));
    };
    if let Ok(value) = serde_json::from_str::<Value>(span.as_str()) {
        return Ok(value);
    }

    // 4. Same span with control characters and trailing commas removed
    let cleaned = clean_json(span.as_str());
    serde_json::from_str::<Value>(&cleaned).map_err(|e| {
        tracing::error!("Failed to parse extracted JSON ({}): {}", e, excerpt(span.as_str()));
        Error::invalid_response("Invalid JSON in LLM response")
    })
}

/// Drop control characters (other than whitespace) and trailing commas
fn clean_json(span: &str) -> String {
    let stripped: String = span
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect();
    let stripped = TRAILING_COMMA_OBJECT.replace_all(&stripped, "}");
    TRAILING_COMMA_ARRAY.replace_all(&stripped, "]").into_owned()
}

/// Truncate text for log output on a character boundary
pub fn excerpt(text: &str) -> String {
    match text.char_indices().nth(LOG_EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
