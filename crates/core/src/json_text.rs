// crates/core/src/json_text.rs

//! Pull a JSON object out of free-form completion text.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

static FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("fence pattern is valid")
});

/// Return the outermost `{ ... }` span, looking inside a Markdown code fence
/// first when there is one.
pub fn object_span(text: &str) -> Option<&str> {
    let body = FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (end > start).then(|| &body[start..=end])
}

/// Parse the JSON object embedded in `text`.
pub fn parse_object<T: DeserializeOwned>(text: &str) -> Result<T> {
    let span = object_span(text).context("completion did not contain a JSON object")?;
    serde_json::from_str(span).context("completion JSON did not match the expected shape")
}
