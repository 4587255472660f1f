//! Tolerant parsing of the collaborator's raw response into JSON.
//!
//! The response should be a bare JSON object, but markdown code fences and
//! surrounding prose are common enough to warrant one repair attempt:
//! strip fences, and if the remainder still fails to parse, extract the
//! first `{...}` block and try that.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use medex_model::FreeformExtraction;

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("empty payload")]
    Empty,

    #[error("payload is not valid JSON")]
    InvalidJson(#[source] serde_json::Error),
}

/// Parses a raw response into a JSON value, repairing fenced or noisy
/// payloads where possible.
pub fn parse_payload(raw: &str) -> Result<Value, PayloadError> {
    let body = strip_fences(raw.trim());
    if body.is_empty() {
        return Err(PayloadError::Empty);
    }
    match serde_json::from_str(body) {
        Ok(value) => Ok(value),
        Err(err) => {
            if let Some(block) = object_block(body)
                && let Ok(value) = serde_json::from_str(block)
            {
                tracing::debug!("recovered JSON object from noisy payload");
                return Ok(value);
            }
            Err(PayloadError::InvalidJson(err))
        }
    }
}

/// Parses a raw response straight into the free-form extraction shape.
pub fn parse_extraction(raw: &str) -> Result<FreeformExtraction, PayloadError> {
    serde_json::from_value(parse_payload(raw)?).map_err(PayloadError::InvalidJson)
}

fn strip_fences(raw: &str) -> &str {
    let Some(rest) = raw.strip_prefix("```") else {
        return raw;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start();
    match rest.trim_end().strip_suffix("```") {
        Some(inner) => inner.trim_end(),
        None => rest,
    }
}

/// The outermost `{...}` span, first opening brace to last closing brace.
fn object_block(raw: &str) -> Option<&str> {
    static OBJECT: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("static pattern compiles"));
    OBJECT.find(raw).map(|found| found.as_str())
}
