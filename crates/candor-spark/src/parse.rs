//! Best-effort extraction of a structured verdict from model output.
//!
//! The classification prompt asks for exactly one JSON object, but
//! models wrap replies in prose or fences often enough that a salvage
//! pass is required. [`extract_json`] tries the whole text first, then
//! the span from the first `{` to the last `}` (greedy, newlines
//! allowed). [`coerce_label`] turns the classification field into an
//! exact 0/1, treating anything unusable as absent rather than an
//! error.

use serde_json::Value;
use thiserror::Error;

/// A classified parse failure. Unlike transport errors these are
/// terminal: a deterministic model produced this text once and a retry
/// would not meaningfully change it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// The response was empty or whitespace-only.
    #[error("empty_response")]
    EmptyResponse,

    /// No `{ ... }` span exists anywhere in the text.
    #[error("no_json_object_found")]
    NoJsonObjectFound,

    /// A span was found but did not parse; carries the parser's detail.
    #[error("json_parse_failed: {0}")]
    JsonParseFailed(String),
}

/// The structured result of one successfully parsed classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelVerdict {
    /// The model's free-text assessment.
    pub assessment: String,
    /// The coerced 0/1 label; `None` when the field was missing or
    /// malformed (absent, not an error).
    pub label: Option<u8>,
}

/// Extract one JSON value from raw response text.
///
/// Ordered attempts, first success wins:
///
/// 1. empty or whitespace-only text fails with `empty_response`
/// 2. the entire text as one value
/// 3. the span from the first `{` to the last `}`
///
/// Returns the text that was fed to the parser alongside the outcome,
/// so callers can record the extracted span even when parsing failed.
pub fn extract_json(text: &str) -> (String, Result<Value, ParseFailure>) {
    if text.trim().is_empty() {
        return (String::new(), Err(ParseFailure::EmptyResponse));
    }

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return (text.to_string(), Ok(value));
    }

    let Some(start) = text.find('{') else {
        return (text.to_string(), Err(ParseFailure::NoJsonObjectFound));
    };
    let Some(end) = text.rfind('}').filter(|end| *end > start) else {
        return (text.to_string(), Err(ParseFailure::NoJsonObjectFound));
    };

    let span = text[start..=end].trim().to_string();
    match serde_json::from_str::<Value>(&span) {
        Ok(value) => (span, Ok(value)),
        Err(e) => (span, Err(ParseFailure::JsonParseFailed(e.to_string()))),
    }
}

/// Coerce a classification field to exactly 0 or 1.
///
/// The value is rendered as text, trimmed, and parsed as an integer:
/// 1 maps to 1, any other integer to 0. A missing, null, or
/// non-integer value coerces to `None` (absent), which is distinct
/// from both 0 and a parse failure.
pub fn coerce_label(value: Option<&Value>) -> Option<u8> {
    let value = value?;
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    match text.trim().parse::<i64>() {
        Ok(1) => Some(1),
        Ok(_) => Some(0),
        Err(_) => None,
    }
}

/// Parse a full response into a [`ModelVerdict`].
///
/// Returns the extracted span alongside either the verdict or the
/// classified failure. The classification field is
/// `your_classification` and the assessment field is `assessment`;
/// a present object with neither field still succeeds, with an empty
/// assessment and an absent label.
pub fn verdict(text: &str) -> (String, Result<ModelVerdict, ParseFailure>) {
    let (extracted, parsed) = extract_json(text);
    let outcome = parsed.map(|value| ModelVerdict {
        assessment: value
            .get("assessment")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        label: coerce_label(value.get("your_classification")),
    });
    (extracted, outcome)
}
