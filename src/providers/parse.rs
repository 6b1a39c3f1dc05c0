//! Lenient JSON extraction from model output.
//!
//! Models asked for "a single JSON object" still wrap it in Markdown
//! fences or add a sentence around it. [`parse_model_json`] undoes the
//! common wrappings; when nothing parses, callers substitute
//! [`fallback_classification`] instead of failing the cycle.

use serde_json::{Map, Value, json};

/// Task name used when the model output could not be parsed.
pub const FALLBACK_TASK: &str = "Unknown Task";

/// Confidence used when the model output could not be parsed.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Why a model response could not be turned into a JSON object.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseFailure {
    #[error("model output is empty")]
    Empty,
    #[error("model output is not JSON: {0}")]
    Syntax(String),
    #[error("model output is JSON but not an object")]
    NotAnObject,
}

/// Parse model output into a JSON object.
///
/// Trims, strips a surrounding code fence, then parses. If that fails the
/// outermost `{ ... }` slice is tried before giving up.
pub fn parse_model_json(raw: &str) -> Result<Map<String, Value>, ParseFailure> {
    let cleaned = strip_code_fences(raw.trim());
    if cleaned.is_empty() {
        return Err(ParseFailure::Empty);
    }

    let parsed = match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => value,
        Err(first) => match outermost_object(cleaned) {
            Some(slice) => serde_json::from_str::<Value>(slice)
                .map_err(|_| ParseFailure::Syntax(first.to_string()))?,
            None => return Err(ParseFailure::Syntax(first.to_string())),
        },
    };

    match parsed {
        Value::Object(map) => Ok(map),
        _ => Err(ParseFailure::NotAnObject),
    }
}

/// Remove a Markdown code fence (```` ``` ```` or ```` ```json ````) wrapping the text.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") up to the first newline.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Object returned in place of an unparseable classification.
pub fn fallback_classification(raw: &str) -> Value {
    json!({
        "task": FALLBACK_TASK,
        "confidence": FALLBACK_CONFIDENCE,
        "description": raw,
        "project": "default",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_object() {
        let map = parse_model_json(r#"{"task":"Research","confidence":0.9}"#).unwrap();
        assert_eq!(map["task"], "Research");
    }

    #[test]
    fn fenced_object() {
        let raw = "```json\n{\"task\": \"Design Work\"}\n```";
        let map = parse_model_json(raw).unwrap();
        assert_eq!(map["task"], "Design Work");

        let raw = "```\n{\"task\": \"Design Work\"}\n```";
        assert!(parse_model_json(raw).is_ok());
    }

    #[test]
    fn object_embedded_in_prose() {
        let raw = "Here is the classification: {\"task\": \"Research\", \"project\": \"p1\"} Hope it helps.";
        let map = parse_model_json(raw).unwrap();
        assert_eq!(map["project"], "p1");
    }

    #[test]
    fn prose_is_a_syntax_failure() {
        let err = parse_model_json("Sorry, I cannot help with that.").unwrap_err();
        assert!(matches!(err, ParseFailure::Syntax(_)));
    }

    #[test]
    fn non_object_rejected() {
        assert_eq!(parse_model_json("[1, 2]"), Err(ParseFailure::NotAnObject));
        assert_eq!(parse_model_json("   "), Err(ParseFailure::Empty));
    }

    #[test]
    fn fallback_keeps_raw_text() {
        let value = fallback_classification("Sorry, I cannot help with that.");
        assert_eq!(value["task"], "Unknown Task");
        assert_eq!(value["confidence"], 0.5);
        assert_eq!(value["description"], "Sorry, I cannot help with that.");
        assert_eq!(value["project"], "default");
    }
}
