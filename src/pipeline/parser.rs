//! Recovery parsing for model replies.
//!
//! The extraction prompt asks for "valid JSON only", but replies routinely
//! arrive wrapped in markdown fences, prefixed with prose, or as a refusal
//! with no JSON at all. Normalization walks a ladder of progressively more
//! forgiving strategies and only gives up after all of them miss, at which
//! point the caller gets the reply back verbatim in a failure payload.

use super::types::{ExtractionFailure, ExtractionOutcome, StructuredRecord};

/// Normalize a raw model reply into a structured record.
///
/// Strategies, in order: strict parse of the whole reply, content of a
/// json-tagged code fence, content of a generic code fence, then the
/// outermost `{..}` span of the fence-stripped text. Every strategy
/// accepts only a top-level JSON object; anything else falls through.
pub fn normalize_extraction(raw: &str) -> ExtractionOutcome {
    // Happy path: the reply is bare JSON.
    if let Some(record) = parse_object(raw.trim()) {
        return ExtractionOutcome::Record(record);
    }

    // Models wrap JSON in a fence even when told not to.
    let stripped = fenced_block(raw, "json").or_else(|| fenced_block(raw, ""));
    if let Some(body) = stripped {
        if let Some(record) = parse_object(body) {
            return ExtractionOutcome::Record(record);
        }
    }

    // Last resort: widest brace span of whatever is left.
    let candidate = stripped.unwrap_or(raw);
    if let Some(span) = outer_brace_span(candidate) {
        if let Some(record) = parse_object(span) {
            return ExtractionOutcome::Record(record);
        }
    }

    ExtractionOutcome::Failure(ExtractionFailure::unparsed(raw))
}

/// Strict parse that accepts only a top-level object.
fn parse_object(text: &str) -> Option<StructuredRecord> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Content of the first code fence opened with the given tag, trimmed.
///
/// An unclosed fence runs to the end of the text.
fn fenced_block<'a>(raw: &'a str, tag: &str) -> Option<&'a str> {
    let marker = format!("```{tag}");
    let start = raw.find(&marker)? + marker.len();
    let rest = &raw[start..];
    let body = match rest.find("```") {
        Some(end) => &rest[..end],
        None => rest,
    };
    Some(body.trim())
}

/// Slice from the first `{` to the last `}`, if both exist in order.
fn outer_brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
