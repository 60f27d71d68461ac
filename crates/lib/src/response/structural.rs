//! # Structural Extractor
//!
//! Obtains a parseable JSON object from raw model text: strip markdown
//! fences, sanitize, parse; then retry on the outermost `{...}` span, then
//! after an aggressive cleanup pass, and finally hand the text to the
//! partial-data extractor.

use super::partial::{extract_partial, PartialData};
use super::sanitize::{balance_brackets, remove_trailing_commas, sanitize};
use crate::errors::ResponseError;
use crate::types::{OperationKind, Record};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::debug;

/// How many element boundaries truncation repair backs off. A cut-off
/// document is missing at most its last member and that member's key.
const MAX_BACKOFF: usize = 2;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)(?:```|\z)").expect("valid regex")
});
static FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_-]*").expect("valid regex"));
static FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```\s*$").expect("valid regex"));

static ANY_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static ADJACENT_STRINGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)"\s+"([^"]*)"(\s*:)?"#).expect("valid regex"));
static MISSING_COMMA_BEFORE_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([0-9\]}]|true|false|null)\s+("[^"]+"\s*:)"#).expect("valid regex")
});
static ADJACENT_OBJECTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\}\s*\{").expect("valid regex"));
static REPEATED_COMMAS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*,").expect("valid regex"));
static LEADING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\[{])\s*,").expect("valid regex"));

/// Which step of the extractor produced the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// The fence-stripped, sanitized text parsed as-is.
    Direct,
    /// The outermost `{...}` span parsed after discarding surrounding prose.
    Sliced,
    /// The span parsed only after [`aggressive_cleanup`].
    Aggressive,
    /// No parse succeeded; fields were recovered by the partial extractor.
    Partial,
}

/// A record obtained by [`extract_structured`].
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub record: Record,
    pub method: ExtractionMethod,
}

/// Removes markdown code fences, with or without a language tag.
///
/// When prose precedes a fenced block only the block's body is kept.
pub fn strip_markdown_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.contains("```") {
        return trimmed.to_string();
    }
    if let Some(caps) = FENCED_BLOCK.captures(trimmed) {
        let body = caps[1].trim();
        if !body.is_empty() {
            return body.to_string();
        }
    }
    let without_open = FENCE_OPEN.replace(trimmed, "");
    FENCE_CLOSE
        .replace(without_open.trim(), "")
        .trim()
        .to_string()
}

/// Returns the text between the first `{` and the last `}`, inclusive.
pub fn outer_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Closes a document that was cut off mid-object.
///
/// Closing the open brackets is tried first. When that still does not parse
/// (the cut landed inside a key or right after a colon), the text is cut
/// back to the last element boundaries and closed again. Text that needed no
/// closers was not cut off and is never shortened.
pub fn repair_truncated_json(text: &str) -> String {
    let balanced = balance_brackets(text);
    let truncated = balanced.len() != text.len();
    let closed = remove_trailing_commas(&balanced);
    if !truncated || serde_json::from_str::<Value>(&closed).is_ok() {
        return closed;
    }
    for cut in element_boundaries(text).into_iter().rev().take(MAX_BACKOFF) {
        let candidate = remove_trailing_commas(&balance_brackets(&text[..cut]));
        if serde_json::from_str::<Value>(&candidate).is_ok() {
            debug!("Truncation repair backed off to byte {cut}");
            return candidate;
        }
    }
    closed
}

/// Byte offsets of commas that sit outside string literals.
fn element_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for (index, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            ',' => boundaries.push(index),
            _ => {}
        }
    }
    boundaries
}

/// A harder cleanup pass for text the plain sanitizer could not fix.
///
/// Flattens all whitespace, rejoins a string that was broken into adjacent
/// literals, inserts commas the model dropped between members, removes
/// misplaced commas, then sanitizes.
pub fn aggressive_cleanup(text: &str) -> String {
    let mut cleaned = ANY_WHITESPACE.replace_all(text, " ").into_owned();

    for _ in 0..8 {
        let next = ADJACENT_STRINGS
            .replace_all(&cleaned, |caps: &Captures| match caps.get(3) {
                // The second literal is a key: a comma went missing.
                Some(colon) => format!("\"{}\", \"{}\"{}", &caps[1], &caps[2], colon.as_str()),
                None => format!("\"{} {}\"", caps[1].trim_end(), caps[2].trim_start()),
            })
            .into_owned();
        if next == cleaned {
            break;
        }
        cleaned = next;
    }

    let cleaned = MISSING_COMMA_BEFORE_KEY.replace_all(&cleaned, "${1}, ${2}");
    let cleaned = ADJACENT_OBJECTS.replace_all(&cleaned, "}, {");
    let cleaned = REPEATED_COMMAS.replace_all(&cleaned, ",");
    let cleaned = LEADING_COMMA.replace_all(&cleaned, "${1}");
    sanitize(&repair_truncated_json(&cleaned))
}

/// Parses `text` into a record. Top-level arrays are wrapped as `{"items": [...]}`.
pub(crate) fn parse_record(text: &str) -> Result<Record, ResponseError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(Value::Array(items)) if items.iter().all(Value::is_object) && !items.is_empty() => {
            let mut record = Record::new();
            record.insert("items".to_string(), Value::Array(items));
            Ok(record)
        }
        Ok(_) => Err(ResponseError::NotAnObject),
        Err(e) => Err(ResponseError::parse("json_parse", e)),
    }
}

/// Runs the structural cascade over raw model text.
///
/// Returns the first record any step produces. Never synthesizes a fallback:
/// when every step fails the error names the last strategy attempted.
pub fn extract_structured(text: &str, kind: &OperationKind) -> Result<Extracted, ResponseError> {
    let stripped = strip_markdown_fences(text);
    if stripped.is_empty() {
        return Err(ResponseError::EmptyInput);
    }

    let sanitized = sanitize(&stripped);
    match parse_record(&sanitized) {
        Ok(record) => {
            return Ok(Extracted {
                record,
                method: ExtractionMethod::Direct,
            })
        }
        Err(e) => debug!("Direct parse failed: {e}"),
    }

    let span = outer_object_span(&sanitized);
    let mut last_error = String::from("no JSON object found in response");

    if let Some(slice) = span {
        match parse_record(slice) {
            Ok(record) => {
                return Ok(Extracted {
                    record,
                    method: ExtractionMethod::Sliced,
                })
            }
            Err(e) => debug!("Sliced parse failed: {e}"),
        }

        match parse_record(&aggressive_cleanup(slice)) {
            Ok(record) => {
                return Ok(Extracted {
                    record,
                    method: ExtractionMethod::Aggressive,
                })
            }
            Err(e) => {
                debug!("Aggressive cleanup parse failed: {e}");
                last_error = e.to_string();
            }
        }
    }

    match extract_partial(span.unwrap_or(&stripped), kind) {
        PartialData::Found(record) => Ok(Extracted {
            record,
            method: ExtractionMethod::Partial,
        }),
        PartialData::Empty { reason } => Err(ResponseError::parse(
            "partial_extraction",
            format!("{reason} (after {last_error})"),
        )),
    }
}
