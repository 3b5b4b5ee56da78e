//! Response sanitizer: recover a JSON object from free-text model output.
//!
//! Despite being told to return only JSON, models wrap the object in
//! ```` ```json ```` fences, prepend prose ("Here is the extracted data:"),
//! or indent it inconsistently. The recovery is a fixed sequence of string
//! rules applied to the outermost `{ … }` span:
//!
//! 1. Take the first `{` through the last `}` inclusive
//! 2. Remove every ```` ```json ```` marker, then every ```` ``` ````
//! 3. Replace each `\n\n` with `\n` (one left-to-right pass)
//! 4. Split on every line boundary (including `\r`, NEL and U+2028/U+2029),
//!    trim each line and rejoin with `\n`
//!
//! The span rule assumes a single object and no stray braces in the prose.
//! Two objects in one reply, or a `}` in trailing text, produce invalid JSON
//! and therefore a parse failure. Callers only use
//! [`recover_json_object`] / [`parse_extraction`], so a structured-output mode
//! can replace the heuristic without touching them.

use crate::document::DocumentType;
use crate::error::SanitizeError;
use crate::output::{ErrorRecord, ExtractedRecord, ImageRecord};
use serde_json::{Map, Value};
use tracing::warn;

/// Prefix of the `error` message on parse-failure records.
pub const PARSE_FAILURE_PREFIX: &str = "Failed to parse response: ";

/// Apply the recovery rules and return the cleaned JSON text.
///
/// Fails with [`SanitizeError::NoJsonObject`] when the reply has no `{` or no
/// `}`. When the last `}` precedes the first `{` the span is empty and the
/// subsequent parse fails instead.
pub fn clean_json_response(response: &str) -> Result<String, SanitizeError> {
    let (start, end) = match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) => (start, end),
        _ => return Err(SanitizeError::NoJsonObject),
    };

    let span = if end >= start {
        &response[start..=end]
    } else {
        ""
    };

    let unfenced = span.replace("```json", "").replace("```", "");
    let collapsed = unfenced.replace("\n\n", "\n");

    Ok(split_lines(&collapsed)
        .into_iter()
        .map(|line| line.trim_matches(is_strip_char))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Line boundaries: `\n`, `\r`, `\r\n` (one break), vertical tab, form feed,
/// the file/group/record separators, NEL and the Unicode line and paragraph
/// separators.
fn is_line_boundary(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Characters stripped from both ends of a line: Unicode whitespace plus the
/// four ASCII information separators.
fn is_strip_char(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}

/// Split on every line boundary. A trailing boundary does not produce an
/// empty last line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !is_line_boundary(c) {
            continue;
        }
        lines.push(&text[start..idx]);
        let mut next = idx + c.len_utf8();
        if c == '\r' {
            if let Some(&(_, '\n')) = chars.peek() {
                chars.next();
                next += 1;
            }
        }
        start = next;
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Recover and parse the JSON object embedded in `response`.
pub fn recover_json_object(response: &str) -> Result<Map<String, Value>, SanitizeError> {
    let cleaned = clean_json_response(response)?;
    serde_json::from_str(&cleaned).map_err(|e| SanitizeError::InvalidJson(e.to_string()))
}

/// Turn an extraction reply into the record stored for the image.
///
/// On success the parsed object gets `document_type` stamped on. Template
/// mismatches are logged but do not fail the record. On failure the record
/// keeps the untouched reply in `raw_response`.
pub fn parse_extraction(response: &str, document_type: &DocumentType) -> ImageRecord {
    match recover_json_object(response) {
        Ok(fields) => {
            let record = ExtractedRecord::new(fields, document_type);
            if let Some(template) = document_type.template() {
                let missing = record.missing_fields(template);
                let extra = record.extra_fields(template);
                if !missing.is_empty() || !extra.is_empty() {
                    warn!(
                        "{} reply deviates from template: missing {:?}, extra {:?}",
                        document_type, missing, extra
                    );
                }
            }
            record.into()
        }
        Err(e) => ErrorRecord::parse_failure(
            format!("{PARSE_FAILURE_PREFIX}{e}"),
            response,
            document_type,
        )
        .into(),
    }
}
