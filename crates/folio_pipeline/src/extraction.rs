//! Structured data extraction from model responses.
//!
//! Models wrap JSON in markdown fences or surround it with commentary. These
//! helpers locate the JSON payload and deserialize it, reporting anything
//! unusable as a malformed response.

use folio_error::{FolioResult, ProviderError, ProviderErrorKind};
use serde::de::DeserializeOwned;

/// Extract a JSON object or array from a response that may contain markdown or extra text.
///
/// Tries a fenced ```` ```json ```` block first, then whichever balanced
/// `{...}` or `[...]` structure starts earliest.
///
/// # Errors
///
/// Returns `MalformedResponse` if no JSON structure is present.
///
/// # Examples
///
/// ```
/// use folio_pipeline::extract_json;
///
/// let response = "Here you go:\n```json\n{\"summary\": \"The storm breaks.\"}\n```";
/// assert_eq!(extract_json(response).unwrap(), "{\"summary\": \"The storm breaks.\"}");
///
/// let bare = "Chapters follow. [{\"index\": 1}] Hope that helps!";
/// assert_eq!(extract_json(bare).unwrap(), "[{\"index\": 1}]");
/// ```
pub fn extract_json(response: &str) -> FolioResult<String> {
    if let Some(json) = extract_from_code_block(response) {
        return Ok(json);
    }

    let bracket_pos = response.find('[');
    let brace_pos = response.find('{');
    let found = match (bracket_pos, brace_pos) {
        (Some(b), Some(c)) if b < c => {
            extract_balanced(response, '[', ']').or_else(|| extract_balanced(response, '{', '}'))
        }
        (Some(_), None) => extract_balanced(response, '[', ']'),
        _ => extract_balanced(response, '{', '}').or_else(|| extract_balanced(response, '[', ']')),
    };

    found.ok_or_else(|| {
        tracing::warn!(response_length = response.len(), "No JSON found in model response");
        ProviderError::new(ProviderErrorKind::MalformedResponse(format!(
            "no JSON found in response (length: {})",
            response.len()
        )))
        .into()
    })
}

/// Extract and deserialize JSON from a model response.
///
/// # Errors
///
/// Returns `MalformedResponse` if no JSON is present or it does not match `T`.
pub fn parse_json<T: DeserializeOwned>(response: &str) -> FolioResult<T> {
    let json = extract_json(response)?;
    serde_json::from_str(&json).map_err(|e| {
        ProviderError::new(ProviderErrorKind::MalformedResponse(format!(
            "response JSON did not match the expected shape: {e}"
        )))
        .into()
    })
}

fn extract_from_code_block(response: &str) -> Option<String> {
    let (content_start, fenced) = match response.find("```json") {
        Some(start) => (start + "```json".len(), true),
        None => (response.find("```")? + 3, false),
    };
    // An unlabelled fence may still carry a language tag on its first line.
    let body_start = if fenced {
        content_start
    } else {
        response[content_start..]
            .find('\n')
            .map(|n| content_start + n + 1)
            .unwrap_or(content_start)
    };
    let body = match response[body_start..].find("```") {
        Some(end) => &response[body_start..body_start + end],
        None => &response[body_start..],
    };
    let body = body.trim();
    (body.starts_with('{') || body.starts_with('[')).then(|| body.to_string())
}

fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(response[start..start + i + c.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}
