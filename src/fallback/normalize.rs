//! Result normalization.
//!
//! Every tier answers in its own shape; this module turns all of them into
//! one canonical `{ text, citations }` pair right at the tier boundary.

use serde_json::{Map, Value};

use crate::fallback::error::AttemptError;
use crate::fallback::tier::{EvidenceCitation, SearchHit, TierResponse};

/// Canonical successful result of one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResult {
    pub text: String,
    pub citations: Vec<EvidenceCitation>,
    /// Whether the payload arrived in the expected structured form.
    pub structured: bool,
}

/// Object keys that hold the answer text directly.
const TEXT_KEYS: &[&str] = &["text", "answer", "content", "output_text", "result", "summary"];

/// Object keys that hold a list of sources.
const CITATION_KEYS: &[&str] = &["citations", "sources", "references", "search_results"];

/// Normalize a tier response, failing when it carries no usable text.
pub fn normalize(response: TierResponse) -> Result<NormalizedResult, AttemptError> {
    match response {
        TierResponse::Research { answer, citations } => {
            let text = non_empty(&answer)
                .ok_or_else(|| AttemptError::validation("research answer is empty"))?;
            Ok(NormalizedResult {
                text,
                citations,
                structured: true,
            })
        }
        TierResponse::General { json } => from_json(&json)
            .ok_or_else(|| AttemptError::validation("no answer text in structured payload")),
        TierResponse::Search { results } => from_search(results),
        TierResponse::Text(body) => from_text(&body),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn from_json(json: &Value) -> Option<NormalizedResult> {
    let text = extract_text(json)?;
    Some(NormalizedResult {
        text,
        citations: extract_citations(json),
        structured: true,
    })
}

fn from_search(results: Vec<SearchHit>) -> Result<NormalizedResult, AttemptError> {
    if results.is_empty() {
        return Err(AttemptError::validation("search returned no results"));
    }

    let mut lines = Vec::with_capacity(results.len());
    let mut citations = Vec::with_capacity(results.len());
    for (i, hit) in results.into_iter().enumerate() {
        let line = match hit.snippet.as_deref().and_then(non_empty) {
            Some(snippet) => format!("{}. {}: {} ({})", i + 1, hit.title, snippet, hit.url),
            None => format!("{}. {} ({})", i + 1, hit.title, hit.url),
        };
        lines.push(line);
        citations.push(EvidenceCitation::new(hit.title, hit.url));
    }

    Ok(NormalizedResult {
        text: lines.join("\n"),
        citations,
        structured: true,
    })
}

fn from_text(body: &str) -> Result<NormalizedResult, AttemptError> {
    let trimmed = strip_code_fence(body.trim());
    if trimmed.is_empty() {
        return Err(AttemptError::validation("empty response body"));
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        let json: Value = serde_json::from_str(trimmed)
            .map_err(|e| AttemptError::json(format!("malformed JSON body: {e}")))?;
        return from_json(&json)
            .ok_or_else(|| AttemptError::validation("no answer text in JSON body"));
    }

    // Prose instead of the structured payload: usable, but not well-formed.
    Ok(NormalizedResult {
        text: trimmed.to_string(),
        citations: Vec::new(),
        structured: false,
    })
}

/// Drop a surrounding markdown code fence (```json ... ```).
fn strip_code_fence(body: &str) -> &str {
    let Some(rest) = body.strip_prefix("```") else {
        return body;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Pull the answer text out of the common provider shapes.
pub fn extract_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Array(items) => join_parts(items),
        Value::Object(map) => {
            for key in TEXT_KEYS {
                if let Some(text) = map.get(*key).and_then(extract_text) {
                    return Some(text);
                }
            }

            // OpenAI-style chat completions.
            if let Some(choice) = map.get("choices").and_then(|c| c.get(0)) {
                if let Some(text) = choice
                    .pointer("/message/content")
                    .or_else(|| choice.get("text"))
                    .and_then(extract_text)
                {
                    return Some(text);
                }
            }

            // Gemini-style candidates.
            if let Some(parts) = map
                .get("candidates")
                .and_then(|c| c.pointer("/0/content/parts"))
                .and_then(Value::as_array)
            {
                if let Some(text) = join_parts(parts) {
                    return Some(text);
                }
            }

            // Responses-style output items.
            if let Some(items) = map.get("output").and_then(Value::as_array) {
                let content: Vec<Value> = items
                    .iter()
                    .filter_map(|item| item.get("content").and_then(Value::as_array))
                    .flatten()
                    .cloned()
                    .collect();
                if let Some(text) = join_parts(&content) {
                    return Some(text);
                }
            }

            map.get("data").and_then(extract_text)
        }
        _ => None,
    }
}

fn join_parts(parts: &[Value]) -> Option<String> {
    let texts: Vec<&str> = parts
        .iter()
        .filter_map(|part| match part {
            Value::String(s) => Some(s.as_str()),
            other => other.get("text").and_then(Value::as_str),
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    (!texts.is_empty()).then(|| texts.join("\n"))
}

/// Pull cited sources out of a structured payload.
pub fn extract_citations(value: &Value) -> Vec<EvidenceCitation> {
    let Some(map) = value.as_object() else {
        return Vec::new();
    };

    CITATION_KEYS
        .iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_array))
        .flatten()
        .filter_map(citation_from)
        .collect()
}

fn citation_from(item: &Value) -> Option<EvidenceCitation> {
    match item {
        Value::String(url) => non_empty(url).map(|url| EvidenceCitation::new("", url)),
        Value::Object(obj) => {
            let title = str_field(obj, &["title", "name"]);
            let url = str_field(obj, &["url", "link", "uri"]);
            if title.is_empty() && url.is_empty() {
                None
            } else {
                Some(EvidenceCitation::new(title, url))
            }
        }
        _ => None,
    }
}

fn str_field(obj: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}
