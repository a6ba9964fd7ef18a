//! The parse-with-fallback ladder every provider-facing node uses: bare JSON, then a
//! fenced code block, then (where the caller allows it) the raw text itself (§4.4).

use ebs_llm::GenerateResponse;
use serde_json::Value;

/// Tries, in order: the response already being `Json`, a bare `serde_json::from_str`
/// over the raw text, then a ```json fenced block extracted from the text. Returns
/// `None` if all three fail, leaving the caller to apply its own default.
pub fn parse_json_with_fallback(response: &GenerateResponse) -> Option<Value> {
    if let GenerateResponse::Json(value) = response {
        return Some(value.clone());
    }

    let text = response.as_raw_text();
    if let Ok(value) = serde_json::from_str::<Value>(&text) {
        return Some(value);
    }

    extract_fenced_json(&text).and_then(|fenced| serde_json::from_str(&fenced).ok())
}

fn extract_fenced_json(text: &str) -> Option<String> {
    let start_marker = text.find("```json").map(|i| i + "```json".len())?;
    let rest = &text[start_marker..];
    let end = rest.find("```")?;
    Some(rest[..end].trim().to_string())
}

/// Rough token estimate (~1 token per 4 characters, mixed scripts) used by the
/// Judge Distiller's trigger condition (§4.5).
pub fn estimate_tokens(text: &str) -> u32 {
    ((text.chars().count() as f64) / 4.0).ceil() as u32
}
