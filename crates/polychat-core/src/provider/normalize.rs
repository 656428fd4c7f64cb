//! Helpers shared by every provider normalizer.
//!
//! Upstream error bodies come in many shapes. [`extract_error_message`]
//! picks the most specific message available, in this order:
//!
//! 1. `error.message` in a JSON body
//! 2. top-level `message` in a JSON body
//! 3. the raw body text
//! 4. the transport-level error text
//! 5. `"Unknown error"`

use serde_json::Value;

use polychat_types::provider::ProviderId;

const UNKNOWN_ERROR: &str = "Unknown error";

/// Pick the most specific error message from an upstream failure.
pub fn extract_error_message(body: Option<&str>, transport: Option<&str>) -> String {
    if let Some(raw) = body.map(str::trim).filter(|b| !b.is_empty()) {
        if let Ok(json) = serde_json::from_str::<Value>(raw) {
            if let Some(msg) = json_error_message(&json) {
                return msg;
            }
        }
        return raw.to_string();
    }

    transport
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

/// `error.message` first, then `message`. A bare string `error` field is
/// accepted as well since several providers answer `{"error": "..."}`.
fn json_error_message(json: &Value) -> Option<String> {
    let nested = json
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str);
    let flat_error = json.get("error").and_then(Value::as_str);
    let top = json.get("message").and_then(Value::as_str);

    nested
        .or(top)
        .or(flat_error)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// The provider's text, or its placeholder when the answer had no content.
pub fn reply_or_placeholder(provider: ProviderId, text: Option<String>) -> String {
    match text {
        Some(t) if !t.trim().is_empty() => t,
        _ => provider.empty_reply_placeholder(),
    }
}

/// First `max_chars` characters, for log previews.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_error_message_wins() {
        let body = r#"{"error":{"message":"Invalid key","type":"auth"},"message":"outer"}"#;
        assert_eq!(extract_error_message(Some(body), Some("transport")), "Invalid key");
    }

    #[test]
    fn top_level_message_second() {
        let body = r#"{"message":"quota exceeded"}"#;
        assert_eq!(extract_error_message(Some(body), None), "quota exceeded");
    }

    #[test]
    fn raw_body_third() {
        assert_eq!(
            extract_error_message(Some("Bad Gateway"), Some("transport")),
            "Bad Gateway"
        );
        // JSON without any message field falls back to the raw text
        assert_eq!(
            extract_error_message(Some(r#"{"code":42}"#), None),
            r#"{"code":42}"#
        );
    }

    #[test]
    fn transport_fourth() {
        assert_eq!(
            extract_error_message(Some("  "), Some("connection refused")),
            "connection refused"
        );
    }

    #[test]
    fn unknown_last() {
        assert_eq!(extract_error_message(None, None), "Unknown error");
    }

    #[test]
    fn flat_string_error() {
        assert_eq!(
            extract_error_message(Some(r#"{"error":"Missing GEMINI_API_KEY"}"#), None),
            "Missing GEMINI_API_KEY"
        );
    }

    #[test]
    fn placeholder_for_empty_reply() {
        assert_eq!(
            reply_or_placeholder(ProviderId::Gemini, None),
            "No response from Gemini"
        );
        assert_eq!(
            reply_or_placeholder(ProviderId::Gemini, Some("   ".into())),
            "No response from Gemini"
        );
        assert_eq!(reply_or_placeholder(ProviderId::Gemini, Some("hi".into())), "hi");
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("héllo wörld", 5), "héllo...");
        assert_eq!(preview("short", 50), "short");
    }
}
