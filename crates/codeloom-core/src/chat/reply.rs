//! Parsing of the LLM's raw text into a structured [`ChatReply`].
//!
//! The model is instructed to answer with a JSON object, but it frequently
//! wraps it in prose or a fenced code block. The span from the first `{` to
//! the last `}` is taken as the candidate object; anything that does not
//! parse degrades to a text-only reply carrying the raw output.

use codeloom_types::chat::ChatReply;
use serde_json::Value;
use tracing::warn;

/// Turn raw model output into a reply. Never fails.
pub fn parse_reply(raw: &str) -> ChatReply {
    let Some(span) = json_object_span(raw) else {
        return ChatReply::text(raw);
    };

    let object = match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(object)) => object,
        Ok(_) => return ChatReply::text(raw),
        Err(e) => {
            warn!(error = %e, "Model reply contained an unparseable JSON object");
            return ChatReply::text(raw);
        }
    };

    let string_field = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);

    ChatReply {
        message: string_field("message").unwrap_or_else(|| raw.to_string()),
        code: string_field("code"),
        filename: string_field("filename"),
    }
}

/// The slice from the first `{` through the last `}`, if both exist in order.
fn json_object_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}
