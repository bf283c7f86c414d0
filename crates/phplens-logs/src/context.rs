//! Embedded context blocks.
//!
//! Some producers write structured metadata next to an entry as
//! `[ELM_context_<id>]{...json...}[/ELM_context_<id>]`.

use serde_json::Value;

use phplens_types::{ContextPayload, PARENT_POSITION_KEY};

/// Opening sentinel of a context block
pub const CONTEXT_OPEN: &str = "[ELM_context_";

/// Whether the text starts a context block
pub fn is_context_block(text: &str) -> bool {
    text.trim_start().starts_with(CONTEXT_OPEN)
}

/// Extract the id and JSON payload of a context block
///
/// Returns `None` when the closing tag is missing, the body is not valid
/// JSON, or the JSON is not an object.
pub fn parse_context_block(text: &str) -> Option<(String, ContextPayload)> {
    let rest = text.trim().strip_prefix(CONTEXT_OPEN)?;
    let id_end = rest.find(']')?;
    let id = &rest[..id_end];
    if id.is_empty() {
        return None;
    }

    let after_open = &rest[id_end + 1..];
    let closing = format!("[/ELM_context_{}]", id);
    let body_end = after_open.find(&closing)?;

    let body = after_open[..body_end].trim();
    let Value::Object(mut payload) = serde_json::from_str::<Value>(body).ok()? else {
        return None;
    };
    payload
        .entry(PARENT_POSITION_KEY)
        .or_insert_with(|| Value::String("next".to_string()));

    Some((id.to_string(), payload))
}
