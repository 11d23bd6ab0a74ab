//! Convert serde_json::Value to the text form every parameter is bound with.
//! The statement casts each placeholder to its column type.

use serde_json::Value;

/// Text bind value; `None` binds SQL NULL.
pub fn to_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(v.to_string()),
    }
}
