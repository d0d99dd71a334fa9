//! # Template Resolution
//!
//! Substitutes `{{path}}` placeholders with values looked up in a JSON
//! payload. Resolution is total: a missing field, a `null`, or a path that
//! walks through a scalar all resolve to the empty string.
//!
//! ```rust
//! use overlay_common::resolve_template;
//! use serde_json::json;
//!
//! let data = json!({ "user": { "name": "Ann" } });
//! assert_eq!(resolve_template("Hello {{user.name}}", &data), "Hello Ann");
//! assert_eq!(resolve_template("{{missing}}", &json!({})), "");
//! ```

use regex::{Captures, Regex};
use serde_json::{json, Value};
use std::sync::LazyLock;

/// Matches `{{ path.to.field }}`; whitespace inside the braces is ignored.
pub const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([\w.]+)\s*\}\}";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("valid regex"));

/// Replace every `{{path}}` in `template` with the value found at `path`.
pub fn resolve_template(template: &str, data: &Value) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| {
            get_nested_value(data, &caps[1])
                .and_then(display_value)
                .unwrap_or_default()
        })
        .into_owned()
}

/// Walk a dot-separated path through objects (by key) and arrays (by index).
///
/// Returns `None` as soon as a segment is missing.
pub fn get_nested_value<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |current, key| match current {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Render a JSON value the way it should appear inside overlay text.
///
/// `null` has no display form. Strings are inserted without quotes, arrays
/// are comma-joined, objects fall back to compact JSON.
pub fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| display_value(item).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Event payloads that are not JSON objects are wrapped as `{"value": payload}`
/// so that paths and templates always have an object to resolve against.
pub fn coerce_payload(payload: Value) -> Value {
    if payload.is_object() {
        payload
    } else {
        json!({ "value": payload })
    }
}
