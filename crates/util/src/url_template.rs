//! URL template filling and query-string construction.

use indexmap::IndexMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

use crate::cast::cast_string;

/// Everything except RFC 3986 unreserved characters is escaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Replaces `{name}` placeholders with percent-encoded values taken from `fields`.
///
/// A field used by a placeholder is removed from `fields`, so it is not also
/// sent in the query string or body. Placeholders without a matching field
/// resolve to the empty string. An unterminated `{` is kept verbatim.
///
/// # Examples
/// ```ignore
/// let mut fields = IndexMap::new();
/// fields.insert("app".to_string(), json!("my app"));
/// assert_eq!(fill_placeholders("/apps/{app}/{missing}", &mut fields), "/apps/my%20app/");
/// assert!(fields.is_empty());
/// ```
pub fn fill_placeholders(template: &str, fields: &mut IndexMap<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &after[..close];
        if let Some(value) = fields.shift_remove(name) {
            out.push_str(&encode_component(&cast_string(&value)));
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

/// Serializes fields as `key=value` pairs joined by `&`.
///
/// Array values repeat the key once per element; all other values are
/// scalar-coerced to strings. Keys and values are percent-encoded.
pub fn build_query_string(fields: &IndexMap<String, Value>) -> String {
    let mut pairs: Vec<String> = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        let key = encode_component(key);
        match value {
            Value::Array(items) => {
                for item in items {
                    pairs.push(format!("{}={}", key, encode_component(&cast_string(item))));
                }
            }
            other => pairs.push(format!("{}={}", key, encode_component(&cast_string(other)))),
        }
    }
    pairs.join("&")
}

/// Appends a query string to a URL, respecting any query already present.
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    if !url.contains('?') {
        return format!("{}?{}", url, query);
    }
    if url.ends_with('?') || url.ends_with('&') {
        format!("{}{}", url, query)
    } else {
        format!("{}&{}", url, query)
    }
}
