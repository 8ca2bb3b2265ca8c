pub mod async_runtime;
pub mod cast;
pub mod media_type;
pub mod url_template;

use once_cell::sync::Lazy;
use regex::Regex;

pub use async_runtime::block_on_future;
pub use cast::{cast_bool, cast_double, cast_int, cast_long, cast_string};
pub use media_type::{OCTET_STREAM, guess_media_type};
pub use url_template::{append_query, build_query_string, fill_placeholders};

static SENSITIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)((?:proxy-)?authorization: )([^\r\n]+)",
        r"(?i)(cookie: )([^\r\n]+)",
        r"(?i)([A-Z0-9_\-]*?(?:KEY|TOKEN|SECRET|PASSWORD)[=:] ?)([^\s&]+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static redaction pattern"))
    .collect()
});

/// Redacts values that look like secrets in a string.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for re in SENSITIVE_PATTERNS.iter() {
        redacted = re
            .replace_all(&redacted, |caps: &regex::Captures| {
                let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{}<redacted>", prefix)
            })
            .to_string();
    }
    redacted
}

/// Renders a header map for logging with secret values redacted.
pub fn redact_headers<'a>(headers: impl IntoIterator<Item = (&'a String, &'a String)>) -> String {
    let rendered = headers
        .into_iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("\n");
    redact_sensitive(&rendered).replace('\n', ", ")
}
