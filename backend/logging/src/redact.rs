//! Log Redaction Layer
//!
//! Scrubs API keys and bearer tokens from strings prior to logging. Provider
//! and storage errors can echo request headers back in their bodies.

use once_cell::sync::Lazy;
use regex::Regex;

static API_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\bsk-[a-zA-Z0-9_\-]{8,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)|(apikey[=:]\s*[a-zA-Z0-9\-\._~+/]+=*)")
        .expect("static redaction pattern")
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]").to_string()
}
