//! Structured logging for the screenshot-to-task service.
//!
//! Handles subscriber setup (console plus rolling NDJSON file) and
//! redaction of secrets from error detail before it is logged or returned.

pub mod logger;
pub mod redact;

pub use logger::{init_json_stdout, init_logger};
pub use redact::redact_sensitive_data;
