//! Secret redaction for JSON-shaped text.
//!
//! This crate scrubs the values of sensitive keys (passwords, tokens, API
//! keys, cookies, ...) out of request bodies, responses, log lines and error
//! strings before they are stored or shown. Every byte outside a redacted
//! value is preserved exactly.
//!
//! # Key Features
//!
//! - **Zero-copy on clean input**: nothing is allocated unless a value is
//!   actually replaced.
//! - **Malformed-input tolerant**: unterminated strings, unbalanced
//!   containers, missing values and `//` / `/* */` comments never cause a
//!   failure or a leak.
//! - **Word-boundary aware**: `authToken` and `AUTH_TOKEN` are sensitive,
//!   `author` and `AUTHORITY` are not.
//! - **Escape aware**: keys spelled with JSON escapes are classified by their
//!   decoded form, in bounded memory even when huge.
//! - **Idempotent**: redacting redacted output is a no-op.
//!
//! # Example
//!
//! ```
//! let out = ks_redact::redact_str(r#"{"password": "hunter2", "user": "alice"}"#);
//! assert_eq!(out, r#"{"password": "[REDACTED]", "user": "alice"}"#);
//! ```

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod scan;
pub mod table;
pub mod unescape;
pub mod value;

pub use config::{RedactorConfig, CONFIG_SCHEMA_VERSION};
pub use engine::{
    contains_sensitive_key, default_redactor, is_sensitive_key, redact, redact_str, Redactor,
    REDACTED_JSON, REDACTED_PLACEHOLDER,
};
pub use error::{RedactionError, Result};
pub use scan::{KeyContext, Span};
pub use table::{KeyTable, DEFAULT_SENSITIVE_KEYS, MAX_KEY_LEN};
pub use unescape::{Normalized, DEFAULT_MAX_UNESCAPE_LEN};
