//! Error types for redactor construction and configuration.
//!
//! The byte scanner itself never fails; these errors only come out of
//! building a [`crate::Redactor`], loading its configuration, or the
//! serialize-then-redact helpers.

use thiserror::Error;

/// Result type for redaction setup operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Errors that can occur while configuring or driving the redactor.
#[derive(Error, Debug)]
pub enum RedactionError {
    /// A configured sensitive key cannot be placed in the key table.
    #[error("invalid sensitive key {key:?}: {reason}")]
    InvalidKey {
        /// The offending key as configured.
        key: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The configuration is structurally invalid.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error while reading or writing a config file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RedactionError {
    pub(crate) fn invalid_key(key: &str, reason: &'static str) -> Self {
        RedactionError::InvalidKey {
            key: key.to_string(),
            reason,
        }
    }
}
