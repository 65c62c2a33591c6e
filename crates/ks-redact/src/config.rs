//! Redactor configuration.
//!
//! Defines which key substrings are sensitive and how large an escaped key
//! may grow before it is classified by streaming instead of decoding.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RedactionError, Result};
use crate::table::{validate_key, DEFAULT_SENSITIVE_KEYS};
use crate::unescape::DEFAULT_MAX_UNESCAPE_LEN;

/// Schema version for the config file.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Redactor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactorConfig {
    /// Schema version.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Base sensitive key substrings. Replaces the built-in list when set.
    #[serde(default = "default_sensitive_keys")]
    pub sensitive_keys: Vec<String>,

    /// Additional key substrings appended to `sensitive_keys`.
    #[serde(default)]
    pub extra_keys: Vec<String>,

    /// Largest raw escaped key decoded in memory.
    #[serde(default = "default_max_unescape_len")]
    pub max_unescape_len: usize,
}

fn default_schema_version() -> String {
    CONFIG_SCHEMA_VERSION.to_string()
}

fn default_sensitive_keys() -> Vec<String> {
    DEFAULT_SENSITIVE_KEYS.iter().map(|k| k.to_string()).collect()
}

fn default_max_unescape_len() -> usize {
    DEFAULT_MAX_UNESCAPE_LEN
}

impl Default for RedactorConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            sensitive_keys: default_sensitive_keys(),
            extra_keys: Vec::new(),
            max_unescape_len: DEFAULT_MAX_UNESCAPE_LEN,
        }
    }
}

impl RedactorConfig {
    /// Load config from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse config from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: RedactorConfig = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Save config to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Append keys to `extra_keys`.
    pub fn with_extra_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Every configured key, base list first.
    pub fn all_keys(&self) -> impl Iterator<Item = &str> {
        self.sensitive_keys
            .iter()
            .chain(&self.extra_keys)
            .map(String::as_str)
    }

    /// Check the config can build a redactor.
    pub fn validate(&self) -> Result<()> {
        if self.schema_version.split('.').next() != CONFIG_SCHEMA_VERSION.split('.').next() {
            return Err(RedactionError::Config(format!(
                "unsupported schema version {} (expected {})",
                self.schema_version, CONFIG_SCHEMA_VERSION
            )));
        }
        if self.max_unescape_len == 0 {
            return Err(RedactionError::Config(
                "max_unescape_len must be greater than zero".to_string(),
            ));
        }
        if self.sensitive_keys.is_empty() && self.extra_keys.is_empty() {
            return Err(RedactionError::Config(
                "at least one sensitive key is required".to_string(),
            ));
        }
        self.all_keys().try_for_each(validate_key)
    }
}
