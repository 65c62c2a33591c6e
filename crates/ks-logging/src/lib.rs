//! Structured logging with secret redaction.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for services and log shippers
//!
//! Both modes pass every field through a [`ks_redact::Redactor`]: fields
//! named like secrets are replaced outright, and text fields have the
//! values of sensitive JSON keys scrubbed.
//!
//! # Usage
//!
//! ```no_run
//! use ks_logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::from_env(None, None);
//! init_logging(&config).expect("logging already initialized");
//!
//! tracing::info!(password = "hunter2", "user logged in"); // password=[REDACTED]
//! ```
//!
//! All log output goes to stderr.

pub mod config;
pub mod fields;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel, ENV_LOG_FORMAT, ENV_LOG_LEVEL};
pub use fields::RedactingFields;
pub use layer::RedactingJsonlLayer;

use std::io::IsTerminal;
use std::sync::{Arc, OnceLock};

use ks_redact::Redactor;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

static REDACTOR: OnceLock<Arc<Redactor>> = OnceLock::new();

/// The redactor used by log layers.
///
/// Initializes with the built-in key list if not already set.
pub fn shared_redactor() -> Arc<Redactor> {
    REDACTOR
        .get_or_init(|| Arc::new(Redactor::default()))
        .clone()
}

/// Install the redactor used by log layers created afterwards.
///
/// Fails, handing the redactor back, once a layer has already been built
/// or a redactor was already installed. Call it before [`init_logging`].
pub fn set_redactor(redactor: Arc<Redactor>) -> Result<(), Arc<Redactor>> {
    REDACTOR.set(redactor)
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` directives carried by `config` are used when they parse;
/// otherwise the filter is `config.level`.
pub fn init_logging(config: &LogConfig) -> Result<(), TryInitError> {
    let filter = env_filter(config);

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi)
                .fmt_fields(RedactingFields::new(shared_redactor()));

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => tracing_subscriber::registry()
            .with(filter)
            .with(RedactingJsonlLayer::stderr())
            .try_init(),
    }
}

/// `RUST_LOG` directives when `config` carries valid ones, else its level.
fn env_filter(config: &LogConfig) -> EnvFilter {
    config
        .directives
        .as_deref()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(config.level.as_str()))
}

/// Initialize logging from the environment alone.
pub fn init_default_logging() -> Result<(), TryInitError> {
    init_logging(&LogConfig::from_env(None, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_set_after_use_is_rejected() {
        let current = shared_redactor();
        let custom = Arc::new(Redactor::with_keys(["session"]).unwrap());
        assert!(set_redactor(custom).is_err());
        assert!(Arc::ptr_eq(&current, &shared_redactor()));
    }

    fn lookup(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    fn max_level(config: &LogConfig) -> Option<LevelFilter> {
        env_filter(config).max_level_hint()
    }

    #[test]
    fn test_filter_follows_level_precedence() {
        let config = LogConfig::from_lookup(lookup(&[("RUST_LOG", "debug")]), None, None);
        assert_eq!(max_level(&config), Some(LevelFilter::DEBUG));

        let config = LogConfig::from_lookup(
            lookup(&[("KS_LOG", "error"), ("RUST_LOG", "debug")]),
            None,
            None,
        );
        assert_eq!(max_level(&config), Some(LevelFilter::ERROR));

        let config =
            LogConfig::from_lookup(lookup(&[("RUST_LOG", "trace")]), Some(LogLevel::Warn), None);
        assert_eq!(max_level(&config), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_invalid_directives_fall_back_to_level() {
        let config = LogConfig {
            directives: Some("ks_redact=loud".to_string()),
            level: LogLevel::Error,
            ..LogConfig::default()
        };
        assert_eq!(max_level(&config), Some(LevelFilter::ERROR));
    }

    #[test]
    fn test_shared_redactor_defaults() {
        let redactor = shared_redactor();
        assert!(redactor.is_sensitive_key("password"));
        assert!(!redactor.is_sensitive_key("author"));
    }
}
