//! Integration tests for ks-logging.
//!
//! Canary secrets logged under sensitive field names, or embedded in JSON
//! text fields, must never reach the JSONL output.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use ks_logging::RedactingJsonlLayer;
use proptest::prelude::*;
use tracing_subscriber::layer::SubscriberExt;

const CANARY: &str = "canary-7f3a9c";

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

fn with_layer<F: FnOnce()>(f: F) -> String {
    let buf = SharedBuf::default();
    let subscriber = tracing_subscriber::registry().with(RedactingJsonlLayer::new(buf.clone()));
    tracing::subscriber::with_default(subscriber, f);
    buf.contents()
}

// ============================================================================
// Canary Leak Tests
// ============================================================================

#[test]
fn test_canary_never_leaks_through_fields() {
    let output = with_layer(|| {
        tracing::info!(password = CANARY, "a");
        tracing::info!(x_api_key = %CANARY, "b");
        tracing::info!(client_secret = ?CANARY, "c");
        tracing::error!(body = %format!(r#"{{"token": "{CANARY}"}}"#), "d");
        tracing::warn!("e {}", format!(r#"{{"Authorization": "Bearer {CANARY}"}}"#));
        let span = tracing::info_span!("req", cookie = CANARY);
        let _guard = span.enter();
        tracing::info!("f");
    });
    assert_eq!(output.lines().count(), 6);
    assert!(!output.contains(CANARY), "leaked: {output}");
}

#[test]
fn test_clean_fields_pass_through() {
    let output = with_layer(|| {
        tracing::info!(user = "alice", path = "/v1/login", "ok");
    });
    assert!(output.contains("alice"));
    assert!(output.contains("/v1/login"));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Whatever the value, JSON text with a sensitive key never leaks it.
    #[test]
    fn embedded_secret_never_leaks(value in "[a-zA-Z0-9]{12,24}", key in prop::sample::select(vec![
        "password", "apiKey", "auth_token", "Set-Cookie", "private_key",
    ])) {
        let marked = format!("LEAK{value}");
        let payload = format!(r#"{{"{key}": "{marked}", "id": 1}}"#);
        let output = with_layer(|| {
            tracing::info!(payload = %payload, "request");
        });
        prop_assert!(!output.contains(&marked), "leaked: {}", output);
        prop_assert!(output.contains("[REDACTED]"));
    }
}
