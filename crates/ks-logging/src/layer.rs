//! Tracing layer that writes redacted JSONL records.
//!
//! One JSON object per event:
//! `{"ts", "level", "target", "message", "fields", "span"}`. Any field whose
//! name is a sensitive key is written as `[REDACTED]` whatever its type;
//! string and debug values, and the message, are scrubbed with
//! [`Redactor::redact_str`] so JSON embedded in log fields loses its secrets.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use ks_redact::{Redactor, REDACTED_PLACEHOLDER};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Redacted fields recorded on a span, stored in its extensions.
#[derive(Debug, Default)]
struct SpanFields(Map<String, Value>);

/// Collects event or span fields, scrubbing as it goes.
struct RedactingVisitor<'r> {
    redactor: &'r Redactor,
    fields: Map<String, Value>,
    message: Option<String>,
}

impl<'r> RedactingVisitor<'r> {
    fn new(redactor: &'r Redactor) -> Self {
        RedactingVisitor {
            redactor,
            fields: Map::new(),
            message: None,
        }
    }

    fn insert(&mut self, field: &Field, value: Value) {
        let value = if self.redactor.is_sensitive_key(field.name()) {
            Value::String(REDACTED_PLACEHOLDER.to_string())
        } else {
            value
        };
        self.fields.insert(field.name().to_string(), value);
    }

    fn insert_text(&mut self, field: &Field, text: &str) {
        if field.name() == "message" {
            self.message = Some(self.redactor.redact_str(text).into_owned());
        } else if self.redactor.is_sensitive_key(field.name()) {
            self.insert(field, Value::Null);
        } else {
            let scrubbed = self.redactor.redact_str(text).into_owned();
            self.insert(field, Value::String(scrubbed));
        }
    }
}

impl Visit for RedactingVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert_text(field, value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert_text(field, &format!("{:?}", value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.insert(field, Value::Number(n));
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }
}

/// JSONL tracing layer with key-aware redaction.
pub struct RedactingJsonlLayer<W = io::Stderr> {
    writer: Mutex<W>,
    redactor: Arc<Redactor>,
}

impl RedactingJsonlLayer<io::Stderr> {
    /// Create a layer writing to stderr with the global redactor.
    pub fn stderr() -> Self {
        RedactingJsonlLayer::new(io::stderr())
    }
}

impl<W: Write> RedactingJsonlLayer<W> {
    /// Create a layer with a custom writer and the global redactor.
    pub fn new(writer: W) -> Self {
        RedactingJsonlLayer {
            writer: Mutex::new(writer),
            redactor: crate::shared_redactor(),
        }
    }

    /// Use a specific redactor instead of the global one.
    pub fn with_redactor(mut self, redactor: Arc<Redactor>) -> Self {
        self.redactor = redactor;
        self
    }
}

impl<S, W> Layer<S> for RedactingJsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = RedactingVisitor::new(&self.redactor);
        attrs.record(&mut visitor);

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(visitor.fields));
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let mut visitor = RedactingVisitor::new(&self.redactor);
        values.record(&mut visitor);

        if let Some(span) = ctx.span(id) {
            let mut extensions = span.extensions_mut();
            match extensions.get_mut::<SpanFields>() {
                Some(existing) => existing.0.extend(visitor.fields),
                None => extensions.insert(SpanFields(visitor.fields)),
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let ts = Utc::now();

        // Innermost span wins on name clashes.
        let mut span_fields = Map::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(fields) = span.extensions().get::<SpanFields>() {
                    for (key, value) in &fields.0 {
                        span_fields.entry(key.clone()).or_insert_with(|| value.clone());
                    }
                }
            }
        }

        let mut visitor = RedactingVisitor::new(&self.redactor);
        event.record(&mut visitor);

        let metadata = event.metadata();
        let mut obj = Map::new();
        obj.insert("ts".to_string(), Value::String(ts.to_rfc3339()));
        obj.insert(
            "level".to_string(),
            Value::String(metadata.level().as_str().to_ascii_lowercase()),
        );
        obj.insert(
            "target".to_string(),
            Value::String(metadata.target().to_string()),
        );
        if let Some(msg) = visitor.message {
            obj.insert("message".to_string(), Value::String(msg));
        }
        if !visitor.fields.is_empty() {
            obj.insert("fields".to_string(), Value::Object(visitor.fields));
        }
        if !span_fields.is_empty() {
            obj.insert("span".to_string(), Value::Object(span_fields));
        }

        let json = serde_json::to_string(&Value::Object(obj)).unwrap_or_default();
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", json);
        }
    }
}
