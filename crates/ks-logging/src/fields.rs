//! Redacting field formatter for human-readable output.
//!
//! Plugs into `tracing_subscriber::fmt` in place of the default field
//! formatter. String values are scrubbed before they are quoted, so JSON
//! carried in a plain `&str` field is seen unescaped by the redactor.

use std::fmt;
use std::sync::Arc;

use ks_redact::{Redactor, REDACTED_PLACEHOLDER};
use tracing::field::{Field, Visit};
use tracing_subscriber::field::RecordFields;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::FormatFields;

/// `FormatFields` writing `name=value` pairs separated by spaces, with the
/// message first and unquoted.
pub struct RedactingFields {
    redactor: Arc<Redactor>,
}

impl RedactingFields {
    pub fn new(redactor: Arc<Redactor>) -> Self {
        RedactingFields { redactor }
    }
}

impl<'writer> FormatFields<'writer> for RedactingFields {
    fn format_fields<R: RecordFields>(&self, writer: Writer<'writer>, fields: R) -> fmt::Result {
        let mut visitor = HumanVisitor {
            writer,
            redactor: &self.redactor,
            result: Ok(()),
            first: true,
        };
        fields.record(&mut visitor);
        visitor.result
    }
}

struct HumanVisitor<'a, 'w> {
    writer: Writer<'w>,
    redactor: &'a Redactor,
    result: fmt::Result,
    first: bool,
}

impl HumanVisitor<'_, '_> {
    fn emit(&mut self, field: &Field, text: &str, quote: bool) {
        if self.result.is_err() {
            return;
        }
        let sep = if self.first { "" } else { " " };
        self.first = false;

        let name = field.name();
        self.result = if self.redactor.is_sensitive_key(name) {
            write!(self.writer, "{sep}{name}={REDACTED_PLACEHOLDER}")
        } else {
            let text = self.redactor.redact_str(text);
            if name == "message" {
                write!(self.writer, "{sep}{text}")
            } else if quote {
                write!(self.writer, "{sep}{name}={:?}", text)
            } else {
                write!(self.writer, "{sep}{name}={text}")
            }
        };
    }
}

impl Visit for HumanVisitor<'_, '_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.emit(field, value, true);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.emit(field, &format!("{:?}", value), false);
    }
}
