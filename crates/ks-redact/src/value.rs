//! Redaction of parsed JSON values and serializable types.

use serde::Serialize;
use serde_json::Value;

use crate::engine::{Redactor, REDACTED_PLACEHOLDER};
use crate::Result;

impl Redactor {
    /// Copy of `value` with every sensitive object entry's value replaced by
    /// the placeholder string.
    pub fn redact_value(&self, value: &Value) -> Value {
        let mut out = value.clone();
        self.redact_value_in_place(&mut out);
        out
    }

    /// Replace sensitive object entries in place.
    pub fn redact_value_in_place(&self, value: &mut Value) {
        match value {
            Value::Object(map) => {
                for (key, entry) in map.iter_mut() {
                    if self.is_sensitive_key(key) {
                        *entry = Value::String(REDACTED_PLACEHOLDER.to_string());
                    } else {
                        self.redact_value_in_place(entry);
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.redact_value_in_place(item);
                }
            }
            _ => {}
        }
    }

    /// Serialize `value` to JSON and redact the result.
    pub fn redact_serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let json = serde_json::to_string(value)?;
        Ok(self.redact_str(&json).into_owned())
    }
}
