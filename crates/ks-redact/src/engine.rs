//! Main redaction engine.
//!
//! The [`Redactor`] walks JSON-shaped bytes looking for strings, decides
//! which of them are object keys, classifies those keys against its table,
//! and splices the placeholder over the values of sensitive ones. Input is
//! never validated; the walk degrades gracefully on anything malformed.

use std::borrow::Cow;
use std::path::Path;

use memchr::{memchr, memchr2};
use once_cell::sync::Lazy;

use crate::config::RedactorConfig;
use crate::scan::{comment_end, find_string_end, key_context, skip_ws_and_comments, value_span, KeyContext};
use crate::table::{KeyTable, DEFAULT_SENSITIVE_KEYS};
use crate::unescape::{normalize, stream_matches, Normalized, DEFAULT_MAX_UNESCAPE_LEN, SMALL_KEY_LEN};
use crate::Result;

/// Text substituted for sensitive values.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

/// The placeholder as it appears in redacted output, quotes included.
pub const REDACTED_JSON: &str = "\"[REDACTED]\"";

/// Cap on the spare capacity reserved when the first substitution happens.
const MAX_OUTPUT_SLACK: usize = 4096;

static DEFAULT_REDACTOR: Lazy<Redactor> = Lazy::new(Redactor::default);

/// The process-wide redactor built from the built-in key list.
pub fn default_redactor() -> &'static Redactor {
    &DEFAULT_REDACTOR
}

/// Scrubs sensitive values from JSON-shaped text.
///
/// Immutable after construction; share it freely across threads.
#[derive(Debug, Clone)]
pub struct Redactor {
    table: KeyTable,
    max_unescape_len: usize,
}

impl Default for Redactor {
    fn default() -> Self {
        Self {
            table: KeyTable::new(DEFAULT_SENSITIVE_KEYS).expect("built-in sensitive keys are valid"),
            max_unescape_len: DEFAULT_MAX_UNESCAPE_LEN,
        }
    }
}

impl Redactor {
    /// Build a redactor from a validated configuration.
    pub fn new(config: &RedactorConfig) -> Result<Self> {
        config.validate()?;
        let table = KeyTable::new(config.all_keys())?;
        tracing::debug!(
            keys = table.key_count(),
            max_key_len = table.max_key_len(),
            max_unescape_len = config.max_unescape_len,
            "redactor configured"
        );
        Ok(Self {
            table,
            max_unescape_len: config.max_unescape_len,
        })
    }

    /// Build a redactor over a custom key list with default limits.
    pub fn with_keys<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            table: KeyTable::new(keys)?,
            max_unescape_len: DEFAULT_MAX_UNESCAPE_LEN,
        })
    }

    /// Load a redactor from a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = RedactorConfig::load(path)?;
        Self::new(&config)
    }

    /// The key table in use.
    pub fn table(&self) -> &KeyTable {
        &self.table
    }

    /// Largest escaped key that is decoded in memory.
    pub fn max_unescape_len(&self) -> usize {
        self.max_unescape_len
    }

    /// Whether a bare (already decoded) key name is sensitive.
    pub fn is_sensitive_key(&self, key: &str) -> bool {
        self.is_sensitive(key.as_bytes())
    }

    /// Byte-level form of [`Redactor::is_sensitive_key`].
    pub fn is_sensitive(&self, bytes: &[u8]) -> bool {
        self.table.matches(bytes)
    }

    /// Whether any object key in `json` is sensitive.
    ///
    /// Unlike [`Redactor::is_sensitive_key`] on the whole text, a match only
    /// counts inside a string that is followed by a colon (or whose context
    /// is ambiguous), so sensitive words in values are ignored.
    pub fn contains_sensitive_key(&self, json: &str) -> bool {
        let input = json.as_bytes();
        if memchr(b'\\', input).is_none() && !self.table.matches(input) {
            return false;
        }

        let mut pos = 0;
        while let Some((open, close)) = next_string(input, pos) {
            let Some(close) = close else {
                return false;
            };
            let after = close + 1;
            if key_context(input, after).is_key() && self.is_sensitive_quoted(&input[open..after]) {
                return true;
            }
            pos = after;
        }
        false
    }

    /// Replace the value of every sensitive key with `"[REDACTED]"`.
    ///
    /// Returns the input unchanged and unallocated when nothing matched.
    pub fn redact<'a>(&self, input: &'a [u8]) -> Cow<'a, [u8]> {
        let mut out: Option<Vec<u8>> = None;
        // Bytes before `copied` are already in `out`.
        let mut copied = 0;
        let mut pos = 0;

        while let Some((open, close)) = next_string(input, pos) {
            let Some(close) = close else {
                // Unclosed key: the remainder is copied as is.
                break;
            };
            let after = close + 1;
            pos = after;

            let value_from = match key_context(input, after) {
                KeyContext::NotKey => continue,
                KeyContext::Colon(colon) => colon + 1,
                KeyContext::Assumed => {
                    let next = skip_ws_and_comments(input, after);
                    match input.get(next) {
                        Some(b':') => next + 1,
                        Some(b',' | b'}' | b']') | None => continue,
                        // A following string that is itself a key keeps its
                        // own value; this one is then not a key.
                        Some(b'"') if followed_by_key(input, next) => continue,
                        Some(_) => after,
                    }
                }
            };
            if !self.is_sensitive_quoted(&input[open..after]) {
                continue;
            }

            let span = value_span(input, value_from);
            if span.start >= input.len() {
                break;
            }
            pos = span.end;
            if span.slice(input) == REDACTED_JSON.as_bytes() {
                continue;
            }

            let buf = out.get_or_insert_with(|| {
                Vec::with_capacity(input.len() + (input.len() / 8).min(MAX_OUTPUT_SLACK))
            });
            buf.extend_from_slice(&input[copied..span.start]);
            buf.extend_from_slice(REDACTED_JSON.as_bytes());
            copied = span.end;
        }

        match out {
            None => Cow::Borrowed(input),
            Some(mut buf) => {
                buf.extend_from_slice(&input[copied..]);
                Cow::Owned(buf)
            }
        }
    }

    /// [`Redactor::redact`] over a string.
    pub fn redact_str<'a>(&self, input: &'a str) -> Cow<'a, str> {
        match self.redact(input.as_bytes()) {
            Cow::Borrowed(_) => Cow::Borrowed(input),
            // Splices land on ASCII bytes, so this is always valid UTF-8.
            Cow::Owned(bytes) => Cow::Owned(
                String::from_utf8(bytes)
                    .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned()),
            ),
        }
    }

    /// Classify a closed key string, quotes included.
    fn is_sensitive_quoted(&self, quoted: &[u8]) -> bool {
        let raw = &quoted[1..quoted.len() - 1];
        if memchr(b'\\', raw).is_none() {
            return self.table.matches(raw);
        }

        let mut scratch = [0u8; SMALL_KEY_LEN];
        match normalize(quoted, &mut scratch, self.max_unescape_len) {
            Normalized::Decoded(key) => self.table.matches(&key),
            Normalized::Fallback(raw) => stream_matches(&self.table, raw),
        }
    }
}

/// Next string opening at or after `pos`, skipping comments.
///
/// Yields the opening quote offset and the closing one, if any.
fn next_string(input: &[u8], mut pos: usize) -> Option<(usize, Option<usize>)> {
    while let Some(off) = memchr2(b'"', b'/', input.get(pos..)?) {
        let at = pos + off;
        if input[at] == b'"' {
            return Some((at, find_string_end(input, at)));
        }
        pos = comment_end(input, at).unwrap_or(at + 1);
    }
    None
}

/// Whether the string opening at `open` is closed and followed by a colon.
fn followed_by_key(input: &[u8], open: usize) -> bool {
    find_string_end(input, open)
        .is_some_and(|close| matches!(key_context(input, close + 1), KeyContext::Colon(_)))
}

/// Redact with the default redactor.
pub fn redact(input: &[u8]) -> Cow<'_, [u8]> {
    DEFAULT_REDACTOR.redact(input)
}

/// Redact a string with the default redactor.
pub fn redact_str(input: &str) -> Cow<'_, str> {
    DEFAULT_REDACTOR.redact_str(input)
}

/// Whether a bare key name is sensitive under the built-in key list.
pub fn is_sensitive_key(key: &str) -> bool {
    DEFAULT_REDACTOR.is_sensitive_key(key)
}

/// Whether `json` has a sensitive object key under the built-in key list.
pub fn contains_sensitive_key(json: &str) -> bool {
    DEFAULT_REDACTOR.contains_sensitive_key(json)
}
