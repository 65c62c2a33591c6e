//! Escape normalization for object keys.
//!
//! Keys containing a backslash are decoded before classification so that
//! `"p\u0061ssword"` is treated like `"password"`. The strategy depends on
//! the raw key size:
//!
//! - up to [`SMALL_KEY_LEN`] bytes: decode into a caller-provided stack buffer,
//! - up to the configured limit: decode with `serde_json`'s string decoder,
//! - anything larger, or anything `serde_json` rejects: return
//!   [`Normalized::Fallback`] and let the caller run [`stream_matches`], which
//!   classifies the key in fixed-size chunks without materializing it.
//!
//! Only the key table's ASCII alphabet matters for classification, so code
//! points above 127 collapse to a single `?`.

use std::borrow::Cow;

use crate::table::{KeyTable, MAX_KEY_LEN};

/// Largest raw key decoded into the stack buffer.
pub const SMALL_KEY_LEN: usize = 256;

/// Default upper bound for materializing a decoded key.
pub const DEFAULT_MAX_UNESCAPE_LEN: usize = 1024 * 1024;

/// Decoded bytes classified per streaming window.
pub const STREAM_CHUNK: usize = 4096;

/// Decoded bytes carried from one streaming window into the next.
pub const STREAM_OVERLAP: usize = MAX_KEY_LEN;

/// Stand-in for any decoded code point outside ASCII.
const NON_ASCII: u8 = b'?';

/// Outcome of normalizing an escaped key.
#[derive(Debug, PartialEq, Eq)]
pub enum Normalized<'a> {
    /// The key decoded cleanly.
    Decoded(Cow<'a, [u8]>),
    /// The key was not materialized; holds the raw key bytes (no quotes).
    Fallback(&'a [u8]),
}

/// Normalize a closed, quoted key string (`quoted` includes both quotes).
pub fn normalize<'a>(
    quoted: &'a [u8],
    scratch: &'a mut [u8; SMALL_KEY_LEN],
    max_unescape_len: usize,
) -> Normalized<'a> {
    debug_assert!(quoted.len() >= 2);
    let raw = &quoted[1..quoted.len() - 1];

    if raw.len() <= SMALL_KEY_LEN {
        if let Some(n) = unescape_small(raw, &mut scratch[..]) {
            let scratch: &'a [u8; SMALL_KEY_LEN] = scratch;
            return Normalized::Decoded(Cow::Borrowed(&scratch[..n]));
        }
    }

    if raw.len() <= max_unescape_len {
        return match serde_json::from_slice::<String>(quoted) {
            Ok(decoded) => Normalized::Decoded(Cow::Owned(decoded.into_bytes())),
            Err(err) => {
                tracing::trace!(error = %err, len = raw.len(), "key decode failed, streaming");
                Normalized::Fallback(raw)
            }
        };
    }

    Normalized::Fallback(raw)
}

/// Decode `raw` into `buf`, returning the decoded length.
///
/// Returns `None` when the output would not fit or `raw` ends in a lone
/// backslash. Malformed `\u` sequences and unknown escapes decode to their
/// literal characters.
pub fn unescape_small(raw: &[u8], buf: &mut [u8]) -> Option<usize> {
    let mut i = 0;
    let mut n = 0;
    while i < raw.len() {
        let (byte, used) = if raw[i] == b'\\' {
            decode_escape(raw, i)?
        } else {
            (raw[i], 1)
        };
        *buf.get_mut(n)? = byte;
        n += 1;
        i += used;
    }
    Some(n)
}

/// Decode the escape starting at `raw[i] == b'\\'`.
///
/// Returns the decoded byte and the number of raw bytes consumed, or `None`
/// for a trailing backslash.
#[inline]
fn decode_escape(raw: &[u8], i: usize) -> Option<(u8, usize)> {
    let next = *raw.get(i + 1)?;
    let decoded = match next {
        b'b' => (0x08, 2),
        b'f' => (0x0c, 2),
        b'n' => (b'\n', 2),
        b'r' => (b'\r', 2),
        b't' => (b'\t', 2),
        b'u' => match raw.get(i + 2..i + 6).and_then(parse_hex4) {
            Some(cp) if cp <= 0x7f => (cp as u8, 6),
            Some(_) => (NON_ASCII, 6),
            None => (b'u', 2),
        },
        // `"`, `\`, `/`, `'` and anything unknown decode to themselves.
        other => (other, 2),
    };
    Some(decoded)
}

fn parse_hex4(digits: &[u8]) -> Option<u16> {
    digits.iter().try_fold(0u16, |acc, &d| {
        let v = (d as char).to_digit(16)?;
        Some(acc << 4 | v as u16)
    })
}

/// Fixed-capacity decode window: `STREAM_CHUNK` bytes of data plus one slot
/// for the padding letter.
struct Window {
    buf: [u8; STREAM_CHUNK + 1],
    len: usize,
}

impl Window {
    fn new() -> Self {
        Self {
            buf: [0; STREAM_CHUNK + 1],
            len: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.len == STREAM_CHUNK
    }

    fn push(&mut self, b: u8) {
        self.buf[self.len] = b;
        self.len += 1;
    }

    /// Copy as much of `run` as fits; returns the count copied.
    fn extend(&mut self, run: &[u8]) -> usize {
        let take = run.len().min(STREAM_CHUNK - self.len);
        self.buf[self.len..self.len + take].copy_from_slice(&run[..take]);
        self.len += take;
        take
    }

    /// Keep the trailing overlap as the start of the next window.
    fn slide(&mut self) {
        self.buf
            .copy_within(self.len - STREAM_OVERLAP..self.len, 0);
        self.len = STREAM_OVERLAP;
    }
}

/// Classify a raw escaped key of any size in O(1) memory.
///
/// Every full window is padded with a letter that cannot complete a key
/// when more input follows, so a key cut at the window edge is never taken
/// as whole. The overlap re-examines it with its real continuation.
pub fn stream_matches(table: &KeyTable, raw: &[u8]) -> bool {
    tracing::trace!(len = raw.len(), "classifying escaped key in streaming windows");

    let mut window = Window::new();
    let mut pending = false;
    let mut i = 0;

    while i < raw.len() {
        if raw[i] == b'\\' {
            let (byte, used) = decode_escape(raw, i).unwrap_or((b'\\', 1));
            window.push(byte);
            i += used;
        } else {
            let run_end = memchr::memchr(b'\\', &raw[i..]).map_or(raw.len(), |off| i + off);
            i += window.extend(&raw[i..run_end]);
        }
        pending = true;

        if window.is_full() {
            let end = if i < raw.len() {
                window.buf[STREAM_CHUNK] = table.pad_byte();
                STREAM_CHUNK + 1
            } else {
                STREAM_CHUNK
            };
            if table.matches(&window.buf[..end]) {
                return true;
            }
            window.slide();
            pending = false;
        }
    }

    pending && table.matches(&window.buf[..window.len])
}
