//! String, value and comment boundary scanning.
//!
//! Nothing here validates JSON. Every scanner returns end-of-input instead
//! of failing when a terminator is missing, so callers always make progress
//! on truncated or hostile input. `//` and `/* */` comments are skipped
//! wherever whitespace may appear, and inside objects and arrays.

use memchr::{memchr, memmem};

/// Bytes examined after a string while deciding whether it is a key.
pub const KEY_LOOKAHEAD: usize = 256;

/// Half-open byte range `[start, end)` into an input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// The bytes this span covers in `input`.
    pub fn slice<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        &input[self.start..self.end]
    }
}

#[inline]
fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Offset of the quote closing the string opened at `quote`.
///
/// A quote closes the string when the run of backslashes before it has even
/// length. `None` means the string is unterminated.
pub fn find_string_end(input: &[u8], quote: usize) -> Option<usize> {
    let body = quote + 1;
    let mut from = body;
    loop {
        let q = from + memchr(b'"', input.get(from..)?)?;
        let backslashes = input[body..q]
            .iter()
            .rev()
            .take_while(|&&b| b == b'\\')
            .count();
        if backslashes % 2 == 0 {
            return Some(q);
        }
        from = q + 1;
    }
}

/// Offset just past the string opened at `quote`, or `input.len()` if it
/// never closes.
pub fn scan_string(input: &[u8], quote: usize) -> usize {
    find_string_end(input, quote).map_or(input.len(), |q| q + 1)
}

/// If a comment opens at `pos`, the offset just past it.
///
/// Line comments end after their newline; an unterminated block comment
/// runs to end-of-input. A `/` not followed by `/` or `*` is not a comment.
pub fn comment_end(input: &[u8], pos: usize) -> Option<usize> {
    if input.get(pos) != Some(&b'/') {
        return None;
    }
    let body = pos + 2;
    match input.get(pos + 1) {
        Some(b'/') => Some(memchr(b'\n', &input[body..]).map_or(input.len(), |off| body + off + 1)),
        Some(b'*') => Some(
            memmem::find(&input[body..], b"*/").map_or(input.len(), |off| body + off + 2),
        ),
        _ => None,
    }
}

/// Skip whitespace and comments starting at `pos`.
pub fn skip_ws_and_comments(input: &[u8], mut pos: usize) -> usize {
    while pos < input.len() {
        if is_ws(input[pos]) {
            pos += 1;
            continue;
        }
        match comment_end(input, pos) {
            Some(end) => pos = end,
            None => break,
        }
    }
    pos
}

/// Extent of the value that begins at the first byte after `from` that is
/// not whitespace or a comment.
///
/// The span is empty when that byte is a delimiter (`{"k": }`), and starts
/// at `input.len()` when only whitespace and comments remain.
pub fn value_span(input: &[u8], from: usize) -> Span {
    let start = skip_ws_and_comments(input, from);
    let end = match input.get(start) {
        None => start,
        Some(b'"') => scan_string(input, start),
        Some(b'{' | b'[') => scan_container(input, start),
        Some(b't' | b'f' | b'n') => scan_literal(input, start),
        Some(_) => scan_number(input, start),
    };
    Span::new(start, end)
}

/// Offset just past the value beginning at or after `from`.
pub fn scan_value(input: &[u8], from: usize) -> usize {
    value_span(input, from).end
}

/// Balanced scan over `{}` and `[]`. Strings and comments are opaque, so
/// brackets inside them never change the depth.
fn scan_container(input: &[u8], open: usize) -> usize {
    let mut depth = 0usize;
    let mut pos = open;
    while pos < input.len() {
        match input[pos] {
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth -= 1;
                if depth == 0 {
                    return pos + 1;
                }
            }
            b'"' => {
                pos = scan_string(input, pos);
                continue;
            }
            b'/' => {
                if let Some(end) = comment_end(input, pos) {
                    pos = end;
                    continue;
                }
            }
            _ => {}
        }
        pos += 1;
    }
    input.len()
}

/// `true`, `false`, `null`, or any run of lowercase letters.
fn scan_literal(input: &[u8], start: usize) -> usize {
    input[start..]
        .iter()
        .position(|b| !b.is_ascii_lowercase())
        .map_or(input.len(), |off| start + off)
}

/// Anything else runs until a structural delimiter or a comment.
fn scan_number(input: &[u8], start: usize) -> usize {
    let mut pos = start;
    while pos < input.len() {
        match input[pos] {
            b',' | b'}' | b']' | b'"' | b':' => break,
            b'/' if comment_end(input, pos).is_some() => break,
            b if is_ws(b) => break,
            _ => pos += 1,
        }
    }
    pos
}

/// How a scanned string relates to what follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyContext {
    /// Followed by a colon at this offset.
    Colon(usize),
    /// Look-ahead gave up before deciding; treat the string as a key.
    Assumed,
    /// Followed by something other than a colon, or by end-of-input.
    NotKey,
}

impl KeyContext {
    pub fn is_key(&self) -> bool {
        !matches!(self, KeyContext::NotKey)
    }
}

/// Decide whether the string ending just before `after` is an object key.
///
/// At most [`KEY_LOOKAHEAD`] bytes are examined. A quote or backslash met
/// along the way, or running out of look-ahead with input remaining,
/// resolves to [`KeyContext::Assumed`] so an odd layout never hides a key.
pub fn key_context(input: &[u8], after: usize) -> KeyContext {
    let limit = input.len().min(after.saturating_add(KEY_LOOKAHEAD));
    let mut pos = after;
    while pos < limit {
        match input[pos] {
            b if is_ws(b) => pos += 1,
            b':' => return KeyContext::Colon(pos),
            b'"' | b'\\' => return KeyContext::Assumed,
            b'/' if matches!(input.get(pos + 1), Some(b'/' | b'*')) => {
                match bounded_comment_end(input, pos, limit) {
                    Some(end) => pos = end,
                    None => return KeyContext::Assumed,
                }
            }
            _ => return KeyContext::NotKey,
        }
    }
    if limit < input.len() {
        KeyContext::Assumed
    } else {
        KeyContext::NotKey
    }
}

/// Comment end within `limit`; `None` when the comment holds a quote or
/// backslash, or outlasts the look-ahead.
fn bounded_comment_end(input: &[u8], pos: usize, limit: usize) -> Option<usize> {
    let block = input[pos + 1] == b'*';
    let mut i = pos + 2;
    while i < limit {
        match input[i] {
            b'"' | b'\\' => return None,
            b'\n' if !block => return Some(i + 1),
            b'*' if block && input.get(i + 1) == Some(&b'/') => return Some(i + 2),
            _ => i += 1,
        }
    }
    (limit == input.len()).then_some(input.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of(input: &str, from: usize) -> &str {
        let span = value_span(input.as_bytes(), from);
        &input[span.start..span.end]
    }

    // ── strings ────────────────────────────────────────────────────

    #[test]
    fn test_string_end_simple() {
        let input = br#""abc", "d""#;
        assert_eq!(find_string_end(input, 0), Some(4));
        assert_eq!(scan_string(input, 0), 5);
    }

    #[test]
    fn test_string_escaped_quote() {
        let input = br#""a\"b" x"#;
        assert_eq!(scan_string(input, 0), 6);
    }

    #[test]
    fn test_string_escaped_backslash_before_quote() {
        let input = br#""a\\" x"#;
        assert_eq!(scan_string(input, 0), 5);
        let input = br#""a\\\"b" x"#;
        assert_eq!(scan_string(input, 0), 8);
    }

    #[test]
    fn test_string_unterminated() {
        let input = br#""abc\""#;
        assert_eq!(find_string_end(input, 0), None);
        assert_eq!(scan_string(input, 0), input.len());
        assert_eq!(find_string_end(b"\"", 0), None);
    }

    // ── comments ───────────────────────────────────────────────────

    #[test]
    fn test_comment_end() {
        assert_eq!(comment_end(b"// x\ny", 0), Some(5));
        assert_eq!(comment_end(b"/* x */y", 0), Some(7));
        assert_eq!(comment_end(b"/* x", 0), Some(4));
        assert_eq!(comment_end(b"// x", 0), Some(4));
        assert_eq!(comment_end(b"/x", 0), None);
        assert_eq!(comment_end(b"/", 0), None);
    }

    #[test]
    fn test_skip_ws_and_comments() {
        let input = b"  /* a */ // b\n\t x";
        assert_eq!(skip_ws_and_comments(input, 0), input.len() - 1);
        assert_eq!(skip_ws_and_comments(b" / 2", 0), 1);
    }

    // ── values ─────────────────────────────────────────────────────

    #[test]
    fn test_value_kinds() {
        assert_eq!(value_of(r#" "s\"x", 1"#, 0), r#""s\"x""#);
        assert_eq!(value_of(" true}", 0), "true");
        assert_eq!(value_of("null,", 0), "null");
        assert_eq!(value_of(" -12.5e3 }", 0), "-12.5e3");
        assert_eq!(value_of(r#"{"a": [1, {"b": "}"}]}, 2"#, 0), r#"{"a": [1, {"b": "}"}]}"#);
        assert_eq!(value_of(r#"["]", "[" ] x"#, 0), r#"["]", "[" ]"#);
    }

    #[test]
    fn test_value_skips_leading_comments() {
        assert_eq!(value_of("/* c */ 42,", 0), "42");
        assert_eq!(value_of("// c\n \"v\"", 0), "\"v\"");
    }

    #[test]
    fn test_container_ignores_brackets_in_comments() {
        let input = "[\n 1,\n /* ] */\n 2\n], 3";
        assert_eq!(value_of(input, 0), "[\n 1,\n /* ] */\n 2\n]");
        let input = "{\n // }\n \"a\": 1\n} tail";
        assert_eq!(value_of(input, 0), "{\n // }\n \"a\": 1\n}");
        let input = "[ /* \" ] */ ] tail";
        assert_eq!(value_of(input, 0), "[ /* \" ] */ ]");
    }

    #[test]
    fn test_container_unterminated() {
        let input = r#"{"a": [1, 2"#;
        assert_eq!(scan_value(input.as_bytes(), 0), input.len());
    }

    #[test]
    fn test_number_stops_at_comment() {
        assert_eq!(value_of("123// x", 0), "123");
        assert_eq!(value_of("123/* x */", 0), "123");
        assert_eq!(value_of("1/2 ", 0), "1/2");
    }

    #[test]
    fn test_empty_value_at_delimiter() {
        let span = value_span(b" }", 0);
        assert_eq!(span, Span::new(1, 1));
        let span = value_span(b"   ", 0);
        assert_eq!(span, Span::new(3, 3));
    }

    // ── key context ────────────────────────────────────────────────

    #[test]
    fn test_key_context_colon() {
        assert_eq!(key_context(b"  : 1", 0), KeyContext::Colon(2));
        assert_eq!(key_context(b" /* c */ : 1", 0), KeyContext::Colon(9));
        assert_eq!(key_context(b" // c\n: 1", 0), KeyContext::Colon(6));
    }

    #[test]
    fn test_key_context_not_key() {
        assert_eq!(key_context(b", \"b\"", 0), KeyContext::NotKey);
        assert_eq!(key_context(b"   ", 0), KeyContext::NotKey);
        assert_eq!(key_context(b" 123", 0), KeyContext::NotKey);
        assert_eq!(key_context(b"}", 0), KeyContext::NotKey);
        assert_eq!(key_context(b" / 2", 0), KeyContext::NotKey);
    }

    #[test]
    fn test_key_context_conservative() {
        assert_eq!(key_context(b" \"x\"", 0), KeyContext::Assumed);
        assert_eq!(key_context(b" /* \" */ : 1", 0), KeyContext::Assumed);
        let mut long = vec![b' '; KEY_LOOKAHEAD + 10];
        long.push(b':');
        assert_eq!(key_context(&long, 0), KeyContext::Assumed);
        assert!(KeyContext::Assumed.is_key());
        assert!(!KeyContext::NotKey.is_key());
    }

    #[test]
    fn test_key_context_lookahead_boundary() {
        let mut exact = vec![b' '; KEY_LOOKAHEAD - 1];
        exact.push(b':');
        assert_eq!(key_context(&exact, 0), KeyContext::Colon(KEY_LOOKAHEAD - 1));
    }
}
