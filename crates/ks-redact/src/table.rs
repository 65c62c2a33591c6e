//! Sensitive-key table.
//!
//! Keys are lowercase ASCII substrings. The table groups them by first
//! character and precomputes the data the classifier needs to reject most
//! positions without touching the key bytes:
//!
//! - a 256-bit bitmap of bytes (both cases) that can start any key,
//! - per group, a bitmask of second characters that can continue a key,
//! - a padding letter for the streaming classifier that cannot complete
//!   any key.
//!
//! Tables are immutable once built.

use crate::error::{RedactionError, Result};

/// Built-in sensitive key substrings.
pub const DEFAULT_SENSITIVE_KEYS: &[&str] = &[
    "api_key",
    "apikey",
    "token",
    "secret",
    "password",
    "passwd",
    "credential",
    "auth",
    "private_key",
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    // Plural forms; the boundary rule would otherwise reject the trailing `s`.
    "api_keys",
    "apikeys",
    "tokens",
    "secrets",
    "passwords",
    "passwds",
    "credentials",
    "private_keys",
    "cookies",
];

/// Longest key accepted into a table. Matches the streaming overlap so a key
/// split across a chunk boundary is always whole in the next chunk.
pub const MAX_KEY_LEN: usize = 64;

/// Bit set in [`KeyGroup::next_mask`] when some key's second byte is not a
/// letter (`x-api-key`).
const NON_ALPHA_BIT: u32 = 1 << 26;

/// Keys sharing a first character.
#[derive(Debug, Clone)]
pub struct KeyGroup {
    first: u8,
    next_mask: u32,
    keys: Vec<Box<[u8]>>,
}

impl KeyGroup {
    fn new(first: u8) -> Self {
        Self {
            first,
            next_mask: 0,
            keys: Vec::new(),
        }
    }

    fn push(&mut self, key: &[u8]) {
        if self.keys.iter().any(|k| &k[..] == key) {
            return;
        }
        self.next_mask |= second_char_bit(key[1]);
        self.keys.push(key.into());
    }

    /// Lowercase first character shared by every key in the group.
    pub fn first(&self) -> u8 {
        self.first
    }

    /// Keys in the group, each including the first character.
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.keys.iter().map(|k| &k[..])
    }

    /// Whether `second` (in either case) can follow the first character of
    /// some key in the group.
    #[inline]
    pub fn may_continue(&self, second: u8) -> bool {
        self.next_mask & second_char_bit(second.to_ascii_lowercase()) != 0
    }
}

#[inline]
fn second_char_bit(c: u8) -> u32 {
    if c.is_ascii_lowercase() {
        1 << (c - b'a')
    } else {
        NON_ALPHA_BIT
    }
}

/// Immutable lookup structure over a set of sensitive keys.
#[derive(Debug, Clone)]
pub struct KeyTable {
    groups: Vec<KeyGroup>,
    /// `group_of[b] - 1` indexes `groups`; zero means no group.
    group_of: [u8; 256],
    start_bits: [u64; 4],
    pad: u8,
    max_len: usize,
    len: usize,
}

impl KeyTable {
    /// Build a table from lowercase key substrings.
    ///
    /// Duplicates are ignored. Every key is validated first; see
    /// [`validate_key`].
    pub fn new<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut groups: Vec<KeyGroup> = Vec::new();
        let mut group_of = [0u8; 256];
        let mut start_bits = [0u64; 4];
        let mut last_bytes = 0u32;
        let mut max_len = 0;

        for key in keys {
            let key = key.as_ref();
            validate_key(key)?;
            let bytes = key.as_bytes();
            let first = bytes[0];

            let idx = match group_of[first as usize] {
                0 => {
                    groups.push(KeyGroup::new(first));
                    let slot = groups.len() as u8;
                    group_of[first as usize] = slot;
                    group_of[first.to_ascii_uppercase() as usize] = slot;
                    set_bit(&mut start_bits, first);
                    set_bit(&mut start_bits, first.to_ascii_uppercase());
                    groups.len() - 1
                }
                slot => slot as usize - 1,
            };
            groups[idx].push(bytes);

            let last = bytes[bytes.len() - 1];
            if last.is_ascii_lowercase() {
                last_bytes |= 1 << (last - b'a');
            }
            max_len = max_len.max(bytes.len());
        }

        if groups.is_empty() {
            return Err(RedactionError::Config(
                "at least one sensitive key is required".to_string(),
            ));
        }

        // A padding letter must never be the final byte of a key, or padding
        // a truncated window could complete a match that is not there.
        let pad = (b'a'..=b'z')
            .find(|c| last_bytes & (1 << (c - b'a')) == 0)
            .unwrap_or(b'z');
        let len = groups.iter().map(|g| g.keys.len()).sum();

        tracing::debug!(
            keys = len,
            groups = groups.len(),
            pad = %(pad as char),
            "built sensitive key table"
        );

        Ok(Self {
            groups,
            group_of,
            start_bits,
            pad,
            max_len,
            len,
        })
    }

    /// Whether `b` can start some key (either case).
    #[inline]
    pub fn is_start(&self, b: u8) -> bool {
        self.start_bits[(b >> 6) as usize] & (1 << (b & 63)) != 0
    }

    /// The group for a start byte, in either case.
    #[inline]
    pub fn group_for(&self, b: u8) -> Option<&KeyGroup> {
        match self.group_of[b as usize] {
            0 => None,
            slot => self.groups.get(slot as usize - 1),
        }
    }

    /// All groups, one per distinct first character.
    pub fn groups(&self) -> &[KeyGroup] {
        &self.groups
    }

    /// Lowercase letter that can never complete a key.
    pub fn pad_byte(&self) -> u8 {
        self.pad
    }

    /// Length of the longest key.
    pub fn max_key_len(&self) -> usize {
        self.max_len
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.len
    }
}

fn set_bit(bits: &mut [u64; 4], b: u8) {
    bits[(b >> 6) as usize] |= 1 << (b & 63);
}

/// Check that a key can be stored in a [`KeyTable`].
pub fn validate_key(key: &str) -> Result<()> {
    let bytes = key.as_bytes();
    if bytes.len() < 2 {
        return Err(RedactionError::invalid_key(
            key,
            "must be at least two bytes long",
        ));
    }
    if bytes.len() > MAX_KEY_LEN {
        return Err(RedactionError::invalid_key(
            key,
            "must not exceed 64 bytes",
        ));
    }
    if !bytes.is_ascii() {
        return Err(RedactionError::invalid_key(key, "must be ASCII"));
    }
    if bytes.iter().any(u8::is_ascii_uppercase) {
        return Err(RedactionError::invalid_key(key, "must be lowercase"));
    }
    if !bytes[0].is_ascii_lowercase() {
        return Err(RedactionError::invalid_key(
            key,
            "must start with a letter",
        ));
    }
    if bytes
        .iter()
        .any(|&b| b == b'"' || b == b'\\' || b.is_ascii_whitespace() || b.is_ascii_control())
    {
        return Err(RedactionError::invalid_key(
            key,
            "must not contain quotes, backslashes or whitespace",
        ));
    }
    Ok(())
}
