//! Sensitive-key classifier.
//!
//! Decides whether a byte span contains one of the table's keys, using ASCII
//! case folding and a word-boundary rule on the byte that follows the match:
//!
//! | next byte                       | verdict                         |
//! |---------------------------------|---------------------------------|
//! | end of input, digit, `_`, `-`.. | sensitive                       |
//! | lowercase letter                | continuation (`author`)         |
//! | uppercase after ALL-CAPS match  | continuation (`AUTHORITY`)      |
//! | uppercase after mixed/lower     | CamelCase boundary (`authToken`)|

use crate::table::{KeyGroup, KeyTable};

/// Inputs shorter than this are scanned byte by byte; longer ones are
/// searched per distinct first character.
pub const SHORT_INPUT_THRESHOLD: usize = 128;

impl KeyTable {
    /// Whether `bytes` contains a sensitive key under the boundary rule.
    pub fn matches(&self, bytes: &[u8]) -> bool {
        if bytes.len() < SHORT_INPUT_THRESHOLD {
            self.matches_linear(bytes)
        } else {
            self.matches_by_first_char(bytes)
        }
    }

    fn matches_linear(&self, bytes: &[u8]) -> bool {
        bytes.iter().enumerate().any(|(pos, &b)| {
            self.is_start(b)
                && self
                    .group_for(b)
                    .is_some_and(|group| group_matches_at(group, bytes, pos))
        })
    }

    /// Work is bounded by the number of groups times the occurrences of their
    /// first characters, so long clean keys cost a handful of memchr passes.
    fn matches_by_first_char(&self, bytes: &[u8]) -> bool {
        self.groups().iter().any(|group| {
            let lower = group.first();
            memchr::memchr2_iter(lower, lower.to_ascii_uppercase(), bytes)
                .any(|pos| group_matches_at(group, bytes, pos))
        })
    }
}

fn group_matches_at(group: &KeyGroup, bytes: &[u8], pos: usize) -> bool {
    let Some(&second) = bytes.get(pos + 1) else {
        return false;
    };
    if !group.may_continue(second) {
        return false;
    }
    group.keys().any(|key| {
        let end = pos + key.len();
        end <= bytes.len()
            && eq_ignore_case(&bytes[pos..end], key)
            && at_word_boundary(&bytes[pos..end], bytes.get(end).copied())
    })
}

/// `key` is lowercase; only letters in `hay` are folded.
#[inline]
fn eq_ignore_case(hay: &[u8], key: &[u8]) -> bool {
    hay.iter()
        .zip(key)
        .all(|(&h, &k)| h.to_ascii_lowercase() == k)
}

/// Apply the boundary rule to a match and the byte following it.
pub fn at_word_boundary(matched: &[u8], next: Option<u8>) -> bool {
    match next {
        Some(c) if c.is_ascii_lowercase() => false,
        Some(c) if c.is_ascii_uppercase() => !is_all_caps(matched),
        _ => true,
    }
}

fn is_all_caps(matched: &[u8]) -> bool {
    matched
        .iter()
        .filter(|b| b.is_ascii_alphabetic())
        .all(u8::is_ascii_uppercase)
}
