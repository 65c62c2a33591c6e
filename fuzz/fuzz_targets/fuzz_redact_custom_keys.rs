//! Fuzz target for redactors built from arbitrary key lists and limits.
//!
//! Invalid key lists must be rejected with an error; valid ones must scan
//! arbitrary input without panicking.

#![no_main]

use arbitrary::Arbitrary;
use ks_redact::{Redactor, RedactorConfig};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    keys: Vec<String>,
    max_unescape_len: u16,
    payload: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let config = RedactorConfig {
        sensitive_keys: input.keys,
        max_unescape_len: usize::from(input.max_unescape_len),
        ..RedactorConfig::default()
    };
    let Ok(redactor) = Redactor::new(&config) else {
        return;
    };
    let once = redactor.redact(&input.payload);
    let twice = redactor.redact(&once);
    assert_eq!(&*twice, &*once);
});
