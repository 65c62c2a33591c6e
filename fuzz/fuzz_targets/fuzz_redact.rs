//! Fuzz target for the byte-level redaction scanner.
//!
//! Redaction must never panic, must be idempotent, and must leave input
//! without substitutions borrowed.

#![no_main]

use std::borrow::Cow;

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let once = ks_redact::redact(data);
    if let Cow::Owned(ref out) = once {
        assert_ne!(out.as_slice(), data);
    }
    let twice = ks_redact::redact(&once);
    assert_eq!(&*twice, &*once);

    if let Ok(text) = std::str::from_utf8(data) {
        let scrubbed = ks_redact::redact_str(text);
        assert_eq!(scrubbed.as_bytes(), &*once);
        let _ = ks_redact::contains_sensitive_key(text);
    }
});
