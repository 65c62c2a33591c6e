//! Fuzz target for redactor config parsing.
//!
//! Tests that config parsing and validation handle arbitrary input without
//! panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = ks_redact::RedactorConfig::from_json(text) {
        let _ = ks_redact::Redactor::new(&config);
    }
});
