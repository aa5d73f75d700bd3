//! Fuzz target for the property decoder.
//!
//! Goal: decoding **never panics**, and whatever decodes re-encodes to a payload that decodes
//! to the same tree.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_property_decode
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use resguard_props::{DecodeOptions, decode, encode};

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    for opts in [DecodeOptions::default(), DecodeOptions::keep_secrets()] {
        if let Ok(decoded) = decode(&value, opts) {
            let again = decode(&encode(&decoded), opts).expect("encoded trees decode");
            assert_eq!(decoded, again);
        }
    }
});
