//! Fuzz target for guarded reads.
//!
//! Goal: dotted lookups over arbitrary decoded trees **never panic**; they either find a value,
//! find nothing, or name the unknown value they hit.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_guarded_lookup
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use resguard_props::{DecodeOptions, decode, guard};

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    payload: &'a str,
    path: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(input.payload) else {
        return;
    };
    let Ok(tree) = decode(&value, DecodeOptions::default()) else {
        return;
    };

    let root = guard(&tree);
    if let Err(err) = root.lookup(input.path) {
        assert!(!err.path.is_empty() || tree.as_unknown().is_some());
    }
    let _ = root.iter().count();
});
