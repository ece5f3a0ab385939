//! Fuzz target for manifest fact extraction.
//!
//! Arbitrary text is parsed as a Cargo manifest and asked whether it claims a directory.
//! Errors are fine; panics are not.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_manifest_facts
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct ManifestInput {
    text: String,
    rel_dir: String,
}

fuzz_target!(|input: ManifestInput| {
    if input.text.len() > 64 * 1024 {
        return;
    }
    let _ = fanout_repo::fuzz::manifest_claims(&input.text, &input.rel_dir);
});
