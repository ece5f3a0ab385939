//! Fuzz target for `members`/`exclude` pattern matching.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_member_globs
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct GlobInput {
    members: Vec<String>,
    excludes: Vec<String>,
    candidates: Vec<String>,
}

fuzz_target!(|input: GlobInput| {
    // Keep inputs small so each iteration stays fast.
    if input.members.len() > 20 || input.excludes.len() > 20 || input.candidates.len() > 100 {
        return;
    }

    if let Ok(claimed) =
        fanout_repo::fuzz::claimed_members(&input.members, &input.excludes, &input.candidates)
    {
        // Everything claimed came from the candidate list.
        for path in &claimed {
            assert!(input.candidates.contains(path));
        }
    }
});
