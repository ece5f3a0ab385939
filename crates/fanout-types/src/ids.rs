//! Stable identifiers, file names and exit codes.

pub const TOOL_NAME: &str = "fanout";

// Schemas
pub const SCHEMA_SUMMARY_V1: &str = "fanout.summary.v1";
pub const SCHEMA_CONFIG_V1: &str = "fanout.config.v1";

// Files
pub const MANIFEST_FILE: &str = "Cargo.toml";
pub const LOCK_FILE: &str = "Cargo.lock";
pub const CONFIG_FILE: &str = "fanout.toml";

// Built-in hooks
pub const HOOK_FMT: &str = "fmt";
pub const HOOK_CHECK: &str = "check";
pub const HOOK_CLIPPY: &str = "clippy";

// Outcome codes (summary JSON, annotations)
pub const OUTCOME_SUCCEEDED: &str = "succeeded";
pub const OUTCOME_FAILED: &str = "failed";
pub const OUTCOME_INVOCATION_ERROR: &str = "invocation_error";
pub const OUTCOME_TIMED_OUT: &str = "timed_out";
pub const OUTCOME_INTERRUPTED: &str = "interrupted";

// Process exit codes
pub const EXIT_PASS: i32 = 0;
pub const EXIT_FAIL: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_INTERRUPTED: i32 = 130;
