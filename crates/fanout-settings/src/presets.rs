use fanout_types::{ToolSpec, ids};
use std::collections::BTreeMap;

/// Files that make a cargo hook relevant.
pub const DEFAULT_FILE_PATTERNS: &[&str] = &["*.rs", ids::MANIFEST_FILE, ids::LOCK_FILE];

/// Built-in hooks. All run over the whole project, with colors off for clean logs.
pub fn preset_hooks() -> BTreeMap<String, ToolSpec> {
    let mut m = BTreeMap::new();
    m.insert(ids::HOOK_FMT.to_string(), cargo(ids::HOOK_FMT, &["fmt", "--"]));
    m.insert(ids::HOOK_CHECK.to_string(), cargo(ids::HOOK_CHECK, &["check"]));
    m.insert(
        ids::HOOK_CLIPPY.to_string(),
        cargo(ids::HOOK_CLIPPY, &["clippy", "--", "-D", "warnings"]),
    );
    m
}

fn cargo(hook: &str, args: &[&str]) -> ToolSpec {
    let mut spec = ToolSpec::new(hook, "cargo")
        .with_args(args.iter().copied())
        .with_env("CARGO_TERM_COLOR", "never");
    spec.file_patterns = DEFAULT_FILE_PATTERNS.iter().map(|p| p.to_string()).collect();
    spec
}
