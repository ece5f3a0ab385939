use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `fanout.toml` schema v1.
///
/// This is a *user-facing* config model: it is intentionally permissive so forward-compat is easy.
/// An empty file is equivalent to the built-in presets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FanoutConfigV1 {
    /// Optional schema string for tooling (`fanout.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Maximum concurrent invocations. `0` means one per CPU (capped).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,

    /// Default per-invocation timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Extra attempts for roots whose tool could not be started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_invocation_errors: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,

    /// Directory where upward manifest searches stop. Relative paths resolve against the
    /// base directory (`--base-dir`), not the config file's location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_boundary: Option<String>,

    /// Tag every captured output line with its project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_lines: Option<bool>,

    /// Map of hook name -> definition. Names matching a preset merge over it.
    #[serde(default)]
    pub hooks: BTreeMap<String, HookConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HookConfig {
    /// Executable, resolved via `PATH`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    /// Glob patterns selecting relevant changed files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,

    /// Append each root's files to the argument list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_files: Option<bool>,

    /// Environment variables set for the tool (merged over the preset's).
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}
