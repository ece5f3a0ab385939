//! Config parsing and hook preset resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod presets;
mod resolve;

pub use model::{FanoutConfigV1, HookConfig};
pub use presets::{DEFAULT_FILE_PATTERNS, preset_hooks};
pub use resolve::{Overrides, ResolvedConfig};

/// Parse `fanout.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<FanoutConfigV1> {
    let cfg: FanoutConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective run options and hook table (presets + config + overrides).
pub fn resolve_config(cfg: FanoutConfigV1, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
