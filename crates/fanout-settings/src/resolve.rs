use crate::{model::FanoutConfigV1, model::HookConfig, presets};
use anyhow::Context;
use camino::Utf8PathBuf;
use fanout_types::{FileArgs, RunOptions, ToolSpec, default_jobs};
use globset::Glob;
use std::collections::BTreeMap;
use std::time::Duration;

/// CLI-level overrides; `None` defers to the config file, then to defaults.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub jobs: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub retry_invocation_errors: Option<u32>,
    pub search_boundary: Option<Utf8PathBuf>,
    pub prefix_lines: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub run: RunOptions,
    pub hooks: BTreeMap<String, ToolSpec>,
}

impl ResolvedConfig {
    /// Look up a hook by name. The hook's own timeout falls back to the run-wide one.
    pub fn hook(&self, name: &str) -> anyhow::Result<ToolSpec> {
        let Some(spec) = self.hooks.get(name) else {
            let available: Vec<&str> = self.hooks.keys().map(String::as_str).collect();
            anyhow::bail!(
                "unknown hook: {name} (available: {})",
                available.join(", ")
            );
        };
        let mut spec = spec.clone();
        if spec.timeout.is_none() {
            spec.timeout = self.run.timeout;
        }
        Ok(spec)
    }

    /// Like [`ResolvedConfig::hook`], with `extra` appended to the fixed arguments.
    pub fn hook_with_args(&self, name: &str, extra: &[String]) -> anyhow::Result<ToolSpec> {
        let mut spec = self.hook(name)?;
        spec.args.extend(extra.iter().cloned());
        Ok(spec)
    }
}

pub fn resolve_config(cfg: FanoutConfigV1, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    let mut run = RunOptions::default();

    // jobs: 0 means "auto"
    if let Some(jobs) = overrides.jobs.or(cfg.jobs) {
        run.jobs = if jobs == 0 { default_jobs() } else { jobs };
    }

    if let Some(secs) = overrides.timeout_secs.or(cfg.timeout_secs) {
        run.timeout = Some(parse_timeout(secs).context("invalid timeout_secs")?);
    }

    if let Some(n) = overrides
        .retry_invocation_errors
        .or(cfg.retry_invocation_errors)
    {
        run.retry_invocation_errors = n;
    }
    if let Some(ms) = cfg.retry_delay_ms {
        run.retry_delay = Duration::from_millis(ms);
    }

    run.search_boundary = overrides
        .search_boundary
        .or_else(|| cfg.search_boundary.map(Utf8PathBuf::from));

    if let Some(prefix) = overrides.prefix_lines.or(cfg.prefix_lines) {
        run.prefix_lines = prefix;
    }

    let mut hooks = presets::preset_hooks();
    for (name, hc) in cfg.hooks {
        let merged = match hooks.remove(&name) {
            Some(base) => merge_hook(base, hc).with_context(|| format!("hook {name}"))?,
            None => new_hook(&name, hc).with_context(|| format!("hook {name}"))?,
        };
        hooks.insert(name, merged);
    }

    Ok(ResolvedConfig { run, hooks })
}

fn new_hook(name: &str, hc: HookConfig) -> anyhow::Result<ToolSpec> {
    let program = hc
        .program
        .clone()
        .context("a hook without a preset must set `program`")?;
    let mut base = ToolSpec::new(name, program);
    base.file_patterns = presets::DEFAULT_FILE_PATTERNS
        .iter()
        .map(|p| p.to_string())
        .collect();
    merge_hook(base, hc)
}

fn merge_hook(mut spec: ToolSpec, hc: HookConfig) -> anyhow::Result<ToolSpec> {
    if let Some(program) = hc.program {
        if program.trim().is_empty() {
            anyhow::bail!("`program` must not be empty");
        }
        spec.program = program;
    }
    if let Some(args) = hc.args {
        spec.args = args;
    }
    if let Some(files) = hc.files {
        validate_patterns(&files)?;
        spec.file_patterns = files;
    }
    if let Some(pass_files) = hc.pass_files {
        spec.file_args = if pass_files {
            FileArgs::Append
        } else {
            FileArgs::RootWide
        };
    }
    spec.env.extend(hc.env);
    if let Some(secs) = hc.timeout_secs {
        spec.timeout = Some(parse_timeout(secs).context("invalid timeout_secs")?);
    }
    Ok(spec)
}

fn validate_patterns(patterns: &[String]) -> anyhow::Result<()> {
    for pattern in patterns {
        Glob::new(pattern).with_context(|| format!("invalid files glob: {pattern}"))?;
    }
    Ok(())
}

fn parse_timeout(secs: u64) -> anyhow::Result<Duration> {
    if secs == 0 {
        anyhow::bail!("timeout must be greater than zero seconds");
    }
    Ok(Duration::from_secs(secs))
}
