//! The `run` use case: resolve a hook, find its roots, dispatch, report.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fanout_exec::Invoker;
use fanout_repo::{Classifier, discover_roots, group_files};
use fanout_settings::{FanoutConfigV1, Overrides, ResolvedConfig};
use fanout_types::{FileGroup, RunOptions, RunReport, ToolSpec};
use tracing::{debug, info};

use crate::coordinate::coordinate;
use crate::filter::FileFilter;

/// What to run over.
#[derive(Clone, Debug)]
pub enum Targets {
    /// Changed files from the hook framework, absolute or relative to the base directory.
    Files(Vec<Utf8PathBuf>),
    /// Every root under the base directory.
    All,
}

/// Input for the run use case.
#[derive(Clone, Debug)]
pub struct RunInput<'a> {
    /// Directory relative paths are resolved against (the repository checkout).
    pub base_dir: &'a Utf8Path,
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    pub overrides: Overrides,
    pub hook: &'a str,
    /// Appended to the hook's fixed arguments.
    pub extra_args: Vec<String>,
    pub targets: Targets,
}

#[derive(Clone, Debug)]
pub struct RunOutput {
    pub report: RunReport,
    /// The hook as dispatched, extra arguments included.
    pub spec: ToolSpec,
    pub resolved: ResolvedConfig,
}

/// Parse config (empty is allowed, defaults apply) and layer the overrides on top.
pub fn load_config(config_text: &str, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    let cfg = if config_text.trim().is_empty() {
        FanoutConfigV1::default()
    } else {
        fanout_settings::parse_config_toml(config_text).context("parse fanout.toml")?
    };
    fanout_settings::resolve_config(cfg, overrides).context("resolve config")
}

/// Run one hook over every root its targets select.
///
/// Configuration problems are errors. Everything that happens per root (failures, missing
/// executables, timeouts, interruption) is reported in [`RunOutput::report`].
pub fn run_hook(input: RunInput<'_>, invoker: &Invoker) -> anyhow::Result<RunOutput> {
    let resolved = load_config(input.config_text, input.overrides)?;
    let spec = resolved.hook_with_args(input.hook, &input.extra_args)?;

    let (group, mut skipped) = select(
        input.base_dir,
        &resolved.run,
        &spec.file_patterns,
        &input.targets,
    )
    .with_context(|| format!("hook {}", spec.hook))?;
    skipped.extend(group.unowned().iter().cloned());
    info!(
        hook = %spec.hook,
        roots = group.len(),
        skipped = skipped.len(),
        "roots selected"
    );

    let report = coordinate(group.into_entries(), skipped, &spec, &resolved.run, invoker)?;
    Ok(RunOutput {
        report,
        spec,
        resolved,
    })
}

/// Grouping for `targets`, plus the candidate files `patterns` ignored.
pub(crate) fn select(
    base_dir: &Utf8Path,
    run: &RunOptions,
    patterns: &[String],
    targets: &Targets,
) -> anyhow::Result<(FileGroup, Vec<Utf8PathBuf>)> {
    let mut classifier =
        Classifier::new(base_dir).with_boundary(run.search_boundary.as_deref());

    match targets {
        Targets::All => {
            let group = discover_roots(&mut classifier, base_dir)
                .with_context(|| format!("discover roots under {base_dir}"))?;
            Ok((group, Vec::new()))
        }
        Targets::Files(files) => {
            let filter = FileFilter::new(patterns)?;
            let (relevant, ignored) = filter.partition(files, base_dir);
            debug!(relevant = relevant.len(), ignored = ignored.len(), "filtered candidates");
            Ok((group_files(&mut classifier, &relevant), ignored))
        }
    }
}
