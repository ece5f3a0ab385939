//! CLI entry point for fanout.
//!
//! This module is intentionally thin: it handles argument parsing, logging setup, Ctrl-C,
//! output and exit codes. All orchestration lives in the `fanout-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{ArgAction, Args, Parser, Subcommand};
use fanout_app::{RootsInput, RunInput, Targets, load_config, run_hook, run_roots, write_summary};
use fanout_exec::{CancelToken, Invoker};
use fanout_render::{TextRenderer, render_github_annotations, render_grouping};
use fanout_settings::Overrides;
use fanout_types::{RunStatus, ids};
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "fanout",
    version,
    about = "Run cargo fmt/check/clippy once per project root touched by a change"
)]
struct Cli {
    /// Directory that relative paths (files, config, boundary) are resolved against.
    #[arg(long, global = true, default_value = ".")]
    base_dir: Utf8PathBuf,

    /// Path to the fanout config TOML. A missing file means defaults.
    #[arg(long, global = true, default_value = ids::CONFIG_FILE)]
    config: Utf8PathBuf,

    /// Maximum concurrent tool invocations (0 = one per CPU, capped at 8).
    #[arg(long, short = 'j', global = true)]
    jobs: Option<usize>,

    /// Kill any single invocation that runs longer than this many seconds.
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Extra attempts for roots whose tool could not be started.
    #[arg(long, global = true, value_name = "N")]
    retries: Option<u32>,

    /// Never look for manifests above this directory.
    #[arg(long, global = true, value_name = "DIR")]
    boundary: Option<Utf8PathBuf>,

    /// Write a machine-readable JSON summary of the run here.
    #[arg(long, global = true, value_name = "PATH")]
    summary_out: Option<Utf8PathBuf>,

    /// Print GitHub Actions annotations for roots that did not pass.
    #[arg(long, global = true)]
    annotations: bool,

    /// Do not tag each output line with its root.
    #[arg(long, global = true)]
    no_prefix: bool,

    /// More log output on stderr (-v info, -vv debug). `FANOUT_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Commands,
}

/// Which files or roots a command works on.
#[derive(Args, Debug, Clone)]
struct TargetArgs {
    /// Ignore the file list and run over every project root under the base directory.
    #[arg(long, conflicts_with = "files")]
    all: bool,

    /// Changed files, as passed by the hook framework.
    files: Vec<Utf8PathBuf>,
}

impl TargetArgs {
    fn to_targets(&self) -> Targets {
        if self.all {
            Targets::All
        } else {
            Targets::Files(self.files.clone())
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run `cargo fmt` in every affected root.
    Fmt {
        /// rustfmt options, passed as `--config <KEY=VALUE,..>`.
        #[arg(long, value_name = "KEY=VALUE,..")]
        rustfmt_config: Option<String>,

        #[command(flatten)]
        targets: TargetArgs,
    },

    /// Run `cargo check` in every affected root.
    Check {
        /// Space or comma separated list of features to activate.
        #[arg(long)]
        features: Option<String>,

        /// Activate all available features (wins over --features).
        #[arg(long)]
        all_features: bool,

        #[command(flatten)]
        targets: TargetArgs,
    },

    /// Run `cargo clippy -- -D warnings` in every affected root.
    Clippy {
        #[command(flatten)]
        targets: TargetArgs,
    },

    /// Run any configured hook by name.
    Run {
        /// Hook name (a preset or a `[hooks.<name>]` table).
        hook: String,

        /// Extra argument for the tool; repeat for several.
        #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
        args: Vec<String>,

        #[command(flatten)]
        targets: TargetArgs,
    },

    /// Show which root each file belongs to, without running anything.
    Roots {
        /// Apply this hook's file filter first.
        #[arg(long)]
        hook: Option<String>,

        #[command(flatten)]
        targets: TargetArgs,
    },

    /// List the resolved hook definitions.
    Hooks,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match dispatch(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("fanout error: {err:#}");
            ids::EXIT_USAGE
        }
    };
    std::process::exit(code);
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("FANOUT_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

fn dispatch(cli: &Cli) -> anyhow::Result<i32> {
    let base_dir = cli
        .base_dir
        .canonicalize_utf8()
        .with_context(|| format!("base directory {}", cli.base_dir))?;
    let config_text = read_config(&base_dir.join(&cli.config))?;
    let overrides = overrides(cli);

    match &cli.cmd {
        Commands::Fmt {
            rustfmt_config,
            targets,
        } => {
            let extra = rustfmt_config
                .iter()
                .flat_map(|c| ["--config".to_string(), c.clone()])
                .collect();
            cmd_run(cli, &base_dir, &config_text, overrides, ids::HOOK_FMT, extra, targets)
        }
        Commands::Check {
            features,
            all_features,
            targets,
        } => {
            let extra = if *all_features {
                vec!["--all-features".to_string()]
            } else {
                features
                    .iter()
                    .flat_map(|f| ["--features".to_string(), f.clone()])
                    .collect()
            };
            cmd_run(cli, &base_dir, &config_text, overrides, ids::HOOK_CHECK, extra, targets)
        }
        Commands::Clippy { targets } => cmd_run(
            cli,
            &base_dir,
            &config_text,
            overrides,
            ids::HOOK_CLIPPY,
            Vec::new(),
            targets,
        ),
        Commands::Run {
            hook,
            args,
            targets,
        } => cmd_run(
            cli,
            &base_dir,
            &config_text,
            overrides,
            hook,
            args.clone(),
            targets,
        ),
        Commands::Roots { hook, targets } => {
            let group = run_roots(RootsInput {
                base_dir: &base_dir,
                config_text: &config_text,
                overrides,
                hook: hook.as_deref(),
                targets: targets.to_targets(),
            })?;
            for line in render_grouping(&group, &base_dir) {
                println!("{line}");
            }
            Ok(ids::EXIT_PASS)
        }
        Commands::Hooks => {
            let resolved = load_config(&config_text, overrides)?;
            for (name, spec) in &resolved.hooks {
                let mut line = format!("{name}: {}", spec.command_line());
                if !spec.file_patterns.is_empty() {
                    line.push_str(&format!(" [files: {}]", spec.file_patterns.join(", ")));
                }
                if spec.file_args == fanout_types::FileArgs::Append {
                    line.push_str(" [pass files]");
                }
                if let Some(t) = spec.timeout.or(resolved.run.timeout) {
                    line.push_str(&format!(" [timeout: {}s]", t.as_secs()));
                }
                println!("{line}");
            }
            Ok(ids::EXIT_PASS)
        }
    }
}

fn cmd_run(
    cli: &Cli,
    base_dir: &Utf8Path,
    config_text: &str,
    overrides: Overrides,
    hook: &str,
    extra_args: Vec<String>,
    targets: &TargetArgs,
) -> anyhow::Result<i32> {
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("could not install Ctrl-C handler: {err}");
    }

    let out = run_hook(
        RunInput {
            base_dir,
            config_text,
            overrides,
            hook,
            extra_args,
            targets: targets.to_targets(),
        },
        &Invoker::new(cancel),
    )?;
    let report = &out.report;

    let renderer = TextRenderer::new(base_dir, out.resolved.run.prefix_lines);
    for line in renderer.render_report(report) {
        println!("{line}");
    }
    if cli.annotations {
        for line in render_github_annotations(report, base_dir) {
            println!("{line}");
        }
    }
    if let Some(path) = &cli.summary_out {
        write_summary(path, report, env!("CARGO_PKG_VERSION")).context("write summary")?;
    }

    let status = report.status();
    if status == RunStatus::Interrupted {
        eprintln!("fanout: interrupted");
    }
    Ok(status.exit_code())
}

fn overrides(cli: &Cli) -> Overrides {
    Overrides {
        jobs: cli.jobs,
        timeout_secs: cli.timeout,
        retry_invocation_errors: cli.retries,
        search_boundary: cli.boundary.clone(),
        prefix_lines: cli.no_prefix.then_some(false),
    }
}

/// Config text, or empty when the file does not exist.
fn read_config(path: &Utf8Path) -> anyhow::Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path, "no config file; using defaults");
            Ok(String::new())
        }
        Err(err) => Err(err).with_context(|| format!("read {path}")),
    }
}
