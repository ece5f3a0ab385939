//! Run Coordinator: bounded parallel dispatch with results in first-seen root order.

use anyhow::Context;
use camino::Utf8PathBuf;
use fanout_exec::{CancelToken, Invoker};
use fanout_types::{
    GroupEntry, InvocationResult, Outcome, RootResult, RunOptions, RunReport, ToolSpec,
};
use rayon::prelude::*;
use std::thread;
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use tracing::{info, warn};

/// Invoke `spec` once per entry, at most `options.jobs` at a time, and build the report.
///
/// Every root reaches a terminal state independently; one root's failure never stops or
/// alters another. Results are slotted by entry index, so completion order does not
/// matter. If the invoker's token is cancelled, every root is reported as interrupted
/// and captured output is discarded.
pub fn coordinate(
    entries: Vec<GroupEntry>,
    skipped: Vec<Utf8PathBuf>,
    spec: &ToolSpec,
    options: &RunOptions,
    invoker: &Invoker,
) -> anyhow::Result<RunReport> {
    let started_at = OffsetDateTime::now_utc();

    let results: Vec<RootResult> = if entries.is_empty() {
        Vec::new()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.jobs.max(1))
            .thread_name(|i| format!("fanout-worker-{i}"))
            .build()
            .context("build worker pool")?;
        pool.install(|| {
            entries
                .into_par_iter()
                .map(|entry| run_root(entry, spec, options, invoker))
                .collect()
        })
    };

    let interrupted = invoker.cancel_token().is_cancelled();
    let results = if interrupted {
        results
            .into_iter()
            .map(|r| RootResult {
                result: InvocationResult::interrupted(r.result.duration, r.result.attempts),
                ..r
            })
            .collect()
    } else {
        results
    };

    Ok(RunReport {
        hook: spec.hook.clone(),
        command: spec.command_line(),
        started_at,
        finished_at: OffsetDateTime::now_utc(),
        interrupted,
        results,
        skipped,
    })
}

/// One root, with bounded retries for invocation errors only.
fn run_root(
    entry: GroupEntry,
    spec: &ToolSpec,
    options: &RunOptions,
    invoker: &Invoker,
) -> RootResult {
    let GroupEntry { root, files } = entry;
    let started = Instant::now();
    let max_attempts = options.retry_invocation_errors.saturating_add(1);
    let mut attempts = 0;

    info!(root = %root, command = %spec.command_line(), "dispatch");
    let mut result = loop {
        let result = invoker.invoke(&root, &files, spec);
        attempts += result.attempts;

        let retryable = matches!(result.outcome, Outcome::InvocationError { .. })
            && attempts < max_attempts
            && !invoker.cancel_token().is_cancelled();
        if !retryable {
            break result;
        }
        warn!(
            root = %root,
            attempt = attempts,
            reason = result.outcome.reason().unwrap_or_default(),
            "invocation error; retrying"
        );
        pause(options.retry_delay, invoker.cancel_token());
    };
    result.attempts = attempts;
    result.duration = started.elapsed();
    info!(root = %root, outcome = result.outcome.code(), "finished");

    RootResult {
        root,
        files,
        result,
    }
}

/// Sleep for `delay`, waking early if the run is cancelled.
fn pause(delay: Duration, cancel: &CancelToken) {
    let step = Duration::from_millis(20);
    let deadline = Instant::now() + delay;
    while !cancel.is_cancelled() {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(step.min(deadline - now));
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use fanout_test_util::TempTree;
    use fanout_types::{ProjectRoot, RunStatus};

    const PKG: &str = "[package]\nname = \"p\"\nversion = \"0.1.0\"\n";

    fn entries(tree: &TempTree, names: &[&str]) -> Vec<GroupEntry> {
        names
            .iter()
            .map(|n| {
                tree.write(&format!("{n}/Cargo.toml"), PKG);
                GroupEntry {
                    root: ProjectRoot::new(tree.canonical_root().join(n)),
                    files: Vec::new(),
                }
            })
            .collect()
    }

    fn sh(script: &str) -> ToolSpec {
        ToolSpec::new("check", "sh").with_args(["-c", script])
    }

    fn options(jobs: usize) -> RunOptions {
        RunOptions {
            jobs,
            retry_delay: Duration::ZERO,
            ..RunOptions::default()
        }
    }

    fn root_names(report: &RunReport) -> Vec<String> {
        report
            .results
            .iter()
            .map(|r| r.root.path().file_name().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn one_failing_root_fails_the_run_without_touching_others() {
        let tree = TempTree::new();
        let spec = sh(r#"echo "in $(basename "$(pwd -P)")"; [ "$(basename "$(pwd -P)")" != a ]"#);
        let report = coordinate(
            entries(&tree, &["a", "b"]),
            Vec::new(),
            &spec,
            &options(2),
            &Invoker::default(),
        )
        .expect("coordinate");

        assert_eq!(root_names(&report), ["a", "b"]);
        assert_eq!(report.results[0].result.outcome, Outcome::Failed);
        assert_eq!(report.results[0].result.exit_code, Some(1));
        assert_eq!(report.results[1].result.outcome, Outcome::Succeeded);
        assert_eq!(report.results[1].result.output_text(), "in b\n");
        assert_eq!(report.status(), RunStatus::Failed);
    }

    #[test]
    fn missing_executable_is_an_invocation_error_everywhere() {
        let tree = TempTree::new();
        let spec = ToolSpec::new("check", "fanout-missing-tool-for-tests");
        let report = coordinate(
            entries(&tree, &["a", "b", "c"]),
            Vec::new(),
            &spec,
            &options(2),
            &Invoker::default(),
        )
        .expect("coordinate");

        let counts = report.counts();
        assert_eq!(counts.invocation_error, 3);
        assert_eq!(counts.failed, 0);
        assert!(!report.success());
    }

    #[test]
    fn results_follow_group_order_not_completion_order() {
        let tree = TempTree::new();
        // The first root finishes last.
        let spec = sh(r#"[ "$(basename "$(pwd -P)")" = slow ] && sleep 0.4; exit 0"#);
        let report = coordinate(
            entries(&tree, &["slow", "fast1", "fast2"]),
            Vec::new(),
            &spec,
            &options(3),
            &Invoker::default(),
        )
        .expect("coordinate");
        assert_eq!(root_names(&report), ["slow", "fast1", "fast2"]);
        assert!(report.success());
    }

    #[test]
    fn invocation_errors_are_retried_up_to_the_limit() {
        let tree = TempTree::new();
        let spec = ToolSpec::new("check", "fanout-missing-tool-for-tests");
        let opts = RunOptions {
            retry_invocation_errors: 2,
            ..options(1)
        };
        let report = coordinate(
            entries(&tree, &["a"]),
            Vec::new(),
            &spec,
            &opts,
            &Invoker::default(),
        )
        .expect("coordinate");
        assert_eq!(report.results[0].result.attempts, 3);
        assert!(matches!(
            report.results[0].result.outcome,
            Outcome::InvocationError { .. }
        ));
    }

    #[test]
    fn tool_failures_are_never_retried() {
        let tree = TempTree::new();
        let opts = RunOptions {
            retry_invocation_errors: 3,
            ..options(1)
        };
        let report = coordinate(
            entries(&tree, &["a"]),
            Vec::new(),
            &sh("exit 1"),
            &opts,
            &Invoker::default(),
        )
        .expect("coordinate");
        assert_eq!(report.results[0].result.attempts, 1);
        assert_eq!(report.results[0].result.outcome, Outcome::Failed);
    }

    #[test]
    fn cancelled_run_reports_every_root_interrupted() {
        let tree = TempTree::new();
        let token = CancelToken::new();
        token.cancel();
        let report = coordinate(
            entries(&tree, &["a", "b"]),
            Vec::new(),
            &sh("echo never"),
            &options(2),
            &Invoker::new(token),
        )
        .expect("coordinate");

        assert!(report.interrupted);
        assert_eq!(report.status(), RunStatus::Interrupted);
        assert!(
            report
                .results
                .iter()
                .all(|r| r.result.outcome == Outcome::Interrupted && r.result.output.is_empty())
        );
    }

    #[test]
    fn cancellation_mid_run_kills_in_flight_tools() {
        let tree = TempTree::new();
        let token = CancelToken::new();
        let invoker = Invoker::new(token.clone());
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            token.cancel();
        });

        let started = Instant::now();
        let report = coordinate(
            entries(&tree, &["a", "b", "c"]),
            Vec::new(),
            &sh("echo partial; exec sleep 5"),
            &options(1),
            &invoker,
        )
        .expect("coordinate");
        canceller.join().unwrap();

        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(report.status(), RunStatus::Interrupted);
        assert_eq!(report.counts().interrupted, 3);
    }

    #[test]
    fn empty_grouping_passes_without_invoking() {
        let report = coordinate(
            Vec::new(),
            vec![Utf8PathBuf::from("README.md")],
            &sh("exit 1"),
            &options(4),
            &Invoker::default(),
        )
        .expect("coordinate");
        assert!(report.results.is_empty());
        assert_eq!(report.status(), RunStatus::Passed);
        assert_eq!(report.skipped, [Utf8PathBuf::from("README.md")]);
    }

    #[test]
    fn repeated_runs_agree() {
        let tree = TempTree::new();
        let spec = sh(r#"[ "$(basename "$(pwd -P)")" != b ]"#);
        let run = || {
            coordinate(
                entries(&tree, &["a", "b"]),
                Vec::new(),
                &spec,
                &options(2),
                &Invoker::default(),
            )
            .expect("coordinate")
        };
        let first = run();
        let second = run();
        assert_eq!(first.success(), second.success());
        assert_eq!(first.counts(), second.counts());
    }
}
