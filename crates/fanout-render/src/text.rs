use camino::Utf8Path;
use fanout_types::{FileGroup, InvocationResult, Outcome, RootResult, RunReport};

/// Combined, root-tagged text output.
///
/// Per root:
///
/// ```text
/// ==> <root> (<command>) <==
/// [<root>] <line>
/// --> <root>: <outcome> in <secs>s
/// ```
#[derive(Clone, Copy, Debug)]
pub struct TextRenderer<'a> {
    base: &'a Utf8Path,
    prefix_lines: bool,
}

impl<'a> TextRenderer<'a> {
    /// Root labels are shown relative to `base`.
    pub fn new(base: &'a Utf8Path, prefix_lines: bool) -> Self {
        Self { base, prefix_lines }
    }

    pub fn root_block(&self, result: &RootResult, command: &str) -> Vec<String> {
        let label = result.root.display_from(self.base);
        let mut out = Vec::with_capacity(result.result.output.len() + 2);
        out.push(format!("==> {label} ({command}) <=="));
        for line in &result.result.output {
            if self.prefix_lines {
                out.push(format!("[{label}] {}", line.text));
            } else {
                out.push(line.text.clone());
            }
        }
        out.push(format!(
            "--> {label}: {} in {:.2}s",
            describe_outcome(&result.result),
            result.result.duration.as_secs_f64()
        ));
        out
    }

    /// `fanout <hook>: <n> root(s): <a> passed, <b> failed, <c> invocation error(s), <d> timed out`
    pub fn summary_line(&self, report: &RunReport) -> String {
        let c = report.counts();
        let mut line = format!(
            "fanout {}: {} root(s): {} passed, {} failed, {} invocation error(s), {} timed out",
            report.hook,
            c.total(),
            c.succeeded,
            c.failed,
            c.invocation_error,
            c.timed_out
        );
        if report.interrupted {
            line.push_str(" (interrupted)");
        }
        line
    }

    /// Every root block in report order, then the summary line.
    pub fn render_report(&self, report: &RunReport) -> Vec<String> {
        let mut out = Vec::new();
        for result in &report.results {
            out.extend(self.root_block(result, &report.command));
        }
        out.push(self.summary_line(report));
        out
    }
}

/// Short human description of a terminal state, e.g. `failed (exit 1)`.
pub fn describe_outcome(result: &InvocationResult) -> String {
    let mut text = match &result.outcome {
        Outcome::Succeeded => "passed".to_string(),
        Outcome::Failed => match result.exit_code {
            Some(code) => format!("failed (exit {code})"),
            None => "failed (terminated by signal)".to_string(),
        },
        Outcome::InvocationError { reason } => format!("invocation error: {reason}"),
        Outcome::TimedOut => "timed out".to_string(),
        Outcome::Interrupted => "interrupted".to_string(),
    };
    if result.attempts > 1 {
        text.push_str(&format!(" after {} attempts", result.attempts));
    }
    text
}

/// Grouping listing for the `roots` command: each root, its files indented beneath it,
/// then the files that selected nothing.
pub fn render_grouping(group: &FileGroup, base: &Utf8Path) -> Vec<String> {
    let mut out = Vec::new();
    for entry in group.entries() {
        out.push(entry.root.display_from(base));
        for file in &entry.files {
            let shown = file
                .strip_prefix(base)
                .map(|p| p.as_str())
                .unwrap_or(file.as_str());
            out.push(format!("  {shown}"));
        }
    }
    if !group.unowned().is_empty() {
        out.push("(no project root)".to_string());
        for file in group.unowned() {
            out.push(format!("  {file}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use fanout_types::{OutputLine, ProjectRoot};
    use std::time::Duration;
    use time::macros::datetime;

    fn root_result(path: &str, outcome: Outcome, exit_code: Option<i32>) -> RootResult {
        RootResult {
            root: ProjectRoot::new(path),
            files: Vec::new(),
            result: InvocationResult {
                outcome,
                exit_code,
                output: vec![
                    OutputLine::stdout("Checking a v0.1.0"),
                    OutputLine::stderr("warning: unused variable"),
                ],
                duration: Duration::from_millis(1250),
                attempts: 1,
            },
        }
    }

    fn report(results: Vec<RootResult>, interrupted: bool) -> RunReport {
        RunReport {
            hook: "check".to_string(),
            command: "cargo check".to_string(),
            started_at: datetime!(2026-01-01 00:00:00 UTC),
            finished_at: datetime!(2026-01-01 00:00:02 UTC),
            interrupted,
            results,
            skipped: Vec::new(),
        }
    }

    #[test]
    fn root_block_tags_every_line() {
        let r = TextRenderer::new(Utf8Path::new("/repo"), true);
        let lines = r.root_block(
            &root_result("/repo/a", Outcome::Failed, Some(101)),
            "cargo check",
        );
        assert_eq!(
            lines,
            vec![
                "==> a (cargo check) <==",
                "[a] Checking a v0.1.0",
                "[a] warning: unused variable",
                "--> a: failed (exit 101) in 1.25s",
            ]
        );
    }

    #[test]
    fn prefix_can_be_disabled() {
        let r = TextRenderer::new(Utf8Path::new("/repo"), false);
        let lines = r.root_block(
            &root_result("/repo", Outcome::Succeeded, Some(0)),
            "cargo fmt --",
        );
        assert_eq!(lines[0], "==> . (cargo fmt --) <==");
        assert_eq!(lines[1], "Checking a v0.1.0");
        assert_eq!(lines[3], "--> .: passed in 1.25s");
    }

    #[test]
    fn roots_outside_base_show_absolute_paths() {
        let r = TextRenderer::new(Utf8Path::new("/repo"), true);
        let lines = r.root_block(&root_result("/elsewhere/x", Outcome::TimedOut, None), "c");
        assert_eq!(lines[0], "==> /elsewhere/x (c) <==");
        assert!(lines[3].contains("timed out"));
    }

    #[test]
    fn summary_line_counts_each_kind() {
        let r = TextRenderer::new(Utf8Path::new("/repo"), true);
        let rep = report(
            vec![
                root_result("/repo/a", Outcome::Succeeded, Some(0)),
                root_result("/repo/b", Outcome::Failed, Some(1)),
                root_result(
                    "/repo/c",
                    Outcome::InvocationError {
                        reason: "no cargo".into(),
                    },
                    None,
                ),
            ],
            false,
        );
        assert_eq!(
            r.summary_line(&rep),
            "fanout check: 3 root(s): 1 passed, 1 failed, 1 invocation error(s), 0 timed out"
        );
        let all = r.render_report(&rep);
        assert_eq!(all.len(), 3 * 4 + 1);
    }

    #[test]
    fn interrupted_summary_is_marked() {
        let r = TextRenderer::new(Utf8Path::new("/repo"), true);
        let rep = report(vec![root_result("/repo/a", Outcome::Interrupted, None)], true);
        assert!(r.summary_line(&rep).ends_with("(interrupted)"));
    }

    #[test]
    fn retried_outcomes_mention_attempts() {
        let mut result = root_result("/repo/a", Outcome::Succeeded, Some(0)).result;
        result.attempts = 3;
        assert_eq!(describe_outcome(&result), "passed after 3 attempts");
    }

    #[test]
    fn grouping_lists_roots_files_and_unowned() {
        let mut g = FileGroup::new();
        g.insert(ProjectRoot::new("/repo/b"), Utf8PathBuf::from("/repo/b/src/lib.rs"));
        g.insert(ProjectRoot::new("/repo/a"), Utf8PathBuf::from("/repo/a/Cargo.toml"));
        g.push_unowned(Utf8PathBuf::from("README.md"));

        assert_eq!(
            render_grouping(&g, Utf8Path::new("/repo")),
            vec![
                "b",
                "  b/src/lib.rs",
                "a",
                "  a/Cargo.toml",
                "(no project root)",
                "  README.md",
            ]
        );
    }
}
