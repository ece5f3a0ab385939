use camino::Utf8PathBuf;
use std::collections::BTreeMap;
use std::time::Duration;

/// Upper bound for the default worker count, so very wide machines do not start dozens of
/// concurrent cargo builds against the same disk.
pub const MAX_DEFAULT_JOBS: usize = 8;

/// Default pause between attempts when retrying invocation errors.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(250);

/// How candidate files reach the tool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FileArgs {
    /// The tool runs over the whole project; files only select which roots run.
    #[default]
    RootWide,
    /// The group's files are appended to the argument list, relative to the root.
    Append,
}

/// Immutable description of one hook: which executable to run and how.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolSpec {
    /// Hook identifier (`fmt`, `check`, `clippy`, or a configured name).
    pub hook: String,
    pub program: String,
    pub args: Vec<String>,
    pub file_args: FileArgs,
    /// Variables set on top of the inherited environment.
    pub env: BTreeMap<String, String>,
    /// Glob patterns selecting which candidate files are relevant. Empty means all files.
    pub file_patterns: Vec<String>,
    /// Per-invocation time bound.
    pub timeout: Option<Duration>,
}

impl ToolSpec {
    pub fn new(hook: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            hook: hook.into(),
            program: program.into(),
            args: Vec::new(),
            file_args: FileArgs::RootWide,
            env: BTreeMap::new(),
            file_patterns: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `program arg1 arg2 ...`, for headers and logs.
    pub fn command_line(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }
}

/// Coordinator knobs resolved from config and CLI overrides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOptions {
    /// Maximum concurrent invocations (at least 1).
    pub jobs: usize,
    /// Fallback time bound for hooks without their own.
    pub timeout: Option<Duration>,
    /// Extra attempts granted to roots whose tool could not be started.
    pub retry_invocation_errors: u32,
    pub retry_delay: Duration,
    /// Upward walks stop at this directory (inclusive).
    pub search_boundary: Option<Utf8PathBuf>,
    /// Tag every captured line with its root.
    pub prefix_lines: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            timeout: None,
            retry_invocation_errors: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
            search_boundary: None,
            prefix_lines: true,
        }
    }
}

/// One worker per available processing unit, capped at [`MAX_DEFAULT_JOBS`].
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_DEFAULT_JOBS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_joins_program_and_args() {
        let spec = ToolSpec::new("clippy", "cargo").with_args(["clippy", "--", "-D", "warnings"]);
        assert_eq!(spec.command_line(), "cargo clippy -- -D warnings");
    }

    #[test]
    fn default_jobs_is_bounded() {
        let jobs = default_jobs();
        assert!((1..=MAX_DEFAULT_JOBS).contains(&jobs));
    }
}
