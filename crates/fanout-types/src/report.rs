use camino::Utf8PathBuf;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;

use crate::{InvocationResult, Outcome, OutcomeCounts, ProjectRoot, ids};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Passed,
    Failed,
    Interrupted,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Passed => ids::EXIT_PASS,
            RunStatus::Failed => ids::EXIT_FAIL,
            RunStatus::Interrupted => ids::EXIT_INTERRUPTED,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Passed => "passed",
            RunStatus::Failed => "failed",
            RunStatus::Interrupted => "interrupted",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootResult {
    pub root: ProjectRoot,
    pub files: Vec<Utf8PathBuf>,
    pub result: InvocationResult,
}

/// Aggregate of one hook run. Results are in first-seen root order regardless of the order
/// in which invocations completed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub hook: String,
    /// `program args...` as dispatched.
    pub command: String,
    pub started_at: OffsetDateTime,
    pub finished_at: OffsetDateTime,
    /// Set when the run was cancelled; per-root results are then all `Interrupted`.
    pub interrupted: bool,
    pub results: Vec<RootResult>,
    /// Candidate files that did not select any root (unowned or filtered out).
    pub skipped: Vec<Utf8PathBuf>,
}

impl RunReport {
    pub fn status(&self) -> RunStatus {
        if self.interrupted {
            RunStatus::Interrupted
        } else if self.results.iter().all(|r| r.result.outcome.is_success()) {
            RunStatus::Passed
        } else {
            RunStatus::Failed
        }
    }

    /// True iff every root succeeded and the run was not interrupted.
    pub fn success(&self) -> bool {
        self.status() == RunStatus::Passed
    }

    pub fn counts(&self) -> OutcomeCounts {
        let mut c = OutcomeCounts::default();
        for r in &self.results {
            match r.result.outcome {
                Outcome::Succeeded => c.succeeded += 1,
                Outcome::Failed => c.failed += 1,
                Outcome::InvocationError { .. } => c.invocation_error += 1,
                Outcome::TimedOut => c.timed_out += 1,
                Outcome::Interrupted => c.interrupted += 1,
            }
        }
        c
    }

    pub fn duration(&self) -> Duration {
        let d = self.finished_at - self.started_at;
        d.try_into().unwrap_or(Duration::ZERO)
    }
}
