use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ids;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stream {
    Stdout,
    Stderr,
}

/// One captured line, in arrival order across both streams.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLine {
    pub stream: Stream,
    pub text: String,
}

impl OutputLine {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stream: Stream::Stdout,
            text: text.into(),
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            stream: Stream::Stderr,
            text: text.into(),
        }
    }
}

/// Terminal state of one invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Exit code zero.
    Succeeded,
    /// The tool ran and reported problems (nonzero exit or killed by a signal).
    Failed,
    /// The executable could not be started or waited on.
    InvocationError { reason: String },
    /// The configured time bound expired and the process was killed.
    TimedOut,
    /// The run was cancelled before this invocation finished.
    Interrupted,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded)
    }

    /// Stable snake_case code.
    pub fn code(&self) -> &'static str {
        match self {
            Outcome::Succeeded => ids::OUTCOME_SUCCEEDED,
            Outcome::Failed => ids::OUTCOME_FAILED,
            Outcome::InvocationError { .. } => ids::OUTCOME_INVOCATION_ERROR,
            Outcome::TimedOut => ids::OUTCOME_TIMED_OUT,
            Outcome::Interrupted => ids::OUTCOME_INTERRUPTED,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::InvocationError { reason } => Some(reason),
            _ => None,
        }
    }
}

/// What the invoker hands back for one root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationResult {
    pub outcome: Outcome,
    /// Process exit code; absent when the process never ran, was killed, or died by signal.
    pub exit_code: Option<i32>,
    pub output: Vec<OutputLine>,
    /// Wall clock, diagnostics only.
    pub duration: Duration,
    pub attempts: u32,
}

impl InvocationResult {
    pub fn invocation_error(reason: impl Into<String>, duration: Duration) -> Self {
        Self {
            outcome: Outcome::InvocationError {
                reason: reason.into(),
            },
            exit_code: None,
            output: Vec::new(),
            duration,
            attempts: 1,
        }
    }

    /// A result with its output discarded.
    pub fn interrupted(duration: Duration, attempts: u32) -> Self {
        Self {
            outcome: Outcome::Interrupted,
            exit_code: None,
            output: Vec::new(),
            duration,
            attempts,
        }
    }

    pub fn output_text(&self) -> String {
        let mut out = String::new();
        for line in &self.output {
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }
}
