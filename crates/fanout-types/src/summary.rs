//! Machine-readable summary of a run (`fanout.summary.v1`).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{RunReport, RunStatus, ids};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunSummary {
    pub schema: String,
    pub tool: ToolMeta,
    pub hook: String,
    pub command: String,
    pub status: RunStatus,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    pub duration_ms: u64,
    pub counts: OutcomeCounts,
    pub roots: Vec<RootSummary>,
    #[serde(default)]
    pub skipped_files: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

/// Roots per outcome kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OutcomeCounts {
    pub succeeded: u32,
    pub failed: u32,
    pub invocation_error: u32,
    pub timed_out: u32,
    pub interrupted: u32,
}

impl OutcomeCounts {
    pub fn total(&self) -> u32 {
        self.succeeded + self.failed + self.invocation_error + self.timed_out + self.interrupted
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RootSummary {
    pub path: String,
    pub outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub duration_ms: u64,
    pub attempts: u32,
    #[serde(default)]
    pub files: Vec<String>,
}

impl RunSummary {
    /// `version` is the running tool's version (the CLI passes its own package version).
    pub fn from_report(report: &RunReport, version: &str) -> Self {
        let roots = report
            .results
            .iter()
            .map(|r| RootSummary {
                path: r.root.path().to_string(),
                outcome: r.result.outcome.code().to_string(),
                exit_code: r.result.exit_code,
                reason: r.result.outcome.reason().map(str::to_string),
                duration_ms: r.result.duration.as_millis() as u64,
                attempts: r.result.attempts,
                files: r.files.iter().map(|f| f.to_string()).collect(),
            })
            .collect();

        RunSummary {
            schema: ids::SCHEMA_SUMMARY_V1.to_string(),
            tool: ToolMeta {
                name: ids::TOOL_NAME.to_string(),
                version: version.to_string(),
            },
            hook: report.hook.clone(),
            command: report.command.clone(),
            status: report.status(),
            started_at: report.started_at,
            finished_at: report.finished_at,
            duration_ms: report.duration().as_millis() as u64,
            counts: report.counts(),
            roots,
            skipped_files: report.skipped.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == RunStatus::Passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InvocationResult, Outcome, ProjectRoot, RootResult};
    use std::time::Duration;

    #[test]
    fn summary_serializes_counts_and_roots() {
        let now = OffsetDateTime::now_utc();
        let report = RunReport {
            hook: "check".into(),
            command: "cargo check".into(),
            started_at: now,
            finished_at: now,
            interrupted: false,
            results: vec![RootResult {
                root: ProjectRoot::new("/r/a"),
                files: vec!["/r/a/src/lib.rs".into()],
                result: InvocationResult {
                    outcome: Outcome::Failed,
                    exit_code: Some(101),
                    output: Vec::new(),
                    duration: Duration::from_millis(12),
                    attempts: 1,
                },
            }],
            skipped: vec!["/r/README.md".into()],
        };

        let summary = RunSummary::from_report(&report, "0.1.0");
        let json = serde_json::to_value(&summary).expect("serialize");

        assert_eq!(json["schema"], "fanout.summary.v1");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["counts"]["failed"], 1);
        assert_eq!(json["roots"][0]["path"], "/r/a");
        assert_eq!(json["roots"][0]["exit_code"], 101);
        assert!(json["roots"][0].get("reason").is_none());
        assert_eq!(json["skipped_files"][0], "/r/README.md");

        let back: RunSummary = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, summary);
    }
}
