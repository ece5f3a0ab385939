//! Machine-readable run summary (`--summary-out`).

use anyhow::Context;
use camino::Utf8Path;
use fanout_types::{RunReport, RunSummary};

pub fn serialize_summary(report: &RunReport, version: &str) -> anyhow::Result<Vec<u8>> {
    let summary = RunSummary::from_report(report, version);
    serde_json::to_vec_pretty(&summary).context("serialize summary")
}

/// Write the summary JSON to `path`, creating parent directories.
pub fn write_summary(path: &Utf8Path, report: &RunReport, version: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
    }
    let mut bytes = serialize_summary(report, version)?;
    bytes.push(b'\n');
    std::fs::write(path, bytes).with_context(|| format!("write {path}"))
}
