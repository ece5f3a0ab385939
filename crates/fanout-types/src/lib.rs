//! Stable DTOs and IDs used across the fanout workspace.
//!
//! This crate is intentionally boring:
//! - project roots and the file grouping keyed by them
//! - tool specifications and run options
//! - invocation results, the aggregated run report and its JSON summary
//! - stable string IDs and exit codes

#![forbid(unsafe_code)]

pub mod group;
pub mod ids;
pub mod report;
pub mod result;
pub mod root;
pub mod summary;
pub mod tool;

pub use group::{FileGroup, GroupEntry};
pub use report::{RootResult, RunReport, RunStatus};
pub use result::{InvocationResult, Outcome, OutputLine, Stream};
pub use root::ProjectRoot;
pub use summary::{OutcomeCounts, RootSummary, RunSummary, ToolMeta};
pub use tool::{FileArgs, RunOptions, ToolSpec, default_jobs};
