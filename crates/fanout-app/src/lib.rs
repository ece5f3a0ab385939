//! Use case orchestration for fanout.
//!
//! This crate provides the application layer: it resolves configuration, asks the repo layer
//! for the root grouping, dispatches the invoker over it and assembles the report. It is
//! intentionally thin and delegates heavy lifting to the appropriate layers.
//!
//! The CLI crate depends on this; it only handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod coordinate;
mod filter;
mod roots;
mod run;
mod summary;

pub use coordinate::coordinate;
pub use filter::FileFilter;
pub use roots::{RootsInput, run_roots};
pub use run::{RunInput, RunOutput, Targets, load_config, run_hook};
pub use summary::{serialize_summary, write_summary};
