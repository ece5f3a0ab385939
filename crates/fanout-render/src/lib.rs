//! Rendering for the terminal and CI surfaces (combined text output, GitHub annotations).
//!
//! Renderers are pure: they take finished reports and return lines. The CLI decides where
//! the lines go.

#![forbid(unsafe_code)]

mod gha;
mod text;

pub use gha::render_github_annotations;
pub use text::{TextRenderer, describe_outcome, render_grouping};
