//! Repository adapters: classify paths to project roots, group changed files, read Cargo
//! manifests.
//!
//! This crate is allowed to do filesystem IO. It should not spawn external processes; the
//! changed-file list is supplied by the caller (typically the hook framework via the CLI).

#![forbid(unsafe_code)]

mod canonical;
mod classify;
mod discover;
mod group;
mod manifest;

pub use canonical::{absolutize, canonicalize_lossy};
pub use classify::Classifier;
pub use discover::discover_roots;
pub use group::{group, group_files};
pub use manifest::{CargoManifests, ManifestFacts, ManifestSource, WorkspaceDecl, parse_manifest_facts};

/// Fuzz-friendly API for testing parsing robustness without filesystem access.
/// These functions are designed to never panic on any input.
pub mod fuzz {
    use camino::Utf8Path;

    /// Parse arbitrary text as a Cargo manifest and, if it declares a workspace, ask it
    /// about `rel_dir`. **Never panics** on any input.
    pub fn manifest_claims(text: &str, rel_dir: &str) -> anyhow::Result<bool> {
        let facts = super::parse_manifest_facts(text)?;
        Ok(facts
            .workspace
            .is_some_and(|ws| ws.claims(Utf8Path::new(rel_dir))))
    }

    /// Build a membership query from raw member/exclude patterns and test candidates.
    ///
    /// Returns `Ok(claimed)` if every pattern compiles, `Err(...)` otherwise.
    /// **Never panics** on any input.
    pub fn claimed_members(
        members: &[String],
        excludes: &[String],
        candidates: &[String],
    ) -> anyhow::Result<Vec<String>> {
        let ws = super::WorkspaceDecl::new(members, excludes, &[])?;
        Ok(candidates
            .iter()
            .filter(|c| ws.claims(Utf8Path::new(c.as_str())))
            .cloned()
            .collect())
    }
}
