//! Relevant-file filter: which candidate files a hook cares about.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled `files` patterns of a hook. Empty means every file is relevant.
#[derive(Clone, Debug)]
pub struct FileFilter {
    set: Option<GlobSet>,
}

impl FileFilter {
    pub fn new(patterns: &[String]) -> anyhow::Result<Self> {
        if patterns.is_empty() {
            return Ok(Self { set: None });
        }
        let mut builder = GlobSetBuilder::new();
        for p in patterns {
            builder.add(Glob::new(p).with_context(|| format!("invalid files glob: {p}"))?);
        }
        let set = builder.build().context("compile files globset")?;
        Ok(Self { set: Some(set) })
    }

    /// A file is relevant when a pattern matches its name or its path relative to `base`.
    pub fn matches(&self, file: &Utf8Path, base: &Utf8Path) -> bool {
        let Some(set) = &self.set else {
            return true;
        };
        let rel = file.strip_prefix(base).unwrap_or(file);
        set.is_match(rel.as_str()) || file.file_name().is_some_and(|name| set.is_match(name))
    }

    /// Split `files` into (relevant, ignored), keeping input order in both.
    pub fn partition(
        &self,
        files: &[Utf8PathBuf],
        base: &Utf8Path,
    ) -> (Vec<Utf8PathBuf>, Vec<Utf8PathBuf>) {
        files.iter().cloned().partition(|f| self.matches(f, base))
    }
}
