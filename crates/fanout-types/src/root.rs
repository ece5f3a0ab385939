use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::MANIFEST_FILE;

/// An independent project boundary: a directory whose manifest is not claimed as a
/// member by any ancestor workspace.
///
/// The path is expected to be canonical (absolute, symlinks resolved). Trailing
/// separators are dropped on construction so equal directories compare equal.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectRoot {
    path: Utf8PathBuf,
    manifest: Utf8PathBuf,
}

impl ProjectRoot {
    pub fn new<P: Into<Utf8PathBuf>>(path: P) -> Self {
        let path: Utf8PathBuf = path.into().components().collect();
        let manifest = path.join(MANIFEST_FILE);
        Self { path, manifest }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The manifest marker that identified this root.
    pub fn manifest(&self) -> &Utf8Path {
        &self.manifest
    }

    /// Human-facing label: relative to `base` when the root lives under it (`.` for `base`
    /// itself), absolute otherwise. Always forward slashes.
    pub fn display_from(&self, base: &Utf8Path) -> String {
        match self.path.strip_prefix(base) {
            Ok(rel) if rel.as_str().is_empty() => ".".to_string(),
            Ok(rel) => rel.as_str().replace('\\', "/"),
            Err(_) => self.path.as_str().replace('\\', "/"),
        }
    }
}

impl fmt::Display for ProjectRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path.as_str())
    }
}
