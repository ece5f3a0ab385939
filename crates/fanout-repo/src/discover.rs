//! Whole-tree root discovery for `--all` runs.

use anyhow::bail;
use camino::{Utf8Path, Utf8PathBuf};
use fanout_types::{FileGroup, ids::MANIFEST_FILE};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::canonical::{absolutize, canonicalize_lossy};
use crate::classify::Classifier;
use crate::manifest::ManifestSource;

/// Every root under `tree`, in lexicographic path order of the manifests that reveal them.
///
/// `target/` and hidden directories are not descended into. Each manifest is classified
/// like a changed file would be, so members collapse into their workspace.
pub fn discover_roots<S: ManifestSource>(
    classifier: &mut Classifier<S>,
    tree: &Utf8Path,
) -> anyhow::Result<FileGroup> {
    let abs = absolutize(classifier.base_dir(), tree);
    let Some(tree) = canonicalize_lossy(&abs).filter(|p| p.is_dir()) else {
        bail!("not a directory: {abs}");
    };

    let mut group = FileGroup::new();
    for entry in WalkDir::new(&tree)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == MANIFEST_FILE)
    {
        let Some(dir) = entry
            .path()
            .parent()
            .and_then(|p| Utf8PathBuf::from_path_buf(p.to_path_buf()).ok())
        else {
            continue;
        };
        if let Some(root) = classifier.classify_dir(&dir)
            && group.insert_root(root.clone())
        {
            debug!(root = %root, "discovered root");
        }
    }
    Ok(group)
}

pub(crate) fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name == "target" || name.starts_with('.')
}
