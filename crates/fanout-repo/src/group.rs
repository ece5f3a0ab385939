//! Root Grouper: partition a changed-file list by owning root.

use camino::{Utf8Path, Utf8PathBuf};
use fanout_types::FileGroup;
use std::collections::HashSet;
use tracing::debug;

use crate::classify::Classifier;
use crate::manifest::ManifestSource;

/// Group `files` by the root that owns each of them.
///
/// Roots appear in the order their first file appears in `files`. Files are stored in their
/// canonical absolute form; two spellings of the same file (relative vs absolute, through a
/// symlinked directory) count once. Files with no root are kept aside as unowned.
pub fn group_files<S: ManifestSource>(
    classifier: &mut Classifier<S>,
    files: &[Utf8PathBuf],
) -> FileGroup {
    let mut group = FileGroup::new();
    let mut seen: HashSet<Utf8PathBuf> = HashSet::new();

    for file in files {
        let Some(abs) = classifier.resolve_path(file) else {
            debug!(file = %file, "path cannot be resolved");
            group.push_unowned(file.clone());
            continue;
        };
        if !seen.insert(abs.clone()) {
            continue;
        }
        match classifier.classify_resolved(&abs) {
            Some(root) => {
                group.insert(root, abs);
            }
            None => {
                debug!(file = %file, "no project root");
                group.push_unowned(file.clone());
            }
        }
    }

    group
}

/// One-shot grouping with a fresh on-disk classifier.
pub fn group(files: &[Utf8PathBuf], base_dir: &Utf8Path, boundary: Option<&Utf8Path>) -> FileGroup {
    let mut classifier = Classifier::new(base_dir).with_boundary(boundary);
    group_files(&mut classifier, files)
}
