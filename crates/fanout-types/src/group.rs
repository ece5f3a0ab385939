use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{BTreeMap, BTreeSet};

use crate::ProjectRoot;

/// Files that belong to one project root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupEntry {
    pub root: ProjectRoot,
    pub files: Vec<Utf8PathBuf>,
}

/// Candidate files partitioned by the project root that owns them.
///
/// Roots keep first-seen order. A file is placed at most once (either in one entry or in the
/// unowned list), no matter how often it is inserted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileGroup {
    entries: Vec<GroupEntry>,
    index: BTreeMap<Utf8PathBuf, usize>,
    placed: BTreeSet<Utf8PathBuf>,
    unowned: Vec<Utf8PathBuf>,
}

impl FileGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `file` under `root`. Returns `false` when the file was already placed.
    pub fn insert(&mut self, root: ProjectRoot, file: Utf8PathBuf) -> bool {
        if !self.placed.insert(file.clone()) {
            return false;
        }
        let idx = match self.index.get(root.path()) {
            Some(&idx) => idx,
            None => {
                let idx = self.entries.len();
                self.index.insert(root.path().to_path_buf(), idx);
                self.entries.push(GroupEntry {
                    root,
                    files: Vec::new(),
                });
                idx
            }
        };
        self.entries[idx].files.push(file);
        true
    }

    /// Add a root that has no files of its own (whole-tree discovery).
    pub fn insert_root(&mut self, root: ProjectRoot) -> bool {
        if self.index.contains_key(root.path()) {
            return false;
        }
        self.index
            .insert(root.path().to_path_buf(), self.entries.len());
        self.entries.push(GroupEntry {
            root,
            files: Vec::new(),
        });
        true
    }

    /// Record a file that no project root owns.
    pub fn push_unowned(&mut self, file: Utf8PathBuf) -> bool {
        if !self.placed.insert(file.clone()) {
            return false;
        }
        self.unowned.push(file);
        true
    }

    pub fn entries(&self) -> &[GroupEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<GroupEntry> {
        self.entries
    }

    pub fn roots(&self) -> impl Iterator<Item = &ProjectRoot> {
        self.entries.iter().map(|e| &e.root)
    }

    pub fn files_for(&self, root: &Utf8Path) -> Option<&[Utf8PathBuf]> {
        self.index
            .get(root)
            .map(|&idx| self.entries[idx].files.as_slice())
    }

    pub fn unowned(&self) -> &[Utf8PathBuf] {
        &self.unowned
    }

    /// Number of distinct roots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
