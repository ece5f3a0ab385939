use camino::{Utf8Path, Utf8PathBuf};

/// Make `path` absolute against `base` without touching the filesystem.
pub fn absolutize(base: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Canonical form of `path` (absolute, symlinks resolved), tolerating missing tails.
///
/// A changed-file list may name files that no longer exist (deleted or renamed in the same
/// commit); the nearest existing ancestor is canonicalized and the missing components are
/// re-appended. Returns `None` when no ancestor can be resolved.
pub fn canonicalize_lossy(path: &Utf8Path) -> Option<Utf8PathBuf> {
    let mut existing = path;
    let mut tail: Vec<&str> = Vec::new();
    loop {
        if let Ok(mut resolved) = existing.canonicalize_utf8() {
            for segment in tail.iter().rev() {
                resolved.push(segment);
            }
            return Some(resolved);
        }
        tail.push(existing.file_name()?);
        existing = existing.parent()?;
    }
}
