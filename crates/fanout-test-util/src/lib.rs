//! Shared test utilities for the fanout workspace.
//!
//! This crate exists because `xtask` needs `normalize_nondeterministic` at
//! runtime (not behind `#[cfg(test)]`), and several crates need the same
//! scratch-tree helper for filesystem tests.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use tempfile::TempDir;

/// Checked-in fixture trees under `tests/fixtures` at the workspace root.
pub fn fixtures_dir() -> Utf8PathBuf {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join("tests")
        .join("fixtures")
}

/// A throwaway directory tree. Removed on drop.
pub struct TempTree {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl TempTree {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        Self { _dir: dir, root }
    }

    /// Root as handed out by the OS; may sit behind a symlink (`/tmp` on macOS).
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Root with symlinks resolved, matching what classification reports.
    pub fn canonical_root(&self) -> Utf8PathBuf {
        self.root.canonicalize_utf8().expect("canonicalize temp root")
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> Utf8PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, contents).expect("write file");
        path
    }

    /// Create `link` pointing at the directory `target` (both relative to the root).
    #[cfg(unix)]
    pub fn symlink_dir(&self, target: &str, link: &str) -> Utf8PathBuf {
        let link_path = self.root.join(link);
        std::os::unix::fs::symlink(self.root.join(target), &link_path).expect("create symlink");
        link_path
    }
}

impl Default for TempTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize non-deterministic JSON fields for golden-file comparison.
///
/// `tool.version` is replaced only on a summary envelope (root object with
/// `schema`, `tool`, `hook`, `status` and `roots`). Timestamps and
/// `duration_ms` are normalized at any depth.
pub fn normalize_nondeterministic(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        let is_envelope = ["schema", "tool", "hook", "status", "roots"]
            .iter()
            .all(|k| obj.contains_key(*k));
        if is_envelope
            && let Some(tool) = obj.get_mut("tool")
            && let Some(tool_obj) = tool.as_object_mut()
            && tool_obj.contains_key("name")
            && tool_obj.contains_key("version")
        {
            tool_obj.insert(
                "version".to_string(),
                Value::String("__VERSION__".to_string()),
            );
        }
    }
    normalize_timings_recursive(&mut value);
    value
}

fn normalize_timings_recursive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in ["started_at", "finished_at"] {
                if map.contains_key(key) {
                    map.insert(key.to_string(), Value::String("__TIMESTAMP__".to_string()));
                }
            }
            if map.contains_key("duration_ms") {
                map.insert("duration_ms".to_string(), Value::Number(0.into()));
            }
            for val in map.values_mut() {
                normalize_timings_recursive(val);
            }
        }
        Value::Array(arr) => {
            for val in arr.iter_mut() {
                normalize_timings_recursive(val);
            }
        }
        _ => {}
    }
}

/// Rewrite absolute paths under `base` to be relative, so summaries from scratch trees can be
/// compared against checked-in expectations.
pub fn relativize_paths(value: &mut Value, base: &Utf8Path) {
    let prefix = format!("{base}/");
    match value {
        Value::String(s) => {
            if s.as_str() == base.as_str() {
                *s = ".".to_string();
            } else if let Some(rest) = s.strip_prefix(&prefix) {
                *s = rest.to_string();
            }
        }
        Value::Object(map) => map.values_mut().for_each(|v| relativize_paths(v, base)),
        Value::Array(arr) => arr.iter_mut().for_each(|v| relativize_paths(v, base)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_only_touches_envelope_tool_version() {
        let input = json!({
            "schema": "fanout.summary.v1",
            "tool": { "name": "fanout", "version": "0.1.0" },
            "hook": "check",
            "status": "passed",
            "started_at": "2026-01-01T00:00:00Z",
            "finished_at": "2026-01-01T00:00:01Z",
            "roots": [
                { "path": "/r/a", "duration_ms": 812, "tool": { "name": "cargo", "version": "1.92" } }
            ]
        });

        let result = normalize_nondeterministic(input);

        assert_eq!(result["tool"]["version"], "__VERSION__");
        assert_eq!(result["started_at"], "__TIMESTAMP__");
        assert_eq!(result["finished_at"], "__TIMESTAMP__");
        assert_eq!(result["roots"][0]["duration_ms"], 0);
        assert_eq!(result["roots"][0]["tool"]["version"], "1.92");
    }

    #[test]
    fn non_envelope_keeps_tool_version() {
        let input = json!({ "tool": { "name": "x", "version": "9" }, "duration_ms": 5 });
        let result = normalize_nondeterministic(input);
        assert_eq!(result["tool"]["version"], "9");
        assert_eq!(result["duration_ms"], 0);
    }

    #[test]
    fn relativize_rewrites_paths_under_base() {
        let mut v = json!({ "roots": [{ "path": "/t/a" }, { "path": "/t" }, { "path": "/elsewhere" }] });
        relativize_paths(&mut v, Utf8Path::new("/t"));
        assert_eq!(v["roots"][0]["path"], "a");
        assert_eq!(v["roots"][1]["path"], ".");
        assert_eq!(v["roots"][2]["path"], "/elsewhere");
    }

    #[test]
    fn temp_tree_writes_nested_files() {
        let tree = TempTree::new();
        let p = tree.write("a/b/c.txt", "hi");
        assert_eq!(std::fs::read_to_string(p).unwrap(), "hi");
        assert!(tree.canonical_root().is_absolute());
    }
}
