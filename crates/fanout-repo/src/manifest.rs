//! Just enough of a Cargo manifest to answer "is this a workspace, and whom does it claim?".

use anyhow::Context;
use camino::Utf8Path;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use toml_edit::{DocumentMut, Item};

const DEP_TABLES: &[&str] = &["dependencies", "dev-dependencies", "build-dependencies"];

/// Facts about one manifest that drive root classification.
#[derive(Clone, Debug, Default)]
pub struct ManifestFacts {
    /// Present when the manifest declares `[workspace]`.
    pub workspace: Option<WorkspaceDecl>,
    /// `package.workspace`: explicit path to the workspace root, relative to this manifest.
    pub package_workspace: Option<String>,
    /// `path` values of this package's dependencies, relative to this manifest. Empty for
    /// virtual manifests.
    pub path_deps: Vec<String>,
}

/// The member list of a `[workspace]` table, as a membership query.
#[derive(Clone, Debug)]
pub struct WorkspaceDecl {
    literal_members: BTreeSet<String>,
    member_globs: GlobSet,
    excludes: Vec<String>,
    exclude_globs: GlobSet,
    path_deps: BTreeSet<String>,
}

impl WorkspaceDecl {
    pub fn new(
        members: &[String],
        excludes: &[String],
        path_deps: &[String],
    ) -> anyhow::Result<Self> {
        let mut literal_members = BTreeSet::new();
        let mut globs = Vec::new();
        for m in members.iter().map(|m| normalize_rel(m)) {
            if is_glob(&m) {
                globs.push(m);
            } else {
                literal_members.insert(m);
            }
        }
        let excludes: Vec<String> = excludes.iter().map(|e| normalize_rel(e)).collect();

        Ok(Self {
            literal_members,
            member_globs: build_globset(&globs).context("compile members globset")?,
            exclude_globs: build_globset(&excludes).context("compile exclude globset")?,
            excludes,
            path_deps: path_deps
                .iter()
                .map(|p| normalize_rel(p))
                .filter(|p| !p.starts_with("..") && !p.starts_with('/'))
                .collect(),
        })
    }

    /// Does this workspace claim the package whose directory is `rel_dir` (relative to the
    /// workspace root)?
    ///
    /// Literal `members` entries always count. Glob members and path dependencies of the
    /// root package count unless the directory sits under an `exclude` entry.
    pub fn claims(&self, rel_dir: &Utf8Path) -> bool {
        let rel = normalize_rel(rel_dir.as_str());
        if rel.is_empty() || self.literal_members.contains(&rel) {
            return true;
        }
        let matched = self.member_globs.is_match(&rel) || self.path_deps.contains(&rel);
        matched && !self.is_excluded(&rel)
    }

    /// Is `rel_dir` (relative to the workspace root) under an `exclude` entry?
    pub fn excludes(&self, rel_dir: &Utf8Path) -> bool {
        self.is_excluded(&normalize_rel(rel_dir.as_str()))
    }

    fn is_excluded(&self, rel: &str) -> bool {
        self.exclude_globs.is_match(rel)
            || self
                .excludes
                .iter()
                .any(|e| rel == e || rel.starts_with(&format!("{e}/")))
    }
}

/// Where manifests come from. The classifier only needs this query; tests can substitute
/// an in-memory or instrumented source.
pub trait ManifestSource {
    /// Read and interpret the manifest at `manifest_path`.
    fn load(&self, manifest_path: &Utf8Path) -> anyhow::Result<ManifestFacts>;
}

/// Reads `Cargo.toml` files from disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct CargoManifests;

impl ManifestSource for CargoManifests {
    fn load(&self, manifest_path: &Utf8Path) -> anyhow::Result<ManifestFacts> {
        let text = std::fs::read_to_string(manifest_path)
            .with_context(|| format!("read {manifest_path}"))?;
        parse_manifest_facts(&text).with_context(|| format!("parse {manifest_path}"))
    }
}

pub fn parse_manifest_facts(text: &str) -> anyhow::Result<ManifestFacts> {
    let doc = text.parse::<DocumentMut>().context("parse manifest toml")?;

    let package_workspace = doc
        .get("package")
        .and_then(|p| p.get("workspace"))
        .and_then(|w| w.as_str())
        .map(str::to_string);

    let path_deps = package_path_deps(&doc);

    let Some(ws) = doc.get("workspace") else {
        return Ok(ManifestFacts {
            workspace: None,
            package_workspace,
            path_deps,
        });
    };

    let members = string_array(ws.get("members"));
    let excludes = string_array(ws.get("exclude"));

    Ok(ManifestFacts {
        workspace: Some(WorkspaceDecl::new(&members, &excludes, &path_deps)?),
        package_workspace,
        path_deps,
    })
}

fn string_array(item: Option<&Item>) -> Vec<String> {
    item.and_then(|i| i.as_array())
        .map(|a| {
            a.iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// Path dependencies of the manifest's package, including `[target.*]` tables.
fn package_path_deps(doc: &DocumentMut) -> Vec<String> {
    let mut out = Vec::new();
    if doc.get("package").is_none() {
        return out;
    }

    let mut tables: Vec<&Item> = DEP_TABLES.iter().filter_map(|t| doc.get(*t)).collect();
    if let Some(targets) = doc.get("target").and_then(|t| t.as_table_like()) {
        for (_, target) in targets.iter() {
            tables.extend(DEP_TABLES.iter().filter_map(|t| target.get(*t)));
        }
    }

    for table in tables.into_iter().filter_map(|t| t.as_table_like()) {
        for (_, dep) in table.iter() {
            if let Some(path) = dep.get("path").and_then(|p| p.as_str()) {
                out.push(path.to_string());
            }
        }
    }
    out
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut b = GlobSetBuilder::new();
    for p in patterns {
        // Cargo member globs are path globs: `*` stays within one directory level.
        b.add(GlobBuilder::new(p).literal_separator(true).build()?);
    }
    Ok(b.build()?)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Forward slashes, no leading `./`, no trailing `/`.
fn normalize_rel(s: &str) -> String {
    let mut v = s.replace('\\', "/");
    while let Some(rest) = v.strip_prefix("./") {
        v = rest.to_string();
    }
    while v.ends_with('/') {
        v.pop();
    }
    if v == "." { String::new() } else { v }
}
