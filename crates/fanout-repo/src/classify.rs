//! Path Classifier: walk upward from a file to the project root that owns it.

use camino::{Utf8Path, Utf8PathBuf};
use fanout_types::{ProjectRoot, ids::MANIFEST_FILE};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::canonical::{absolutize, canonicalize_lossy};
use crate::discover::is_skipped_dir;
use crate::manifest::{CargoManifests, ManifestFacts, ManifestSource, WorkspaceDecl};

/// Resolves candidate paths to their owning [`ProjectRoot`].
///
/// Manifests are read at most once per classifier; reuse one classifier for a whole batch.
pub struct Classifier<S = CargoManifests> {
    source: S,
    base_dir: Utf8PathBuf,
    boundary: Option<Utf8PathBuf>,
    facts: HashMap<Utf8PathBuf, Option<Rc<ManifestFacts>>>,
    /// Workspace root -> every package directory cargo would treat as a member.
    members: HashMap<Utf8PathBuf, Rc<HashSet<Utf8PathBuf>>>,
}

impl Classifier<CargoManifests> {
    /// Classifier over on-disk `Cargo.toml` files. Relative candidates resolve against
    /// `base_dir`.
    pub fn new(base_dir: &Utf8Path) -> Self {
        Self::with_source(CargoManifests, base_dir)
    }
}

impl<S: ManifestSource> Classifier<S> {
    pub fn with_source(source: S, base_dir: &Utf8Path) -> Self {
        let base_dir = canonicalize_lossy(base_dir).unwrap_or_else(|| base_dir.to_path_buf());
        Self {
            source,
            base_dir,
            boundary: None,
            facts: HashMap::new(),
            members: HashMap::new(),
        }
    }

    /// Stop upward walks at `boundary` (inclusive). Files outside it have no root.
    pub fn with_boundary(mut self, boundary: Option<&Utf8Path>) -> Self {
        self.boundary = boundary.map(|b| {
            let abs = absolutize(&self.base_dir, b);
            canonicalize_lossy(&abs).unwrap_or(abs)
        });
        self
    }

    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    pub fn boundary(&self) -> Option<&Utf8Path> {
        self.boundary.as_deref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Absolute canonical form of a candidate path.
    pub fn resolve_path(&self, file: &Utf8Path) -> Option<Utf8PathBuf> {
        canonicalize_lossy(&absolutize(&self.base_dir, file))
    }

    /// Root owning `file`, or `None` when no manifest encloses it. Never an error.
    pub fn classify(&mut self, file: &Utf8Path) -> Option<ProjectRoot> {
        let abs = self.resolve_path(file)?;
        self.classify_resolved(&abs)
    }

    /// Like [`Classifier::classify`] for a path already produced by
    /// [`Classifier::resolve_path`].
    pub fn classify_resolved(&mut self, abs: &Utf8Path) -> Option<ProjectRoot> {
        let start = abs.parent()?;
        self.classify_dir(start)
    }

    /// Root owning the canonical directory `start`.
    ///
    /// The first manifest found going upward is the candidate. If it declares `[workspace]`
    /// it is the root. Otherwise an explicit `package.workspace` pointer is followed, and
    /// failing that the walk continues: the first ancestor workspace that claims the
    /// candidate as a member becomes the root. A workspace claims a package either through
    /// its own member list or because a member reaches it through `path` dependencies.
    /// Unclaimed candidates are independent roots.
    pub fn classify_dir(&mut self, start: &Utf8Path) -> Option<ProjectRoot> {
        let boundary = self.boundary.clone();
        if let Some(b) = &boundary
            && !start.starts_with(b)
        {
            debug!(dir = %start, boundary = %b, "outside search boundary");
            return None;
        }

        let mut visited: HashSet<Utf8PathBuf> = HashSet::new();
        let mut candidate: Option<Utf8PathBuf> = None;
        let mut dir = start.to_path_buf();

        loop {
            if !visited.insert(dir.clone()) {
                warn!(dir = %dir, "directory revisited during upward walk; stopping");
                break;
            }

            if let Some(facts) = self.facts_for(&dir) {
                if candidate.is_none() {
                    if facts.workspace.is_some() {
                        debug!(root = %dir, "manifest declares a workspace");
                        return Some(ProjectRoot::new(dir));
                    }
                    if let Some(pointer) = &facts.package_workspace
                        && let Some(root) = self.follow_pointer(&dir, pointer)
                    {
                        return Some(root);
                    }
                    candidate = Some(dir.clone());
                } else if let (Some(member), Some(ws)) = (&candidate, &facts.workspace)
                    && let Ok(rel) = member.strip_prefix(&dir)
                {
                    if ws.claims(rel) {
                        debug!(member = %member, root = %dir, "claimed by ancestor workspace");
                        return Some(ProjectRoot::new(dir));
                    }
                    if !ws.excludes(rel) && self.workspace_members(&dir, ws).contains(member) {
                        debug!(
                            member = %member,
                            root = %dir,
                            "member reached through path dependencies"
                        );
                        return Some(ProjectRoot::new(dir));
                    }
                }
            }

            if boundary.as_deref() == Some(dir.as_path()) {
                break;
            }
            match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => break,
            }
        }

        candidate.map(ProjectRoot::new)
    }

    /// Follow `package.workspace = "<rel>"`; only trusted when it lands on a workspace.
    fn follow_pointer(&mut self, dir: &Utf8Path, pointer: &str) -> Option<ProjectRoot> {
        let target = canonicalize_lossy(&dir.join(pointer))?;
        match self.facts_for(&target) {
            Some(facts) if facts.workspace.is_some() => {
                debug!(member = %dir, root = %target, "followed package.workspace");
                Some(ProjectRoot::new(target))
            }
            _ => {
                warn!(
                    manifest = %dir.join(MANIFEST_FILE),
                    pointer,
                    "package.workspace does not point at a workspace manifest; ignoring"
                );
                None
            }
        }
    }

    /// Package directories belonging to the workspace at `root`: the root package, the
    /// directories its member list claims, and everything those reach through `path`
    /// dependencies that lies inside `root` and is not excluded.
    fn workspace_members(
        &mut self,
        root: &Utf8Path,
        ws: &WorkspaceDecl,
    ) -> Rc<HashSet<Utf8PathBuf>> {
        if let Some(cached) = self.members.get(root) {
            return Rc::clone(cached);
        }

        let mut queue: VecDeque<Utf8PathBuf> = VecDeque::from([root.to_path_buf()]);
        for entry in WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
        {
            let Some(dir) = Utf8Path::from_path(entry.path()) else {
                continue;
            };
            if let Ok(rel) = dir.strip_prefix(root)
                && ws.claims(rel)
                && dir.join(MANIFEST_FILE).is_file()
            {
                queue.push_back(dir.to_path_buf());
            }
        }

        let mut members = HashSet::new();
        while let Some(pkg) = queue.pop_front() {
            if !members.insert(pkg.clone()) {
                continue;
            }
            let Some(facts) = self.facts_for(&pkg) else {
                continue;
            };
            for dep in &facts.path_deps {
                let Some(dep_dir) = canonicalize_lossy(&pkg.join(dep)) else {
                    continue;
                };
                let inside = dep_dir
                    .strip_prefix(root)
                    .is_ok_and(|rel| !ws.excludes(rel));
                if inside && !members.contains(&dep_dir) {
                    queue.push_back(dep_dir);
                }
            }
        }
        debug!(root = %root, members = members.len(), "expanded workspace members");

        let members = Rc::new(members);
        self.members.insert(root.to_path_buf(), Rc::clone(&members));
        members
    }

    /// Facts for the manifest in `dir`; `None` when there is no manifest there.
    ///
    /// A manifest that cannot be read or parsed still marks a project boundary, it just
    /// claims no members.
    fn facts_for(&mut self, dir: &Utf8Path) -> Option<Rc<ManifestFacts>> {
        if let Some(cached) = self.facts.get(dir) {
            return cached.clone();
        }
        let manifest = dir.join(MANIFEST_FILE);
        let facts = if manifest.is_file() {
            match self.source.load(&manifest) {
                Ok(f) => Some(Rc::new(f)),
                Err(err) => {
                    warn!(manifest = %manifest, "unusable manifest: {err:#}");
                    Some(Rc::new(ManifestFacts::default()))
                }
            }
        } else {
            None
        };
        self.facts.insert(dir.to_path_buf(), facts.clone());
        facts
    }
}
