//! Module identity: mapping source file paths to qualified names.
//!
//! A qualified name is the path relative to the project root with the source
//! extension stripped and separators replaced by `.`:
//!
//! ```text
//! <root>/pkg/sub/mod.py  →  pkg.sub.mod
//! ```
//!
//! The root is always passed explicitly. Nothing here consults the process
//! working directory.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::PlanError;

// ---------------------------------------------------------------------------
// Module
// ---------------------------------------------------------------------------

/// One admitted source file.
///
/// Equality, ordering and hashing use `path` only; `qualified_name` is
/// derived from it and never set independently.
#[derive(Debug, Clone, Serialize)]
pub struct Module {
    path: PathBuf,
    qualified_name: String,
}

impl Module {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Module {}

impl Hash for Module {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl PartialOrd for Module {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Module {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path.cmp(&other.path)
    }
}

// ---------------------------------------------------------------------------
// Qualified names
// ---------------------------------------------------------------------------

/// Derive the qualified name of `path` under `root`.
///
/// Absolute paths must lie under `root`; relative paths are taken as already
/// relative to it. Returns `None` when the file is not a source file (by
/// extension), escapes the root, or has a non UTF-8 component.
#[must_use]
pub fn qualified_name(root: &Path, path: &Path, extensions: &[String]) -> Option<String> {
    let extension = path.extension()?.to_str()?;
    if !extensions.iter().any(|ext| ext == extension) {
        return None;
    }

    let relative = if path.is_absolute() {
        path.strip_prefix(root).ok()?
    } else {
        path
    };

    let stem = relative.with_extension("");
    let mut segments: Vec<&str> = Vec::new();
    for component in stem.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_str()?),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if segments.is_empty() {
        return None;
    }
    Some(segments.join("."))
}

// ---------------------------------------------------------------------------
// ModuleSet
// ---------------------------------------------------------------------------

/// The admitted modules of one run, indexed by path and by qualified name.
#[derive(Debug, Clone)]
pub struct ModuleSet {
    root: PathBuf,
    by_path: BTreeMap<PathBuf, Module>,
    by_name: HashMap<String, PathBuf>,
    skipped: usize,
}

impl ModuleSet {
    /// Admit every path in `paths` that is an existing source file under
    /// `root`. Everything else is skipped without error.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidRoot`] if `root` is not a readable
    /// directory, and [`PlanError::NameCollision`] if two distinct paths
    /// derive the same qualified name.
    #[instrument(skip(paths, extensions), fields(root = %root.display()))]
    pub fn new<P: AsRef<Path>>(
        root: &Path,
        paths: &[P],
        extensions: &[String],
    ) -> Result<Self, PlanError> {
        let meta = std::fs::metadata(root).map_err(|source| PlanError::InvalidRoot {
            root: root.to_path_buf(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(PlanError::InvalidRoot {
                root: root.to_path_buf(),
                source: std::io::Error::other("not a directory"),
            });
        }

        let mut set = Self {
            root: root.to_path_buf(),
            by_path: BTreeMap::new(),
            by_name: HashMap::with_capacity(paths.len()),
            skipped: 0,
        };

        for path in paths {
            let path = path.as_ref();
            if set.by_path.contains_key(path) {
                continue;
            }

            let Some(name) = qualified_name(root, path, extensions) else {
                debug!(path = %path.display(), "not a project source file, skipping");
                set.skipped += 1;
                continue;
            };
            if !root.join(path).is_file() {
                debug!(path = %path.display(), "no such file, skipping");
                set.skipped += 1;
                continue;
            }

            if let Some(existing) = set.by_name.get(&name) {
                return Err(PlanError::NameCollision {
                    name,
                    first: existing.clone(),
                    second: path.to_path_buf(),
                });
            }

            set.by_name.insert(name.clone(), path.to_path_buf());
            set.by_path.insert(
                path.to_path_buf(),
                Module {
                    path: path.to_path_buf(),
                    qualified_name: name,
                },
            );
        }

        debug!(admitted = set.len(), skipped = set.skipped, "module set built");
        Ok(set)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up a module by its path.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&Module> {
        self.by_path.get(path)
    }

    /// Look up a module by its qualified name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Module> {
        self.by_name.get(name).and_then(|path| self.by_path.get(path))
    }

    /// Iterate modules in path order.
    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.by_path.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Number of distinct input paths that were not admitted.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }
}
