//! Turn command-line paths into the candidate list handed to the planner.
//!
//! Directories are walked for files with a configured extension, minus the
//! excluded directory names, file names and patterns; explicit files are
//! passed through untouched so the planner can decide whether to
//! admit them. Everything under the project root is reported relative to it.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use depsort_core::Config;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Which entries a directory walk admits, built from the `[modules]` table.
#[derive(Debug)]
pub struct SourceFilter {
    extensions: Vec<String>,
    exclude_dirs: Vec<String>,
    exclude_files: Vec<String>,
    patterns: Gitignore,
}

impl SourceFilter {
    /// Compile the filter. Anchored patterns are relative to `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if an `exclude_patterns` entry is not a valid glob.
    pub fn from_config(root: &Path, config: &Config) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(root);
        for pattern in &config.modules.exclude_patterns {
            builder
                .add_line(None, pattern)
                .with_context(|| format!("Invalid exclude pattern `{pattern}`"))?;
        }
        let patterns = builder.build().context("Failed to compile exclude patterns")?;

        Ok(Self {
            extensions: config.modules.extensions.clone(),
            exclude_dirs: config.modules.exclude_dirs.clone(),
            exclude_files: config.modules.exclude_files.clone(),
            patterns,
        })
    }

    fn skips_dir(&self, path: &Path) -> bool {
        let excluded_name = path
            .file_name()
            .and_then(OsStr::to_str)
            .is_some_and(|name| self.exclude_dirs.iter().any(|d| d == name));
        excluded_name || self.patterns.matched(path, true).is_ignore()
    }

    fn admits_file(&self, path: &Path) -> bool {
        let has_extension = path
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext));
        let excluded_name = path
            .file_name()
            .and_then(OsStr::to_str)
            .is_some_and(|name| self.exclude_files.iter().any(|f| f == name));
        has_extension && !excluded_name && !self.patterns.matched(path, false).is_ignore()
    }
}

/// Collect candidate paths for one run.
///
/// `root` must already be absolute. Relative entries in `paths` are taken
/// relative to the current directory. With no `paths`, the whole root is
/// walked. `filter` only applies to walked directories.
///
/// # Errors
///
/// Returns an error if the current directory is needed and unavailable.
pub fn collect_inputs(root: &Path, paths: &[PathBuf], filter: &SourceFilter) -> Result<Vec<PathBuf>> {
    let targets: Vec<PathBuf> = if paths.is_empty() {
        vec![root.to_path_buf()]
    } else {
        paths
            .iter()
            .map(|p| std::path::absolute(p).with_context(|| format!("Failed to resolve {}", p.display())))
            .collect::<Result<_>>()?
    };

    let mut collected: BTreeSet<PathBuf> = BTreeSet::new();
    for target in &targets {
        if target.is_dir() {
            walk_sources(target, filter, |file| {
                collected.insert(relative_to_root(root, file));
            });
        } else {
            collected.insert(relative_to_root(root, target));
        }
    }

    debug!(
        targets = targets.len(),
        collected = collected.len(),
        "collected input paths"
    );
    Ok(collected.into_iter().collect())
}

fn walk_sources(dir: &Path, filter: &SourceFilter, mut visit: impl FnMut(&Path)) {
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !(e.file_type().is_dir() && filter.skips_dir(e.path())));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        if entry.file_type().is_file() && filter.admits_file(entry.path()) {
            visit(entry.path());
        }
    }
}

fn relative_to_root(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
}
