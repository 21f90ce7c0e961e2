//! End-to-end planning: paths in, processing order out.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::PlanError;
use crate::graph::{CycleBreak, DependencyGraph, sort};
use crate::module::ModuleSet;

/// The result of one planning run.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    /// Project root the qualified names were derived from.
    pub root: PathBuf,
    /// Admitted paths in processing order, prerequisites first. Paths
    /// removed to break cycles are not included.
    pub order: Vec<PathBuf>,
    /// Qualified name of every admitted path.
    pub modules: BTreeMap<PathBuf, String>,
    /// The dependency graph as built, cycles included.
    pub dependencies: DependencyGraph,
    /// The graph after cycle breaking; the order is a topological sort of it.
    pub reduced: DependencyGraph,
    /// Cycle breaks in the order they were applied.
    pub breaks: Vec<CycleBreak>,
    /// Number of input paths that were not admitted as modules.
    pub skipped: usize,
}

impl Plan {
    /// Paths removed to break cycles, in removal order.
    pub fn removed(&self) -> impl Iterator<Item = &Path> {
        self.breaks.iter().map(|b| b.removed.as_path())
    }

    /// Qualified name for an admitted path.
    #[must_use]
    pub fn qualified_name(&self, path: &Path) -> Option<&str> {
        self.modules.get(path).map(String::as_str)
    }
}

/// Compute a processing order for `paths` under `root`.
///
/// Per-module problems (unreadable files, syntax errors, unresolvable
/// imports) and dependency cycles are absorbed and logged.
///
/// # Errors
///
/// Returns an error only when `root` is not a directory or two distinct
/// paths map to the same qualified name.
#[instrument(skip(paths, config), fields(root = %root.display(), inputs = paths.len()))]
pub fn plan<P: AsRef<Path>>(root: &Path, paths: &[P], config: &Config) -> Result<Plan, PlanError> {
    let modules = ModuleSet::new(root, paths, &config.modules.extensions)?;
    let dependencies = DependencyGraph::build(&modules, &config.extract_options());
    let outcome = sort(dependencies.clone());

    info!(
        modules = modules.len(),
        edges = dependencies.edge_count(),
        removed = outcome.breaks.len(),
        skipped = modules.skipped(),
        "plan computed"
    );

    Ok(Plan {
        root: root.to_path_buf(),
        order: outcome.order,
        modules: modules
            .iter()
            .map(|m| (m.path().to_path_buf(), m.qualified_name().to_string()))
            .collect(),
        dependencies,
        reduced: outcome.graph,
        breaks: outcome.breaks,
        skipped: modules.skipped(),
    })
}
