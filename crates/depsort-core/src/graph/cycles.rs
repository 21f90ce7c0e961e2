//! Cycle detection helpers for module dependency graphs.
//!
//! Two views are offered:
//!
//! - [`find_cycle`] returns the single cycle the sorter would break next,
//!   chosen deterministically. This is what drives node removal.
//! - [`find_all_cycles`] lists every strongly connected component that
//!   contains a cycle, for reporting.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use serde::Serialize;

use crate::graph::build::{DependencyGraph, ModuleDiGraph};
use crate::graph::sort::try_sort;

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

/// A closed dependency loop.
///
/// Each member depends on the next one and the last depends on the first.
/// Never empty; a self-loop is a one-member cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cycle(Vec<PathBuf>);

impl Cycle {
    pub(crate) fn from_members(members: Vec<PathBuf>) -> Self {
        debug_assert!(!members.is_empty(), "a cycle has at least one member");
        Self(members)
    }

    /// Members in loop order.
    #[must_use]
    pub fn members(&self) -> &[PathBuf] {
        &self.0
    }

    /// The first reported member, which the sorter removes.
    #[must_use]
    pub fn first(&self) -> &Path {
        &self.0[0]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with [`Cycle::len`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for member in &self.0 {
            write!(f, "{} -> ", member.display())?;
        }
        write!(f, "{}", self.first().display())
    }
}

/// Return the cycle the sorter would break next, or `None` if `graph` is
/// acyclic.
#[must_use]
pub fn find_cycle(graph: &DependencyGraph) -> Option<Cycle> {
    try_sort(graph).err()
}

/// Trace one cycle among `stalled`, the nodes a topological pass could not
/// emit.
///
/// Starting at the smallest stalled path, repeatedly step to the smallest
/// stalled prerequisite until a node repeats. The cycle is the walk from the
/// first visit of that node. Every stalled node has at least one stalled
/// prerequisite, so the walk always closes.
pub(crate) fn trace_cycle(graph: &DependencyGraph, stalled: &BTreeSet<&Path>) -> Option<Cycle> {
    let start = *stalled.first()?;
    let mut walk: Vec<&Path> = vec![start];
    let mut seen: HashMap<&Path, usize> = HashMap::from([(start, 0)]);
    let mut current = start;

    loop {
        let next = graph
            .dependencies(current)?
            .iter()
            .map(PathBuf::as_path)
            .find(|dep| stalled.contains(dep))?;

        if let Some(&pos) = seen.get(next) {
            return Some(Cycle(walk[pos..].iter().map(|p| p.to_path_buf()).collect()));
        }

        seen.insert(next, walk.len());
        walk.push(next);
        current = next;
    }
}

// ---------------------------------------------------------------------------
// Strongly connected components
// ---------------------------------------------------------------------------

/// Find all cycles currently present in `graph`.
///
/// Each entry is a sorted list of node labels in one strongly connected
/// component (SCC). Self-loops are reported as a one-element cycle.
#[must_use]
pub fn find_all_cycles(graph: &ModuleDiGraph) -> Vec<Vec<String>> {
    let mut cycles: Vec<Vec<String>> = tarjan_scc(graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || component.first().is_some_and(|node| has_self_loop(graph, *node))
        })
        .map(|component| {
            let mut ids: Vec<String> = component.into_iter().map(|idx| node_id(graph, idx)).collect();
            ids.sort_unstable();
            ids
        })
        .collect();

    cycles.sort_unstable();
    cycles
}

#[must_use]
pub fn has_self_loop(graph: &ModuleDiGraph, node: NodeIndex) -> bool {
    graph.find_edge(node, node).is_some()
}

fn node_id(graph: &ModuleDiGraph, idx: NodeIndex) -> String {
    graph
        .node_weight(idx)
        .cloned()
        .unwrap_or_else(|| format!("#{}", idx.index()))
}
