//! Cycle-tolerant topological sort.
//!
//! # Resolution Loop
//!
//! ```text
//! Attempt(graph) ──ok──▶ Sorted(order)
//!      │
//!      └─cycle─▶ Resolving(graph, cycle)
//!                   │  remove cycle.first() from graph
//!                   └──────────▶ Attempt(reduced graph)
//! ```
//!
//! Each resolution step consumes the graph and produces a strictly smaller
//! one, so the loop runs at most once per node. Removed nodes never come
//! back and are absent from the final order.
//!
//! # Ordering
//!
//! Prerequisites come before dependents. Among nodes that are ready at the
//! same time the smallest path goes first, so the output only depends on
//! the graph contents.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::graph::build::DependencyGraph;
use crate::graph::cycles::{Cycle, trace_cycle};

/// One cycle-breaking step: the cycle that stalled the sort and the node
/// removed to break it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleBreak {
    pub cycle: Cycle,
    pub removed: PathBuf,
}

/// Result of [`sort`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOutcome {
    /// Processing order, prerequisites first.
    pub order: Vec<PathBuf>,
    /// Cycle breaks in the order they were applied.
    pub breaks: Vec<CycleBreak>,
    /// The reduced graph that sorted cleanly.
    pub graph: DependencyGraph,
}

impl SortOutcome {
    /// Paths removed to break cycles, in removal order.
    pub fn removed(&self) -> impl Iterator<Item = &Path> {
        self.breaks.iter().map(|b| b.removed.as_path())
    }
}

/// Attempt a single topological sort of `graph`.
///
/// # Errors
///
/// Returns the cycle to break when the graph is not acyclic.
pub fn try_sort(graph: &DependencyGraph) -> Result<Vec<PathBuf>, Cycle> {
    let mut pending: BTreeMap<&Path, usize> = BTreeMap::new();
    let mut dependents: HashMap<&Path, Vec<&Path>> = HashMap::new();

    for (node, deps) in graph.iter() {
        pending.insert(node, deps.len());
        for dep in deps {
            dependents.entry(dep.as_path()).or_default().push(node);
        }
    }

    let mut ready: BTreeSet<&Path> = pending
        .iter()
        .filter_map(|(node, count)| (*count == 0).then_some(*node))
        .collect();
    let mut order: Vec<PathBuf> = Vec::with_capacity(graph.node_count());

    while let Some(next) = ready.pop_first() {
        pending.remove(next);
        order.push(next.to_path_buf());

        for dependent in dependents.get(next).into_iter().flatten() {
            if let Some(count) = pending.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(dependent);
                }
            }
        }
    }

    if pending.is_empty() {
        return Ok(order);
    }

    let stalled: BTreeSet<&Path> = pending.keys().copied().collect();
    Err(trace_cycle(graph, &stalled).unwrap_or_else(|| {
        // Only reachable if a dependency is not a node; fall back to the
        // smallest stalled path so the caller still makes progress.
        let first = stalled.first().map_or_else(PathBuf::new, |p| p.to_path_buf());
        Cycle::from_members(vec![first])
    }))
}

/// Sort `graph`, breaking cycles until it sorts cleanly. Never fails.
///
/// Whenever an attempt stalls on a cycle, the cycle's first member is
/// removed from the graph entirely and the sort restarts on what remains.
#[must_use]
#[instrument(skip_all, fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn sort(graph: DependencyGraph) -> SortOutcome {
    let mut graph = graph;
    let mut breaks: Vec<CycleBreak> = Vec::new();

    loop {
        match try_sort(&graph) {
            Ok(order) => {
                debug!(
                    sorted = order.len(),
                    removed = breaks.len(),
                    "topological sort complete"
                );
                return SortOutcome {
                    order,
                    breaks,
                    graph,
                };
            }
            Err(cycle) => {
                let removed = cycle.first().to_path_buf();
                warn!(
                    cycle = %cycle,
                    removed = %removed.display(),
                    "dependency cycle detected, removing node to resolve it"
                );
                graph = graph.without(&removed);
                breaks.push(CycleBreak { cycle, removed });
            }
        }
    }
}
