//! Dependency graph construction from extracted candidates.
//!
//! # Edge Direction
//!
//! [`DependencyGraph`] maps each module path to the set of paths it depends
//! on: an entry `A → {B}` means "A needs B first". The petgraph projection
//! ([`DependencyGraph::to_petgraph`]) flips this into `B → A` (blocker →
//! blocked), which is the direction SCC and DOT output expect.
//!
//! ## Closed World
//!
//! Candidates are only ever resolved against the admitted [`ModuleSet`].
//! Names that match no module (standard library, third-party packages,
//! local variables caught by the bare-reference pass) are dropped silently.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use petgraph::dot::{Config as DotConfig, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::extract::{Candidates, ExtractOptions, extract_file};
use crate::module::{Module, ModuleSet};

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

/// Adjacency map from a module path to its prerequisite paths.
///
/// Every dependency target is also a node; the constructors and
/// [`add_edge`](Self::add_edge) keep that true. Self-loops are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    edges: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
}

/// Edge weight of the petgraph projection. Carries no data and renders as
/// an empty label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Requires;

impl fmt::Display for Requires {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }
}

/// Petgraph graph type with module labels as node weights.
pub type ModuleDiGraph = DiGraph<String, Requires>;

/// A petgraph view of a [`DependencyGraph`].
///
/// Edges point from prerequisite to dependent.
#[derive(Debug)]
pub struct PetGraph {
    pub graph: ModuleDiGraph,
    pub node_map: HashMap<PathBuf, NodeIndex>,
}

impl PetGraph {
    /// Graphviz DOT rendering with node labels and unlabelled edges.
    #[must_use]
    pub fn to_dot(&self) -> String {
        Dot::with_config(&self.graph, &[DotConfig::EdgeNoLabel]).to_string()
    }
}

impl DependencyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from explicit nodes and `(dependent, prerequisite)`
    /// edges. Edge endpoints missing from `nodes` are added as nodes.
    #[must_use]
    pub fn from_edges<N, E, P>(nodes: N, edges: E) -> Self
    where
        N: IntoIterator<Item = P>,
        E: IntoIterator<Item = (P, P)>,
        P: Into<PathBuf>,
    {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node);
        }
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    /// Extract every module's candidates and resolve them into a graph.
    ///
    /// Extraction runs on the rayon pool when `options.parallel` is set; the
    /// result is identical either way.
    #[must_use]
    #[instrument(skip_all, fields(modules = modules.len(), parallel = options.parallel))]
    pub fn build(modules: &ModuleSet, options: &ExtractOptions) -> Self {
        let root = modules.root();
        let extracted: Vec<(&Module, Candidates)> = if options.parallel {
            modules
                .iter()
                .collect::<Vec<_>>()
                .into_par_iter()
                .map(|module| (module, extract_file(root, module, options)))
                .collect()
        } else {
            modules
                .iter()
                .map(|module| (module, extract_file(root, module, options)))
                .collect()
        };

        Self::resolve(
            modules,
            extracted.iter().map(|(module, candidates)| (*module, candidates)),
        )
    }

    /// Resolve per-module candidates against `modules.by_name`.
    ///
    /// Every module in `modules` becomes a node, including those absent from
    /// `extracted` or with no resolvable candidates.
    #[must_use]
    pub fn resolve<'a, I>(modules: &ModuleSet, extracted: I) -> Self
    where
        I: IntoIterator<Item = (&'a Module, &'a Candidates)>,
    {
        let mut graph = Self::new();
        for module in modules.iter() {
            graph.add_node(module.path());
        }

        for (module, candidates) in extracted {
            let mut resolved = 0usize;
            for name in candidates.names() {
                if let Some(target) = modules.by_name(name) {
                    graph.add_edge(module.path(), target.path());
                    resolved += 1;
                }
            }
            debug!(
                module = module.qualified_name(),
                resolved, "resolved dependencies"
            );
        }

        graph
    }

    /// Insert `node` with no dependencies if it is not already present.
    pub fn add_node(&mut self, node: impl Into<PathBuf>) {
        self.edges.entry(node.into()).or_default();
    }

    /// Record that `from` depends on `to`, adding either endpoint as needed.
    pub fn add_edge(&mut self, from: impl Into<PathBuf>, to: impl Into<PathBuf>) {
        let to = to.into();
        self.edges.entry(to.clone()).or_default();
        self.edges.entry(from.into()).or_default().insert(to);
    }

    /// The prerequisites of `node`, if it is in the graph.
    #[must_use]
    pub fn dependencies(&self, node: &Path) -> Option<&BTreeSet<PathBuf>> {
        self.edges.get(node)
    }

    #[must_use]
    pub fn contains(&self, node: &Path) -> bool {
        self.edges.contains_key(node)
    }

    /// Nodes in path order.
    pub fn nodes(&self) -> impl Iterator<Item = &Path> {
        self.edges.keys().map(PathBuf::as_path)
    }

    /// `(node, prerequisites)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &BTreeSet<PathBuf>)> {
        self.edges.iter().map(|(node, deps)| (node.as_path(), deps))
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Consume the graph and return it without `node`, which is dropped both
    /// as a key and from every dependency set.
    #[must_use]
    pub fn without(mut self, node: &Path) -> Self {
        self.edges.remove(node);
        for deps in self.edges.values_mut() {
            deps.remove(node);
        }
        self
    }

    /// Project into a petgraph `DiGraph` with prerequisite → dependent edges.
    ///
    /// `label` produces each node's weight (a display path, a qualified
    /// name, ...). Nodes are inserted in path order so indices are stable.
    #[must_use]
    pub fn to_petgraph(&self, label: impl Fn(&Path) -> String) -> PetGraph {
        let mut graph = ModuleDiGraph::with_capacity(self.node_count(), self.edge_count());
        let mut node_map: HashMap<PathBuf, NodeIndex> = HashMap::with_capacity(self.node_count());

        for node in self.edges.keys() {
            let idx = graph.add_node(label(node));
            node_map.insert(node.clone(), idx);
        }

        for (dependent, prerequisites) in &self.edges {
            let Some(&blocked) = node_map.get(dependent) else {
                continue;
            };
            for prerequisite in prerequisites {
                if let Some(&blocker) = node_map.get(prerequisite) {
                    graph.add_edge(blocker, blocked, Requires);
                }
            }
        }

        PetGraph { graph, node_map }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
