//! Module dependency graph: construction, cycle detection and ordering.
//!
//! # Overview
//!
//! This module turns extracted candidate names into a directed dependency
//! graph and sorts it into a processing order that puts every module after
//! the modules it depends on.
//!
//! ## Pipeline
//!
//! ```text
//! ModuleSet
//!        ↓  build::DependencyGraph::build()   (per-module extraction, parallel)
//! DependencyGraph (dependent → prerequisites, may contain cycles)
//!        ↓  sort::sort()                      (remove cycles[0].first() until acyclic)
//! SortOutcome
//!   ├─ order:  prerequisites first, ties by path
//!   ├─ breaks: each detected cycle and the node removed for it
//!   └─ graph:  the reduced graph that sorted cleanly
//! ```
//!
//! ## Typical Usage
//!
//! ```rust,ignore
//! use depsort_core::graph::{DependencyGraph, sort};
//! use depsort_core::extract::ExtractOptions;
//!
//! let graph = DependencyGraph::build(&modules, &ExtractOptions::default());
//! let outcome = sort(graph);
//! for path in &outcome.order {
//!     println!("{}", path.display());
//! }
//! ```

pub mod build;
pub mod cycles;
pub mod sort;

// Re-export primary types at module level for convenience.
pub use build::{DependencyGraph, ModuleDiGraph, PetGraph, Requires};
pub use cycles::{Cycle, find_all_cycles, find_cycle};
pub use sort::{CycleBreak, SortOutcome, sort, try_sort};
