#![no_main]

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use depsort_core::graph::{DependencyGraph, find_cycle, sort};
use libfuzzer_sys::fuzz_target;

// Each byte pair is one edge between up to 32 nodes.
fuzz_target!(|data: &[u8]| {
    let node = |b: u8| PathBuf::from(format!("m{:02}.py", b % 32));
    let graph = DependencyGraph::from_edges(
        data.iter().copied().map(node),
        data.chunks_exact(2).map(|pair| (node(pair[0]), node(pair[1]))),
    );

    let outcome = sort(graph.clone());

    let ordered: BTreeSet<&PathBuf> = outcome.order.iter().collect();
    assert_eq!(ordered.len(), outcome.order.len());
    assert_eq!(outcome.order.len() + outcome.breaks.len(), graph.node_count());
    assert!(find_cycle(&outcome.graph).is_none());

    let position: HashMap<&PathBuf, usize> =
        outcome.order.iter().enumerate().map(|(i, p)| (p, i)).collect();
    for (dependent, deps) in outcome.graph.iter() {
        let dependent = dependent.to_path_buf();
        for dep in deps {
            assert!(position[dep] < position[&dependent]);
        }
    }
});
