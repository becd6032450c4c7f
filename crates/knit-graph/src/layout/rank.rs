//! Rank assignment
//!
//! Cycles are broken by reversing a greedy feedback arc set, then every node
//! gets the length of the longest path reaching it from a source. Nodes are
//! addressed by their index within one connected component.

use std::collections::HashSet;

use log::{trace, warn};
use petgraph::{
    algo::{greedy_feedback_arc_set, toposort},
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};

/// An edge between two component-local node indices, with its weight.
pub(super) type RankEdge = (usize, usize, f32);

/// Assigns a layer to each of `node_count` nodes.
///
/// For every edge not reversed to break a cycle, the target ends up on a
/// strictly greater layer than the source. Self-loops must be removed by the
/// caller.
pub(super) fn assign(node_count: usize, edges: &[RankEdge]) -> Vec<usize> {
    let mut graph = DiGraph::<(), ()>::with_capacity(node_count, edges.len());
    for _ in 0..node_count {
        graph.add_node(());
    }
    for &(source, target, _) in edges {
        graph.add_edge(NodeIndex::new(source), NodeIndex::new(target), ());
    }

    let reversed: HashSet<_> = greedy_feedback_arc_set(&graph)
        .map(|edge| edge.id())
        .collect();
    if !reversed.is_empty() {
        trace!(reversed_len = reversed.len(); "Reversing edges to break cycles");
    }

    let mut acyclic = DiGraph::<(), ()>::with_capacity(node_count, edges.len());
    for _ in 0..node_count {
        acyclic.add_node(());
    }
    for edge in graph.edge_references() {
        if reversed.contains(&edge.id()) {
            acyclic.add_edge(edge.target(), edge.source(), ());
        } else {
            acyclic.add_edge(edge.source(), edge.target(), ());
        }
    }

    let order = match toposort(&acyclic, None) {
        Ok(order) => order,
        Err(cycle) => {
            warn!(
                node = cycle.node_id().index();
                "Cycle left after reversing feedback arcs, placing all nodes on layer 0",
            );
            return vec![0; node_count];
        }
    };

    let mut ranks = vec![0; node_count];
    for node in order {
        let rank = ranks[node.index()];
        for edge in acyclic.edges(node) {
            let target = edge.target().index();
            ranks[target] = ranks[target].max(rank + 1);
        }
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolated_nodes_on_layer_zero() {
        assert_eq!(assign(3, &[]), vec![0, 0, 0]);
    }

    #[test]
    fn test_longest_path() {
        // 0 -> 1 -> 2, 0 -> 2
        let ranks = assign(3, &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0)]);
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[test]
    fn test_targets_below_sources() {
        let edges = [(3, 1, 1.0), (1, 0, 1.0), (3, 2, 1.0), (2, 0, 1.0), (4, 2, 1.0)];
        let ranks = assign(5, &edges);

        for (source, target, _) in edges {
            assert!(ranks[target] > ranks[source], "{source} -> {target}");
        }
        assert_eq!(ranks[3], 0);
        assert_eq!(ranks[4], 0);
    }

    #[test]
    fn test_cycle_is_broken() {
        let ranks = assign(2, &[(0, 1, 1.0), (1, 0, 1.0)]);

        assert_ne!(ranks[0], ranks[1]);
        assert_eq!(ranks.iter().min(), Some(&0));
        assert_eq!(ranks.iter().max(), Some(&1));
    }
}
