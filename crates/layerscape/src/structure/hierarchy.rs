//! Topological grouping of layers into rendering columns.

use std::collections::HashSet;

use log::{debug, warn};
use petgraph::{algo::is_cyclic_directed, graph::DiGraph};

use super::adjacency::{AdjacencyGraph, NodeKey};

/// Layers at one topological depth, in discovery order.
pub type HierarchyLevel = Vec<NodeKey>;

/// Groups the nodes of `graph` into levels.
///
/// Level 0 holds every node without predecessors. Each following level is
/// discovered from the previous one: the successors of its nodes are examined
/// in order, and a successor is admitted only once all of its predecessors sit
/// in completed levels. A node is never admitted twice. The walk stops when a
/// pass admits nothing.
///
/// Nodes that never become admissible, because of a cycle or a predecessor
/// that is itself unreachable, are left out and reported in the log.
///
/// # Examples
///
/// ```
/// # use layerscape::structure::{build_hierarchy, AdjacencyGraph, NodeKey};
/// # use layerscape_core::model::LayerId;
/// let [a, b, c] = [0, 1, 2].map(|i| NodeKey::Layer(LayerId::new(i)));
/// let mut graph = AdjacencyGraph::new();
/// graph.add_edge(a, b);
/// graph.add_edge(a, c);
/// graph.add_edge(b, c);
///
/// // `c` waits for `b` although `a` reaches it directly
/// let levels = build_hierarchy(&graph);
/// assert_eq!(levels, vec![vec![a], vec![b], vec![c]]);
/// ```
pub fn build_hierarchy(graph: &AdjacencyGraph) -> Vec<HierarchyLevel> {
    let mut levels: Vec<Vec<usize>> = Vec::new();
    let mut placed: HashSet<usize> = HashSet::new();

    let roots: Vec<usize> = (0..graph.len())
        .filter(|&index| graph.in_degree(index) == 0)
        .collect();
    if roots.is_empty() {
        report_unplaced(graph, &placed);
        return Vec::new();
    }
    placed.extend(roots.iter().copied());
    levels.push(roots);

    while let Some(last) = levels.last() {
        let mut next = Vec::new();
        for &index in last {
            for successor in graph.successors(index) {
                if placed.contains(&successor) || next.contains(&successor) {
                    continue;
                }
                if graph.predecessors(successor).all(|p| placed.contains(&p)) {
                    next.push(successor);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        placed.extend(next.iter().copied());
        levels.push(next);
    }

    report_unplaced(graph, &placed);
    debug!(levels = levels.len(), nodes = placed.len(); "Hierarchy built");

    levels
        .into_iter()
        .map(|level| level.into_iter().filter_map(|index| graph.key_at(index)).collect())
        .collect()
}

fn report_unplaced(graph: &AdjacencyGraph, placed: &HashSet<usize>) {
    let unplaced = graph.len() - placed.len();
    if unplaced == 0 {
        return;
    }

    let mut digraph = DiGraph::<(), u32>::with_capacity(graph.len(), 0);
    let nodes: Vec<_> = (0..graph.len()).map(|_| digraph.add_node(())).collect();
    for (src, dst, count) in graph.edges() {
        digraph.add_edge(nodes[src], nodes[dst], count);
    }
    let cyclic = is_cyclic_directed(&digraph);

    warn!(unplaced, cyclic; "Some layers are never admitted to a column and are not drawn");
}
