//! Weakly connected components.
//!
//! Always available; used whenever no clustering backend is configured or the
//! backend declines to produce a partition.

use graph::TransactionGraph;
use petgraph::unionfind::UnionFind;

/// Component label per node index, numbered 0, 1, 2, ... in the order the
/// components are first reached when scanning nodes by index.
pub fn weakly_connected_components(graph: &TransactionGraph) -> Vec<usize> {
    let n = graph.node_count();
    let mut uf = UnionFind::<usize>::new(n);

    // Edge direction is ignored
    for (source, target, _) in graph.transfers() {
        uf.union(source, target);
    }

    crate::renumber(&uf.into_labeling())
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph::Transfer;

    #[test]
    fn test_wcc() {
        // Edges: 1->2, 3->4->5, 6 (isolated)
        let mut graph = TransactionGraph::new();
        graph.add_transfer("1", "2", Transfer::new(1.0, 0));
        graph.add_transfer("3", "4", Transfer::new(1.0, 0));
        graph.add_transfer("5", "4", Transfer::new(1.0, 0));
        graph.ensure_account("6");

        let labels = weakly_connected_components(&graph);

        assert_eq!(labels, vec![0, 0, 1, 1, 1, 2]);
    }

    #[test]
    fn test_empty_graph() {
        assert!(weakly_connected_components(&TransactionGraph::new()).is_empty());
    }
}
