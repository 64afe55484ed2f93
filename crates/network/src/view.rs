//! Read-only, index-based view of a transaction graph for algorithm execution.

use graph::TransactionGraph;
use std::collections::{BTreeMap, BTreeSet};

/// Dense adjacency in Compressed Sparse Row form.
///
/// Successor and predecessor lists hold each neighbour once, in ascending
/// index order. Parallel transfers are folded into `out_weights`
/// (multiplicity) and still counted by `degree`.
pub struct GraphView {
    pub node_count: usize,

    /// Offsets into `out_targets`. Size = node_count + 1
    out_offsets: Vec<usize>,
    out_targets: Vec<usize>,
    /// Number of parallel transfers behind each entry of `out_targets`
    out_weights: Vec<f64>,

    /// Offsets into `in_sources`. Size = node_count + 1
    in_offsets: Vec<usize>,
    in_sources: Vec<usize>,

    /// in-degree + out-degree, parallel transfers included
    degree: Vec<usize>,
}

impl GraphView {
    pub fn from_graph(graph: &TransactionGraph) -> Self {
        let n = graph.node_count();
        let mut outgoing: Vec<BTreeMap<usize, usize>> = vec![BTreeMap::new(); n];
        let mut incoming: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
        let mut degree = vec![0; n];

        for (source, target, _) in graph.transfers() {
            *outgoing[source].entry(target).or_insert(0) += 1;
            incoming[target].insert(source);
            degree[source] += 1;
            degree[target] += 1;
        }

        let mut out_offsets = Vec::with_capacity(n + 1);
        let mut out_targets = Vec::new();
        let mut out_weights = Vec::new();
        out_offsets.push(0);
        for neighbors in outgoing {
            for (target, multiplicity) in neighbors {
                out_targets.push(target);
                out_weights.push(multiplicity as f64);
            }
            out_offsets.push(out_targets.len());
        }

        let mut in_offsets = Vec::with_capacity(n + 1);
        let mut in_sources = Vec::new();
        in_offsets.push(0);
        for sources in incoming {
            in_sources.extend(sources);
            in_offsets.push(in_sources.len());
        }

        GraphView {
            node_count: n,
            out_offsets,
            out_targets,
            out_weights,
            in_offsets,
            in_sources,
            degree,
        }
    }

    /// Distinct successors of a node
    pub fn successors(&self, idx: usize) -> &[usize] {
        &self.out_targets[self.out_offsets[idx]..self.out_offsets[idx + 1]]
    }

    /// Multiplicity of each successor, aligned with `successors`
    pub fn successor_weights(&self, idx: usize) -> &[f64] {
        &self.out_weights[self.out_offsets[idx]..self.out_offsets[idx + 1]]
    }

    /// Distinct predecessors of a node
    pub fn predecessors(&self, idx: usize) -> &[usize] {
        &self.in_sources[self.in_offsets[idx]..self.in_offsets[idx + 1]]
    }

    pub fn degree(&self, idx: usize) -> usize {
        self.degree[idx]
    }

    pub fn has_self_loop(&self, idx: usize) -> bool {
        self.successors(idx).binary_search(&idx).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph::Transfer;

    #[test]
    fn test_parallel_edges_fold_into_weights() {
        let mut graph = TransactionGraph::new();
        graph.add_transfer("a", "b", Transfer::new(1.0, 0));
        graph.add_transfer("a", "b", Transfer::new(2.0, 0));
        graph.add_transfer("a", "a", Transfer::new(3.0, 0));

        let view = GraphView::from_graph(&graph);

        assert_eq!(view.successors(0), &[0, 1]);
        assert_eq!(view.successor_weights(0), &[1.0, 2.0]);
        assert_eq!(view.predecessors(1), &[0]);
        assert_eq!(view.degree(0), 4);
        assert_eq!(view.degree(1), 2);
        assert!(view.has_self_loop(0));
        assert!(!view.has_self_loop(1));
    }
}
