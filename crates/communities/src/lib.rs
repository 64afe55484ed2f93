pub mod components;
pub mod louvain;

pub use components::weakly_connected_components;
pub use louvain::LouvainDetector;

use graph::TransactionGraph;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Optional clustering collaborator. A backend may decline by returning
/// `None`, in which case the detector falls back to weakly connected
/// components.
pub trait CommunityBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// One label per node index; labels need not be contiguous.
    fn partition(&self, graph: &TransactionGraph) -> Option<Vec<usize>>;
}

/// Community membership for every node of a graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityAssignment {
    /// Which method produced the labels ("louvain", "weakly_connected", ...)
    pub method: &'static str,
    pub community_count: usize,
    /// Dense community id per node index
    pub labels: Vec<usize>,
}

impl CommunityAssignment {
    /// node-id -> community-id
    pub fn by_id(&self, graph: &TransactionGraph) -> HashMap<String, usize> {
        graph
            .accounts()
            .zip(&self.labels)
            .map(|(account, &label)| (account.id.clone(), label))
            .collect()
    }
}

pub struct CommunityDetector {
    backend: Option<Box<dyn CommunityBackend>>,
}

impl CommunityDetector {
    pub fn new(backend: Option<Box<dyn CommunityBackend>>) -> Self {
        Self { backend }
    }

    /// Weakly connected components only.
    pub fn components_only() -> Self {
        Self::new(None)
    }

    pub fn backend_name(&self) -> Option<&'static str> {
        self.backend.as_ref().map(|backend| backend.name())
    }

    pub fn detect(&self, graph: &TransactionGraph) -> CommunityAssignment {
        if let Some(backend) = &self.backend {
            match backend.partition(graph) {
                Some(labels) if labels.len() == graph.node_count() => {
                    return assignment(backend.name(), &labels);
                }
                Some(labels) => warn!(
                    backend = backend.name(),
                    labels = labels.len(),
                    nodes = graph.node_count(),
                    "Community backend returned wrong label count, falling back to components"
                ),
                None => debug!(backend = backend.name(), "Community backend declined"),
            }
        }

        assignment("weakly_connected", &weakly_connected_components(graph))
    }
}

impl Default for CommunityDetector {
    fn default() -> Self {
        Self::new(Some(Box::new(LouvainDetector::new())))
    }
}

fn assignment(method: &'static str, raw: &[usize]) -> CommunityAssignment {
    let labels = renumber(raw);
    let community_count = labels.iter().max().map_or(0, |&max| max + 1);

    CommunityAssignment {
        method,
        community_count,
        labels,
    }
}

/// Map arbitrary labels to 0, 1, 2, ... in order of first appearance.
pub(crate) fn renumber(raw: &[usize]) -> Vec<usize> {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    raw.iter()
        .map(|&label| {
            let next = mapping.len();
            *mapping.entry(label).or_insert(next)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph::Transfer;

    struct Declining;

    impl CommunityBackend for Declining {
        fn name(&self) -> &'static str {
            "declining"
        }

        fn partition(&self, _graph: &TransactionGraph) -> Option<Vec<usize>> {
            None
        }
    }

    fn two_islands() -> TransactionGraph {
        let mut graph = TransactionGraph::new();
        graph.add_transfer("a", "b", Transfer::new(1.0, 0));
        graph.add_transfer("c", "d", Transfer::new(1.0, 0));
        graph
    }

    #[test]
    fn test_renumber_first_appearance() {
        assert_eq!(renumber(&[7, 7, 3, 9, 3]), vec![0, 0, 1, 2, 1]);
    }

    #[test]
    fn test_declining_backend_falls_back() {
        let detector = CommunityDetector::new(Some(Box::new(Declining)));
        let result = detector.detect(&two_islands());

        assert_eq!(result.method, "weakly_connected");
        assert_eq!(result.community_count, 2);
    }

    #[test]
    fn test_default_uses_louvain() {
        let graph = two_islands();
        let result = CommunityDetector::default().detect(&graph);

        assert_eq!(result.method, "louvain");
        let by_id = result.by_id(&graph);
        assert_eq!(by_id["a"], by_id["b"]);
        assert_ne!(by_id["a"], by_id["c"]);
    }

    #[test]
    fn test_empty_graph() {
        let result = CommunityDetector::components_only().detect(&TransactionGraph::new());
        assert_eq!(result.community_count, 0);
        assert!(result.labels.is_empty());
    }
}
