use std::collections::BTreeMap;

use graph::TransactionGraph;

use crate::CommunityBackend;

const MAX_ITERATIONS: usize = 10;

/// Louvain-style local moving on the undirected projection of the
/// transaction graph. Parallel transfers add weight; self-transfers are
/// ignored.
#[derive(Debug, Clone, Default)]
pub struct LouvainDetector;

impl LouvainDetector {
    pub fn new() -> Self {
        Self
    }

    /// Returns one raw community label per node index. Labels are not
    /// contiguous; callers renumber them.
    pub fn detect_communities(&self, graph: &TransactionGraph) -> Vec<usize> {
        let n = graph.node_count();

        if n == 0 {
            return Vec::new();
        }

        // Initialize: each node in its own community
        let mut communities: Vec<usize> = (0..n).collect();

        let mut adj_list: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        let mut m = 0.0;

        for (source, target, _) in graph.transfers() {
            if source == target {
                continue;
            }
            *adj_list[source].entry(target).or_insert(0.0) += 1.0;
            *adj_list[target].entry(source).or_insert(0.0) += 1.0;
            m += 1.0;
        }

        if m == 0.0 {
            return communities;
        }

        let degrees: Vec<f64> = adj_list.iter().map(|neighbors| neighbors.values().sum()).collect();

        // Total degree per community, kept in step with every move
        let mut sigma_tot = degrees.clone();

        let mut improved = true;
        let mut iteration = 0;

        while improved && iteration < MAX_ITERATIONS {
            improved = false;
            iteration += 1;

            for node in 0..n {
                let current_comm = communities[node];
                let k_i = degrees[node];

                let mut neighbor_comms: BTreeMap<usize, f64> = BTreeMap::new();
                for (&neighbor, &weight) in &adj_list[node] {
                    *neighbor_comms.entry(communities[neighbor]).or_insert(0.0) += weight;
                }

                let mut best_comm = current_comm;
                let mut best_gain = 0.0;

                for &comm in neighbor_comms.keys() {
                    if comm == current_comm {
                        continue;
                    }

                    let gain = modularity_gain(k_i, current_comm, comm, &sigma_tot, &neighbor_comms, m);

                    if gain > best_gain {
                        best_gain = gain;
                        best_comm = comm;
                    }
                }

                if best_comm != current_comm {
                    sigma_tot[current_comm] -= k_i;
                    sigma_tot[best_comm] += k_i;
                    communities[node] = best_comm;
                    improved = true;
                }
            }
        }

        tracing::debug!(iterations = iteration, "Louvain local moving finished");
        communities
    }
}

/// Change in modularity when a node of degree `k_i` leaves `from_comm` and
/// joins `to_comm`. `m` is the total edge weight.
fn modularity_gain(
    k_i: f64,
    from_comm: usize,
    to_comm: usize,
    sigma_tot: &[f64],
    neighbor_comms: &BTreeMap<usize, f64>,
    m: f64,
) -> f64 {
    let k_i_in_to = neighbor_comms.get(&to_comm).copied().unwrap_or(0.0);
    let k_i_in_from = neighbor_comms.get(&from_comm).copied().unwrap_or(0.0);

    let sigma_to = sigma_tot[to_comm];
    let sigma_from = sigma_tot[from_comm] - k_i;

    (k_i_in_to - k_i_in_from) / m - k_i * (sigma_to - sigma_from) / (2.0 * m * m)
}

impl CommunityBackend for LouvainDetector {
    fn name(&self) -> &'static str {
        "louvain"
    }

    fn partition(&self, graph: &TransactionGraph) -> Option<Vec<usize>> {
        Some(self.detect_communities(graph))
    }
}
