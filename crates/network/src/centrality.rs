//! Node centrality: degree, betweenness and influence (PageRank).
//!
//! All functions return one value per node index and accept graphs with zero
//! or one node.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::AnalysisFailure;
use crate::view::GraphView;

/// PageRank configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageRankConfig {
    /// Probability of following an out-edge rather than jumping
    pub damping_factor: f64,
    /// Upper bound on power iterations
    pub max_iterations: usize,
    /// Converged once the L1 change drops below `node_count * tolerance`
    pub tolerance: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.85,
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

/// The three centrality measures, indexed by node.
#[derive(Debug, Clone, PartialEq)]
pub struct Centrality {
    pub degree: Vec<f64>,
    pub betweenness: Vec<f64>,
    pub influence: Vec<f64>,
}

impl Centrality {
    pub fn compute(view: &GraphView, config: &PageRankConfig) -> Result<Self, AnalysisFailure> {
        Ok(Self {
            degree: degree_centrality(view),
            betweenness: betweenness_centrality(view),
            influence: page_rank(view, config)?,
        })
    }
}

/// (in-degree + out-degree) / (N - 1). Zero for graphs with fewer than two nodes.
pub fn degree_centrality(view: &GraphView) -> Vec<f64> {
    let n = view.node_count;
    if n <= 1 {
        return vec![0.0; n];
    }

    let scale = 1.0 / (n - 1) as f64;
    (0..n).map(|idx| view.degree(idx) as f64 * scale).collect()
}

/// Brandes betweenness over unweighted directed shortest paths, normalised
/// by 1 / ((N - 1)(N - 2)).
pub fn betweenness_centrality(view: &GraphView) -> Vec<f64> {
    let n = view.node_count;
    let mut betweenness = vec![0.0; n];

    let mut stack: Vec<usize> = Vec::with_capacity(n);
    let mut queue: VecDeque<usize> = VecDeque::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0; n];
    let mut distance: Vec<Option<usize>> = vec![None; n];
    let mut delta = vec![0.0; n];

    for source in 0..n {
        stack.clear();
        for idx in 0..n {
            predecessors[idx].clear();
            sigma[idx] = 0.0;
            distance[idx] = None;
            delta[idx] = 0.0;
        }

        sigma[source] = 1.0;
        distance[source] = Some(0);
        queue.push_back(source);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            let next_distance = distance[v].map_or(0, |d| d + 1);

            for &w in view.successors(v) {
                if distance[w].is_none() {
                    distance[w] = Some(next_distance);
                    queue.push_back(w);
                }
                if distance[w] == Some(next_distance) {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        // Accumulate dependencies in order of non-increasing distance
        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != source {
                betweenness[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        for value in &mut betweenness {
            *value *= scale;
        }
    }

    betweenness
}

/// Power-iteration PageRank.
///
/// Transition probabilities are proportional to the number of parallel
/// transfers. Mass held by dangling nodes is spread uniformly over all nodes
/// each iteration, so the scores always sum to one.
pub fn page_rank(view: &GraphView, config: &PageRankConfig) -> Result<Vec<f64>, AnalysisFailure> {
    let n = view.node_count;

    if n == 0 {
        return Ok(Vec::new());
    }

    let uniform = 1.0 / n as f64;
    let d = config.damping_factor;

    let out_totals: Vec<f64> = (0..n).map(|idx| view.successor_weights(idx).iter().sum()).collect();
    let dangling: Vec<usize> = (0..n).filter(|&idx| out_totals[idx] == 0.0).collect();

    let mut scores = vec![uniform; n];
    let mut next_scores = vec![0.0; n];

    for _ in 0..config.max_iterations {
        let dangling_mass: f64 = d * dangling.iter().map(|&idx| scores[idx]).sum::<f64>();
        let base_score = dangling_mass * uniform + (1.0 - d) * uniform;

        next_scores.iter_mut().for_each(|score| *score = base_score);

        for source in 0..n {
            if out_totals[source] == 0.0 {
                continue;
            }
            let share = d * scores[source] / out_totals[source];
            for (&target, &weight) in view.successors(source).iter().zip(view.successor_weights(source)) {
                next_scores[target] += share * weight;
            }
        }

        let total_diff: f64 = next_scores
            .iter()
            .zip(&scores)
            .map(|(next, current)| (next - current).abs())
            .sum();

        // Swap buffers
        std::mem::swap(&mut scores, &mut next_scores);

        // Check convergence
        if total_diff < n as f64 * config.tolerance {
            return Ok(scores);
        }
    }

    Err(AnalysisFailure::PageRankDidNotConverge {
        iterations: config.max_iterations,
    })
}
