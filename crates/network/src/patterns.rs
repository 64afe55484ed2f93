//! Suspicious transfer patterns: cyclic money movement and outsized amounts.

use graph::TransactionGraph;
use petgraph::algo::tarjan_scc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::view::GraphView;

/// Thresholds and penalty rates for pattern detection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternConfig {
    /// At most this many cycles are counted. Finding one more marks the
    /// report saturated and applies the full cap.
    pub max_cycles: usize,
    pub cycle_penalty_per_cycle: f64,
    pub cycle_penalty_cap: f64,
    /// A transfer is an outlier when its amount exceeds `multiplier * mean`
    pub outlier_multiplier: f64,
    pub outlier_penalty_per_transfer: f64,
    pub outlier_penalty_cap: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            max_cycles: 1000,
            cycle_penalty_per_cycle: 0.05,
            cycle_penalty_cap: 0.20,
            outlier_multiplier: 3.0,
            outlier_penalty_per_transfer: 0.03,
            outlier_penalty_cap: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub count: usize,
    /// More than `max_cycles` cycles exist; `count` stops at `max_cycles`
    pub saturated: bool,
    pub penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    pub mean_amount: f64,
    pub outliers: usize,
    pub penalty: f64,
}

pub fn detect_cycles(graph: &TransactionGraph, view: &GraphView, config: &PatternConfig) -> CycleReport {
    let (count, saturated) = count_elementary_cycles(graph, view, config.max_cycles);

    let penalty = if saturated {
        config.cycle_penalty_cap
    } else if count > 0 {
        (config.cycle_penalty_per_cycle * count as f64).min(config.cycle_penalty_cap)
    } else {
        0.0
    };

    CycleReport {
        count,
        saturated,
        penalty,
    }
}

pub fn detect_outliers(amounts: &[f64], config: &PatternConfig) -> OutlierReport {
    if amounts.is_empty() {
        return OutlierReport {
            mean_amount: 0.0,
            outliers: 0,
            penalty: 0.0,
        };
    }

    let mean_amount = statistical::mean(amounts);
    let threshold = config.outlier_multiplier * mean_amount;
    let outliers = amounts.iter().filter(|&&amount| amount > threshold).count();

    let penalty = if outliers > 0 {
        (config.outlier_penalty_per_transfer * outliers as f64).min(config.outlier_penalty_cap)
    } else {
        0.0
    };

    OutlierReport {
        mean_amount,
        outliers,
        penalty,
    }
}

/// Count elementary directed cycles (Johnson), stopping past `limit`.
///
/// Returns `(count, saturated)` with `count <= limit`; `saturated` means a
/// cycle beyond `limit` exists. Self-transfers count as cycles; parallel
/// transfers do not produce extra cycles. Only strongly connected
/// components can hold cycles, so everything else is skipped up front.
pub fn count_elementary_cycles(graph: &TransactionGraph, view: &GraphView, limit: usize) -> (usize, bool) {
    let n = view.node_count;
    if n == 0 || limit == 0 {
        return (0, false);
    }

    let mut component = vec![0; n];
    let mut component_size = Vec::new();
    for (id, members) in tarjan_scc(graph.inner()).into_iter().enumerate() {
        component_size.push(members.len());
        for node in members {
            component[node.index()] = id;
        }
    }

    // One extra cycle tells "exactly limit" apart from "more than limit"
    let budget = limit.saturating_add(1);
    let mut search = CircuitSearch::new(n);
    let mut found = 0;

    for start in 0..n {
        if component_size[component[start]] == 1 && !view.has_self_loop(start) {
            continue;
        }

        let members = search.restrict(view, start, |v| component[v] == component[start] && v >= start);
        found += search.circuits_from(view, start, budget - found);
        search.reset(&members);

        if found > limit {
            return (limit, true);
        }
    }

    (found, false)
}

/// Scratch state for Johnson's circuit search, reused across start nodes.
struct CircuitSearch {
    member: Vec<bool>,
    blocked: Vec<bool>,
    closed: Vec<bool>,
    blocked_by: Vec<Vec<usize>>,
}

impl CircuitSearch {
    fn new(n: usize) -> Self {
        Self {
            member: vec![false; n],
            blocked: vec![false; n],
            closed: vec![false; n],
            blocked_by: vec![Vec::new(); n],
        }
    }

    /// Mark the strongly connected component of `start` inside the subgraph
    /// induced by `allowed`. Returns the marked nodes.
    fn restrict(&mut self, view: &GraphView, start: usize, allowed: impl Fn(usize) -> bool) -> Vec<usize> {
        let forward = reach(start, &allowed, |v| view.successors(v));
        let backward = reach(start, &allowed, |v| view.predecessors(v));

        let backward: HashSet<usize> = backward.into_iter().collect();

        let members: Vec<usize> = forward.into_iter().filter(|v| backward.contains(v)).collect();
        for &v in &members {
            self.member[v] = true;
        }
        members
    }

    fn reset(&mut self, members: &[usize]) {
        for &v in members {
            self.member[v] = false;
            self.blocked[v] = false;
            self.closed[v] = false;
            self.blocked_by[v].clear();
        }
    }

    fn member_successors(&self, view: &GraphView, v: usize) -> Vec<usize> {
        view.successors(v).iter().copied().filter(|&w| self.member[w]).collect()
    }

    /// Enumerate circuits through `start`, returning how many were found
    /// (never more than `budget`).
    fn circuits_from(&mut self, view: &GraphView, start: usize, budget: usize) -> usize {
        let mut found = 0;
        let mut path = vec![start];
        let mut stack: Vec<(usize, Vec<usize>)> = vec![(start, self.member_successors(view, start))];
        self.blocked[start] = true;

        while let Some(frame) = stack.last_mut() {
            let this = frame.0;

            if let Some(next) = frame.1.pop() {
                if next == start {
                    found += 1;
                    if found >= budget {
                        return found;
                    }
                    for &v in &path {
                        self.closed[v] = true;
                    }
                } else if !self.blocked[next] {
                    path.push(next);
                    self.closed[next] = false;
                    self.blocked[next] = true;
                    let successors = self.member_successors(view, next);
                    stack.push((next, successors));
                    continue;
                }
            }

            let exhausted = stack.last().is_some_and(|frame| frame.1.is_empty());
            if exhausted {
                if self.closed[this] {
                    self.unblock(this);
                } else {
                    for w in self.member_successors(view, this) {
                        if !self.blocked_by[w].contains(&this) {
                            self.blocked_by[w].push(this);
                        }
                    }
                }
                stack.pop();
                path.pop();
            }
        }

        found
    }

    fn unblock(&mut self, node: usize) {
        let mut pending = vec![node];
        while let Some(v) = pending.pop() {
            if self.blocked[v] {
                self.blocked[v] = false;
                pending.append(&mut self.blocked_by[v]);
            }
        }
    }
}

fn reach<'a>(start: usize, allowed: &impl Fn(usize) -> bool, neighbors: impl Fn(usize) -> &'a [usize]) -> Vec<usize> {
    let mut seen = HashSet::from([start]);
    let mut order = vec![start];
    let mut frontier = vec![start];

    while let Some(v) = frontier.pop() {
        for &w in neighbors(v) {
            if allowed(w) && seen.insert(w) {
                order.push(w);
                frontier.push(w);
            }
        }
    }

    order
}
