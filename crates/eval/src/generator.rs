//! Synthetic transaction graphs with known shapes.

use graph::{GraphInput, RawEdge};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// a -> b -> c -> ...
    Chain,
    /// One hub paying every other account
    Star,
    /// A single cycle through every account
    Ring,
    /// Every ordered pair connected; worst case for cycle enumeration
    Dense,
    /// Each ordered pair connected with probability 3 / size
    Random,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::Chain,
        Scenario::Star,
        Scenario::Ring,
        Scenario::Dense,
        Scenario::Random,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Chain => "chain",
            Scenario::Star => "star",
            Scenario::Ring => "ring",
            Scenario::Dense => "dense",
            Scenario::Random => "random",
        }
    }
}

fn account(i: usize) -> String {
    format!("acct_{i:05}")
}

/// Mostly small amounts with the occasional large spike
fn amount(rng: &mut impl Rng) -> f64 {
    if rng.gen_bool(0.05) {
        rng.gen_range(10_000.0..100_000.0)
    } else {
        rng.gen_range(10.0..1_000.0)
    }
}

fn edge(rng: &mut impl Rng, source: usize, target: usize, timestamp: i64) -> RawEdge {
    let mut edge = RawEdge::new();
    edge.insert("source".to_string(), json!(account(source)));
    edge.insert("target".to_string(), json!(account(target)));
    edge.insert("amount".to_string(), json!(amount(rng)));
    edge.insert("timestamp".to_string(), json!(timestamp));
    edge
}

pub fn generate(scenario: Scenario, size: usize, rng: &mut impl Rng) -> GraphInput {
    let mut nodes = BTreeMap::new();
    for i in 0..size {
        let mut attributes = BTreeMap::new();
        if rng.gen_bool(0.2) {
            attributes.insert("risk_score".to_string(), json!(rng.gen_range(0.0..1.0)));
        }
        nodes.insert(account(i), attributes);
    }

    let mut pairs = Vec::new();
    match scenario {
        Scenario::Chain => pairs.extend((1..size).map(|i| (i - 1, i))),
        Scenario::Star => pairs.extend((1..size).map(|i| (0, i))),
        Scenario::Ring if size > 1 => pairs.extend((0..size).map(|i| (i, (i + 1) % size))),
        Scenario::Ring => {}
        Scenario::Dense => {
            for s in 0..size {
                pairs.extend((0..size).filter(|&t| t != s).map(|t| (s, t)));
            }
        }
        Scenario::Random => {
            let p = (3.0 / size.max(1) as f64).min(1.0);
            for s in 0..size {
                for t in 0..size {
                    if s != t && rng.gen_bool(p) {
                        pairs.push((s, t));
                    }
                }
            }
        }
    }

    let start = 1_700_000_000;
    let edges = pairs
        .into_iter()
        .enumerate()
        .map(|(i, (s, t))| edge(rng, s, t, start + i as i64 * 60))
        .collect();

    GraphInput { nodes, edges }
}
