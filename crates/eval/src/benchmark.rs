use anyhow::Result;
use network::NetworkRiskAnalyzer;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::generator::{Scenario, generate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub sizes: Vec<usize>,
    /// Timed runs per scenario and size
    pub iterations: usize,
    pub seed: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            sizes: vec![10, 50, 200],
            iterations: 20,
            seed: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResults {
    pub config: BenchmarkConfig,
    pub scenarios: Vec<ScenarioResults>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResults {
    pub scenario: Scenario,
    pub node_count: usize,
    pub edge_count: usize,
    pub runs: usize,
    pub avg_latency_ms: f64,
    pub p50_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub network_risk: f64,
    pub cycles: usize,
    pub cycles_saturated: bool,
    pub outliers: usize,
}

impl ScenarioResults {
    pub fn label(&self) -> String {
        format!("{}-{}", self.scenario.name(), self.node_count)
    }
}

pub struct Benchmarker {
    analyzer: NetworkRiskAnalyzer,
    config: BenchmarkConfig,
}

impl Benchmarker {
    pub fn new(analyzer: NetworkRiskAnalyzer, config: BenchmarkConfig) -> Self {
        Self { analyzer, config }
    }

    pub fn run_benchmark(&self) -> Result<BenchmarkResults> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut scenarios = Vec::new();

        for &size in &self.config.sizes {
            for scenario in Scenario::ALL {
                println!("Testing {} graph with {} accounts...", scenario.name(), size);
                let input = generate(scenario, size, &mut rng);
                scenarios.push(self.run_scenario(scenario, &input)?);
            }
        }

        Ok(BenchmarkResults {
            config: self.config.clone(),
            scenarios,
        })
    }

    fn run_scenario(&self, scenario: Scenario, input: &graph::GraphInput) -> Result<ScenarioResults> {
        let mut latencies = Vec::with_capacity(self.config.iterations);
        let mut last_report = None;

        for _ in 0..self.config.iterations.max(1) {
            let start = Instant::now();
            let report = self.analyzer.analyze_input(input)?;
            latencies.push(start.elapsed().as_secs_f64() * 1000.0);
            last_report = Some(report);
        }

        let report = last_report.ok_or_else(|| anyhow::anyhow!("no benchmark runs for {}", scenario.name()))?;

        latencies.sort_by(f64::total_cmp);

        Ok(ScenarioResults {
            scenario,
            node_count: report.node_count,
            edge_count: report.edge_count,
            runs: latencies.len(),
            avg_latency_ms: statistical::mean(&latencies),
            p50_latency_ms: statistical::median(&latencies),
            p95_latency_ms: percentile(&latencies, 95),
            network_risk: report.network_risk,
            cycles: report.cycles.count,
            cycles_saturated: report.cycles.saturated,
            outliers: report.outliers.outliers,
        })
    }
}

fn percentile(sorted_data: &[f64], p: usize) -> f64 {
    let index = (p as f64 / 100.0 * sorted_data.len() as f64) as usize;
    sorted_data[index.min(sorted_data.len() - 1)]
}
