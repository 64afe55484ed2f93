use communities::{CommunityAssignment, CommunityDetector};
use graph::{GraphInput, TransactionGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::centrality::{Centrality, PageRankConfig};
use crate::error::{AnalysisFailure, NetworkConfigError};
use crate::patterns::{self, CycleReport, OutlierReport, PatternConfig};
use crate::view::GraphView;

/// How the three centralities blend into a node's structural risk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeRiskWeights {
    pub degree: f64,
    pub betweenness: f64,
    pub influence: f64,
}

impl Default for NodeRiskWeights {
    fn default() -> Self {
        Self {
            degree: 0.3,
            betweenness: 0.4,
            influence: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    #[serde(default)]
    pub pagerank: PageRankConfig,
    #[serde(default)]
    pub patterns: PatternConfig,
    #[serde(default)]
    pub node_weights: NodeRiskWeights,
    /// Returned for empty graphs and whenever analysis fails
    #[serde(default = "default_neutral_risk")]
    pub neutral_risk: f64,
}

fn default_neutral_risk() -> f64 {
    0.5
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            pagerank: PageRankConfig::default(),
            patterns: PatternConfig::default(),
            node_weights: NodeRiskWeights::default(),
            neutral_risk: default_neutral_risk(),
        }
    }
}

impl NetworkConfig {
    /// Checks every knob that can move a score out of [0, 1] or make the
    /// analysis meaningless.
    pub fn validate(&self) -> Result<(), NetworkConfigError> {
        if !(0.0..=1.0).contains(&self.neutral_risk) {
            return Err(invalid(format!("neutral_risk must be in [0, 1], got {}", self.neutral_risk)));
        }

        let w = &self.node_weights;
        let p = &self.patterns;
        let non_negative = [
            ("node_weights.degree", w.degree),
            ("node_weights.betweenness", w.betweenness),
            ("node_weights.influence", w.influence),
            ("patterns.cycle_penalty_per_cycle", p.cycle_penalty_per_cycle),
            ("patterns.cycle_penalty_cap", p.cycle_penalty_cap),
            ("patterns.outlier_multiplier", p.outlier_multiplier),
            ("patterns.outlier_penalty_per_transfer", p.outlier_penalty_per_transfer),
            ("patterns.outlier_penalty_cap", p.outlier_penalty_cap),
            ("pagerank.tolerance", self.pagerank.tolerance),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{name} must be finite and non-negative, got {value}")));
            }
        }

        if p.max_cycles == 0 {
            return Err(invalid("patterns.max_cycles must be greater than 0".to_string()));
        }
        if self.pagerank.max_iterations == 0 {
            return Err(invalid("pagerank.max_iterations must be greater than 0".to_string()));
        }
        if !(0.0..1.0).contains(&self.pagerank.damping_factor) {
            return Err(invalid(format!(
                "pagerank.damping_factor must be in [0, 1), got {}",
                self.pagerank.damping_factor
            )));
        }

        Ok(())
    }
}

fn invalid(reason: String) -> NetworkConfigError {
    NetworkConfigError { reason }
}

/// Per-account breakdown of the network risk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRisk {
    pub id: String,
    pub degree: f64,
    pub betweenness: f64,
    pub influence: f64,
    /// `risk_score` attribute supplied by the caller, if any
    pub external_risk: Option<f64>,
    pub risk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkReport {
    /// Final score in [0, 1]
    pub network_risk: f64,
    /// Mean node risk before pattern penalties
    pub base_risk: f64,
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes: Vec<NodeRisk>,
    /// Diagnostic only; membership does not feed into `network_risk`
    pub communities: CommunityAssignment,
    pub cycles: CycleReport,
    pub outliers: OutlierReport,
}

impl NetworkReport {
    /// node-id -> risk
    pub fn node_risks(&self) -> HashMap<String, f64> {
        self.nodes.iter().map(|node| (node.id.clone(), node.risk)).collect()
    }
}

/// Outcome of the failure-absorbing boundary: always carries a usable score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkAssessment {
    pub network_risk: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<NetworkReport>,
    /// Why the neutral risk was substituted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Scores a transaction graph by structure and suspicious patterns.
///
/// Holds configuration only; every call builds and drops its own graph, so a
/// single analyzer can be shared across concurrent requests.
pub struct NetworkRiskAnalyzer {
    config: NetworkConfig,
    communities: CommunityDetector,
}

impl NetworkRiskAnalyzer {
    pub fn new(config: NetworkConfig) -> Result<Self, NetworkConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            communities: CommunityDetector::default(),
        })
    }

    pub fn with_community_detector(mut self, communities: CommunityDetector) -> Self {
        self.communities = communities;
        self
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// The only place an `AnalysisFailure` is turned into a score. Malformed
    /// input and algorithm failures both yield the neutral risk.
    pub fn assess(&self, input: &GraphInput) -> NetworkAssessment {
        match self.analyze_input(input) {
            Ok(report) => NetworkAssessment {
                network_risk: report.network_risk,
                report: Some(report),
                failure: None,
            },
            Err(e) => {
                warn!(
                    error = %e,
                    fallback = self.config.neutral_risk,
                    "Network analysis failed, using neutral risk"
                );
                NetworkAssessment {
                    network_risk: self.config.neutral_risk,
                    report: None,
                    failure: Some(e.to_string()),
                }
            }
        }
    }

    /// Network risk in [0, 1]; never fails.
    pub fn score(&self, input: &GraphInput) -> f64 {
        self.assess(input).network_risk
    }

    pub fn analyze_input(&self, input: &GraphInput) -> Result<NetworkReport, AnalysisFailure> {
        let graph = TransactionGraph::build(input)?;
        self.analyze(&graph)
    }

    pub fn analyze(&self, graph: &TransactionGraph) -> Result<NetworkReport, AnalysisFailure> {
        let view = GraphView::from_graph(graph);

        let centrality = Centrality::compute(&view, &self.config.pagerank)?;
        let communities = self.communities.detect(graph);
        let cycles = patterns::detect_cycles(graph, &view, &self.config.patterns);
        let outliers = patterns::detect_outliers(&graph.amounts(), &self.config.patterns);

        let nodes = self.node_risks(graph, &centrality)?;

        let (base_risk, network_risk) = if nodes.is_empty() {
            (self.config.neutral_risk, self.config.neutral_risk)
        } else {
            let base = nodes.iter().map(|node| node.risk).sum::<f64>() / nodes.len() as f64;
            let penalised = base + cycles.penalty + outliers.penalty;
            if !penalised.is_finite() {
                return Err(AnalysisFailure::NonFiniteScore { stage: "network risk" });
            }
            (base, penalised.clamp(0.0, 1.0))
        };

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            communities = communities.community_count,
            cycles = cycles.count,
            outliers = outliers.outliers,
            network_risk,
            "Network analysis complete"
        );

        Ok(NetworkReport {
            network_risk,
            base_risk,
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            nodes,
            communities,
            cycles,
            outliers,
        })
    }

    fn node_risks(&self, graph: &TransactionGraph, centrality: &Centrality) -> Result<Vec<NodeRisk>, AnalysisFailure> {
        let weights = &self.config.node_weights;

        graph
            .accounts()
            .enumerate()
            .map(|(idx, account)| {
                let degree = centrality.degree[idx];
                let betweenness = centrality.betweenness[idx];
                let influence = centrality.influence[idx];

                let structural =
                    weights.degree * degree + weights.betweenness * betweenness + weights.influence * influence;

                let external_risk = account
                    .risk_score()
                    .map_err(|found| AnalysisFailure::InvalidRiskAttribute {
                        node: account.id.clone(),
                        found: found.to_string(),
                    })?;

                let risk = match external_risk {
                    Some(external) => (structural + external) / 2.0,
                    None => structural,
                };

                Ok(NodeRisk {
                    id: account.id.clone(),
                    degree,
                    betweenness,
                    influence,
                    external_risk,
                    risk,
                })
            })
            .collect()
    }
}

impl Default for NetworkRiskAnalyzer {
    fn default() -> Self {
        Self {
            config: NetworkConfig::default(),
            communities: CommunityDetector::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: serde_json::Value) -> GraphInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_graph_is_neutral() {
        let analyzer = NetworkRiskAnalyzer::default();
        assert_eq!(analyzer.score(&GraphInput::default()), 0.5);
    }

    #[test]
    fn test_single_isolated_node() {
        let analyzer = NetworkRiskAnalyzer::default();
        let report = analyzer
            .analyze_input(&input(json!({"nodes": {"solo": {}}})))
            .unwrap();

        assert_eq!(report.nodes.len(), 1);
        assert_eq!(report.nodes[0].degree, 0.0);
        assert_eq!(report.nodes[0].betweenness, 0.0);
        // All influence mass sits on the only node
        assert!((report.network_risk - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_external_risk_is_averaged() {
        let analyzer = NetworkRiskAnalyzer::default();
        let report = analyzer
            .analyze_input(&input(json!({"nodes": {"solo": {"risk_score": 0.9}}})))
            .unwrap();

        assert_eq!(report.nodes[0].external_risk, Some(0.9));
        assert!((report.network_risk - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_zero_risk_score_counts_as_absent() {
        let analyzer = NetworkRiskAnalyzer::default();
        for falsy in [json!(0.0), json!(0), json!(false), json!(null)] {
            let report = analyzer
                .analyze_input(&input(json!({"nodes": {"solo": {"risk_score": falsy}}})))
                .unwrap();

            assert_eq!(report.nodes[0].external_risk, None);
            assert!((report.network_risk - 0.3).abs() < 1e-12);
        }
    }

    #[test]
    fn test_boolean_risk_score_is_one() {
        let analyzer = NetworkRiskAnalyzer::default();
        let report = analyzer
            .analyze_input(&input(json!({"nodes": {"solo": {"risk_score": true}}})))
            .unwrap();

        assert_eq!(report.nodes[0].external_risk, Some(1.0));
        assert!((report.network_risk - 0.65).abs() < 1e-12);

        let pair = input(json!({
            "nodes": {"a": {"risk_score": true}, "b": {}},
            "edges": [{"source": "a", "target": "b"}]
        }));
        let assessment = analyzer.assess(&pair);
        assert!(assessment.failure.is_none());
        assert!(assessment.report.is_some());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let out_of_range = NetworkConfig {
            neutral_risk: 1.5,
            ..NetworkConfig::default()
        };
        assert!(NetworkRiskAnalyzer::new(out_of_range).is_err());

        let nan_weight = NetworkConfig {
            node_weights: NodeRiskWeights {
                betweenness: f64::NAN,
                ..NodeRiskWeights::default()
            },
            ..NetworkConfig::default()
        };
        assert!(NetworkRiskAnalyzer::new(nan_weight).is_err());

        let negative_weight = NetworkConfig {
            node_weights: NodeRiskWeights {
                degree: -0.1,
                ..NodeRiskWeights::default()
            },
            ..NetworkConfig::default()
        };
        assert!(NetworkRiskAnalyzer::new(negative_weight).is_err());

        let no_cycles = NetworkConfig {
            patterns: PatternConfig {
                max_cycles: 0,
                ..PatternConfig::default()
            },
            ..NetworkConfig::default()
        };
        let err = NetworkRiskAnalyzer::new(no_cycles).err().unwrap();
        assert!(err.reason.contains("max_cycles"));

        assert!(NetworkRiskAnalyzer::new(NetworkConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_risk_attribute_falls_back() {
        let analyzer = NetworkRiskAnalyzer::default();
        let graph = input(json!({"nodes": {"solo": {"risk_score": "high"}}}));

        assert!(matches!(
            analyzer.analyze_input(&graph),
            Err(AnalysisFailure::InvalidRiskAttribute { .. })
        ));

        let assessment = analyzer.assess(&graph);
        assert_eq!(assessment.network_risk, 0.5);
        assert!(assessment.report.is_none());
        assert!(assessment.failure.is_some());
    }

    #[test]
    fn test_malformed_graph_falls_back() {
        let analyzer = NetworkRiskAnalyzer::default();
        let graph = input(json!({"edges": [{"source": "a"}]}));
        assert_eq!(analyzer.score(&graph), 0.5);
    }

    #[test]
    fn test_non_convergence_falls_back() {
        let config = NetworkConfig {
            pagerank: PageRankConfig {
                max_iterations: 1,
                tolerance: 0.0,
                ..PageRankConfig::default()
            },
            ..NetworkConfig::default()
        };
        let analyzer = NetworkRiskAnalyzer::new(config).unwrap();
        let graph = input(json!({"edges": [
            {"source": "a", "target": "b"},
            {"source": "b", "target": "c"}
        ]}));

        assert_eq!(analyzer.score(&graph), 0.5);
    }

    #[test]
    fn test_communities_reported_not_scored() {
        let graph = input(json!({"edges": [
            {"source": "a", "target": "b", "amount": 10.0},
            {"source": "c", "target": "d", "amount": 10.0}
        ]}));

        let louvain = NetworkRiskAnalyzer::default().analyze_input(&graph).unwrap();
        let components = NetworkRiskAnalyzer::default()
            .with_community_detector(CommunityDetector::components_only())
            .analyze_input(&graph)
            .unwrap();

        assert_eq!(louvain.communities.community_count, 2);
        assert_eq!(components.communities.method, "weakly_connected");
        assert_eq!(louvain.network_risk.to_bits(), components.network_risk.to_bits());
    }
}
