use graph::MalformedGraphError;
use thiserror::Error;

/// Anything that stops the network analysis from producing a report.
///
/// Never crosses `NetworkRiskAnalyzer::assess`; it is logged there and
/// replaced by the neutral risk.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisFailure {
    #[error("cannot build transaction graph: {0}")]
    MalformedGraph(#[from] MalformedGraphError),

    #[error("influence scores did not converge within {iterations} iterations")]
    PageRankDidNotConverge { iterations: usize },

    #[error("node `{node}` has non-numeric risk_score {found}")]
    InvalidRiskAttribute { node: String, found: String },

    #[error("{stage} produced a non-finite value")]
    NonFiniteScore { stage: &'static str },
}

/// Rejected at construction so a bad config file cannot push scores outside
/// [0, 1].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid network config: {reason}")]
pub struct NetworkConfigError {
    pub reason: String,
}
