//! Network risk: how suspicious a web of accounts and transfers looks.
//!
//! Centrality marks the accounts that sit in the middle of money flows,
//! pattern detection adds penalties for cyclic movement and outsized amounts,
//! and [`NetworkRiskAnalyzer`] folds both into a single score in [0, 1].

pub mod analyzer;
pub mod centrality;
pub mod error;
pub mod patterns;
pub mod view;

pub use analyzer::{NetworkAssessment, NetworkConfig, NetworkReport, NetworkRiskAnalyzer, NodeRisk, NodeRiskWeights};
pub use centrality::{Centrality, PageRankConfig};
pub use error::{AnalysisFailure, NetworkConfigError};
pub use patterns::{CycleReport, OutlierReport, PatternConfig};
pub use view::GraphView;
