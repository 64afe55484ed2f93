//! One transaction in, one scored response out.

use chrono::Utc;
use graph::GraphInput;
use network::{NetworkAssessment, NetworkRiskAnalyzer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::{ComponentScores, RiskClass, ScoreFusion};
use crate::error::FusionInputError;
use crate::models::{ModelSuite, TransactionFeatures, reconstruction_error};

/// Compliance risk when the text model is missing, fails or returns a
/// single class
const NEUTRAL_COMPLIANCE: f64 = 0.5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionRequest {
    #[serde(default)]
    pub transaction_data: Option<TransactionFeatures>,
    /// Recent transactions of the same customer, one feature vector each
    #[serde(default)]
    pub transaction_sequence: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub transaction_text: Option<String>,
    #[serde(default)]
    pub network_data: Option<GraphInput>,
}

/// Raw outputs of every component that actually ran
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScoringDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fraud: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behavior: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkAssessment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoringResponse {
    pub request_id: Uuid,
    pub fraud_probability: f64,
    pub compliance_risk: f64,
    pub behavior_anomaly: f64,
    pub network_risk: f64,
    /// 0-1
    pub overall_risk: f64,
    /// 0-100
    pub overall_risk_percent: f64,
    pub risk_class: RiskClass,
    pub details: ScoringDetails,
    pub transaction_amount: f64,
    pub transaction_text: String,
    /// RFC 3339
    pub timestamp: String,
}

/// Runs the available models, the network analysis and fusion.
///
/// Stateless between calls; share it behind an `Arc`.
pub struct ScoringPipeline {
    models: ModelSuite,
    network: NetworkRiskAnalyzer,
    fusion: ScoreFusion,
}

impl ScoringPipeline {
    pub fn new(models: ModelSuite, network: NetworkRiskAnalyzer, fusion: ScoreFusion) -> Self {
        Self {
            models,
            network,
            fusion,
        }
    }

    pub fn models(&self) -> &ModelSuite {
        &self.models
    }

    pub fn network(&self) -> &NetworkRiskAnalyzer {
        &self.network
    }

    pub fn score(&self, request: &TransactionRequest) -> Result<ScoringResponse, FusionInputError> {
        let (scores, details) = self.components(request);
        let fused = self.fusion.fuse(&scores).ensure_finite()?;

        let response = ScoringResponse {
            request_id: Uuid::new_v4(),
            fraud_probability: scores.fraud_probability,
            compliance_risk: scores.compliance_risk,
            behavior_anomaly: scores.behavior_anomaly,
            network_risk: scores.network_risk,
            overall_risk: fused.overall_risk,
            overall_risk_percent: fused.percent(),
            risk_class: fused.risk_class,
            details,
            transaction_amount: request
                .transaction_data
                .as_ref()
                .map_or(0.0, TransactionFeatures::amount),
            transaction_text: request.transaction_text.clone().unwrap_or_default(),
            timestamp: Utc::now().to_rfc3339(),
        };

        info!(
            request_id = %response.request_id,
            overall_risk = response.overall_risk,
            risk_class = response.risk_class.as_str(),
            "Transaction scored"
        );

        Ok(response)
    }

    /// Component scores with per-component defaults already applied.
    pub fn components(&self, request: &TransactionRequest) -> (ComponentScores, ScoringDetails) {
        let details = ScoringDetails {
            fraud: request
                .transaction_data
                .as_ref()
                .and_then(|features| self.fraud_probability(features)),
            compliance: request
                .transaction_text
                .as_deref()
                .and_then(|text| self.class_probabilities(text)),
            behavior: request
                .transaction_sequence
                .as_deref()
                .and_then(|sequence| self.behavior_anomaly(sequence)),
            network: request.network_data.as_ref().map(|input| self.network.assess(input)),
        };

        let compliance_risk = match details.compliance.as_deref() {
            Some([_, non_compliant, ..]) => *non_compliant,
            _ => NEUTRAL_COMPLIANCE,
        };

        let scores = ComponentScores {
            fraud_probability: details.fraud.unwrap_or(0.0),
            compliance_risk,
            behavior_anomaly: details.behavior.unwrap_or(0.0),
            network_risk: details
                .network
                .as_ref()
                .map_or(0.0, |assessment| assessment.network_risk),
        };

        debug!(?scores, "Component scores");

        (scores, details)
    }

    fn fraud_probability(&self, features: &TransactionFeatures) -> Option<f64> {
        let classifier = self.models.tabular.as_ref()?;

        let result = classifier.fraud_probability(features).and_then(|probability| {
            let Some(autoencoder) = &self.models.autoencoder else {
                return Ok(probability);
            };
            let input = features.numeric_vector();
            let reconstruction = autoencoder.reconstruct(&input)?;
            let mse = reconstruction_error(&input, &reconstruction)?;
            Ok((probability + mse.min(1.0)) / 2.0)
        });

        Some(result.unwrap_or_else(|e| {
            warn!(error = %e, "Fraud model failed, using 0.0");
            0.0
        }))
    }

    fn class_probabilities(&self, text: &str) -> Option<Vec<f64>> {
        let classifier = self.models.text.as_ref()?;

        match classifier.class_probabilities(text) {
            Ok(probabilities) => Some(probabilities),
            Err(e) => {
                warn!(error = %e, "Text model failed, using neutral compliance risk");
                None
            }
        }
    }

    fn behavior_anomaly(&self, sequence: &[Vec<f64>]) -> Option<f64> {
        let model = self.models.sequence.as_ref()?;

        Some(model.anomaly(sequence).unwrap_or_else(|e| {
            warn!(error = %e, "Sequence model failed, using 0.0");
            0.0
        }))
    }
}

impl Default for ScoringPipeline {
    fn default() -> Self {
        Self::new(ModelSuite::empty(), NetworkRiskAnalyzer::default(), ScoreFusion::default())
    }
}
