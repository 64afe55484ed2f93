//! Weighted combination of component risk scores

use serde::{Deserialize, Serialize};

use crate::error::{FusionError, FusionInputError};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Per-component weights. Must be finite, non-negative and sum to 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FusionWeights {
    pub fraud: f64,
    pub compliance: f64,
    pub behavior: f64,
    pub network: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            fraud: 0.4,
            compliance: 0.2,
            behavior: 0.2,
            network: 0.2,
        }
    }
}

impl FusionWeights {
    pub fn validate(&self) -> Result<(), FusionError> {
        let named = [
            ("fraud", self.fraud),
            ("compliance", self.compliance),
            ("behavior", self.behavior),
            ("network", self.network),
        ];

        for (name, weight) in named {
            if !weight.is_finite() || weight < 0.0 {
                return Err(FusionError::InvalidWeights {
                    reason: format!("{name} weight must be finite and non-negative, got {weight}"),
                });
            }
        }

        let sum: f64 = named.iter().map(|(_, weight)| weight).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(FusionError::InvalidWeights {
                reason: format!("weights must sum to 1.0, got {sum}"),
            });
        }

        Ok(())
    }
}

/// Component scores on the 0-1 scale. Not clamped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ComponentScores {
    pub fraud_probability: f64,
    pub compliance_risk: f64,
    pub behavior_anomaly: f64,
    pub network_risk: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskClass {
    Low,
    Medium,
    High,
}

impl RiskClass {
    /// Classify a 0-1 overall risk on the 0-100 scale.
    ///
    /// NaN fails both comparisons and lands in `High`; callers that care
    /// check `FusedRisk::ensure_finite` first.
    pub fn from_overall(overall_risk: f64) -> Self {
        let percent = overall_risk * 100.0;
        if percent < 33.0 {
            RiskClass::Low
        } else if percent < 66.0 {
            RiskClass::Medium
        } else {
            RiskClass::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskClass::Low => "Low",
            RiskClass::Medium => "Medium",
            RiskClass::High => "High",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FusedRisk {
    pub overall_risk: f64,
    pub risk_class: RiskClass,
}

impl FusedRisk {
    pub fn percent(&self) -> f64 {
        self.overall_risk * 100.0
    }

    pub fn ensure_finite(self) -> Result<Self, FusionInputError> {
        if self.overall_risk.is_finite() {
            Ok(self)
        } else {
            Err(FusionInputError {
                overall_risk: self.overall_risk,
            })
        }
    }
}

/// Combines component scores with weights fixed at construction.
#[derive(Debug, Clone)]
pub struct ScoreFusion {
    weights: FusionWeights,
}

impl ScoreFusion {
    pub fn new(weights: FusionWeights) -> Result<Self, FusionError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &FusionWeights {
        &self.weights
    }

    pub fn fuse(&self, scores: &ComponentScores) -> FusedRisk {
        let w = &self.weights;
        let overall_risk = w.fraud * scores.fraud_probability
            + w.compliance * scores.compliance_risk
            + w.behavior * scores.behavior_anomaly
            + w.network * scores.network_risk;

        FusedRisk {
            overall_risk,
            risk_class: RiskClass::from_overall(overall_risk),
        }
    }
}

impl Default for ScoreFusion {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
        }
    }
}
