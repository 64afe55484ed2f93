use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FusionError {
    #[error("invalid fusion weights: {reason}")]
    InvalidWeights { reason: String },
}

/// The fused score is not a finite number, so no class can be trusted.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("fused risk is not finite (overall_risk = {overall_risk})")]
pub struct FusionInputError {
    pub overall_risk: f64,
}
