//! Score fusion and the per-transaction scoring pipeline.

pub mod engine;
pub mod error;
pub mod models;
pub mod pipeline;

pub use engine::{ComponentScores, FusedRisk, FusionWeights, RiskClass, ScoreFusion};
pub use error::{FusionError, FusionInputError};
pub use models::{Autoencoder, ModelSuite, SequenceModel, TabularClassifier, TextClassifier, TransactionFeatures};
pub use pipeline::{ScoringDetails, ScoringPipeline, ScoringResponse, TransactionRequest};
