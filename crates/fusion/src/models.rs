//! Externally trained models the pipeline can consult.
//!
//! Inference lives behind these traits; the workspace ships no model
//! implementations. Any collaborator may be missing, and a missing or
//! failing one only changes its own component score.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tabular transaction fields as sent by the caller (`TransactionAmt`,
/// `ProductCD`, card and device flags, ...). Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionFeatures(Map<String, Value>);

impl TransactionFeatures {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// `TransactionAmt`, or 0 when absent or not a number
    pub fn amount(&self) -> f64 {
        self.get("TransactionAmt").and_then(Value::as_f64).unwrap_or(0.0)
    }

    /// Numeric fields in key order, booleans as 0/1. Strings and nulls are
    /// skipped.
    pub fn numeric_vector(&self) -> Vec<f32> {
        self.0
            .values()
            .filter_map(|value| match value {
                Value::Number(n) => n.as_f64().map(|v| v as f32),
                Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
                _ => None,
            })
            .collect()
    }
}

pub trait TabularClassifier: Send + Sync {
    /// Probability in [0, 1] that the transaction is fraudulent
    fn fraud_probability(&self, features: &TransactionFeatures) -> Result<f64>;
}

pub trait Autoencoder: Send + Sync {
    fn reconstruct(&self, input: &[f32]) -> Result<Vec<f32>>;
}

pub trait SequenceModel: Send + Sync {
    /// Anomaly score for a sequence of per-transaction feature vectors
    fn anomaly(&self, sequence: &[Vec<f64>]) -> Result<f64>;
}

pub trait TextClassifier: Send + Sync {
    /// Class probabilities; index 1 is the non-compliant class
    fn class_probabilities(&self, text: &str) -> Result<Vec<f64>>;
}

/// The set of collaborators available to a pipeline.
#[derive(Clone, Default)]
pub struct ModelSuite {
    pub tabular: Option<Arc<dyn TabularClassifier>>,
    pub autoencoder: Option<Arc<dyn Autoencoder>>,
    pub sequence: Option<Arc<dyn SequenceModel>>,
    pub text: Option<Arc<dyn TextClassifier>>,
}

impl ModelSuite {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_tabular(mut self, model: Arc<dyn TabularClassifier>) -> Self {
        self.tabular = Some(model);
        self
    }

    pub fn with_autoencoder(mut self, model: Arc<dyn Autoencoder>) -> Self {
        self.autoencoder = Some(model);
        self
    }

    pub fn with_sequence(mut self, model: Arc<dyn SequenceModel>) -> Self {
        self.sequence = Some(model);
        self
    }

    pub fn with_text(mut self, model: Arc<dyn TextClassifier>) -> Self {
        self.text = Some(model);
        self
    }

    /// model name -> loaded
    pub fn availability(&self) -> BTreeMap<&'static str, bool> {
        BTreeMap::from([
            ("tabular", self.tabular.is_some()),
            ("autoencoder", self.autoencoder.is_some()),
            ("sequence", self.sequence.is_some()),
            ("text", self.text.is_some()),
            // Graph analysis needs no trained model
            ("network", true),
        ])
    }
}

/// Mean squared difference between an input and its reconstruction.
pub fn reconstruction_error(input: &[f32], reconstruction: &[f32]) -> Result<f64> {
    if input.len() != reconstruction.len() {
        anyhow::bail!(
            "reconstruction has {} values, input has {}",
            reconstruction.len(),
            input.len()
        );
    }
    if input.is_empty() {
        return Ok(0.0);
    }

    let total: f64 = input
        .iter()
        .zip(reconstruction)
        .map(|(a, b)| {
            let diff = f64::from(*a) - f64::from(*b);
            diff * diff
        })
        .sum();

    Ok(total / input.len() as f64)
}
