use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Free-form attributes attached to an account or a transfer.
pub type Attributes = BTreeMap<String, Value>;

/// Edge exactly as received from the caller. Kept untyped so that a missing
/// `source`/`target` surfaces as a graph error instead of a decode error.
pub type RawEdge = Map<String, Value>;

/// Wire shape of a transaction-graph snapshot:
/// `{"nodes": {id: {attr: value}}, "edges": [{source, target, amount, timestamp, ...}]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphInput {
    #[serde(default)]
    pub nodes: BTreeMap<String, Attributes>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

/// An account or entity in the money-movement graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: String,
    pub attributes: Attributes,
}

impl Account {
    /// Externally supplied risk, if present. `false`, `0` and `null` count as
    /// absent and `true` as 1.0. `Err` carries the offending value when the
    /// attribute is neither a number nor a boolean.
    pub fn risk_score(&self) -> Result<Option<f64>, &Value> {
        match self.attributes.get("risk_score") {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
            Some(Value::Bool(true)) => Ok(Some(1.0)),
            Some(value) => match value.as_f64() {
                Some(score) if score == 0.0 => Ok(None),
                Some(score) => Ok(Some(score)),
                None => Err(value),
            },
        }
    }
}

/// A single money movement. Parallel transfers between the same pair are
/// kept as separate edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transfer {
    pub amount: f64,
    pub timestamp: i64,
    /// Everything besides source/target/amount/timestamp.
    pub extra: Attributes,
}

impl Transfer {
    pub fn new(amount: f64, timestamp: i64) -> Self {
        Self {
            amount,
            timestamp,
            extra: Attributes::new(),
        }
    }
}
