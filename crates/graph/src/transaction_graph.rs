use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::error::MalformedGraphError;
use crate::schema::{Account, Attributes, GraphInput, RawEdge, Transfer};

const SOURCE: &str = "source";
const TARGET: &str = "target";
const AMOUNT: &str = "amount";
const TIMESTAMP: &str = "timestamp";

/// Directed multigraph of accounts and transfers, built per request.
///
/// Node indices are dense (`0..node_count`) and follow insertion order, so
/// every algorithm that walks the graph by index is deterministic.
#[derive(Debug, Clone, Default)]
pub struct TransactionGraph {
    graph: DiGraph<Account, Transfer>,
    account_to_idx: HashMap<String, NodeIndex>,
}

impl TransactionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the wire snapshot. Declared nodes come first (in id order),
    /// endpoints that were never declared are created with empty attributes.
    pub fn build(input: &GraphInput) -> Result<Self, MalformedGraphError> {
        let mut graph = Self::new();

        for (id, attributes) in &input.nodes {
            graph.add_account(id.clone(), attributes.clone());
        }

        for (position, raw) in input.edges.iter().enumerate() {
            graph.add_raw_edge(position, raw)?;
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Transaction graph built"
        );

        Ok(graph)
    }

    /// Insert an account, or merge attributes into an existing one.
    pub fn add_account(&mut self, id: String, attributes: Attributes) -> NodeIndex {
        if let Some(&idx) = self.account_to_idx.get(&id) {
            self.graph[idx].attributes.extend(attributes);
            return idx;
        }

        let idx = self.graph.add_node(Account {
            id: id.clone(),
            attributes,
        });
        self.account_to_idx.insert(id, idx);
        idx
    }

    /// Look up an account, creating it with empty attributes if missing.
    pub fn ensure_account(&mut self, id: &str) -> NodeIndex {
        match self.account_to_idx.get(id) {
            Some(&idx) => idx,
            None => self.add_account(id.to_string(), Attributes::new()),
        }
    }

    pub fn add_transfer(&mut self, source: &str, target: &str, transfer: Transfer) -> EdgeIndex {
        let source_idx = self.ensure_account(source);
        let target_idx = self.ensure_account(target);
        self.graph.add_edge(source_idx, target_idx, transfer)
    }

    fn add_raw_edge(&mut self, position: usize, raw: &RawEdge) -> Result<EdgeIndex, MalformedGraphError> {
        let source = endpoint(position, raw, SOURCE)?;
        let target = endpoint(position, raw, TARGET)?;

        let amount = match raw.get(AMOUNT) {
            None | Some(Value::Null) => 0.0,
            Some(value) => value.as_f64().ok_or_else(|| invalid(position, AMOUNT, value))?,
        };

        let timestamp = match raw.get(TIMESTAMP) {
            None | Some(Value::Null) => 0,
            Some(value) => value
                .as_i64()
                .or_else(|| value.as_f64().map(|t| t as i64))
                .ok_or_else(|| invalid(position, TIMESTAMP, value))?,
        };

        let extra: Attributes = raw
            .iter()
            .filter(|(key, _)| ![SOURCE, TARGET, AMOUNT, TIMESTAMP].contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(self.add_transfer(
            source,
            target,
            Transfer {
                amount,
                timestamp,
                extra,
            },
        ))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.account_to_idx.get(id).copied()
    }

    pub fn account(&self, idx: NodeIndex) -> &Account {
        &self.graph[idx]
    }

    pub fn account_by_id(&self, id: &str) -> Option<&Account> {
        self.index_of(id).map(|idx| &self.graph[idx])
    }

    /// Accounts in index order.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Transfers in insertion order as `(source_idx, target_idx, transfer)`.
    pub fn transfers(&self) -> impl Iterator<Item = (usize, usize, &Transfer)> {
        self.graph
            .edge_references()
            .map(|edge| (edge.source().index(), edge.target().index(), edge.weight()))
    }

    pub fn amounts(&self) -> Vec<f64> {
        self.transfers().map(|(_, _, transfer)| transfer.amount).collect()
    }

    /// Number of transfers leaving (`Outgoing`) or entering (`Incoming`) a node,
    /// parallel edges included.
    pub fn degree(&self, idx: NodeIndex, direction: Direction) -> usize {
        self.graph.edges_directed(idx, direction).count()
    }

    pub fn inner(&self) -> &DiGraph<Account, Transfer> {
        &self.graph
    }
}

fn endpoint<'a>(position: usize, raw: &'a RawEdge, field: &'static str) -> Result<&'a str, MalformedGraphError> {
    match raw.get(field) {
        None | Some(Value::Null) => Err(MalformedGraphError::MissingField { edge: position, field }),
        Some(Value::String(id)) => Ok(id.as_str()),
        Some(other) => Err(invalid(position, field, other)),
    }
}

fn invalid(position: usize, field: &'static str, value: &Value) -> MalformedGraphError {
    MalformedGraphError::InvalidField {
        edge: position,
        field,
        found: value.to_string(),
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
    fn test_build_defaults_and_extras() {
        let graph = TransactionGraph::build(&input(json!({
            "nodes": {
                "user_123": {"risk_score": 0.3, "is_business": 0},
                "bank_12": {"risk_score": 0.1}
            },
            "edges": [
                {"source": "user_123", "target": "bank_12", "frequency": 50, "is_international": 0}
            ]
        })))
        .unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);

        let (_, _, transfer) = graph.transfers().next().unwrap();
        assert_eq!(transfer.amount, 0.0);
        assert_eq!(transfer.timestamp, 0);
        assert_eq!(transfer.extra.get("frequency"), Some(&json!(50)));
        assert!(!transfer.extra.contains_key("source"));

        let user = graph.account_by_id("user_123").unwrap();
        assert_eq!(user.attributes.get("is_business"), Some(&json!(0)));
        assert_eq!(user.risk_score(), Ok(Some(0.3)));
    }

    #[test]
    fn test_undeclared_endpoints_are_created() {
        let graph = TransactionGraph::build(&input(json!({
            "edges": [{"source": "a", "target": "b", "amount": 10.0}]
        })))
        .unwrap();

        assert_eq!(graph.node_count(), 2);
        assert!(graph.account_by_id("a").unwrap().attributes.is_empty());
    }

    #[test]
    fn test_parallel_edges_are_kept() {
        let mut graph = TransactionGraph::new();
        graph.add_transfer("a", "b", Transfer::new(5.0, 1));
        graph.add_transfer("a", "b", Transfer::new(7.0, 2));

        assert_eq!(graph.edge_count(), 2);
        let a = graph.index_of("a").unwrap();
        assert_eq!(graph.degree(a, Direction::Outgoing), 2);
        assert_eq!(graph.amounts(), vec![5.0, 7.0]);
    }

    #[test]
    fn test_missing_target_is_malformed() {
        let err = TransactionGraph::build(&input(json!({
            "edges": [
                {"source": "a", "target": "b"},
                {"source": "a"}
            ]
        })))
        .unwrap_err();

        assert_eq!(err, MalformedGraphError::MissingField { edge: 1, field: "target" });
    }

    #[test]
    fn test_non_numeric_amount_is_malformed() {
        let err = TransactionGraph::build(&input(json!({
            "edges": [{"source": "a", "target": "b", "amount": "lots"}]
        })))
        .unwrap_err();

        assert!(matches!(err, MalformedGraphError::InvalidField { field: "amount", .. }));
    }

    #[test]
    fn test_declared_nodes_ordered_by_id() {
        let graph = TransactionGraph::build(&input(json!({
            "nodes": {"c": {}, "a": {}, "b": {}},
            "edges": [{"source": "z", "target": "a"}]
        })))
        .unwrap();

        let ids: Vec<&str> = graph.accounts().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "z"]);
    }
}
