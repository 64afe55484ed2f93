//! Transaction graph construction.
//!
//! Turns a caller-supplied snapshot of accounts and money movements into a
//! directed multigraph that the network analysis crates walk by index.

pub mod error;
pub mod schema;
pub mod transaction_graph;

pub use error::MalformedGraphError;
pub use schema::{Account, Attributes, GraphInput, RawEdge, Transfer};
pub use transaction_graph::TransactionGraph;

pub use petgraph::Direction;
pub use petgraph::graph::NodeIndex;
