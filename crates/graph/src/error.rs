use thiserror::Error;

/// Raised when an edge description cannot be turned into a transfer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedGraphError {
    #[error("edge {edge} is missing required field `{field}`")]
    MissingField { edge: usize, field: &'static str },

    #[error("edge {edge} has invalid `{field}`: {found}")]
    InvalidField {
        edge: usize,
        field: &'static str,
        found: String,
    },
}
