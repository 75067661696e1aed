//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::arena::NodeId;

/// Domain errors represent misuse of the layer model by a caller.
/// Malformed descriptor entries never surface here; the builder skips them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node {0:?} does not belong to this model")]
    UnknownNode(NodeId),

    #[error("heading node {0:?} has no visibility state")]
    NotToggleable(NodeId),

    #[error("row {row} out of range for parent with {count} children")]
    RowOutOfRange { row: usize, count: usize },

    #[error("node {0:?} is not attached to the tree")]
    Detached(NodeId),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
