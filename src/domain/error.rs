//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the document model or the expression grammar.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("malformed expression `{expression}` at {position}: {reason}")]
    MalformedExpression {
        expression: String,
        position: usize,
        reason: String,
    },

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("duplicate node id: {0}")]
    DuplicateNodeId(String),

    #[error("node is not attached to the document root: {0}")]
    DetachedNode(String),

    #[error("cycle detected in ancestor chain of: {0}")]
    CycleDetected(String),

    #[error("unknown property type: {0}")]
    InvalidPropertyType(String),

    #[error("invalid property declaration: {0}")]
    InvalidPropertyDeclaration(String),

    #[error("invalid value for {kind} property {name}: {value}")]
    InvalidPropertyValue {
        name: String,
        kind: String,
        value: String,
    },

    #[error("node declares no property: {0}")]
    MissingPropertyDeclaration(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
