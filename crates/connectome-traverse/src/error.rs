//! Error types for the traversal layer.
//!
//! Dead-ends and exhausted hop budgets are *outcomes*, not errors: they are
//! counted in [`OutcomeCounts`](crate::OutcomeCounts). Only a malformed setup
//! aborts a run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraverseError {
    #[error("invalid traversal configuration: {0}")]
    Configuration(String),

    #[error("node {node} is out of range for a graph with {n_nodes} nodes")]
    NodeOutOfRange { node: usize, n_nodes: usize },
}

pub type Result<T> = std::result::Result<T, TraverseError>;
