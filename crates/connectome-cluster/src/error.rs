//! Error types for divisive clustering.

use thiserror::Error;

use crate::path::BranchPath;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    #[error("linkage siblings {left} and {right} do not share a parent")]
    SiblingInvariantViolation { left: BranchPath, right: BranchPath },

    #[error("tree has not been fitted")]
    NotFitted,

    #[error("feature width mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("cluster model failed: {0}")]
    Model(String),
}

pub type Result<T> = std::result::Result<T, ClusterError>;
