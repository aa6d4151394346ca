//! # connectome-cluster
//!
//! Divisive hierarchical clustering of per-node feature vectors (for
//! example flattened hop histograms), with model selection at every split
//! and dendrogram export.
//!
//! - [`DivisiveClusterTree`] — grows a binary tree top-down, one
//!   1-vs-2-component decision per node
//! - [`ClusterEstimator`] / [`ClusterModel`] — the pluggable clustering
//!   capability; [`KMeansBic`] is bundled
//! - [`BranchPath`] — leaf labels such as `0-1-1`, plus
//!   [`level_labels`] for per-depth label columns
//! - [`Linkage`] — 4-column merge table for dendrogram tools
//!
//! ## Invariants
//!
//! - An INTERNAL node's two children partition its samples exactly.
//! - A node is a LEAF iff it has no children.
//! - Every linkage row merges two ids assigned by earlier rows or leaves.

pub mod error;
pub mod kmeans;
pub mod linkage;
pub mod model;
pub mod path;
pub mod tree;

pub use error::{ClusterError, Result};
pub use kmeans::{KMeansBic, KMeansModel};
pub use linkage::{Linkage, LinkageRow, LinkageWeight};
pub use model::{ClusterEstimator, ClusterModel};
pub use path::{level_labels, BranchPath};
pub use tree::{
    ClusterNode, DivisiveClusterTree, DivisiveConfig, NodeId, NodeState, SplitRecord, TreeField,
};
