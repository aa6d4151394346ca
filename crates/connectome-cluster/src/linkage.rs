//! Dendrogram export of a fitted tree.
//!
//! Produces the 4-column linkage table used by dendrogram plotting tools:
//! leaves get ids `0..L`, merges get ids `L..L+K` in emission order, and
//! every row merges two ids that already exist.
//!
//! Levels are walked from the deepest up. Within a level, consecutive nodes
//! are taken in pairs and must be siblings. The merge distance is the
//! number of levels from the bottom, so all merges of one level share a
//! height; it is not derived from the split scores.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{ClusterError, Result};
use crate::model::ClusterEstimator;
use crate::path::BranchPath;
use crate::tree::{ClusterNode, DivisiveClusterTree, NodeId};

/// One merge: `(left, right, distance, member_count)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkageRow {
    pub left:         usize,
    pub right:        usize,
    pub distance:     f64,
    pub member_count: usize,
}

/// What a leaf contributes to `member_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkageWeight {
    /// Every leaf counts 1.
    #[default]
    Leaves,
    /// Every leaf counts its number of samples.
    Samples,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Linkage {
    pub rows:        Vec<LinkageRow>,
    /// Leaf paths in id order.
    pub leaf_labels: Vec<BranchPath>,
}

impl Linkage {
    /// `(K, 4)` matrix `[left, right, distance, member_count]`.
    pub fn to_array(&self) -> Array2<f64> {
        let mut m = Array2::zeros((self.rows.len(), 4));
        for (i, r) in self.rows.iter().enumerate() {
            m[[i, 0]] = r.left as f64;
            m[[i, 1]] = r.right as f64;
            m[[i, 2]] = r.distance;
            m[[i, 3]] = r.member_count as f64;
        }
        m
    }
}

impl<E: ClusterEstimator> DivisiveClusterTree<E> {
    /// Linkage table with every leaf counting 1.
    pub fn build_linkage(&self) -> Result<Linkage> {
        self.build_linkage_weighted(LinkageWeight::Leaves)
    }

    pub fn build_linkage_weighted(&self, weight: LinkageWeight) -> Result<Linkage> {
        if self.nodes.is_empty() {
            return Err(ClusterError::NotFitted);
        }
        link(&self.nodes, weight)
    }
}

fn link<M>(nodes: &[ClusterNode<M>], weight: LinkageWeight) -> Result<Linkage> {
    let depth = nodes.iter().map(ClusterNode::depth).max().unwrap_or(0);
    let mut levels: Vec<Vec<NodeId>> = vec![Vec::new(); depth + 1];
    for (id, n) in nodes.iter().enumerate() {
        levels[n.depth()].push(id);
    }

    let n_leaves = nodes.iter().filter(|n| n.children.is_none()).count();
    let mut ids:    Vec<Option<usize>> = vec![None; nodes.len()];
    let mut counts: Vec<usize>         = vec![0; nodes.len()];
    let mut rows        = Vec::new();
    let mut leaf_labels = Vec::with_capacity(n_leaves);

    if depth == 0 {
        leaf_labels.push(nodes[0].path.clone());
        return Ok(Linkage { rows, leaf_labels });
    }

    // bottom level first; the root level has no partner
    for (g, group) in levels.iter().rev().take(depth).enumerate() {
        for pair in group.chunks(2) {
            let &[left, right] = pair else {
                let lone = &nodes[pair[0]].path;
                return Err(ClusterError::SiblingInvariantViolation {
                    left:  lone.clone(),
                    right: lone.clone(),
                });
            };
            let parent = match (nodes[left].parent, nodes[right].parent) {
                (Some(a), Some(b)) if a == b => a,
                _ => {
                    return Err(ClusterError::SiblingInvariantViolation {
                        left:  nodes[left].path.clone(),
                        right: nodes[right].path.clone(),
                    })
                }
            };

            for id in [left, right] {
                if nodes[id].children.is_none() {
                    ids[id] = Some(leaf_labels.len());
                    counts[id] = match weight {
                        LinkageWeight::Leaves  => 1,
                        LinkageWeight::Samples => nodes[id].samples.len(),
                    };
                    leaf_labels.push(nodes[id].path.clone());
                }
            }

            let (Some(l), Some(r)) = (ids[left], ids[right]) else {
                return Err(ClusterError::SiblingInvariantViolation {
                    left:  nodes[left].path.clone(),
                    right: nodes[right].path.clone(),
                });
            };

            counts[parent] = counts[left] + counts[right];
            ids[parent]    = Some(n_leaves + rows.len());
            rows.push(LinkageRow {
                left:         l,
                right:        r,
                distance:     (g + 1) as f64,
                member_count: counts[parent],
            });
        }
    }

    Ok(Linkage { rows, leaf_labels })
}
