//! Divisive (top-down) hierarchical clustering.
//!
//! Every node with more than `min_split_samples` samples is offered a 1- and
//! a 2-component fit; if the 2-component score is lower the node becomes
//! INTERNAL and its samples are partitioned by the 2-component hard labels,
//! otherwise it is a LEAF. Nodes live in an arena in level order, so all
//! nodes of one depth are contiguous and siblings are adjacent.

use ndarray::{ArrayView2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ClusterError, Result};
use crate::model::{ClusterEstimator, ClusterModel};
use crate::path::BranchPath;

/// Index of a node in the tree arena.
pub type NodeId = usize;

// ─────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DivisiveConfig {
    /// Nodes with at most this many samples are never split.
    pub min_split_samples: usize,
    /// Nodes at this depth are never split.
    pub max_depth:         Option<usize>,
    /// Fit the nodes of one level on the rayon pool.
    pub parallel:          bool,
}

impl Default for DivisiveConfig {
    fn default() -> Self {
        Self { min_split_samples: 5, max_depth: None, parallel: false }
    }
}

impl DivisiveConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("CONNECTOME_MIN_SPLIT_SAMPLES") {
            if let Ok(n) = v.parse() { cfg.min_split_samples = n; }
        }
        if let Ok(v) = std::env::var("CONNECTOME_MAX_DEPTH") {
            if let Ok(n) = v.parse() { cfg.max_depth = Some(n); }
        }
        if let Ok(v) = std::env::var("CONNECTOME_PARALLEL") {
            cfg.parallel = v == "1" || v.eq_ignore_ascii_case("true");
        }
        cfg
    }
}

// ─────────────────────────────────────────────
// Nodes
// ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Unfit,
    Leaf,
    Internal,
}

#[derive(Debug, Clone)]
pub struct ClusterNode<M> {
    pub(crate) path:     BranchPath,
    pub(crate) parent:   Option<NodeId>,
    pub(crate) samples:  Vec<usize>,
    pub(crate) state:    NodeState,
    pub(crate) model:    Option<M>,
    /// `[score(1), score(2)]` when a fit was attempted.
    pub(crate) scores:   Option<[f64; 2]>,
    pub(crate) children: Option<[NodeId; 2]>,
}

impl<M> ClusterNode<M> {
    pub(crate) fn unfit(path: BranchPath, parent: Option<NodeId>, samples: Vec<usize>) -> Self {
        Self {
            path,
            parent,
            samples,
            state:    NodeState::Unfit,
            model:    None,
            scores:   None,
            children: None,
        }
    }

    pub fn path(&self) -> &BranchPath { &self.path }
    pub fn depth(&self) -> usize { self.path.depth() }
    pub fn parent(&self) -> Option<NodeId> { self.parent }
    /// Indices into the fitted feature matrix.
    pub fn samples(&self) -> &[usize] { &self.samples }
    pub fn n_samples(&self) -> usize { self.samples.len() }
    pub fn state(&self) -> NodeState { self.state }
    pub fn model(&self) -> Option<&M> { self.model.as_ref() }
    pub fn children(&self) -> Option<[NodeId; 2]> { self.children }
    pub fn is_leaf(&self) -> bool { self.state == NodeState::Leaf }
    pub fn scores(&self) -> Option<[f64; 2]> { self.scores }

    /// `score(2) / score(1)`, recorded whether or not the node split.
    pub fn bic_ratio(&self) -> Option<f64> {
        self.scores.map(|[s1, s2]| s2 / s1)
    }
}

/// Outcome of fitting one UNFIT node.
enum Decision<M> {
    Leaf { scores: Option<[f64; 2]> },
    Split { model: M, scores: [f64; 2], halves: [Vec<usize>; 2] },
}

// ─────────────────────────────────────────────
// Reporting
// ─────────────────────────────────────────────

/// Per-node audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRecord {
    pub path:      BranchPath,
    pub depth:     usize,
    pub n_samples: usize,
    pub state:     NodeState,
    pub bic_ratio: Option<f64>,
    pub scores:    Option<[f64; 2]>,
}

/// Value printed next to each node by [`DivisiveClusterTree::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeField {
    Samples,
    BicRatio,
}

// ─────────────────────────────────────────────
// Tree
// ─────────────────────────────────────────────

pub struct DivisiveClusterTree<E: ClusterEstimator> {
    estimator:  E,
    config:     DivisiveConfig,
    pub(crate) nodes:      Vec<ClusterNode<E::Model>>,
    pub(crate) n_features: Option<usize>,
}

impl<E: ClusterEstimator> DivisiveClusterTree<E> {
    pub fn new(estimator: E, config: DivisiveConfig) -> Self {
        Self { estimator, config, nodes: Vec::new(), n_features: None }
    }

    pub fn config(&self) -> &DivisiveConfig { &self.config }
    pub fn estimator(&self) -> &E { &self.estimator }
    pub fn is_fitted(&self) -> bool { !self.nodes.is_empty() }

    /// All nodes in level order; the root is `0`.
    pub fn nodes(&self) -> &[ClusterNode<E::Model>] { &self.nodes }

    pub fn node(&self, id: NodeId) -> Option<&ClusterNode<E::Model>> {
        self.nodes.get(id)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &ClusterNode<E::Model>> + '_ {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    pub fn n_leaves(&self) -> usize {
        self.leaves().count()
    }

    /// Depth of the deepest node; 0 for a single-leaf tree.
    pub fn depth(&self) -> usize {
        self.nodes.last().map_or(0, |n| n.depth())
    }

    /// Grow the tree on the rows of `x`, replacing any previous fit.
    pub fn fit(&mut self, x: ArrayView2<'_, f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 {
            return Err(ClusterError::DegenerateInput("cannot fit an empty sample set".into()));
        }

        let mut nodes = vec![ClusterNode::unfit(BranchPath::root(), None, (0..n).collect())];
        let mut level: Vec<NodeId> = vec![0];
        let mut depth = 0;

        while !level.is_empty() {
            let decide = |&id: &NodeId| self.decide(x, &nodes[id], depth);
            let decisions: Vec<Decision<E::Model>> = if self.config.parallel {
                level.par_iter().map(decide).collect::<Result<_>>()?
            } else {
                level.iter().map(decide).collect::<Result<_>>()?
            };

            let mut next = Vec::new();
            for (&id, decision) in level.iter().zip(decisions) {
                match decision {
                    Decision::Leaf { scores } => {
                        nodes[id].state  = NodeState::Leaf;
                        nodes[id].scores = scores;
                    }
                    Decision::Split { model, scores, halves: [left, right] } => {
                        let path = nodes[id].path.clone();
                        let l = nodes.len();
                        nodes.push(ClusterNode::unfit(path.child(0), Some(id), left));
                        nodes.push(ClusterNode::unfit(path.child(1), Some(id), right));

                        let node = &mut nodes[id];
                        node.state    = NodeState::Internal;
                        node.model    = Some(model);
                        node.scores   = Some(scores);
                        node.children = Some([l, l + 1]);
                        next.extend([l, l + 1]);
                    }
                }
            }
            level = next;
            depth += 1;
        }

        self.nodes      = nodes;
        self.n_features = Some(x.ncols());

        info!(
            samples = n,
            nodes   = self.nodes.len(),
            leaves  = self.n_leaves(),
            depth   = self.depth(),
            "divisive fit complete"
        );
        Ok(())
    }

    fn decide(
        &self,
        x: ArrayView2<'_, f64>,
        node: &ClusterNode<E::Model>,
        depth: usize,
    ) -> Result<Decision<E::Model>> {
        let n = node.samples.len();
        let too_small = n <= self.config.min_split_samples.max(1);
        let too_deep  = self.config.max_depth.map_or(false, |max| depth >= max);
        if too_small || too_deep {
            return Ok(Decision::Leaf { scores: None });
        }

        let sub = x.select(Axis(0), &node.samples);
        let one = self.estimator.fit(sub.view(), 1)?;
        let two = self.estimator.fit(sub.view(), 2)?;
        let scores = [one.score(sub.view()), two.score(sub.view())];

        if !(scores[1] < scores[0]) {
            debug!(path = %node.path, n, bic_ratio = scores[1] / scores[0], "kept as leaf");
            return Ok(Decision::Leaf { scores: Some(scores) });
        }

        let labels = two.predict(sub.view())?;
        let mut halves = [Vec::new(), Vec::new()];
        for (&sample, &label) in node.samples.iter().zip(&labels) {
            halves[usize::from(label != 0)].push(sample);
        }

        if halves.iter().any(Vec::is_empty) {
            warn!(path = %node.path, n, "2-component split left one side empty; collapsing to leaf");
            return Ok(Decision::Leaf { scores: Some(scores) });
        }

        debug!(
            path      = %node.path,
            n,
            left      = halves[0].len(),
            right     = halves[1].len(),
            bic_ratio = scores[1] / scores[0],
            "split accepted"
        );
        Ok(Decision::Split { model: two, scores, halves })
    }

    /// Leaf path of every fitted sample, indexed like the fitted rows.
    pub fn fitted_labels(&self) -> Result<Vec<BranchPath>> {
        let root = self.nodes.first().ok_or(ClusterError::NotFitted)?;
        let mut labels = vec![BranchPath::root(); root.samples.len()];
        for leaf in self.leaves() {
            for &s in &leaf.samples {
                labels[s] = leaf.path.clone();
            }
        }
        Ok(labels)
    }

    /// Route every row of `x` to a leaf and return its path.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<BranchPath>> {
        let expected = self.n_features.ok_or(ClusterError::NotFitted)?;
        if x.nrows() == 0 {
            return Err(ClusterError::DegenerateInput("cannot predict an empty sample set".into()));
        }
        if x.ncols() != expected {
            return Err(ClusterError::DimensionMismatch { expected, got: x.ncols() });
        }

        let mut labels = vec![BranchPath::root(); x.nrows()];
        let mut stack: Vec<(NodeId, Vec<usize>)> = vec![(0, (0..x.nrows()).collect())];

        while let Some((id, rows)) = stack.pop() {
            if rows.is_empty() {
                continue;
            }
            let node = &self.nodes[id];
            match (node.children, node.model.as_ref()) {
                (Some([left, right]), Some(model)) => {
                    let sub = x.select(Axis(0), &rows);
                    let branch = model.predict(sub.view())?;
                    let (mut l, mut r) = (Vec::new(), Vec::new());
                    for (&row, &b) in rows.iter().zip(&branch) {
                        if b == 0 { l.push(row) } else { r.push(row) }
                    }
                    stack.push((right, r));
                    stack.push((left, l));
                }
                _ => {
                    for row in rows {
                        labels[row] = node.path.clone();
                    }
                }
            }
        }
        Ok(labels)
    }

    /// One [`SplitRecord`] per node, in level order.
    pub fn split_report(&self) -> Vec<SplitRecord> {
        self.nodes
            .iter()
            .map(|n| SplitRecord {
                path:      n.path.clone(),
                depth:     n.depth(),
                n_samples: n.n_samples(),
                state:     n.state,
                bic_ratio: n.bic_ratio(),
                scores:    n.scores,
            })
            .collect()
    }

    /// Indented text rendering, one line per node in depth-first order.
    ///
    /// ```text
    /// root (100)
    /// ├── 0 (50)
    /// └── 1 (50)
    /// ```
    pub fn render(&self, field: TreeField) -> String {
        let mut out = String::new();
        if self.nodes.is_empty() {
            return out;
        }

        // (node, prefix for its children, connector for itself)
        let mut stack: Vec<(NodeId, String, &str)> = vec![(0, String::new(), "")];
        while let Some((id, prefix, connector)) = stack.pop() {
            let node = &self.nodes[id];
            let value = match field {
                TreeField::Samples  => node.n_samples().to_string(),
                TreeField::BicRatio => node.bic_ratio().map_or_else(|| "-".into(), |r| format!("{r:.4}")),
            };
            out.push_str(&format!("{prefix}{connector}{} ({value})\n", node.path));

            if let Some([left, right]) = node.children {
                let child_prefix = match connector {
                    "├── " => format!("{prefix}│   "),
                    "└── " => format!("{prefix}    "),
                    _      => prefix.clone(),
                };
                stack.push((right, child_prefix.clone(), "└── "));
                stack.push((left, child_prefix, "├── "));
            }
        }
        out
    }
}
