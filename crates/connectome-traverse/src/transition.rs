//! Transition models derived from a raw weighted adjacency matrix.
//!
//! ## Model kinds
//!
//! | Kind           | Entry `P[i, j]`                 | Used by                  |
//! |----------------|---------------------------------|--------------------------|
//! | `Markov`       | `A[i, j] / Σ_k A[i, k]`         | random walks             |
//! | `Transmission` | `1 − (1 − p)^A[i, j]`           | cascades                 |
//!
//! A row with no outgoing mass marks a **dead** node: any trajectory reaching
//! it terminates with [`Outcome::DeadEnd`](crate::Outcome::DeadEnd).
//!
//! Backward (upstream) traversal runs the same engines on
//! [`TransitionModel::transpose`].

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TraverseError};

/// How the probabilities of a [`TransitionModel`] were derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Row-stochastic one-step movement probabilities.
    Markov,
    /// Independent per-edge activation probabilities.
    Transmission,
}

/// Per-node outgoing probability distribution over a directed graph.
#[derive(Debug, Clone)]
pub struct TransitionModel {
    probs: Array2<f64>,
    kind:  ModelKind,
    dead:  Vec<bool>,
}

impl TransitionModel {
    /// Wrap an already-computed probability matrix.
    ///
    /// Entries must be finite and lie in `[0, 1]`; the matrix must be square.
    pub fn from_probabilities(probs: Array2<f64>, kind: ModelKind) -> Result<Self> {
        check_square(&probs)?;
        if let Some(bad) = probs.iter().find(|&&v| !v.is_finite() || !(0.0..=1.0).contains(&v)) {
            return Err(TraverseError::Configuration(format!(
                "transition probabilities must lie in [0, 1], found {bad}"
            )));
        }
        let dead = probs.rows().into_iter().map(|r| r.sum() <= 0.0).collect();
        Ok(Self { probs, kind, dead })
    }

    #[inline] pub fn n_nodes(&self) -> usize { self.probs.nrows() }
    #[inline] pub fn kind(&self) -> ModelKind { self.kind }
    #[inline] pub fn probabilities(&self) -> &Array2<f64> { &self.probs }

    /// Outgoing distribution of node `i`.
    #[inline]
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.probs.row(i)
    }

    /// `true` when node `i` has zero outgoing mass.
    #[inline]
    pub fn is_dead(&self, i: usize) -> bool {
        self.dead[i]
    }

    /// Indices of all dead nodes, ascending.
    pub fn dead_nodes(&self) -> Vec<usize> {
        self.dead
            .iter()
            .enumerate()
            .filter_map(|(i, &d)| d.then_some(i))
            .collect()
    }

    /// The same model over reversed edges.
    ///
    /// A transposed Markov matrix is no longer row-stochastic; random walks
    /// renormalize each row at sampling time.
    pub fn transpose(&self) -> Self {
        let probs = self.probs.t().to_owned();
        let dead = probs.rows().into_iter().map(|r| r.sum() <= 0.0).collect();
        Self { probs, kind: self.kind, dead }
    }

    pub(crate) fn check_node(&self, node: usize) -> Result<()> {
        if node >= self.n_nodes() {
            return Err(TraverseError::NodeOutOfRange { node, n_nodes: self.n_nodes() });
        }
        Ok(())
    }
}

/// Row-normalize `adj` into a Markov transition matrix.
///
/// Rows summing to zero stay zero, marking dead nodes; nothing is ever
/// divided by zero.
pub fn to_markov_matrix(adj: &Array2<f64>) -> Result<TransitionModel> {
    check_adjacency(adj)?;
    let mut probs = adj.clone();
    for mut row in probs.rows_mut() {
        let total = row.sum();
        if total > 0.0 {
            row.mapv_inplace(|w| w / total);
        }
    }
    TransitionModel::from_probabilities(probs, ModelKind::Markov)
}

/// Per-edge transmission probabilities for cascades.
///
/// Each unit of edge weight is an independent quantal event that fires with
/// probability `p`, so the edge transmits with
///
/// ```text
/// P[i, j] = 1 − (1 − p)^A[i, j]
/// ```
pub fn to_transmission_matrix(adj: &Array2<f64>, p: f64) -> Result<TransitionModel> {
    check_adjacency(adj)?;
    if !(0.0..=1.0).contains(&p) {
        return Err(TraverseError::Configuration(format!(
            "firing probability must lie in [0, 1], got {p}"
        )));
    }
    let not_fire = 1.0 - p;
    let probs = adj.mapv(|w| if w > 0.0 { 1.0 - not_fire.powf(w) } else { 0.0 });
    TransitionModel::from_probabilities(probs, ModelKind::Transmission)
}

fn check_square(m: &Array2<f64>) -> Result<()> {
    if m.nrows() != m.ncols() {
        return Err(TraverseError::Configuration(format!(
            "adjacency must be square, got {}x{}",
            m.nrows(),
            m.ncols()
        )));
    }
    Ok(())
}

fn check_adjacency(adj: &Array2<f64>) -> Result<()> {
    check_square(adj)?;
    if let Some(bad) = adj.iter().find(|&&w| !w.is_finite() || w < 0.0) {
        return Err(TraverseError::Configuration(format!(
            "adjacency weights must be finite and non-negative, found {bad}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn markov_rows_sum_to_one_or_zero() {
        let adj = array![[0.0, 2.0, 2.0], [0.0, 0.0, 0.0], [1.0, 3.0, 0.0]];
        let m = to_markov_matrix(&adj).unwrap();

        assert!((m.row(0).sum() - 1.0).abs() < 1e-12);
        assert_eq!(m.row(1).sum(), 0.0);
        assert!((m.row(2)[1] - 0.75).abs() < 1e-12);
        assert_eq!(m.dead_nodes(), vec![1]);
        assert_eq!(m.kind(), ModelKind::Markov);
    }

    #[test]
    fn transmission_follows_quantal_union_bound() {
        let adj = array![[0.0, 1.0], [3.0, 0.0]];
        let m = to_transmission_matrix(&adj, 0.5).unwrap();

        assert!((m.row(0)[1] - 0.5).abs() < 1e-12);
        assert!((m.row(1)[0] - 0.875).abs() < 1e-12);
        assert_eq!(m.row(0)[0], 0.0);
    }

    #[test]
    fn transmission_with_certain_firing_saturates() {
        let adj = array![[0.0, 4.0], [0.0, 0.0]];
        let m = to_transmission_matrix(&adj, 1.0).unwrap();
        assert_eq!(m.row(0)[1], 1.0);
        assert!(m.is_dead(1));
    }

    #[test]
    fn rejects_non_square_adjacency() {
        let adj = Array2::<f64>::zeros((2, 3));
        assert!(matches!(to_markov_matrix(&adj), Err(TraverseError::Configuration(_))));
    }

    #[test]
    fn rejects_negative_weights_and_bad_p() {
        let adj = array![[0.0, -1.0], [0.0, 0.0]];
        assert!(to_markov_matrix(&adj).is_err());

        let ok = array![[0.0, 1.0], [0.0, 0.0]];
        assert!(to_transmission_matrix(&ok, 1.5).is_err());
    }

    #[test]
    fn transpose_swaps_direction_and_dead_set() {
        let adj = array![[0.0, 1.0], [0.0, 0.0]];
        let fwd = to_markov_matrix(&adj).unwrap();
        let back = fwd.transpose();

        assert_eq!(fwd.dead_nodes(), vec![1]);
        assert_eq!(back.dead_nodes(), vec![0]);
        assert_eq!(back.row(1)[0], 1.0);
    }
}
