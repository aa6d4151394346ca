//! Per-hop visitation counts accumulated over many trajectories.

use ndarray::{Array1, Array2, Axis};

use crate::engine::Trajectory;

/// Matrix of shape `(max_hops, n_nodes)`.
///
/// Row `h` counts how often each node was reached after `h + 1` steps. The
/// source of a trajectory is hop 0 and is not a step, so it is not counted;
/// a single-token trajectory therefore contributes at most `max_hops` counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopHistogram {
    counts: Array2<u64>,
}

impl HopHistogram {
    pub fn new(max_hops: usize, n_nodes: usize) -> Self {
        Self { counts: Array2::zeros((max_hops, n_nodes)) }
    }

    #[inline] pub fn max_hops(&self) -> usize { self.counts.nrows() }
    #[inline] pub fn n_nodes(&self) -> usize { self.counts.ncols() }
    #[inline] pub fn counts(&self) -> &Array2<u64> { &self.counts }

    pub fn into_inner(self) -> Array2<u64> {
        self.counts
    }

    /// Add every post-source visit of `trajectory`.
    pub fn record(&mut self, trajectory: &Trajectory) {
        let max_hops = self.max_hops();
        for (step, node) in trajectory.visits() {
            if step <= max_hops {
                self.counts[[step - 1, node]] += 1;
            }
        }
    }

    /// Sum another histogram of the same shape into this one.
    pub fn merge(&mut self, other: &HopHistogram) {
        debug_assert_eq!(self.counts.dim(), other.counts.dim());
        self.counts += &other.counts;
    }

    /// Total number of recorded visits.
    pub fn total(&self) -> u64 {
        self.counts.sum()
    }

    /// Visits per node summed over all hops.
    pub fn visits_per_node(&self) -> Array1<u64> {
        self.counts.sum_axis(Axis(0))
    }

    /// Mean 1-based hop at which each node was visited; `None` if never.
    pub fn mean_visit_hop(&self) -> Vec<Option<f64>> {
        self.counts
            .columns()
            .into_iter()
            .map(|col| {
                let n: u64 = col.sum();
                if n == 0 {
                    return None;
                }
                let weighted: u64 = col
                    .iter()
                    .enumerate()
                    .map(|(h, &c)| (h as u64 + 1) * c)
                    .sum();
                Some(weighted as f64 / n as f64)
            })
            .collect()
    }

    /// Counts as floating point, for feature concatenation or plotting.
    pub fn to_f64(&self) -> Array2<f64> {
        self.counts.mapv(|c| c as f64)
    }
}
