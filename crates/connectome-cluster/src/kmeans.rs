//! Bundled estimator: spherical k-means scored by BIC.
//!
//! Lloyd iterations from k-means++ seeds, best of `n_init` restarts by
//! inertia. The fitted model is read as a hard-assignment Gaussian mixture
//! with one shared isotropic variance and mixing weights equal to the
//! cluster shares, which gives a likelihood and therefore a BIC:
//!
//! ```text
//! log L = Σ_i [ ln w(c_i) - d/2 · ln(2π σ²) - ‖x_i - μ(c_i)‖² / 2σ² ]
//! BIC   = -2 log L + p · ln n,      p = k·d + 1 + (k - 1)
//! ```

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{ClusterError, Result};
use crate::model::{ClusterEstimator, ClusterModel};

/// Lower bound on the shared variance, so zero-spread clusters stay finite.
const VARIANCE_FLOOR: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct KMeansBic {
    /// Independent k-means++ restarts per fit.
    pub n_init:    usize,
    pub max_iter:  usize,
    /// Stop once no centroid moves more than this (squared distance).
    pub threshold: f64,
    pub seed:      u64,
}

impl Default for KMeansBic {
    fn default() -> Self {
        Self { n_init: 10, max_iter: 100, threshold: 1e-10, seed: 888 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansModel {
    /// `(k, d)` cluster means.
    centers:  Array2<f64>,
    /// Share of training rows per cluster.
    weights:  Vec<f64>,
    variance: f64,
}

impl KMeansModel {
    pub fn centers(&self) -> &Array2<f64> { &self.centers }
    pub fn weights(&self) -> &[f64] { &self.weights }
    pub fn variance(&self) -> f64 { self.variance }

    fn nearest(&self, x: ArrayView1<'_, f64>) -> (usize, f64) {
        nearest(&self.centers, x)
    }
}

fn sq_dist(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Index of and squared distance to the closest center; ties go to the lower index.
fn nearest(centers: &Array2<f64>, x: ArrayView1<'_, f64>) -> (usize, f64) {
    let mut best = (0, f64::MAX);
    for (k, c) in centers.rows().into_iter().enumerate() {
        let d = sq_dist(x, c);
        if d < best.1 {
            best = (k, d);
        }
    }
    best
}

impl KMeansBic {
    /// k-means++ seeding: first center uniform, the rest by squared distance.
    fn seed_centers<R: Rng>(&self, x: ArrayView2<'_, f64>, k: usize, rng: &mut R) -> Array2<f64> {
        let n = x.nrows();
        let mut centers = Array2::zeros((k, x.ncols()));
        centers.row_mut(0).assign(&x.row(rng.gen_range(0..n)));

        let mut d2: Vec<f64> = x.rows().into_iter().map(|r| sq_dist(r, centers.row(0))).collect();
        for c in 1..k {
            let pick = match WeightedIndex::new(&d2) {
                Ok(dist) => dist.sample(rng),
                // every point already sits on a center
                Err(_) => rng.gen_range(0..n),
            };
            centers.row_mut(c).assign(&x.row(pick));
            for (i, r) in x.rows().into_iter().enumerate() {
                d2[i] = d2[i].min(sq_dist(r, centers.row(c)));
            }
        }
        centers
    }

    /// One Lloyd run; returns centers, assignments and inertia.
    fn lloyd(&self, x: ArrayView2<'_, f64>, mut centers: Array2<f64>) -> (Array2<f64>, Vec<usize>, f64) {
        let (n, d) = x.dim();
        let k = centers.nrows();
        let mut assignments = vec![0usize; n];

        for _ in 0..self.max_iter {
            for (i, r) in x.rows().into_iter().enumerate() {
                assignments[i] = nearest(&centers, r).0;
            }

            let mut sums = Array2::<f64>::zeros((k, d));
            let mut counts = vec![0usize; k];
            for (i, r) in x.rows().into_iter().enumerate() {
                let c = assignments[i];
                counts[c] += 1;
                let mut row = sums.row_mut(c);
                row += &r;
            }

            let mut max_shift = 0.0f64;
            for c in 0..k {
                // an empty cluster keeps its previous center
                if counts[c] == 0 {
                    continue;
                }
                let mean = sums.row(c).mapv(|s| s / counts[c] as f64);
                max_shift = max_shift.max(sq_dist(centers.row(c), mean.view()));
                centers.row_mut(c).assign(&mean);
            }
            if max_shift < self.threshold {
                break;
            }
        }

        let mut inertia = 0.0;
        for (i, r) in x.rows().into_iter().enumerate() {
            let (c, dist) = nearest(&centers, r);
            assignments[i] = c;
            inertia += dist;
        }
        (centers, assignments, inertia)
    }
}

impl ClusterEstimator for KMeansBic {
    type Model = KMeansModel;

    fn fit(&self, x: ArrayView2<'_, f64>, n_components: usize) -> Result<KMeansModel> {
        let (n, d) = x.dim();
        if n_components == 0 {
            return Err(ClusterError::Model("n_components must be at least 1".into()));
        }
        if n < n_components {
            return Err(ClusterError::Model(format!(
                "cannot fit {n_components} components to {n} samples"
            )));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(ClusterError::Model("features contain non-finite values".into()));
        }

        let mut best: Option<(Array2<f64>, Vec<usize>, f64)> = None;
        for restart in 0..self.n_init.max(1) {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            rng.set_stream(restart as u64);
            let init = self.seed_centers(x, n_components, &mut rng);
            let run = self.lloyd(x, init);
            if best.as_ref().map_or(true, |b| run.2 < b.2) {
                best = Some(run);
            }
        }
        let Some((centers, assignments, inertia)) = best else {
            return Err(ClusterError::Model("no k-means restart completed".into()));
        };

        let mut weights = vec![0.0; n_components];
        for &c in &assignments {
            weights[c] += 1.0;
        }
        weights.iter_mut().for_each(|w| *w /= n as f64);

        let variance = (inertia / (n * d).max(1) as f64).max(VARIANCE_FLOOR);
        Ok(KMeansModel { centers, weights, variance })
    }
}

impl ClusterModel for KMeansModel {
    fn n_components(&self) -> usize {
        self.centers.nrows()
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>> {
        if x.ncols() != self.centers.ncols() {
            return Err(ClusterError::DimensionMismatch {
                expected: self.centers.ncols(),
                got:      x.ncols(),
            });
        }
        Ok(x.rows().into_iter().map(|r| self.nearest(r).0).collect())
    }

    /// BIC of the hard-assignment mixture. `+∞` if a component lost all of
    /// its training rows or `x` is unusable.
    fn score(&self, x: ArrayView2<'_, f64>) -> f64 {
        let (n, d) = x.dim();
        if n == 0 || d != self.centers.ncols() || self.weights.iter().any(|&w| w <= 0.0) {
            return f64::INFINITY;
        }

        let k = self.n_components();
        let norm = 0.5 * d as f64 * (2.0 * std::f64::consts::PI * self.variance).ln();
        let log_lik: f64 = x
            .axis_iter(Axis(0))
            .map(|r| {
                let (c, dist) = self.nearest(r);
                self.weights[c].ln() - norm - dist / (2.0 * self.variance)
            })
            .sum();

        let n_params = (k * d + 1 + (k - 1)) as f64;
        -2.0 * log_lik + n_params * (n as f64).ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_groups() -> Array2<f64> {
        array![
            [0.0, 0.0], [0.2, 0.1], [0.1, 0.3], [0.3, 0.2],
            [9.0, 9.0], [9.2, 9.1], [9.1, 9.3], [9.3, 9.2],
        ]
    }

    #[test]
    fn two_components_separate_groups() {
        let x = two_groups();
        let model = KMeansBic::default().fit(x.view(), 2).unwrap();
        let labels = model.predict(x.view()).unwrap();

        assert!(labels[..4].iter().all(|&l| l == labels[0]));
        assert!(labels[4..].iter().all(|&l| l == labels[4]));
        assert_ne!(labels[0], labels[4]);
        assert_eq!(model.weights(), &[0.5, 0.5]);
    }

    #[test]
    fn bic_prefers_two_components_for_separated_groups() {
        let x = two_groups();
        let est = KMeansBic::default();
        let s1 = est.fit(x.view(), 1).unwrap().score(x.view());
        let s2 = est.fit(x.view(), 2).unwrap().score(x.view());
        assert!(s2 < s1, "s1={s1} s2={s2}");
    }

    #[test]
    fn identical_points_do_not_split() {
        let x = Array2::from_elem((12, 3), 1.5);
        let est = KMeansBic::default();
        let one = est.fit(x.view(), 1).unwrap();
        let two = est.fit(x.view(), 2).unwrap();

        assert_eq!(one.variance(), VARIANCE_FLOOR);
        assert!(one.score(x.view()).is_finite());
        // every point ties to center 0, leaving component 1 empty
        assert_eq!(two.score(x.view()), f64::INFINITY);
    }

    #[test]
    fn fit_rejects_too_few_samples() {
        let x = array![[1.0, 2.0]];
        assert!(matches!(KMeansBic::default().fit(x.view(), 2), Err(ClusterError::Model(_))));
    }

    #[test]
    fn predict_checks_feature_width() {
        let model = KMeansBic::default().fit(two_groups().view(), 2).unwrap();
        let err = model.predict(array![[1.0, 2.0, 3.0]].view()).unwrap_err();
        assert!(matches!(err, ClusterError::DimensionMismatch { expected: 2, got: 3 }));
    }

    #[test]
    fn fits_are_deterministic() {
        let x = two_groups();
        let a = KMeansBic::default().fit(x.view(), 2).unwrap();
        let b = KMeansBic::default().fit(x.view(), 2).unwrap();
        assert_eq!(a, b);
    }
}
