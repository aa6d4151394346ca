//! The clustering capability consumed by the divisive tree.
//!
//! The tree only ever asks for 1- and 2-component fits and compares their
//! scores; any estimator with an information-criterion style score (lower is
//! better) can be plugged in. [`KMeansBic`](crate::KMeansBic) is the bundled
//! implementation.

use ndarray::ArrayView2;

use crate::error::Result;

/// Fits a [`ClusterModel`] with a fixed number of components.
pub trait ClusterEstimator: Send + Sync {
    type Model: ClusterModel;

    /// Fit `n_components` clusters to the rows of `x`. `x` is never empty.
    fn fit(&self, x: ArrayView2<'_, f64>, n_components: usize) -> Result<Self::Model>;
}

/// A fitted clustering of feature rows.
pub trait ClusterModel: Send + Sync {
    fn n_components(&self) -> usize;

    /// Hard component label in `0..n_components()` for every row of `x`.
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>>;

    /// Model-selection score on `x`; lower is better.
    fn score(&self, x: ArrayView2<'_, f64>) -> f64;
}
