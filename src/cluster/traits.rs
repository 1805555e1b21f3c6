//! Clustering strategy interface.

use crate::error::Result;

/// Label assigned to points a strategy declines to cluster.
pub const NOISE: isize = -1;

/// A clustering strategy: one integer label per input point.
///
/// Labels are arbitrary non-negative integers; [`NOISE`] marks unassigned
/// points for strategies that have a noise concept. The partitioner relabels
/// them to a contiguous range, so strategies need not.
pub trait Clustering {
    /// Fit the model to `data` and return one label per point.
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<isize>>;

    /// The configured number of clusters, or 0 when discovered from the data.
    fn n_clusters(&self) -> usize {
        0
    }
}

impl<T: Clustering + ?Sized> Clustering for Box<T> {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<isize>> {
        (**self).fit_predict(data)
    }

    fn n_clusters(&self) -> usize {
        (**self).n_clusters()
    }
}

impl<T: Clustering + ?Sized> Clustering for &T {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<isize>> {
        (**self).fit_predict(data)
    }

    fn n_clusters(&self) -> usize {
        (**self).n_clusters()
    }
}

/// A strategy backed by a closure.
#[derive(Clone)]
pub struct FnClustering<F> {
    f: F,
}

impl<F> Clustering for FnClustering<F>
where
    F: Fn(&[Vec<f32>]) -> Result<Vec<isize>>,
{
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<isize>> {
        (self.f)(data)
    }
}

/// Wrap a closure as a [`Clustering`] strategy.
pub fn from_fn<F>(f: F) -> FnClustering<F>
where
    F: Fn(&[Vec<f32>]) -> Result<Vec<isize>>,
{
    FnClustering { f }
}
