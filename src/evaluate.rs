//! Scoring a fitted partitioner.

use crate::cluster::{Clustering, NOISE};
use crate::error::{Error, Result};
use crate::metrics::{silhouette_score, within_cluster_sum_of_squares};
use crate::partition::{ClusterPartitioner, FitState};
use ndarray::{Array2, Axis};
use serde::Deserialize;
use tracing::debug;

/// How noise-labeled samples take part in the silhouette.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoisePolicy {
    /// Noise is scored as one more cluster.
    #[default]
    PseudoCluster,
    /// Noise samples are dropped before scoring.
    Exclude,
}

/// Scores the last fit of a [`ClusterPartitioner`].
///
/// Scores use the unweighted attribute vectors, whatever weights the fit used.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartitionEvaluator {
    noise_policy: NoisePolicy,
}

impl PartitionEvaluator {
    /// Evaluator with the default noise policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the noise policy.
    pub fn with_noise_policy(mut self, noise_policy: NoisePolicy) -> Self {
        self.noise_policy = noise_policy;
        self
    }

    /// Configured noise policy.
    pub fn noise_policy(&self) -> NoisePolicy {
        self.noise_policy
    }

    /// Mean silhouette of the last fit, in `[-1, 1]`.
    ///
    /// # Errors
    ///
    /// [`Error::NoFitResult`] if the partitioner was never fit and
    /// [`Error::UnscorablePartition`] when the labeling has fewer than two or
    /// as many labels as scored samples.
    pub fn evaluate<S: Clustering>(&self, partitioner: &ClusterPartitioner<S>) -> Result<f64> {
        let fit = last_fit(partitioner)?;
        let score = match self.noise_policy {
            NoisePolicy::PseudoCluster => silhouette_score(fit.vectors.view(), &fit.labels)?,
            NoisePolicy::Exclude => {
                let keep: Vec<usize> = fit
                    .labels
                    .iter()
                    .enumerate()
                    .filter(|&(_, &l)| l != NOISE)
                    .map(|(i, _)| i)
                    .collect();
                let vectors: Array2<f32> = fit.vectors.select(Axis(0), &keep);
                let labels: Vec<isize> = keep.iter().map(|&i| fit.labels[i]).collect();
                silhouette_score(vectors.view(), &labels)?
            }
        };
        debug!(score, policy = ?self.noise_policy, "silhouette");
        Ok(score)
    }

    /// Within-cluster sum of squares of the last fit, noise excluded.
    pub fn inertia<S: Clustering>(&self, partitioner: &ClusterPartitioner<S>) -> Result<f64> {
        let fit = last_fit(partitioner)?;
        within_cluster_sum_of_squares(fit.vectors.view(), &fit.labels)
    }
}

fn last_fit<S: Clustering>(partitioner: &ClusterPartitioner<S>) -> Result<&FitState> {
    partitioner.last_fit().ok_or(Error::NoFitResult)
}
