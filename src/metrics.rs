//! Internal clustering quality metrics.
//!
//! Measures that score a labeling against the geometry of the points it
//! labels, without ground truth.
//!
//! # Metrics Overview
//!
//! | Metric | Range | Best | Properties |
//! |--------|-------|------|------------|
//! | [`silhouette_score`] | [-1, 1] | 1 | Separation vs cohesion, O(n²) |
//! | [`silhouette_samples`] | [-1, 1] each | 1 | Per-point silhouette |
//! | [`within_cluster_sum_of_squares`] | [0, ∞) | 0 | k-means inertia |
//!
//! All distances are Euclidean. Every distinct label, including the noise
//! sentinel, is treated as a cluster here; callers that want noise left out
//! filter it first.
//!
//! # Example
//!
//! ```rust
//! use mien::metrics::silhouette_score;
//! use ndarray::array;
//!
//! let points = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
//! let score = silhouette_score(points.view(), &[0, 0, 1, 1]).unwrap();
//! assert!(score > 0.8);
//! ```
//!
//! # References
//!
//! - Rousseeuw (1987). "Silhouettes: a graphical aid to the interpretation
//!   and validation of cluster analysis"

use crate::cluster::NOISE;
use crate::error::{Error, Result};
use ndarray::{Array1, ArrayView1, ArrayView2};
use std::collections::BTreeMap;

/// Silhouette coefficient of each point.
///
/// ```text
/// s(i) = (b(i) - a(i)) / max(a(i), b(i))
/// ```
///
/// where `a(i)` is the mean distance from `i` to the other members of its
/// cluster and `b(i)` the smallest mean distance from `i` to another
/// cluster. Points alone in their cluster score 0.
///
/// # Errors
///
/// [`Error::UnscorablePartition`] unless `2 <= n_labels <= n_samples - 1`,
/// [`Error::ShapeMismatch`] if `labels` and `points` disagree in length.
pub fn silhouette_samples(points: ArrayView2<'_, f32>, labels: &[isize]) -> Result<Vec<f64>> {
    let n = points.nrows();
    if labels.len() != n {
        return Err(Error::ShapeMismatch {
            expected: format!("{n} labels"),
            actual: format!("{} labels", labels.len()),
        });
    }

    // Dense cluster ids in sorted label order.
    let groups = group_sizes(labels);
    let n_labels = groups.len();
    if n_labels < 2 || n_labels + 1 > n {
        return Err(Error::UnscorablePartition {
            n_labels,
            n_samples: n,
        });
    }
    let ids: BTreeMap<isize, usize> = groups.keys().enumerate().map(|(i, &l)| (l, i)).collect();
    let sizes: Vec<usize> = groups.values().copied().collect();
    let dense: Vec<usize> = labels.iter().map(|l| ids[l]).collect();

    let mut scores = Vec::with_capacity(n);
    let mut sums = vec![0.0_f64; n_labels];
    for i in 0..n {
        sums.iter_mut().for_each(|s| *s = 0.0);
        let pi = points.row(i);
        for j in 0..n {
            if i != j {
                sums[dense[j]] += euclidean(pi, points.row(j));
            }
        }

        let own = dense[i];
        if sizes[own] == 1 {
            scores.push(0.0);
            continue;
        }
        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..n_labels)
            .filter(|&c| c != own)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        scores.push(if denom > 0.0 { (b - a) / denom } else { 0.0 });
    }
    Ok(scores)
}

/// Mean silhouette coefficient over all points.
///
/// Higher is better: near 1 means tight, well separated clusters, near 0
/// overlapping ones, negative values points closer to another cluster than
/// their own.
pub fn silhouette_score(points: ArrayView2<'_, f32>, labels: &[isize]) -> Result<f64> {
    let scores = silhouette_samples(points, labels)?;
    Ok(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Sum of squared distances from each point to its cluster mean.
///
/// Points labeled [`NOISE`] contribute nothing.
pub fn within_cluster_sum_of_squares(points: ArrayView2<'_, f32>, labels: &[isize]) -> Result<f64> {
    if labels.len() != points.nrows() {
        return Err(Error::ShapeMismatch {
            expected: format!("{} labels", points.nrows()),
            actual: format!("{} labels", labels.len()),
        });
    }

    let d = points.ncols();
    let mut centroids: BTreeMap<isize, (Array1<f64>, usize)> = BTreeMap::new();
    for (row, &label) in points.rows().into_iter().zip(labels) {
        if label == NOISE {
            continue;
        }
        let (sum, count) = centroids
            .entry(label)
            .or_insert_with(|| (Array1::zeros(d), 0));
        sum.zip_mut_with(&row, |s, &x| *s += f64::from(x));
        *count += 1;
    }
    for (sum, count) in centroids.values_mut() {
        *sum /= *count as f64;
    }

    let mut total = 0.0;
    for (row, label) in points.rows().into_iter().zip(labels) {
        if let Some((mean, _)) = centroids.get(label) {
            total += row
                .iter()
                .zip(mean.iter())
                .map(|(&x, &m)| (f64::from(x) - m).powi(2))
                .sum::<f64>();
        }
    }
    Ok(total)
}

fn group_sizes(labels: &[isize]) -> BTreeMap<isize, usize> {
    let mut sizes = BTreeMap::new();
    for &l in labels {
        *sizes.entry(l).or_insert(0) += 1;
    }
    sizes
}

#[inline]
fn euclidean(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}
