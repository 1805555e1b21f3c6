//! K-means clustering.
//!
//! Partitions data into k clusters by minimizing **within-cluster sum of squares**
//! (WCSS):
//!
//! ```text
//! WCSS = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! # Lloyd's Algorithm
//!
//! 1. Seed k centroids with k-means++
//! 2. **Assign**: Each point → nearest centroid
//! 3. **Update**: Each centroid → mean of assigned points
//! 4. Repeat until the centroid shift drops below tolerance
//!
//! Lloyd only finds a local minimum, so the whole procedure is restarted
//! `n_init` times from different seeds and the run with the lowest WCSS wins.
//!
//! # Binary attribute vectors
//!
//! On 0/1 vectors many points coincide exactly. k-means++ then sees zero
//! total distance once every distinct point is a centroid; remaining
//! centroids are drawn uniformly, and clusters that end up empty are
//! re-seeded from a random point.

use super::traits::Clustering;
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1};
use rand::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum Lloyd iterations per run.
    max_iter: usize,
    /// Convergence tolerance on total squared centroid shift.
    tol: f64,
    /// Independent restarts.
    n_init: usize,
    /// Random seed.
    seed: Option<u64>,
}

/// Result of a k-means fit.
#[derive(Debug, Clone)]
pub struct KmeansFit {
    /// Cluster index per point, in `0..k`.
    pub labels: Vec<usize>,
    /// `k × d` centroid matrix.
    pub centroids: Array2<f32>,
    /// Within-cluster sum of squared distances.
    pub inertia: f64,
    /// Lloyd iterations used by the winning run.
    pub n_iter: usize,
}

impl Kmeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 300,
            tol: 1e-4,
            n_init: 10,
            seed: None,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the number of restarts.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fit and return labels, centroids and inertia of the best run.
    pub fn fit(&self, data: &[Vec<f32>]) -> Result<KmeansFit> {
        if data.is_empty() {
            return Err(Error::EmptyTable);
        }
        if self.k == 0 {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "must be at least 1",
            });
        }
        if self.n_init == 0 {
            return Err(Error::InvalidParameter {
                name: "n_init",
                message: "must be at least 1",
            });
        }

        let n = data.len();
        let d = data[0].len();
        if self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }

        let mut flat: Vec<f32> = Vec::with_capacity(n * d);
        for point in data {
            if point.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: point.len(),
                });
            }
            flat.extend_from_slice(point);
        }
        let points = Array2::from_shape_vec((n, d), flat).map_err(|e| Error::ShapeMismatch {
            expected: format!("{n}x{d}"),
            actual: e.to_string(),
        })?;

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        let mut best: Option<KmeansFit> = None;
        for _ in 0..self.n_init {
            let run = self.lloyd(&points, &mut rng);
            if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }
        best.ok_or(Error::InvalidParameter {
            name: "n_init",
            message: "must be at least 1",
        })
    }

    fn lloyd(&self, points: &Array2<f32>, rng: &mut impl Rng) -> KmeansFit {
        let n = points.nrows();
        let d = points.ncols();
        let mut centroids = self.init_centroids(points, rng);
        let mut labels = vec![0usize; n];
        let mut n_iter = 0;

        for _ in 0..self.max_iter {
            n_iter += 1;
            self.assign(points, &centroids, &mut labels);

            let mut next = Array2::<f32>::zeros((self.k, d));
            let mut counts = vec![0usize; self.k];
            for (i, &k) in labels.iter().enumerate() {
                let mut row = next.row_mut(k);
                row += &points.row(i);
                counts[k] += 1;
            }
            for (k, &count) in counts.iter().enumerate() {
                if count > 0 {
                    next.row_mut(k).mapv_inplace(|v| v / count as f32);
                } else {
                    let idx = rng.random_range(0..n);
                    next.row_mut(k).assign(&points.row(idx));
                }
            }

            let shift: f32 = centroids
                .iter()
                .zip(next.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();
            centroids = next;
            if f64::from(shift) < self.tol {
                break;
            }
        }

        // Final assignment against the converged centroids.
        self.assign(points, &centroids, &mut labels);
        let inertia = labels
            .iter()
            .enumerate()
            .map(|(i, &k)| f64::from(squared_distance(&points.row(i), &centroids.row(k))))
            .sum();

        KmeansFit {
            labels,
            centroids,
            inertia,
            n_iter,
        }
    }

    fn assign(&self, points: &Array2<f32>, centroids: &Array2<f32>, labels: &mut [usize]) {
        let nearest = |i: usize| {
            let point = points.row(i);
            let mut best_cluster = 0;
            let mut best_dist = f32::MAX;
            for k in 0..self.k {
                let dist = squared_distance(&point, &centroids.row(k));
                if dist < best_dist {
                    best_dist = dist;
                    best_cluster = k;
                }
            }
            best_cluster
        };

        #[cfg(feature = "parallel")]
        labels
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, label)| *label = nearest(i));

        #[cfg(not(feature = "parallel"))]
        for (i, label) in labels.iter_mut().enumerate() {
            *label = nearest(i);
        }
    }

    /// Initialize centroids using k-means++.
    fn init_centroids(&self, points: &Array2<f32>, rng: &mut impl Rng) -> Array2<f32> {
        let n = points.nrows();
        let mut centroids = Array2::zeros((self.k, points.ncols()));

        let first = rng.random_range(0..n);
        centroids.row_mut(0).assign(&points.row(first));

        let mut min_dist: Vec<f32> = (0..n)
            .map(|j| squared_distance(&points.row(j), &centroids.row(0)))
            .collect();

        for i in 1..self.k {
            let total: f32 = min_dist.iter().sum();
            let selected = if total <= 0.0 {
                rng.random_range(0..n)
            } else {
                let threshold = rng.random::<f32>() * total;
                let mut cumsum = 0.0;
                let mut selected = n - 1;
                for (j, &dist) in min_dist.iter().enumerate() {
                    cumsum += dist;
                    if cumsum >= threshold && dist > 0.0 {
                        selected = j;
                        break;
                    }
                }
                selected
            };
            centroids.row_mut(i).assign(&points.row(selected));

            for (j, slot) in min_dist.iter_mut().enumerate() {
                *slot = slot.min(squared_distance(&points.row(j), &centroids.row(i)));
            }
        }

        centroids
    }
}

#[inline]
fn squared_distance(a: &ArrayView1<'_, f32>, b: &ArrayView1<'_, f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<isize>> {
        let fit = self.fit(data)?;
        Ok(fit.labels.into_iter().map(|l| l as isize).collect())
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
        ]
    }

    #[test]
    fn test_kmeans_basic() {
        let labels = Kmeans::new(2).with_seed(42).fit_predict(&blobs()).unwrap();

        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn test_kmeans_all_points_assigned() {
        let data: Vec<Vec<f32>> = (0..50)
            .map(|i| vec![i as f32 * 0.1, (i % 5) as f32])
            .collect();

        let labels = Kmeans::new(5).with_seed(123).fit_predict(&data).unwrap();

        assert_eq!(labels.len(), data.len());
        for &label in &labels {
            assert!((0..5).contains(&label), "label {} out of range", label);
        }
    }

    #[test]
    fn test_kmeans_binary_duplicates() {
        // Many identical binary vectors: only two distinct points.
        let mut data = vec![vec![1.0, 0.0, 1.0]; 6];
        data.extend(vec![vec![0.0, 1.0, 0.0]; 4]);

        let fit = Kmeans::new(3).with_seed(7).fit(&data).unwrap();
        assert_eq!(fit.labels.len(), 10);
        assert!(fit.inertia.abs() < 1e-9);
        assert!(fit.labels[..6].iter().all(|&l| l == fit.labels[0]));
        assert!(fit.labels[6..].iter().all(|&l| l == fit.labels[6]));
    }

    #[test]
    fn test_kmeans_deterministic_with_seed() {
        let a = Kmeans::new(2).with_seed(42).fit_predict(&blobs()).unwrap();
        let b = Kmeans::new(2).with_seed(42).fit_predict(&blobs()).unwrap();
        assert_eq!(a, b, "same seed should give same result");
    }

    #[test]
    fn test_kmeans_inertia() {
        let fit = Kmeans::new(2).with_seed(1).fit(&blobs()).unwrap();
        // Each pair is 0.1*sqrt(2) apart; each point is half that from its centroid.
        assert!((fit.inertia - 0.02).abs() < 1e-4);
        assert_eq!(fit.centroids.dim(), (2, 2));
    }

    #[test]
    fn test_kmeans_errors() {
        let empty: Vec<Vec<f32>> = vec![];
        assert!(Kmeans::new(2).fit_predict(&empty).is_err());

        let data = vec![vec![0.0, 0.0], vec![1.0, 1.0]];
        assert!(matches!(
            Kmeans::new(5).fit_predict(&data),
            Err(Error::InvalidClusterCount { .. })
        ));
        assert!(Kmeans::new(0).fit_predict(&data).is_err());

        let ragged = vec![vec![0.0, 0.0], vec![1.0]];
        assert!(matches!(
            Kmeans::new(1).fit_predict(&ragged),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
