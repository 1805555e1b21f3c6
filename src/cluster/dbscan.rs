//! Density-based clustering with a noise set (Ester et al., 1996).
//!
//! The number of clusters comes from the data, and points in sparse regions
//! are labeled [`NOISE`]. A point is *core* when at least `min_pts` points
//! (itself included) lie within `epsilon`; clusters grow from core points
//! and absorb any border point they reach.
//!
//! ## On binary attribute vectors
//!
//! Euclidean distance between 0/1 vectors is `sqrt(hamming)`, so ε between
//! 1.0 and 1.4 means "differ in at most one attribute". Weighted vectors
//! stretch that per attribute.
//!
//! ## Complexity
//!
//! O(n²) distance evaluations; O(n) memory for labels.

use super::traits::{Clustering, NOISE};
use crate::error::{Error, Result};
use std::collections::VecDeque;

/// Density-based strategy: `epsilon` neighborhoods, `min_pts` core threshold.
#[derive(Debug, Clone)]
pub struct Dbscan {
    epsilon: f32,
    min_pts: usize,
}

impl Dbscan {
    /// Strategy with neighborhood radius `epsilon` and core size `min_pts`.
    pub fn new(epsilon: f32, min_pts: usize) -> Self {
        Self { epsilon, min_pts }
    }

    /// Set the neighborhood radius.
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the core size, the point itself included.
    pub fn with_min_pts(mut self, min_pts: usize) -> Self {
        self.min_pts = min_pts;
        self
    }

    /// Positions within epsilon of `center`, excluding it.
    fn neighborhood(&self, data: &[Vec<f32>], center: usize) -> Vec<usize> {
        let eps2 = self.epsilon * self.epsilon;
        (0..data.len())
            .filter(|&j| j != center && squared_distance(&data[center], &data[j]) <= eps2)
            .collect()
    }

    fn is_core(&self, neighbors: &[usize]) -> bool {
        neighbors.len() + 1 >= self.min_pts
    }
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(0.5, 5)
    }
}

impl Clustering for Dbscan {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<isize>> {
        let n = data.len();
        if n == 0 {
            return Err(Error::EmptyTable);
        }
        if self.epsilon.is_nan() || self.epsilon <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "epsilon",
                message: "must be positive",
            });
        }
        if self.min_pts == 0 {
            return Err(Error::InvalidParameter {
                name: "min_pts",
                message: "must be at least 1",
            });
        }
        let d = data[0].len();
        if let Some(p) = data.iter().find(|p| p.len() != d) {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: p.len(),
            });
        }

        let mut labels = vec![NOISE; n];
        let mut visited = vec![false; n];
        let mut next: isize = 0;

        for seed in 0..n {
            if std::mem::replace(&mut visited[seed], true) {
                continue;
            }
            let neighbors = self.neighborhood(data, seed);
            if !self.is_core(&neighbors) {
                // Stays noise unless a later core point reaches it.
                continue;
            }

            let cluster_id = next;
            next += 1;
            labels[seed] = cluster_id;
            let mut queue: VecDeque<usize> = neighbors.into();
            while let Some(q) = queue.pop_front() {
                if labels[q] == NOISE {
                    labels[q] = cluster_id;
                }
                if std::mem::replace(&mut visited[q], true) {
                    continue;
                }
                let q_neighbors = self.neighborhood(data, q);
                if self.is_core(&q_neighbors) {
                    queue.extend(
                        q_neighbors
                            .into_iter()
                            .filter(|&r| !visited[r] || labels[r] == NOISE),
                    );
                }
            }
        }

        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(rows: &[&str]) -> Vec<Vec<f32>> {
        rows.iter()
            .map(|r| r.bytes().map(|b| f32::from(b - b'0')).collect())
            .collect()
    }

    #[test]
    fn test_groups_near_duplicates() {
        let data = bits(&["1100", "1100", "1000", "0011", "0011", "0001"]);
        let labels = Dbscan::new(1.0, 2).fit_predict(&data).unwrap();
        assert_eq!(labels, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_isolated_vector_is_noise() {
        let data = bits(&["10000", "10000", "11000", "00111", "01110", "01110", "01100"]);
        let labels = Dbscan::new(1.0, 3).fit_predict(&data).unwrap();
        assert_eq!(&labels[..3], &[0, 0, 0]);
        // "00111" is two flips from "01110": outside epsilon.
        assert_eq!(labels[3], NOISE);
        assert_eq!(&labels[4..], &[1, 1, 1]);
    }

    #[test]
    fn test_sparse_data_all_noise() {
        let data = bits(&["1000", "0100", "0010", "0001"]);
        let labels = Dbscan::new(1.0, 2).fit_predict(&data).unwrap();
        assert!(labels.iter().all(|&l| l == NOISE));
    }

    #[test]
    fn test_border_reached_through_chain() {
        // Each step flips one attribute, so density connects the ends.
        let data = bits(&["000", "100", "110", "111"]);
        let labels = Dbscan::new(1.0, 2).fit_predict(&data).unwrap();
        assert!(labels.iter().all(|&l| l == 0));
    }

    #[test]
    fn test_weighted_attribute_splits() {
        // Scaling the first attribute by 3 pushes its flips out of reach.
        let data = vec![
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            vec![3.0, 1.0],
            vec![3.0, 1.0],
        ];
        let labels = Dbscan::new(1.0, 2).fit_predict(&data).unwrap();
        assert_eq!(labels, vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_invalid_params() {
        let data = bits(&["10"]);
        assert!(Dbscan::new(0.0, 3).fit_predict(&data).is_err());
        assert!(Dbscan::new(f32::NAN, 3).fit_predict(&data).is_err());
        assert!(Dbscan::new(1.0, 0).fit_predict(&data).is_err());
        assert!(matches!(
            Dbscan::default().fit_predict(&[]),
            Err(Error::EmptyTable)
        ));
        assert!(matches!(
            Dbscan::default().fit_predict(&[vec![0.0], vec![0.0, 1.0]]),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
