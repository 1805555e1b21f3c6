//! Agglomerative clustering over attribute vectors.
//!
//! Starts with every sample in its own group and repeatedly joins the two
//! closest groups, recording each join in a [`Dendrogram`]. The flat labeling
//! is the dendrogram cut that leaves `n_clusters` groups.
//!
//! [`Linkage`] decides how the distance between two groups is measured. Ward
//! (the default) joins the pair whose union grows within-group variance the
//! least; single, complete and average use the minimum, maximum or mean
//! pairwise distance. The linkage itself runs in `kodama` over an O(n²)
//! condensed distance matrix.

use super::dendrogram::Dendrogram;
use super::traits::Clustering;
use crate::error::{Error, Result};
use kodama::{linkage as kodama_linkage, Method as KodamaMethod};

/// Inter-group distance used when joining.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Linkage {
    /// Closest pair of members.
    Single,
    /// Farthest pair of members.
    Complete,
    /// Mean over all member pairs.
    Average,
    /// Increase in within-group variance.
    #[default]
    Ward,
}

/// Agglomerative strategy cut to a fixed number of clusters.
#[derive(Debug, Clone)]
pub struct HierarchicalClustering {
    n_clusters: usize,
    linkage: Linkage,
}

impl HierarchicalClustering {
    /// Strategy producing `n_clusters` groups with Ward linkage.
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            linkage: Linkage::default(),
        }
    }

    /// Set the linkage.
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Full merge history of `data`.
    pub fn fit_dendrogram(&self, data: &[Vec<f32>]) -> Result<Dendrogram> {
        if data.is_empty() {
            return Err(Error::EmptyTable);
        }

        let n = data.len();
        let d = data[0].len();
        if let Some(p) = data.iter().find(|p| p.len() != d) {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: p.len(),
            });
        }

        // Condensed upper-triangle dissimilarities, row-major, length n choose 2.
        let mut condensed = Vec::with_capacity(n * (n - 1) / 2);
        for row in 0..n.saturating_sub(1) {
            for col in (row + 1)..n {
                condensed.push(euclidean(&data[row], &data[col]));
            }
        }

        let method = match self.linkage {
            Linkage::Single => KodamaMethod::Single,
            Linkage::Complete => KodamaMethod::Complete,
            Linkage::Average => KodamaMethod::Average,
            Linkage::Ward => KodamaMethod::Ward,
        };

        let mut dendro = Dendrogram::new(n);
        if n > 1 {
            let steps = kodama_linkage(&mut condensed, n, method);
            for step in steps.steps() {
                dendro.add_merge(step.cluster1, step.cluster2, step.dissimilarity, step.size);
            }
        }
        Ok(dendro)
    }
}

#[inline]
fn euclidean(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let dx = f64::from(*x) - f64::from(*y);
            dx * dx
        })
        .sum::<f64>()
        .sqrt()
}

impl Clustering for HierarchicalClustering {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<isize>> {
        let labels = self.fit_dendrogram(data)?.cut_to_k(self.n_clusters)?;
        Ok(labels.into_iter().map(|l| l as isize).collect())
    }

    fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_linkage_separates_profiles() {
        // Two attribute profiles with one-bit variations.
        let data = vec![
            vec![1.0, 1.0, 0.0, 0.0],
            vec![1.0, 1.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 1.0, 1.0, 1.0],
            vec![1.0, 1.0, 0.0, 0.0],
        ];
        for linkage in [Linkage::Single, Linkage::Complete, Linkage::Average, Linkage::Ward] {
            let labels = HierarchicalClustering::new(2)
                .with_linkage(linkage)
                .fit_predict(&data)
                .unwrap();
            assert_eq!(labels, vec![0, 0, 1, 1, 0], "{linkage:?}");
        }
    }

    #[test]
    fn test_merge_history() {
        let data = vec![vec![0.0], vec![1.0], vec![5.0]];
        let dendro = HierarchicalClustering::new(1).fit_dendrogram(&data).unwrap();
        assert_eq!((dendro.n_items(), dendro.n_merges()), (3, 2));
        let distances: Vec<f64> = dendro.merges().map(|m| m.distance).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));

        let single = HierarchicalClustering::new(1).fit_dendrogram(&data[..1]).unwrap();
        assert_eq!(single.n_merges(), 0);
    }

    #[test]
    fn test_cluster_count_bounds() {
        let data = vec![vec![0.0], vec![1.0]];
        assert!(HierarchicalClustering::new(3).fit_predict(&data).is_err());
        assert!(HierarchicalClustering::new(0).fit_predict(&data).is_err());
        assert!(HierarchicalClustering::new(1).fit_predict(&[]).is_err());
    }
}
