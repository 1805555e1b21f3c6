//! Merge history of agglomerative clustering.
//!
//! Leaves are items `0..n`; merge `i` creates cluster id `n + i`
//! (SciPy/MATLAB convention, as produced by `kodama`).

use super::util::UnionFind;
use crate::error::{Error, Result};

/// A single merge operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    /// First cluster being merged.
    pub cluster_a: usize,
    /// Second cluster being merged.
    pub cluster_b: usize,
    /// Dissimilarity at which the merge occurred.
    pub distance: f64,
    /// Size of the resulting cluster.
    pub size: usize,
}

/// Nested cluster structure, merges ordered by non-decreasing distance.
#[derive(Debug, Clone)]
pub struct Dendrogram {
    merges: Vec<Merge>,
    n_items: usize,
}

impl Dendrogram {
    /// Empty dendrogram over `n_items` leaves.
    pub fn new(n_items: usize) -> Self {
        Self {
            merges: Vec::with_capacity(n_items.saturating_sub(1)),
            n_items,
        }
    }

    /// Record a merge.
    pub fn add_merge(&mut self, cluster_a: usize, cluster_b: usize, distance: f64, size: usize) {
        self.merges.push(Merge {
            cluster_a,
            cluster_b,
            distance,
            size,
        });
    }

    /// Flat labels for exactly `k` clusters.
    ///
    /// Applies the first `n - k` merges; labels are numbered by first
    /// appearance in item order.
    pub fn cut_to_k(&self, k: usize) -> Result<Vec<usize>> {
        if k == 0 || k > self.n_items {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: self.n_items,
            });
        }
        let n_merges = self.n_items - k;
        if n_merges > self.merges.len() {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: self.n_items,
            });
        }

        let mut uf = UnionFind::new(self.n_items + n_merges);
        for (i, m) in self.merges.iter().take(n_merges).enumerate() {
            let id = self.n_items + i;
            let _ = uf.union(m.cluster_a, id);
            let _ = uf.union(m.cluster_b, id);
        }
        Ok(relabel((0..self.n_items).map(|i| uf.find(i)).collect()))
    }

    /// Number of leaves.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of merges recorded.
    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    /// Iterate over merges.
    pub fn merges(&self) -> impl Iterator<Item = &Merge> {
        self.merges.iter()
    }
}

fn relabel(roots: Vec<usize>) -> Vec<usize> {
    let mut seen: Vec<usize> = Vec::new();
    roots
        .into_iter()
        .map(|r| match seen.iter().position(|&s| s == r) {
            Some(p) => p,
            None => {
                seen.push(r);
                seen.len() - 1
            }
        })
        .collect()
}
