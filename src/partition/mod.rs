//! Partitioning a sample table into clusters.
//!
//! [`ClusterPartitioner`] wraps a [`Clustering`] strategy. Each `fit`
//! extracts the table's attribute matrix, optionally scales it with
//! [`Weights`], asks the strategy for one label per sample, and turns those
//! labels into a [`Partition`]: clusters numbered `0..num_clusters` in
//! first-encountered order plus a separate noise set.
//!
//! ```rust
//! use std::sync::Arc;
//! use mien::catalog::AttributeCatalog;
//! use mien::cluster::Kmeans;
//! use mien::partition::ClusterPartitioner;
//! use mien::sample::SampleTable;
//!
//! let schema = Arc::new(AttributeCatalog::build(["Smiling", "Eyeglasses"]).unwrap());
//! let mut table = SampleTable::new(schema);
//! table.push("a.jpg", vec![1, 0], None).unwrap();
//! table.push("b.jpg", vec![1, 0], None).unwrap();
//! table.push("c.jpg", vec![0, 1], None).unwrap();
//!
//! let mut partitioner = ClusterPartitioner::new(Kmeans::new(2).with_seed(1));
//! let partition = partitioner.fit(&Arc::new(table), None).unwrap();
//! assert_eq!(partition.num_clusters(), 2);
//! assert_eq!(partition.cluster(0).unwrap().size(), 2);
//! ```

mod cluster;
mod eigenface;

pub use cluster::{Cluster, EigenfaceOptions, MosaicOptions, DEFAULT_TILE_SIZE};
pub use eigenface::MeanFace;

use crate::cluster::{Clustering, NOISE};
use crate::error::{Error, Result};
use crate::sample::{Sample, SampleTable};
use ndarray::{Array1, Array2, Axis};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::info;

/// Attribute importance applied before clustering.
#[derive(Debug, Clone, PartialEq)]
pub enum Weights {
    /// One weight per matrix entry, shape `samples × attributes`.
    Elementwise(Array2<f32>),
    /// One weight per attribute, applied to every row.
    PerAttribute(Vec<f32>),
}

impl Weights {
    /// Multiply `vectors` in place.
    pub fn apply(&self, vectors: &mut Array2<f32>) -> Result<()> {
        match self {
            Weights::Elementwise(w) => {
                if w.dim() != vectors.dim() {
                    return Err(Error::ShapeMismatch {
                        expected: format!("{:?} weights", vectors.dim()),
                        actual: format!("{:?} weights", w.dim()),
                    });
                }
                *vectors *= w;
            }
            Weights::PerAttribute(w) => {
                if w.len() != vectors.ncols() {
                    return Err(Error::ShapeMismatch {
                        expected: format!("{} attribute weights", vectors.ncols()),
                        actual: format!("{} attribute weights", w.len()),
                    });
                }
                *vectors *= &Array1::from(w.clone());
            }
        }
        Ok(())
    }
}

/// Inputs of the most recent successful fit, as scored by the evaluator.
#[derive(Debug, Clone)]
pub struct FitState {
    /// Unweighted attribute vectors, `samples × attributes`.
    pub vectors: Array2<f32>,
    /// Labels exactly as the strategy returned them.
    pub labels: Vec<isize>,
}

/// Group sample positions by label, noise included.
///
/// Each list keeps the original order of the samples.
pub fn labels_to_indices(labels: &[isize]) -> BTreeMap<isize, Vec<usize>> {
    let mut groups: BTreeMap<isize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        groups.entry(label).or_default().push(i);
    }
    groups
}

/// Result of one fit: clusters plus the noise set.
#[derive(Debug)]
pub struct Partition {
    table: Arc<SampleTable>,
    clusters: Vec<Cluster>,
    labels: Vec<isize>,
    noise: Vec<usize>,
}

impl Partition {
    fn from_labels(table: Arc<SampleTable>, raw: &[isize]) -> Result<Self> {
        let mut remap: HashMap<isize, usize> = HashMap::new();
        let mut members: Vec<Vec<usize>> = Vec::new();
        let mut noise = Vec::new();
        let mut labels = Vec::with_capacity(raw.len());

        for (i, &label) in raw.iter().enumerate() {
            if label == NOISE {
                noise.push(i);
                labels.push(NOISE);
                continue;
            }
            if label < 0 {
                return Err(Error::InvalidLabel { index: i, label });
            }
            let k = *remap.entry(label).or_insert_with(|| {
                members.push(Vec::new());
                members.len() - 1
            });
            members[k].push(i);
            labels.push(k as isize);
        }

        let clusters = members
            .into_iter()
            .enumerate()
            .map(|(k, m)| Cluster::new(k, Arc::clone(&table), m))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            table,
            clusters,
            labels,
            noise,
        })
    }

    /// Clusters, ordered by `k`.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Cluster `k`, if it exists.
    pub fn cluster(&self, k: usize) -> Option<&Cluster> {
        self.clusters.get(k)
    }

    /// Number of non-noise clusters.
    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Positions of samples labeled noise.
    pub fn noise(&self) -> &[usize] {
        &self.noise
    }

    /// Samples labeled noise.
    pub fn noise_samples(&self) -> impl Iterator<Item = &Sample> + '_ {
        self.noise.iter().map(move |&i| &self.table.samples()[i])
    }

    /// Contiguous label per sample (`NOISE` for noise).
    pub fn labels(&self) -> &[isize] {
        &self.labels
    }

    /// Cluster of sample `i`, or `None` for noise or out of range.
    pub fn assignment(&self, i: usize) -> Option<&Cluster> {
        let label = *self.labels.get(i)?;
        usize::try_from(label).ok().and_then(|k| self.clusters.get(k))
    }

    /// Table the partition was fit on.
    pub fn table(&self) -> &Arc<SampleTable> {
        &self.table
    }
}

/// Partitions sample tables with a pluggable clustering strategy.
///
/// Holds at most one current [`Partition`]; a successful `fit` replaces it
/// and a failed one leaves it untouched.
#[derive(Debug)]
pub struct ClusterPartitioner<S> {
    strategy: S,
    partition: Option<Partition>,
    last_fit: Option<FitState>,
}

impl<S: Clustering> ClusterPartitioner<S> {
    /// Partitioner using `strategy`.
    pub fn new(strategy: S) -> Self {
        Self {
            strategy,
            partition: None,
            last_fit: None,
        }
    }

    /// The configured strategy.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Cluster `table`, scaling its vectors by `weights` first when given.
    pub fn fit(
        &mut self,
        table: &Arc<SampleTable>,
        weights: Option<&Weights>,
    ) -> Result<&Partition> {
        if table.is_empty() {
            return Err(Error::EmptyTable);
        }

        let vectors = table.vectors();
        let mut weighted = vectors.clone();
        if let Some(w) = weights {
            w.apply(&mut weighted)?;
        }
        let rows: Vec<Vec<f32>> = weighted.axis_iter(Axis(0)).map(|r| r.to_vec()).collect();

        let raw = self.strategy.fit_predict(&rows)?;
        if raw.len() != rows.len() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} labels", rows.len()),
                actual: format!("{} labels", raw.len()),
            });
        }

        let partition = Partition::from_labels(Arc::clone(table), &raw)?;
        info!(
            samples = rows.len(),
            requested = self.strategy.n_clusters(),
            clusters = partition.num_clusters(),
            noise = partition.noise().len(),
            "estimated partition"
        );

        self.last_fit = Some(FitState { vectors, labels: raw });
        Ok(&*self.partition.insert(partition))
    }

    /// Current partition, if fit.
    pub fn partition(&self) -> Option<&Partition> {
        self.partition.as_ref()
    }

    /// Vectors and raw labels of the last successful fit.
    pub fn last_fit(&self) -> Option<&FitState> {
        self.last_fit.as_ref()
    }

    /// Clusters found by the last fit, or 0 before any fit.
    pub fn num_clusters(&self) -> usize {
        self.partition.as_ref().map_or(0, Partition::num_clusters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AttributeCatalog;
    use crate::cluster::{from_fn, Dbscan, Kmeans};
    use crate::error::ErrorKind;
    use ndarray::array;
    use tracing_test::traced_test;

    fn table(vectors: &[Vec<u8>]) -> Arc<SampleTable> {
        let width = vectors.first().map_or(1, Vec::len);
        let schema = AttributeCatalog::build((0..width).map(|i| format!("a{i}"))).unwrap();
        let mut t = SampleTable::new(Arc::new(schema));
        for (i, v) in vectors.iter().enumerate() {
            t.push(format!("img_{i}.jpg"), v.clone(), None).unwrap();
        }
        Arc::new(t)
    }

    fn fixed(labels: Vec<isize>) -> impl Clustering {
        from_fn(move |_: &[Vec<f32>]| Ok(labels.clone()))
    }

    #[test]
    fn test_labels_to_indices() {
        let groups = labels_to_indices(&[0, 1, 1, 0, 2, 2, -1]);
        assert_eq!(groups[&0], vec![0, 3]);
        assert_eq!(groups[&1], vec![1, 2]);
        assert_eq!(groups[&2], vec![4, 5]);
        assert_eq!(groups[&-1], vec![6]);
    }

    #[test]
    #[traced_test]
    fn test_fit_groups_and_noise() {
        let t = table(&vec![vec![0, 1]; 7]);
        let mut p = ClusterPartitioner::new(fixed(vec![0, 1, 1, 0, 2, 2, -1]));
        let partition = p.fit(&t, None).unwrap();

        assert_eq!(partition.num_clusters(), 3);
        assert_eq!(partition.cluster(0).unwrap().member_indices(), &[0, 3]);
        assert_eq!(partition.cluster(1).unwrap().member_indices(), &[1, 2]);
        assert_eq!(partition.cluster(2).unwrap().member_indices(), &[4, 5]);
        assert_eq!(partition.noise(), &[6]);
        assert_eq!(
            partition.noise_samples().next().unwrap().image_reference(),
            "img_6.jpg"
        );
        assert!(partition.assignment(6).is_none());
        assert_eq!(partition.assignment(4).unwrap().k(), 2);
        assert!(logs_contain("estimated partition"));
    }

    #[test]
    #[traced_test]
    fn test_fit_logs_requested_clusters() {
        let t = table(&[vec![0, 0], vec![0, 0], vec![1, 1], vec![1, 1]]);
        let mut p = ClusterPartitioner::new(Kmeans::new(2).with_seed(51));
        assert_eq!(p.fit(&t, None).unwrap().num_clusters(), 2);
        assert!(logs_contain("requested=2"));
        assert!(logs_contain("clusters=2"));
    }

    #[test]
    fn test_relabel_first_encountered() {
        let t = table(&vec![vec![1]; 5]);
        let mut p = ClusterPartitioner::new(fixed(vec![7, 3, 7, -1, 42]));
        let partition = p.fit(&t, None).unwrap();
        assert_eq!(partition.labels(), &[0, 1, 0, -1, 2]);
        // Raw labels are kept for scoring.
        assert_eq!(p.last_fit().unwrap().labels, vec![7, 3, 7, -1, 42]);
        assert_eq!(p.num_clusters(), 3);
    }

    #[test]
    fn test_invalid_label() {
        let t = table(&vec![vec![1]; 2]);
        let mut p = ClusterPartitioner::new(fixed(vec![0, -2]));
        let err = p.fit(&t, None).unwrap_err();
        assert!(matches!(err, Error::InvalidLabel { index: 1, label: -2 }));
        assert!(p.partition().is_none());
        assert!(p.last_fit().is_none());
    }

    #[test]
    fn test_wrong_label_count() {
        let t = table(&vec![vec![1]; 3]);
        let mut p = ClusterPartitioner::new(fixed(vec![0, 0]));
        assert_eq!(p.fit(&t, None).unwrap_err().kind(), ErrorKind::DataShape);
    }

    #[test]
    fn test_empty_table() {
        let t = table(&[]);
        let mut p = ClusterPartitioner::new(Kmeans::new(2));
        assert!(matches!(p.fit(&t, None), Err(Error::EmptyTable)));
    }

    #[test]
    fn test_failed_fit_keeps_previous() {
        let t = table(&vec![vec![1, 0]; 4]);
        let mut p = ClusterPartitioner::new(fixed(vec![0, 0, 1, 1]));
        let _ = p.fit(&t, None).unwrap();

        let bad = Weights::PerAttribute(vec![1.0, 2.0, 3.0]);
        assert!(p.fit(&t, Some(&bad)).is_err());
        assert_eq!(p.num_clusters(), 2);
        assert!(p.last_fit().is_some());
    }

    #[test]
    fn test_weights_apply() {
        let mut m = array![[1.0, 1.0], [0.0, 1.0]];
        Weights::PerAttribute(vec![2.0, 0.5]).apply(&mut m).unwrap();
        assert_eq!(m, array![[2.0, 0.5], [0.0, 0.5]]);

        let mut m = array![[1.0, 1.0], [1.0, 1.0]];
        Weights::Elementwise(array![[1.0, 2.0], [3.0, 4.0]])
            .apply(&mut m)
            .unwrap();
        assert_eq!(m, array![[1.0, 2.0], [3.0, 4.0]]);

        let err = Weights::Elementwise(Array2::ones((3, 2))).apply(&mut m).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataShape);
    }

    #[test]
    fn test_weights_reach_strategy_but_not_fit_state() {
        let t = table(&[vec![1, 1], vec![0, 1]]);
        let seen = std::sync::Mutex::new(Vec::new());
        let strategy = from_fn(|data: &[Vec<f32>]| {
            seen.lock().unwrap().extend_from_slice(data);
            Ok(vec![0, 1])
        });
        let mut p = ClusterPartitioner::new(strategy);
        let w = Weights::PerAttribute(vec![3.0, 1.0]);
        let _ = p.fit(&t, Some(&w)).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![vec![3.0, 1.0], vec![0.0, 1.0]]);
        assert_eq!(p.last_fit().unwrap().vectors, array![[1.0, 1.0], [0.0, 1.0]]);
    }

    #[test]
    fn test_refit_reproduces_partition() {
        let t = table(&[
            vec![1, 1, 0],
            vec![1, 1, 0],
            vec![0, 0, 1],
            vec![0, 1, 1],
            vec![1, 0, 0],
            vec![0, 0, 1],
        ]);
        let mut p = ClusterPartitioner::new(Kmeans::new(2).with_seed(51));
        let first: Vec<Vec<usize>> = p
            .fit(&t, None)
            .unwrap()
            .clusters()
            .iter()
            .map(|c| c.member_indices().to_vec())
            .collect();
        let second: Vec<Vec<usize>> = p
            .fit(&t, None)
            .unwrap()
            .clusters()
            .iter()
            .map(|c| c.member_indices().to_vec())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_dbscan_noise() {
        let t = table(&[vec![1, 1], vec![1, 1], vec![1, 1], vec![0, 0]]);
        let mut p = ClusterPartitioner::new(Dbscan::new(0.5, 2));
        let partition = p.fit(&t, None).unwrap();
        assert_eq!(partition.num_clusters(), 1);
        assert_eq!(partition.noise(), &[3]);
    }
}
