//! # mien
//!
//! Cluster face images by the binary facial attributes a model infers for them.
//!
//! An [`AttributeCatalog`] names the attributes. A [`SampleTable`] holds one
//! binary vector per image, inferred through an [`AttributeModel`] or read from
//! label records. A [`ClusterPartitioner`] groups the vectors with any
//! [`Clustering`] strategy; each resulting [`Cluster`] lazily computes its
//! attribute frequencies, a mosaic of its members and a mean face with
//! eigenfaces. [`PartitionEvaluator`] scores the partition by silhouette, and
//! [`SummaryRenderer`] packages everything for display.
//!
//! Image pixels are fetched through the [`ImageSource`] seam; the crate never
//! ships a model.
//!
//! ```rust
//! use std::sync::Arc;
//! use mien::{AttributeCatalog, ClusterPartitioner, Kmeans, PartitionEvaluator, SampleTable};
//!
//! let catalog = AttributeCatalog::celeba().subset(&["Smiling", "Eyeglasses"]).unwrap();
//! let mut table = SampleTable::new(Arc::new(catalog));
//! for (i, v) in [[1, 0], [1, 0], [0, 1], [0, 1], [1, 1]].into_iter().enumerate() {
//!     table.push(format!("{i:06}.jpg"), v.to_vec(), None).unwrap();
//! }
//!
//! let mut partitioner = ClusterPartitioner::new(Kmeans::new(2).with_seed(51));
//! let _ = partitioner.fit(&Arc::new(table), None).unwrap();
//! let score = PartitionEvaluator::new().evaluate(&partitioner).unwrap();
//! assert!((-1.0..=1.0).contains(&score));
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![cfg_attr(test, deny(unsafe_code))]

pub mod catalog;
pub mod cluster;
pub mod config;
/// Error types used across `mien`.
pub mod error;
pub mod evaluate;
pub mod images;
pub mod inference;
pub mod metrics;
pub mod partition;
pub mod sample;
pub mod summary;

pub use catalog::{AttributeCatalog, CELEBA_ATTRIBUTES};
pub use cluster::{Clustering, Dbscan, HierarchicalClustering, Kmeans, Linkage, NOISE};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use evaluate::{NoisePolicy, PartitionEvaluator};
pub use images::{image_paths_from_folder, FsImageSource, ImageSource, InMemoryImages};
pub use inference::{AttributeModel, InferenceOptions};
pub use metrics::{silhouette_score, within_cluster_sum_of_squares};
pub use partition::{
    labels_to_indices, Cluster, ClusterPartitioner, EigenfaceOptions, MeanFace, MosaicOptions,
    Partition, Weights,
};
pub use sample::{DatasetSplit, LabelRecord, Sample, SampleSize, SampleTable};
pub use summary::{ClusterPanel, Layout, PartitionReport, SummaryRenderer};
