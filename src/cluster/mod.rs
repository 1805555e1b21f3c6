//! Clustering strategies.
//!
//! The partitioner treats clustering as a pluggable capability: anything
//! implementing [`Clustering`] maps `samples × features` points to one label
//! per point, with [`NOISE`] (`-1`) for points left unassigned. Three
//! strategies ship with the crate; callers can plug in their own, including
//! closures via [`from_fn`].
//!
//! | Strategy | k known up front | Noise | Notes |
//! |----------|------------------|-------|-------|
//! | [`Kmeans`] | yes | no | k-means++ seeding, `n_init` restarts |
//! | [`Dbscan`] | no | yes | ε-neighborhood density |
//! | [`HierarchicalClustering`] | yes | no | agglomerative, Ward by default |
//!
//! ## Usage
//!
//! ```rust
//! use mien::cluster::{Clustering, Dbscan, Kmeans, NOISE};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//!     vec![50.0, 50.0],
//! ];
//!
//! let labels = Kmeans::new(2).with_seed(7).fit_predict(&data[..4]).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//!
//! let labels = Dbscan::new(0.5, 2).fit_predict(&data).unwrap();
//! assert_eq!(labels[4], NOISE);
//! ```

mod dbscan;
mod dendrogram;
mod hierarchical;
mod kmeans;
mod traits;
mod util;

pub use dbscan::Dbscan;
pub use dendrogram::{Dendrogram, Merge};
pub use hierarchical::{HierarchicalClustering, Linkage};
pub use kmeans::{Kmeans, KmeansFit};
pub use traits::{from_fn, Clustering, FnClustering, NOISE};
