//! Display-ready data for a fitted partition.
//!
//! Rendering (figures, DPI, fonts) happens outside this crate. The renderer
//! only gathers what each cluster figure needs into [`ClusterPanel`]s, and a
//! whole partition into a [`PartitionReport`].

use crate::cluster::Clustering;
use crate::error::{Error, Result};
use crate::evaluate::PartitionEvaluator;
use crate::images::ImageSource;
use crate::partition::{Cluster, ClusterPartitioner, EigenfaceOptions, MosaicOptions, Partition};
use image::RgbImage;
use serde::Deserialize;
use tracing::{debug, warn};

/// Which views each cluster panel carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Mosaic only.
    #[default]
    Mosaics,
    /// Mosaic and attribute frequencies.
    WithFrequencies,
    /// Mosaic and mean face.
    WithEigenfaces,
    /// Mosaic, attribute frequencies and mean face.
    AllStats,
}

impl Layout {
    /// Whether panels include attribute frequencies.
    pub fn frequencies(self) -> bool {
        matches!(self, Layout::WithFrequencies | Layout::AllStats)
    }

    /// Whether panels include the mean face.
    pub fn mean_face(self) -> bool {
        matches!(self, Layout::WithEigenfaces | Layout::AllStats)
    }
}

/// Everything needed to draw one cluster.
#[derive(Debug, Clone)]
pub struct ClusterPanel {
    /// Cluster identifier.
    pub k: usize,
    /// Member count.
    pub size: usize,
    /// Member mosaic.
    pub mosaic: RgbImage,
    /// `(attribute, frequency)` pairs in schema order.
    pub frequencies: Option<Vec<(String, f32)>>,
    /// Mean face as an 8-bit raster.
    pub mean_face: Option<RgbImage>,
}

/// Summary of a whole partition.
#[derive(Debug, Clone)]
pub struct PartitionReport {
    /// Silhouette score, `None` when the labeling cannot be scored.
    pub score: Option<f64>,
    /// Number of clusters.
    pub num_clusters: usize,
    /// Number of noise samples.
    pub noise: usize,
    /// One panel per cluster, ordered by `k`.
    pub panels: Vec<ClusterPanel>,
}

/// Builds panels and reports from clusters.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryRenderer {
    mosaic: MosaicOptions,
    eigenface: EigenfaceOptions,
}

impl SummaryRenderer {
    /// Renderer with 200px tiles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set mosaic options.
    pub fn with_mosaic_options(mut self, mosaic: MosaicOptions) -> Self {
        self.mosaic = mosaic;
        self
    }

    /// Set mean face options.
    pub fn with_eigenface_options(mut self, eigenface: EigenfaceOptions) -> Self {
        self.eigenface = eigenface;
        self
    }

    /// Panel for one cluster.
    ///
    /// Views come from the cluster's caches, so a second panel for the same
    /// cluster reuses them.
    pub fn panel<I>(&self, cluster: &Cluster, images: &I, layout: Layout) -> Result<ClusterPanel>
    where
        I: ImageSource + ?Sized,
    {
        let mosaic = cluster.mosaic_image(images, &self.mosaic)?.clone();
        let frequencies = if layout.frequencies() {
            Some(
                cluster
                    .named_frequencies()?
                    .into_iter()
                    .map(|(name, f)| (name.to_string(), f))
                    .collect(),
            )
        } else {
            None
        };
        let mean_face = if layout.mean_face() {
            Some(cluster.mean_face(images, &self.eigenface)?.to_rgb_image())
        } else {
            None
        };

        Ok(ClusterPanel {
            k: cluster.k(),
            size: cluster.size(),
            mosaic,
            frequencies,
            mean_face,
        })
    }

    /// Panels for every cluster of `partition`.
    pub fn panels<I>(
        &self,
        partition: &Partition,
        images: &I,
        layout: Layout,
    ) -> Result<Vec<ClusterPanel>>
    where
        I: ImageSource + ?Sized,
    {
        partition
            .clusters()
            .iter()
            .map(|c| self.panel(c, images, layout))
            .collect()
    }

    /// Score and panels for the current partition of `partitioner`.
    ///
    /// A labeling the silhouette cannot score (a single cluster, or one
    /// cluster per sample) yields `score: None`; other failures propagate.
    pub fn report<S, I>(
        &self,
        partitioner: &ClusterPartitioner<S>,
        evaluator: &PartitionEvaluator,
        images: &I,
        layout: Layout,
    ) -> Result<PartitionReport>
    where
        S: Clustering,
        I: ImageSource + ?Sized,
    {
        let partition = partitioner.partition().ok_or(Error::NoFitResult)?;
        let score = match evaluator.evaluate(partitioner) {
            Ok(s) => Some(s),
            Err(e @ Error::UnscorablePartition { .. }) => {
                warn!(error = %e, "partition not scored");
                None
            }
            Err(e) => return Err(e),
        };

        let panels = self.panels(partition, images, layout)?;
        debug!(panels = panels.len(), ?layout, "built partition report");
        Ok(PartitionReport {
            score,
            num_clusters: partition.num_clusters(),
            noise: partition.noise().len(),
            panels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AttributeCatalog;
    use crate::cluster::from_fn;
    use crate::images::InMemoryImages;
    use crate::sample::SampleTable;
    use image::Rgb;
    use std::sync::Arc;

    fn fixture(labels: Vec<isize>) -> (ClusterPartitioner<impl Clustering>, InMemoryImages) {
        let schema = AttributeCatalog::build(["Smiling", "Bangs"]).unwrap();
        let mut t = SampleTable::new(Arc::new(schema));
        let mut images = InMemoryImages::new();
        for i in 0..labels.len() {
            let v = vec![u8::from(i % 2 == 0), 1];
            t.push(format!("{i}.png"), v, None).unwrap();
            let shade = Rgb([i as u8 * 10, 0, 0]);
            images.insert(format!("{i}.png"), RgbImage::from_pixel(4, 4, shade));
        }
        let mut p = ClusterPartitioner::new(from_fn(move |_: &[Vec<f32>]| Ok(labels.clone())));
        let _ = p.fit(&Arc::new(t), None).unwrap();
        (p, images)
    }

    #[test]
    fn test_layouts() {
        assert!(!Layout::Mosaics.frequencies() && !Layout::Mosaics.mean_face());
        assert!(Layout::WithFrequencies.frequencies() && !Layout::WithFrequencies.mean_face());
        assert!(!Layout::WithEigenfaces.frequencies() && Layout::WithEigenfaces.mean_face());
        assert!(Layout::AllStats.frequencies() && Layout::AllStats.mean_face());
    }

    #[test]
    fn test_report_all_stats() {
        let (p, images) = fixture(vec![0, 1, 0, 1, -1]);
        let renderer = SummaryRenderer::new()
            .with_mosaic_options(MosaicOptions::new().with_tile_size(4))
            .with_eigenface_options(EigenfaceOptions::new().with_tile_size(4));
        let report = renderer
            .report(&p, &PartitionEvaluator::new(), &images, Layout::AllStats)
            .unwrap();

        assert_eq!(report.num_clusters, 2);
        assert_eq!(report.noise, 1);
        assert!(report.score.is_some());

        let first = &report.panels[0];
        assert_eq!((first.k, first.size), (0, 2));
        assert_eq!(first.mosaic.dimensions(), (4, 4));
        let freqs = first.frequencies.as_ref().unwrap();
        assert_eq!(freqs[0], ("Smiling".to_string(), 1.0));
        // Members 0 and 2 have reds 0 and 20.
        let face = first.mean_face.as_ref().unwrap();
        assert_eq!(face.get_pixel(0, 0), &Rgb([10, 0, 0]));
    }

    #[test]
    fn test_report_unscorable() {
        let (p, images) = fixture(vec![3, 3, 3]);
        let report = SummaryRenderer::new()
            .with_mosaic_options(MosaicOptions::new().with_tile_size(2))
            .report(&p, &PartitionEvaluator::new(), &images, Layout::Mosaics)
            .unwrap();
        assert!(report.score.is_none());
        assert_eq!(report.panels.len(), 1);
        assert!(report.panels[0].frequencies.is_none());
        assert!(report.panels[0].mean_face.is_none());
    }

    #[test]
    fn test_report_before_fit() {
        let p = ClusterPartitioner::new(crate::cluster::Kmeans::new(2));
        let err = SummaryRenderer::new()
            .report(&p, &PartitionEvaluator::new(), &InMemoryImages::new(), Layout::Mosaics)
            .unwrap_err();
        assert!(matches!(err, Error::NoFitResult));
    }
}
