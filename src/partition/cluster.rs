//! A single cluster and its derived views.
//!
//! A [`Cluster`] shares its table through an `Arc` and stores only member
//! positions. Its three summaries (attribute frequencies, mosaic, mean face)
//! are computed on first request and memoized in `OnceCell`s: each is
//! computed at most once per instance, and later calls return the cached
//! value even if they pass different options. To refresh after images change
//! on disk, build a new cluster (or refit).
//!
//! Concurrent first access is safe: one initializer wins and the others
//! observe its value.

use super::eigenface::MeanFace;
use crate::error::{Error, Result};
use crate::images::ImageSource;
use crate::sample::{Sample, SampleTable};
use image::{imageops, RgbImage};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Default side of one mosaic tile / mean-face raster, in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 200;

/// Layout of a cluster mosaic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MosaicOptions {
    /// Side of each square tile.
    pub tile_size: u32,
    /// Grid rows; defaults to `floor(sqrt(size))` when either side is unset.
    pub rows: Option<usize>,
    /// Grid columns; defaults to `floor(sqrt(size))` when either side is unset.
    pub cols: Option<usize>,
}

impl Default for MosaicOptions {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            rows: None,
            cols: None,
        }
    }
}

impl MosaicOptions {
    /// Default square layout with 200px tiles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set tile side.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Set an explicit grid.
    pub fn with_grid(mut self, rows: usize, cols: usize) -> Self {
        self.rows = Some(rows);
        self.cols = Some(cols);
        self
    }
}

/// Options for the mean face decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EigenfaceOptions {
    /// Side of the square raster each member is resized to.
    pub tile_size: u32,
    /// Eigenfaces to keep; defaults to the cluster size.
    pub components: Option<usize>,
}

impl Default for EigenfaceOptions {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            components: None,
        }
    }
}

impl EigenfaceOptions {
    /// 200px rasters, all components.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set raster side.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Set the number of eigenfaces kept.
    pub fn with_components(mut self, components: usize) -> Self {
        self.components = Some(components);
        self
    }
}

/// A group of samples produced by one partitioning.
pub struct Cluster {
    k: usize,
    table: Arc<SampleTable>,
    members: Vec<usize>,
    frequencies: OnceCell<Vec<f32>>,
    mosaic: OnceCell<RgbImage>,
    mean_face: OnceCell<MeanFace>,
}

impl Cluster {
    /// Cluster `k` over the samples of `table` at positions `members`.
    pub fn new(k: usize, table: Arc<SampleTable>, members: Vec<usize>) -> Result<Self> {
        if let Some(&bad) = members.iter().find(|&&m| m >= table.len()) {
            return Err(Error::ShapeMismatch {
                expected: format!("member index < {}", table.len()),
                actual: format!("member index {bad}"),
            });
        }
        Ok(Self {
            k,
            table,
            members,
            frequencies: OnceCell::new(),
            mosaic: OnceCell::new(),
            mean_face: OnceCell::new(),
        })
    }

    /// Cluster identifier.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of members.
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Whether the cluster has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member positions in the source table.
    pub fn member_indices(&self) -> &[usize] {
        &self.members
    }

    /// Member samples, in member order.
    pub fn members(&self) -> impl Iterator<Item = &Sample> + '_ {
        self.members.iter().map(move |&i| &self.table.samples()[i])
    }

    /// Member image references, in member order.
    pub fn image_references(&self) -> impl Iterator<Item = &str> + '_ {
        self.members().map(Sample::image_reference)
    }

    /// Source table.
    pub fn table(&self) -> &Arc<SampleTable> {
        &self.table
    }

    /// Mean of each attribute over the members, rounded to 2 decimals with
    /// ties to even.
    pub fn attribute_frequencies(&self) -> Result<&[f32]> {
        self.frequencies
            .get_or_try_init(|| {
                if self.is_empty() {
                    return Err(Error::InsufficientMembers { k: self.k });
                }
                let mut sums = vec![0u32; self.table.schema().len()];
                for sample in self.members() {
                    for (sum, &v) in sums.iter_mut().zip(sample.attributes()) {
                        *sum += u32::from(v);
                    }
                }
                let size = self.size() as f32;
                Ok(sums
                    .into_iter()
                    .map(|s| (s as f32 / size * 100.0).round_ties_even() / 100.0)
                    .collect())
            })
            .map(Vec::as_slice)
    }

    /// Frequencies paired with attribute names, in schema order.
    pub fn named_frequencies(&self) -> Result<Vec<(&str, f32)>> {
        let freqs = self.attribute_frequencies()?;
        Ok(self
            .table
            .schema()
            .names()
            .iter()
            .map(String::as_str)
            .zip(freqs.iter().copied())
            .collect())
    }

    /// All member images tiled into one raster, row-major in member order.
    ///
    /// The grid is `rows × cols` tiles of `tile_size` pixels. Members past
    /// `rows * cols` are left out; when the grid has more cells than members,
    /// tiling stops after the last member and remaining cells stay black.
    pub fn mosaic_image<I>(&self, images: &I, options: &MosaicOptions) -> Result<&RgbImage>
    where
        I: ImageSource + ?Sized,
    {
        self.mosaic.get_or_try_init(|| {
            let (rows, cols) = match (options.rows, options.cols) {
                (Some(r), Some(c)) => (r, c),
                _ => {
                    let side = (self.size() as f64).sqrt().floor() as usize;
                    (side, side)
                }
            };
            let tile = options.tile_size;
            let pixels = |cells: usize| {
                u32::try_from(cells)
                    .ok()
                    .and_then(|c| c.checked_mul(tile))
                    .ok_or(Error::InvalidParameter {
                        name: "grid",
                        message: "mosaic dimensions exceed u32 pixels",
                    })
            };
            let mut canvas = RgbImage::new(pixels(cols)?, pixels(rows)?);

            let placed = rows.saturating_mul(cols).min(self.size());
            for (slot, reference) in self.image_references().take(placed).enumerate() {
                let img = images.load(reference, Some((tile, tile)))?;
                let x = (slot % cols) as i64 * i64::from(tile);
                let y = (slot / cols) as i64 * i64::from(tile);
                imageops::replace(&mut canvas, &img, x, y);
            }

            debug!(k = self.k, rows, cols, placed, "built cluster mosaic");
            Ok(canvas)
        })
    }

    /// Mean face of the members plus leading eigenfaces.
    pub fn mean_face<I>(&self, images: &I, options: &EigenfaceOptions) -> Result<&MeanFace>
    where
        I: ImageSource + ?Sized,
    {
        self.mean_face.get_or_try_init(|| {
            if self.is_empty() {
                return Err(Error::InsufficientMembers { k: self.k });
            }
            let side = options.tile_size;
            let rasters = self
                .image_references()
                .map(|r| images.load(r, Some((side, side))))
                .collect::<Result<Vec<_>>>()?;
            let components = options.components.unwrap_or(self.size());

            let face = MeanFace::compute(&rasters, components)?;
            debug!(
                k = self.k,
                members = self.size(),
                components = face.n_components(),
                "computed mean face"
            );
            Ok(face)
        })
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("k", &self.k)
            .field("size", &self.members.len())
            .field("members", &self.members)
            .finish_non_exhaustive()
    }
}
