//! Mean face and eigenfaces of a set of equally-sized images.
//!
//! Each image becomes one row of an `n × p` matrix of `[0, 1]` pixel values
//! (`p = width · height · 3`). The mean row is the mean face. Principal
//! directions come from the `n × n` Gram matrix of the centered rows rather
//! than the `p × p` covariance: for faces `n ≪ p`, and the nonzero spectra
//! coincide. If `Gu = λu` then `Xcᵀu / √λ` is a unit principal direction.

use crate::error::{Error, Result};
use faer::{Mat, Side};
use image::{Rgb, RgbImage};
use ndarray::{Array1, Array2, Array3, Axis};

/// Eigenvalues below this fraction of the largest are treated as zero.
const RANK_TOL: f64 = 1e-5;

/// Mean face of a group of images plus its leading eigenfaces.
#[derive(Debug, Clone)]
pub struct MeanFace {
    width: u32,
    height: u32,
    mean: Array3<f32>,
    components: Array2<f32>,
    explained_variance: Vec<f32>,
}

impl MeanFace {
    /// Decompose `images`, keeping at most `components` eigenfaces.
    ///
    /// All images must share the dimensions of the first.
    pub fn compute(images: &[RgbImage], components: usize) -> Result<Self> {
        let first = images.first().ok_or(Error::InsufficientMembers { k: 0 })?;
        let (width, height) = first.dimensions();
        let p = (width * height * 3) as usize;

        let mut data = Array2::<f32>::zeros((images.len(), p));
        for (i, img) in images.iter().enumerate() {
            if img.dimensions() != (width, height) {
                return Err(Error::ShapeMismatch {
                    expected: format!("{width}x{height} image"),
                    actual: format!("{}x{} image", img.width(), img.height()),
                });
            }
            for (dst, &src) in data.row_mut(i).iter_mut().zip(img.as_raw().iter()) {
                *dst = f32::from(src) / 255.0;
            }
        }

        let mean: Array1<f32> = data
            .mean_axis(Axis(0))
            .ok_or(Error::InsufficientMembers { k: 0 })?;
        data -= &mean;

        let (components, explained_variance) = principal_directions(&data, components);
        let mean = mean
            .into_shape_with_order((height as usize, width as usize, 3))
            .map_err(|e| Error::ShapeMismatch {
                expected: format!("{height}x{width}x3"),
                actual: e.to_string(),
            })?;

        Ok(Self {
            width,
            height,
            mean,
            components,
            explained_variance,
        })
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Mean face as `height × width × 3` values in `[0, 1]`.
    pub fn mean(&self) -> &Array3<f32> {
        &self.mean
    }

    /// Number of eigenfaces retained.
    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    /// Unit-norm eigenface `i`, reshaped to `height × width × 3`.
    pub fn eigenface(&self, i: usize) -> Option<Array3<f32>> {
        if i >= self.n_components() {
            return None;
        }
        self.components
            .row(i)
            .to_owned()
            .into_shape_with_order((self.height as usize, self.width as usize, 3))
            .ok()
    }

    /// Variance along each retained eigenface, descending.
    pub fn explained_variance(&self) -> &[f32] {
        &self.explained_variance
    }

    /// Mean face as an 8-bit RGB raster.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let px = |c: usize| {
                (self.mean[[y as usize, x as usize, c]].clamp(0.0, 1.0) * 255.0).round() as u8
            };
            Rgb([px(0), px(1), px(2)])
        })
    }
}

/// Top `k` principal directions (rows) of centered `data`, with their variances.
fn principal_directions(centered: &Array2<f32>, k: usize) -> (Array2<f32>, Vec<f32>) {
    let n = centered.nrows();
    let p = centered.ncols();
    if n < 2 || k == 0 {
        return (Array2::zeros((0, p)), Vec::new());
    }

    let gram = centered.dot(&centered.t());
    let g = Mat::from_fn(n, n, |i, j| f64::from(gram[[i, j]]));
    let evd = g.selfadjoint_eigendecomposition(Side::Lower);
    let s = evd.s().column_vector();
    let u = evd.u();
    let values: Vec<f64> = (0..n).map(|i| s.read(i)).collect();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    let top = values[order[0]].max(0.0);
    let kept: Vec<usize> = order
        .into_iter()
        .filter(|&i| values[i] > top * RANK_TOL && values[i] > 0.0)
        .take(k)
        .collect();

    let mut coeffs = Array2::<f32>::zeros((kept.len(), n));
    for (row, &i) in kept.iter().enumerate() {
        let scale = values[i].sqrt();
        for j in 0..n {
            coeffs[[row, j]] = (u.read(j, i) / scale) as f32;
        }
    }
    let directions = coeffs.dot(centered);
    let variance = kept
        .iter()
        .map(|&i| (values[i] / (n - 1) as f64) as f32)
        .collect();
    (directions, variance)
}
