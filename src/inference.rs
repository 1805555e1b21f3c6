//! Attribute-inference seam.
//!
//! The attribute model is a black box: given a batch of RGB images it returns
//! one probability vector per image over the full catalog. The engine loads
//! images at the model's input size, feeds them in bounded batches, and
//! thresholds the probabilities into 0/1 labels.

use crate::error::{BoxError, Error, Result};
use crate::images::ImageSource;
use image::RgbImage;
use tracing::{debug, info};

/// Default images per model call.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Default square model input side, in pixels.
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// A pretrained classifier producing per-attribute probabilities.
pub trait AttributeModel {
    /// Predict attribute probabilities for a batch of images.
    ///
    /// Must return one vector per input image, each as long as the model's catalog.
    fn predict(&self, batch: &[RgbImage]) -> std::result::Result<Vec<Vec<f32>>, BoxError>;
}

impl<T: AttributeModel + ?Sized> AttributeModel for &T {
    fn predict(&self, batch: &[RgbImage]) -> std::result::Result<Vec<Vec<f32>>, BoxError> {
        (**self).predict(batch)
    }
}

/// A model backed by a closure.
#[derive(Clone)]
pub struct FnModel<F> {
    f: F,
}

impl<F> AttributeModel for FnModel<F>
where
    F: Fn(&[RgbImage]) -> std::result::Result<Vec<Vec<f32>>, BoxError>,
{
    fn predict(&self, batch: &[RgbImage]) -> std::result::Result<Vec<Vec<f32>>, BoxError> {
        (self.f)(batch)
    }
}

/// Wrap a closure as an [`AttributeModel`].
pub fn from_fn<F>(f: F) -> FnModel<F>
where
    F: Fn(&[RgbImage]) -> std::result::Result<Vec<Vec<f32>>, BoxError>,
{
    FnModel { f }
}

/// Batching and input-format options for inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceOptions {
    batch_size: usize,
    input_size: (u32, u32),
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            input_size: (DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE),
        }
    }
}

impl InferenceOptions {
    /// Default options: batches of 64, 224×224 input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set images per model call.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set model input size as `(width, height)`.
    pub fn with_input_size(mut self, width: u32, height: u32) -> Self {
        self.input_size = (width, height);
        self
    }

    /// Images per model call.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Model input size as `(width, height)`.
    pub fn input_size(&self) -> (u32, u32) {
        self.input_size
    }
}

/// Threshold a probability to a binary label; `0.5` maps to 0.
#[inline]
pub fn binarize(p: f32) -> u8 {
    u8::from(p > 0.5)
}

/// Run `model` over `references` and return full-length 0/1 vectors in input order.
///
/// Images are loaded one batch at a time so peak memory is bounded by the batch size.
pub fn infer_labels<S, I, M>(
    references: &[S],
    images: &I,
    model: &M,
    catalog_len: usize,
    options: &InferenceOptions,
) -> Result<Vec<Vec<u8>>>
where
    S: AsRef<str>,
    I: ImageSource + ?Sized,
    M: AttributeModel + ?Sized,
{
    if options.batch_size == 0 {
        return Err(Error::InvalidParameter {
            name: "batch_size",
            message: "must be at least 1",
        });
    }

    let mut labels = Vec::with_capacity(references.len());
    for (batch_idx, chunk) in references.chunks(options.batch_size).enumerate() {
        let batch = chunk
            .iter()
            .map(|r| images.load(r.as_ref(), Some(options.input_size)))
            .collect::<Result<Vec<_>>>()?;

        let preds = model.predict(&batch).map_err(Error::Inference)?;
        if preds.len() != batch.len() {
            return Err(Error::InferenceLength {
                expected: batch.len(),
                found: preds.len(),
            });
        }
        for probs in preds {
            if probs.len() != catalog_len {
                return Err(Error::InferenceLength {
                    expected: catalog_len,
                    found: probs.len(),
                });
            }
            labels.push(probs.into_iter().map(binarize).collect());
        }
        debug!(batch = batch_idx, size = chunk.len(), "inferred batch");
    }

    info!(images = labels.len(), "attribute inference complete");
    Ok(labels)
}
