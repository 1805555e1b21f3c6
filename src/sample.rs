//! Samples and sample tables.
//!
//! A [`SampleTable`] is an ordered, keyed collection of [`Sample`]s that all share
//! one schema catalog: every attribute vector has exactly `schema.len()` entries,
//! laid out in schema order. Tables are immutable; every derivation (partition
//! selection, sampling, filtering, union) returns a new table.

use crate::catalog::AttributeCatalog;
use crate::error::{Error, Result};
use crate::images::ImageSource;
use crate::inference::{infer_labels, AttributeModel, InferenceOptions};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Dataset partition a sample originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetSplit {
    /// Training partition (code 0).
    Training,
    /// Validation partition (code 1).
    Validation,
    /// Test partition (code 2).
    Test,
}

impl DatasetSplit {
    /// All partitions, in code order.
    pub const ALL: [DatasetSplit; 3] = [Self::Training, Self::Validation, Self::Test];

    /// Partition from its numeric code in `list_eval_partition.csv`.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Training),
            1 => Some(Self::Validation),
            2 => Some(Self::Test),
            _ => None,
        }
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Validation => "validation",
            Self::Test => "test",
        }
    }
}

impl FromStr for DatasetSplit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "training" => Ok(Self::Training),
            "validation" => Ok(Self::Validation),
            "test" => Ok(Self::Test),
            other => Err(Error::InvalidPartitionName(other.to_string())),
        }
    }
}

impl fmt::Display for DatasetSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One image and its binary attribute vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    image_reference: String,
    attributes: Vec<u8>,
    partition: Option<DatasetSplit>,
}

impl Sample {
    /// Image reference (path or opaque handle).
    pub fn image_reference(&self) -> &str {
        &self.image_reference
    }

    /// 0/1 attribute values in schema order.
    pub fn attributes(&self) -> &[u8] {
        &self.attributes
    }

    /// Originating dataset partition, if known.
    pub fn partition(&self) -> Option<DatasetSplit> {
        self.partition
    }

    /// Whether every attribute is 0.
    pub fn is_all_zero(&self) -> bool {
        self.attributes.iter().all(|&v| v == 0)
    }
}

/// A stored ground-truth record from a dataset metadata loader.
///
/// `attributes` is laid out in the order of the catalog passed alongside it.
/// Values `<= 0` are absent (`-1` in the CelebA CSV), positive values present.
#[derive(Debug, Clone)]
pub struct LabelRecord {
    /// Image reference.
    pub image_reference: String,
    /// Full attribute vector.
    pub attributes: Vec<i8>,
    /// Dataset partition, if known.
    pub partition: Option<DatasetSplit>,
}

/// How many samples [`SampleTable::sample`] should draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleSize {
    /// Exact count.
    Count(usize),
    /// Fraction of the table, rounded to the nearest count.
    Fraction(f64),
}

/// Ordered collection of samples keyed by image reference.
#[derive(Debug, Clone)]
pub struct SampleTable {
    schema: Arc<AttributeCatalog>,
    samples: Vec<Sample>,
    index: HashMap<String, usize>,
}

impl SampleTable {
    /// Create an empty table over `schema`.
    pub fn new(schema: Arc<AttributeCatalog>) -> Self {
        Self {
            schema,
            samples: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Append a sample.
    ///
    /// Fails if the vector length disagrees with the schema or the reference
    /// is already present.
    pub fn push(
        &mut self,
        image_reference: impl Into<String>,
        attributes: Vec<u8>,
        partition: Option<DatasetSplit>,
    ) -> Result<()> {
        let image_reference = image_reference.into();
        if attributes.len() != self.schema.len() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} attributes", self.schema.len()),
                actual: format!("{} attributes", attributes.len()),
            });
        }
        if self.index.contains_key(&image_reference) {
            return Err(Error::DuplicateKey(image_reference));
        }
        let _ = self
            .index
            .insert(image_reference.clone(), self.samples.len());
        self.samples.push(Sample {
            image_reference,
            attributes: attributes.into_iter().map(|v| u8::from(v > 0)).collect(),
            partition,
        });
        Ok(())
    }

    /// Infer attribute vectors for `references` with `model` and keep `subset`.
    ///
    /// The resulting table's schema is `catalog.subset(subset)`.
    pub fn from_inference<S, I, M>(
        references: &[S],
        images: &I,
        model: &M,
        catalog: &AttributeCatalog,
        subset: &[&str],
        options: &InferenceOptions,
    ) -> Result<Self>
    where
        S: AsRef<str>,
        I: ImageSource + ?Sized,
        M: AttributeModel + ?Sized,
    {
        let positions = catalog.indices_of(subset)?;
        let schema = Arc::new(catalog.subset(subset)?);
        let labels = infer_labels(references, images, model, catalog.len(), options)?;

        let mut table = Self::new(schema);
        for (reference, full) in references.iter().zip(labels) {
            let projected = positions.iter().map(|&p| full[p]).collect();
            table.push(reference.as_ref(), projected, None)?;
        }
        Ok(table)
    }

    /// Build a table from stored labels over `catalog`, keeping `subset`.
    pub fn from_records<R>(records: R, catalog: &AttributeCatalog, subset: &[&str]) -> Result<Self>
    where
        R: IntoIterator<Item = LabelRecord>,
    {
        let positions = catalog.indices_of(subset)?;
        let mut table = Self::new(Arc::new(catalog.subset(subset)?));
        for record in records {
            if record.attributes.len() != catalog.len() {
                return Err(Error::ShapeMismatch {
                    expected: format!("{} attributes", catalog.len()),
                    actual: format!("{} attributes", record.attributes.len()),
                });
            }
            let projected = positions
                .iter()
                .map(|&p| u8::from(record.attributes[p] > 0))
                .collect();
            table.push(record.image_reference, projected, record.partition)?;
        }
        Ok(table)
    }

    /// Schema catalog shared by every sample.
    pub fn schema(&self) -> &Arc<AttributeCatalog> {
        &self.schema
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at position `i`.
    pub fn get(&self, i: usize) -> Option<&Sample> {
        self.samples.get(i)
    }

    /// Sample keyed by image reference.
    pub fn by_reference(&self, image_reference: &str) -> Option<&Sample> {
        self.index.get(image_reference).map(|&i| &self.samples[i])
    }

    /// Samples in table order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Iterate samples in table order.
    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Attribute vectors as a `samples × attributes` matrix.
    pub fn vectors(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.len(), self.schema.len()), |(i, j)| {
            f32::from(self.samples[i].attributes[j])
        })
    }

    /// Samples whose partition label equals `name`.
    pub fn select_partition(&self, name: &str) -> Result<Self> {
        let split: DatasetSplit = name.parse()?;
        Ok(self.filter(|s| s.partition == Some(split)))
    }

    /// Samples satisfying `predicate`, in table order.
    pub fn filter(&self, mut predicate: impl FnMut(&Sample) -> bool) -> Self {
        self.from_positions(
            self.samples
                .iter()
                .enumerate()
                .filter(|(_, s)| predicate(s))
                .map(|(i, _)| i),
        )
    }

    /// Drop samples with every attribute absent.
    pub fn retain_any_active(&self) -> Self {
        self.filter(|s| !s.is_all_zero())
    }

    /// Drop a seeded `fraction` of the all-zero samples, keeping the rest.
    pub fn thin_all_zero(&self, fraction: f64, seed: u64) -> Result<Self> {
        let zeros: Vec<usize> = self
            .samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_all_zero())
            .map(|(i, _)| i)
            .collect();
        let amount = fraction_to_count(fraction, zeros.len())?;
        let mut rng = StdRng::seed_from_u64(seed);
        let dropped: HashSet<usize> = index::sample(&mut rng, zeros.len(), amount)
            .into_iter()
            .map(|i| zeros[i])
            .collect();
        Ok(self.from_positions((0..self.len()).filter(|i| !dropped.contains(i))))
    }

    /// Uniform sample without replacement, deterministic for a given seed.
    pub fn sample(&self, size: SampleSize, seed: u64) -> Result<Self> {
        let available = self.len();
        let requested = match size {
            SampleSize::Count(n) => n,
            SampleSize::Fraction(f) => fraction_to_count(f, available)?,
        };
        if requested > available {
            return Err(Error::InsufficientSamples {
                requested,
                available,
            });
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let picked = index::sample(&mut rng, available, requested).into_vec();
        Ok(self.from_positions(picked))
    }

    /// Concatenate with `other`; keys must be disjoint and schemas equal.
    pub fn union(&self, other: &SampleTable) -> Result<Self> {
        if self.schema != other.schema {
            return Err(Error::ShapeMismatch {
                expected: format!("schema {:?}", self.schema.names()),
                actual: format!("schema {:?}", other.schema.names()),
            });
        }
        if let Some(dup) = other
            .samples
            .iter()
            .find(|s| self.index.contains_key(&s.image_reference))
        {
            return Err(Error::DuplicateKey(dup.image_reference.clone()));
        }
        let mut out = self.clone();
        for s in &other.samples {
            let _ = out
                .index
                .insert(s.image_reference.clone(), out.samples.len());
            out.samples.push(s.clone());
        }
        Ok(out)
    }

    fn from_positions(&self, positions: impl IntoIterator<Item = usize>) -> Self {
        let samples: Vec<Sample> = positions
            .into_iter()
            .map(|i| self.samples[i].clone())
            .collect();
        let index = samples
            .iter()
            .enumerate()
            .map(|(i, s)| (s.image_reference.clone(), i))
            .collect();
        Self {
            schema: Arc::clone(&self.schema),
            samples,
            index,
        }
    }
}

impl<'a> IntoIterator for &'a SampleTable {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

fn fraction_to_count(fraction: f64, available: usize) -> Result<usize> {
    if !fraction.is_finite() || fraction < 0.0 {
        return Err(Error::InvalidParameter {
            name: "fraction",
            message: "must be a non-negative finite number",
        });
    }
    let requested = (fraction * available as f64).round() as usize;
    if requested > available {
        return Err(Error::InsufficientSamples {
            requested,
            available,
        });
    }
    Ok(requested)
}
