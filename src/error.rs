use thiserror::Error;

/// Result alias for `mien`.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by external collaborators (models, strategies written by callers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Catalog/attribute mismatches and invalid parameters.
    Configuration,
    /// Vector length or matrix shape disagreements.
    DataShape,
    /// Image or model I/O failures.
    ResourceAccess,
    /// Evaluating before fitting, fitting an empty table.
    FitState,
    /// Requesting more items than exist.
    Capacity,
}

/// Errors returned by catalog, table, partitioning and summary operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An attribute name appears more than once in a catalog.
    #[error("duplicate attribute '{0}'")]
    DuplicateAttribute(String),

    /// An attribute name is not in the catalog.
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),

    /// An attribute index is outside `[0, size)`.
    #[error("attribute index {index} out of range for catalog of size {size}")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Catalog size.
        size: usize,
    },

    /// A dataset partition name is not one of training/validation/test.
    #[error("invalid partition name '{0}': must be one of [training, validation, test]")]
    InvalidPartitionName(String),

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Requested cluster count is incompatible with the dataset.
    #[error("cannot create {requested} clusters from {n_items} items")]
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Shape mismatch between table, weights, catalog or labels.
    #[error("shape mismatch: expected {expected}, actual {actual}")]
    ShapeMismatch {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },

    /// Points in a dataset have inconsistent dimensionality.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// The attribute model returned a vector of the wrong length.
    #[error("inference returned {found} values, expected {expected}")]
    InferenceLength {
        /// Expected length.
        expected: usize,
        /// Returned length.
        found: usize,
    },

    /// Two tables share an image reference.
    #[error("duplicate image reference '{0}'")]
    DuplicateKey(String),

    /// A clustering strategy produced a negative label other than the noise sentinel.
    #[error("invalid label {label} for sample {index}")]
    InvalidLabel {
        /// Sample position.
        index: usize,
        /// Offending label.
        label: isize,
    },

    /// The attribute model failed.
    #[error("attribute inference failed: {0}")]
    Inference(#[source] BoxError),

    /// An image could not be loaded.
    #[error("failed to load image '{reference}': {source}")]
    ImageLoad {
        /// Image reference that failed.
        reference: String,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },

    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The partitioner was never fit.
    #[error("fit data before evaluation")]
    NoFitResult,

    /// Fitting a table with no samples.
    #[error("cannot fit an empty table")]
    EmptyTable,

    /// Silhouette is undefined for this labeling.
    #[error("silhouette needs 2 to n - 1 labels, got {n_labels} over {n_samples} samples")]
    UnscorablePartition {
        /// Distinct labels scored.
        n_labels: usize,
        /// Samples scored.
        n_samples: usize,
    },

    /// Sampling more items than available.
    #[error("requested {requested} samples, only {available} available")]
    InsufficientSamples {
        /// Requested count.
        requested: usize,
        /// Available count.
        available: usize,
    },

    /// A cluster summary needs at least one member.
    #[error("cluster {k} has no members")]
    InsufficientMembers {
        /// Cluster identifier.
        k: usize,
    },
}

impl Error {
    /// Coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DuplicateAttribute(_)
            | Error::UnknownAttribute(_)
            | Error::IndexOutOfRange { .. }
            | Error::InvalidPartitionName(_)
            | Error::InvalidParameter { .. }
            | Error::InvalidClusterCount { .. }
            | Error::Config(_) => ErrorKind::Configuration,
            Error::ShapeMismatch { .. }
            | Error::DimensionMismatch { .. }
            | Error::InferenceLength { .. }
            | Error::DuplicateKey(_)
            | Error::InvalidLabel { .. } => ErrorKind::DataShape,
            Error::Inference(_) | Error::ImageLoad { .. } | Error::Io(_) => {
                ErrorKind::ResourceAccess
            }
            Error::NoFitResult | Error::EmptyTable | Error::UnscorablePartition { .. } => {
                ErrorKind::FitState
            }
            Error::InsufficientSamples { .. } | Error::InsufficientMembers { .. } => {
                ErrorKind::Capacity
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(Error::NoFitResult.kind(), ErrorKind::FitState);
        assert_eq!(Error::EmptyTable.kind(), ErrorKind::FitState);
        assert_eq!(
            Error::UnknownAttribute("Smiling".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            Error::InsufficientSamples {
                requested: 3,
                available: 2
            }
            .kind(),
            ErrorKind::Capacity
        );
        assert_eq!(
            Error::InferenceLength {
                expected: 40,
                found: 37
            }
            .kind(),
            ErrorKind::DataShape
        );
    }

    #[test]
    fn test_display() {
        let err = Error::IndexOutOfRange { index: 7, size: 3 };
        assert_eq!(
            err.to_string(),
            "attribute index 7 out of range for catalog of size 3"
        );
    }
}
