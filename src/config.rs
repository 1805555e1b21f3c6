//! Run configuration.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! [attributes]
//! subset = ["Smiling", "Eyeglasses", "Male"]
//!
//! [inference]
//! batch_size = 64
//! input_size = 224
//!
//! [summary]
//! tile_size = 200
//! layout = "all_stats"
//!
//! [sampling]
//! seed = 51
//!
//! [evaluation]
//! noise_policy = "pseudo_cluster"
//! ```

use crate::catalog::AttributeCatalog;
use crate::error::{Error, Result};
use crate::evaluate::{NoisePolicy, PartitionEvaluator};
use crate::inference::{InferenceOptions, DEFAULT_BATCH_SIZE};
use crate::partition::{EigenfaceOptions, MosaicOptions, DEFAULT_TILE_SIZE};
use crate::summary::{Layout, SummaryRenderer};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Seed used for sampling when none is configured.
pub const DEFAULT_SEED: u64 = 51;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Attribute selection.
    pub attributes: AttributeConfig,
    /// Batch inference.
    pub inference: InferenceConfig,
    /// Cluster panels.
    pub summary: SummaryConfig,
    /// Table sampling.
    pub sampling: SamplingConfig,
    /// Partition scoring.
    pub evaluation: EvaluationConfig,
}

/// Attribute selection over the CelebA catalog.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttributeConfig {
    /// Attributes to keep, in order. Empty keeps the whole catalog.
    pub subset: Vec<String>,
}

/// Batch inference settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceConfig {
    /// Images per model call.
    pub batch_size: usize,
    /// Side of the square model input.
    pub input_size: u32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            input_size: 224,
        }
    }
}

/// Cluster panel settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummaryConfig {
    /// Side of each mosaic tile and of the mean face.
    pub tile_size: u32,
    /// Views carried by each panel.
    pub layout: Layout,
    /// Eigenfaces kept per cluster; all when unset.
    pub components: Option<usize>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            layout: Layout::default(),
            components: None,
        }
    }
}

/// Sampling settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplingConfig {
    /// Seed for table sampling and thinning.
    pub seed: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { seed: DEFAULT_SEED }
    }
}

/// Scoring settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluationConfig {
    /// Treatment of noise in the silhouette.
    pub noise_policy: NoisePolicy,
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading config");
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<()> {
        if self.inference.batch_size == 0 {
            return Err(Error::InvalidParameter {
                name: "inference.batch_size",
                message: "must be at least 1",
            });
        }
        if self.inference.input_size == 0 {
            return Err(Error::InvalidParameter {
                name: "inference.input_size",
                message: "must be at least 1",
            });
        }
        if self.summary.tile_size == 0 {
            return Err(Error::InvalidParameter {
                name: "summary.tile_size",
                message: "must be at least 1",
            });
        }
        Ok(())
    }

    /// The CelebA catalog narrowed to the configured subset.
    pub fn catalog(&self) -> Result<AttributeCatalog> {
        let full = AttributeCatalog::celeba();
        if self.attributes.subset.is_empty() {
            Ok(full)
        } else {
            full.subset(&self.attributes.subset)
        }
    }

    /// Inference options.
    pub fn inference_options(&self) -> InferenceOptions {
        let side = self.inference.input_size;
        InferenceOptions::new()
            .with_batch_size(self.inference.batch_size)
            .with_input_size(side, side)
    }

    /// Mosaic options with the default square grid.
    pub fn mosaic_options(&self) -> MosaicOptions {
        MosaicOptions::new().with_tile_size(self.summary.tile_size)
    }

    /// Mean face options.
    pub fn eigenface_options(&self) -> EigenfaceOptions {
        EigenfaceOptions {
            tile_size: self.summary.tile_size,
            components: self.summary.components,
        }
    }

    /// Renderer configured with tile size and components.
    pub fn renderer(&self) -> SummaryRenderer {
        SummaryRenderer::new()
            .with_mosaic_options(self.mosaic_options())
            .with_eigenface_options(self.eigenface_options())
    }

    /// Evaluator with the configured noise policy.
    pub fn evaluator(&self) -> PartitionEvaluator {
        PartitionEvaluator::new().with_noise_policy(self.evaluation.noise_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    #[test]
    fn test_empty_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.inference_options().batch_size(), 64);
        assert_eq!(config.inference_options().input_size(), (224, 224));
        assert_eq!(config.mosaic_options().tile_size, 200);
        assert_eq!(config.sampling.seed, 51);
        assert_eq!(config.catalog().unwrap().len(), 40);
    }

    #[test]
    fn test_parse_sections() {
        let config = Config::from_toml_str(
            r#"
            [attributes]
            subset = ["Smiling", "Bangs"]

            [inference]
            batch_size = 8

            [summary]
            tile_size = 32
            layout = "with_eigenfaces"
            components = 4

            [evaluation]
            noise_policy = "exclude"
            "#,
        )
        .unwrap();

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.names_of(&[0, 1]).unwrap(), vec!["Smiling", "Bangs"]);
        assert_eq!(config.inference_options().batch_size(), 8);
        assert_eq!(config.summary.layout, Layout::WithEigenfaces);
        assert_eq!(config.eigenface_options().components, Some(4));
        assert_eq!(config.evaluator().noise_policy(), NoisePolicy::Exclude);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = Config::from_toml_str("[inference]\nbatch_size = 0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = Config::from_toml_str("[summary]\nlayout = \"spiral\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        assert!(Config::from_toml_str("[sampling]\nsed = 3").is_err());

        let config =
            Config::from_toml_str("[attributes]\nsubset = [\"Not_An_Attribute\"]").unwrap();
        assert!(config.catalog().is_err());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sampling]\nseed = 7").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.sampling.seed, 7);

        let missing = Config::load(file.path().with_extension("missing")).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::ResourceAccess);
    }
}
