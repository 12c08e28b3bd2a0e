//! Model and training configuration with TOML support.
//!
//! Provides structured configs for the model core and the training driver
//! with load/save capabilities.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, ShallowError};

/// Default capacity of the negative sampling table.
pub const NEGATIVE_TABLE_SIZE: usize = 10_000_000;

/// Default learning-rate floor.
pub const MIN_LR: f32 = 1e-6;

/// Output objective used to score a hidden vector against a target class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    /// True class against `neg` sampled classes.
    #[serde(alias = "ns")]
    NegativeSampling,
    /// Binary decisions along the class's Huffman path.
    #[serde(alias = "hs")]
    HierarchicalSoftmax,
    /// Normalized scores over every class.
    Softmax,
}

/// Training objective family. Only affects gradient rescaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Classification: the input gradient is averaged over the input bag.
    #[serde(alias = "sup")]
    Supervised,
    /// Word-vector training: the input gradient is applied unscaled.
    #[serde(alias = "cbow", alias = "skipgram")]
    Unsupervised,
}

/// Model core configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Embedding dimensionality (columns of both tables).
    pub dim: usize,
    /// Rows of the input embedding table.
    pub input_size: usize,
    /// Number of output classes (rows of the output table).
    pub output_size: usize,
    /// Output objective.
    pub loss: LossKind,
    /// Objective family.
    pub model: ModelKind,
    /// Negatives drawn per example under negative sampling.
    pub neg: usize,
    /// Initial learning rate.
    pub lr: f32,
    /// Learning-rate floor applied by `set_learning_rate`.
    pub min_lr: f32,
    /// Seed for the negative-table shuffle.
    pub seed: u64,
    /// Capacity of the negative sampling table.
    pub negative_table_size: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dim: 100,
            input_size: 0,
            output_size: 0,
            loss: LossKind::NegativeSampling,
            model: ModelKind::Unsupervised,
            neg: 5,
            lr: 0.05,
            min_lr: MIN_LR,
            seed: 0,
            negative_table_size: NEGATIVE_TABLE_SIZE,
        }
    }
}

impl ModelConfig {
    /// Supervised classifier over `output_size` labels (fastText `supervised` defaults).
    pub fn supervised(input_size: usize, output_size: usize) -> Self {
        Self {
            dim: 100,
            input_size,
            output_size,
            loss: LossKind::Softmax,
            model: ModelKind::Supervised,
            lr: 0.1,
            ..Default::default()
        }
    }

    /// Unsupervised word vectors over a vocabulary of `vocab_size` words.
    pub fn unsupervised(vocab_size: usize) -> Self {
        Self {
            input_size: vocab_size,
            output_size: vocab_size,
            ..Default::default()
        }
    }

    /// Whether the input gradient is averaged over the input bag.
    pub fn rescales_gradient(&self) -> bool {
        self.model == ModelKind::Supervised
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(ShallowError::InvalidConfig("dim must be > 0".into()));
        }
        if self.input_size == 0 {
            return Err(ShallowError::InvalidConfig("input_size must be > 0".into()));
        }
        if self.output_size == 0 {
            return Err(ShallowError::InvalidConfig("output_size must be > 0".into()));
        }
        if self.loss == LossKind::NegativeSampling && self.neg == 0 {
            return Err(ShallowError::InvalidConfig(
                "neg must be > 0 under negative sampling".into(),
            ));
        }
        if self.loss == LossKind::HierarchicalSoftmax && self.output_size < 2 {
            return Err(ShallowError::InvalidConfig(
                "hierarchical softmax needs at least 2 classes".into(),
            ));
        }
        if !(self.min_lr > 0.0) {
            return Err(ShallowError::InvalidConfig("min_lr must be > 0".into()));
        }
        if !(self.lr >= 0.0) {
            return Err(ShallowError::InvalidConfig("lr must be >= 0".into()));
        }
        if self.negative_table_size == 0 {
            return Err(ShallowError::InvalidConfig(
                "negative_table_size must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Driver-side training configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Passes over the example set.
    pub epochs: usize,
    /// Examples between learning-rate decay updates.
    pub lr_update_rate: usize,
    /// Examples between progress log events.
    pub log_interval: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 5,
            lr_update_rate: 100,
            log_interval: 10_000,
        }
    }
}

impl TrainingConfig {
    /// Validate training configuration.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(ShallowError::InvalidConfig("epochs must be > 0".into()));
        }
        if self.lr_update_rate == 0 {
            return Err(ShallowError::InvalidConfig(
                "lr_update_rate must be > 0".into(),
            ));
        }
        if self.log_interval == 0 {
            return Err(ShallowError::InvalidConfig("log_interval must be > 0".into()));
        }
        Ok(())
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging level (debug, info, warn, error).
    pub log_level: String,
    /// Model core config.
    pub model: ModelConfig,
    /// Training driver config.
    pub training: TrainingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            model: ModelConfig::unsupervised(1000),
            training: TrainingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ShallowError::Other(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.validate()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Validate all sub-configs.
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        self.training.validate()?;
        Ok(())
    }
}
