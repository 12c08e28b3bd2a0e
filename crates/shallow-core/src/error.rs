//! Centralized error types for shallow-embed.
//!
//! Uses thiserror for ergonomic error handling with context.
//!
//! Caller bugs (target id out of range, `k == 0`, unsorted frequencies handed
//! to the tree builder) are not represented here: they panic at the call site.

use thiserror::Error;

/// Main error type for shallow-embed operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ShallowError {
    /// Invalid model or training configuration detected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Frequency table does not cover the output vocabulary.
    #[error("Frequency table length mismatch: expected {expected} classes, got {actual}")]
    FrequencyMismatch { expected: usize, actual: usize },

    /// A weight table does not match the configured shape.
    #[error("Shape mismatch for {table} table: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        table: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// The objective needs state that `configure` builds.
    #[error("Model not configured: {0} must be built before training or prediction")]
    NotConfigured(&'static str),

    /// Every entry of the negative table equals the excluded target.
    #[error("Negative sampling table has no class other than {target} (gave up after {attempts} draws)")]
    DegenerateSamplingTable { target: usize, attempts: usize },

    /// Training diverged (NaN or infinite loss).
    #[error("Training diverged at step {step}: loss={loss}")]
    TrainingDiverged { loss: f64, step: usize },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Generic error with context.
    #[error("{0}")]
    Other(String),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ShallowError>;

impl ShallowError {
    /// Check if error is recoverable (can retry).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ShallowError::Io(_))
    }

    /// Check if error indicates training should stop.
    pub fn should_stop_training(&self) -> bool {
        matches!(
            self,
            ShallowError::TrainingDiverged { .. } | ShallowError::DegenerateSamplingTable { .. }
        )
    }
}
