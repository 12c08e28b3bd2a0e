//! Core types shared across shallow-embed crates.
//!
//! Provides:
//! - Centralized error types via thiserror
//! - Model and training configuration with TOML support

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{AppConfig, LossKind, ModelConfig, ModelKind, TrainingConfig};
pub use error::{Result, ShallowError};
