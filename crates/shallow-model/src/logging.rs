//! Structured logging for training with tracing.
//!
//! JSON output for long-running jobs, pretty output for debugging, and a
//! per-step metrics event with an error event on divergence.

use shallow_core::AppConfig;
use tracing::{debug, error, info, span, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,shallow_model=info,shallow_core=info";

/// Initialize structured logging.
///
/// Reads log level from RUST_LOG environment variable (defaults to "info").
/// Outputs JSON-formatted logs. Does nothing if a subscriber is already set.
pub fn init_logging() {
    init_json(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()));
}

/// Like [`init_logging`], falling back to `config.log_level` when RUST_LOG is unset.
pub fn init_logging_from(config: &AppConfig) {
    init_json(
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str())),
    );
}

fn init_json(filter: EnvFilter) {
    let initialized = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
        .is_ok();

    if initialized {
        info!("Structured logging initialized");
    }
}

/// Initialize simple console logging (for examples/debugging).
pub fn init_console_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,shallow_model=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().pretty())
        .try_init();
}

/// Training metrics for structured logging.
#[derive(Debug, Clone)]
pub struct TrainingMetrics {
    /// Mean loss since the last report.
    pub loss: f64,
    /// Current learning rate.
    pub learning_rate: f64,
    /// Examples processed so far.
    pub examples: u64,
    /// Throughput in examples per second.
    pub examples_per_sec: f64,
}

impl TrainingMetrics {
    pub fn new(loss: f64, learning_rate: f64, examples: u64, examples_per_sec: f64) -> Self {
        Self {
            loss,
            learning_rate,
            examples,
            examples_per_sec,
        }
    }
}

/// Log a training step with structured metrics.
///
/// Emits an error event instead when the loss is NaN or infinite.
pub fn log_training_step(step: usize, metrics: &TrainingMetrics) {
    let span = span!(Level::INFO, "training_step", step = step);
    let _enter = span.enter();

    if !metrics.loss.is_finite() {
        error!(
            loss = metrics.loss,
            step = step,
            "Training diverged! NaN or infinite loss detected"
        );
        return;
    }

    info!(
        loss = metrics.loss,
        lr = metrics.learning_rate,
        examples = metrics.examples,
        examples_per_sec = metrics.examples_per_sec,
        "Training step completed"
    );

    debug!(
        step = step,
        progress = format!("{} examples at {:.1}/s", metrics.examples, metrics.examples_per_sec),
        "Training diagnostics"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = TrainingMetrics::new(1.5, 0.05, 1000, 25_000.0);
        assert_eq!(metrics.loss, 1.5);
        assert_eq!(metrics.examples, 1000);
    }

    #[test]
    fn test_logging_does_not_panic() {
        init_console_logging();
        init_console_logging();
        // Already initialized: both are no-ops
        init_logging();
        init_logging_from(&AppConfig::default());
        log_training_step(10, &TrainingMetrics::new(0.7, 0.05, 10, 100.0));
        log_training_step(11, &TrainingMetrics::new(f64::NAN, 0.05, 11, 100.0));
    }
}
