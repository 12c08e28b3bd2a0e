//! Single-threaded training driver over an in-memory example set.
//!
//! Applies linear learning-rate decay every `lr_update_rate` examples and
//! reports progress every `log_interval` examples. Multi-threaded training
//! runs one [`Model`] per thread over [`SharedMatrix`](crate::SharedMatrix)
//! handles and is left to the caller.

use std::time::{Duration, Instant};

use shallow_core::{Result, ShallowError, TrainingConfig};
use tracing::info;

use crate::logging::{log_training_step, TrainingMetrics};
use crate::matrix::RowStore;
use crate::model::Model;
use crate::schedule::linear_decay;

/// One training example: input feature ids and the target class.
pub type Example = (Vec<usize>, usize);

/// Outcome of [`fit`].
#[derive(Debug, Clone)]
pub struct FitSummary {
    /// Updates performed, including empty-input no-ops.
    pub examples: u64,
    /// Mean loss over all non-empty updates.
    pub average_loss: f64,
    /// Learning rate in effect at the end.
    pub final_lr: f32,
    pub elapsed: Duration,
}

/// Train `model` on `examples` for `training.epochs` passes.
///
/// Stops with [`ShallowError::TrainingDiverged`] on the first non-finite loss.
pub fn fit<W: RowStore>(
    model: &mut Model<W>,
    examples: &[Example],
    training: &TrainingConfig,
) -> Result<FitSummary> {
    training.validate()?;
    let base_lr = model.config().lr;
    let total = (examples.len() * training.epochs) as u64;
    let start = Instant::now();

    let mut processed = 0u64;
    let mut loss_sum = 0.0f64;
    let mut counted = 0u64;
    model.reset_loss();

    for epoch in 0..training.epochs {
        for (input, target) in examples {
            if processed % training.lr_update_rate as u64 == 0 {
                model.set_learning_rate(linear_decay(base_lr, processed, total));
            }

            let loss = model.update(input, *target)?;
            processed += 1;
            if !loss.is_finite() {
                return Err(ShallowError::TrainingDiverged {
                    loss: f64::from(loss),
                    step: processed as usize,
                });
            }
            if !input.is_empty() {
                loss_sum += f64::from(loss);
                counted += 1;
            }

            if processed % training.log_interval as u64 == 0 {
                let secs = start.elapsed().as_secs_f64().max(f64::EPSILON);
                let metrics = TrainingMetrics::new(
                    model.average_loss(),
                    f64::from(model.learning_rate()),
                    processed,
                    processed as f64 / secs,
                );
                log_training_step(processed as usize, &metrics);
                model.reset_loss();
            }
        }
        info!(epoch = epoch, examples = processed, "Epoch completed");
    }

    let average_loss = if counted == 0 {
        0.0
    } else {
        loss_sum / counted as f64
    };
    Ok(FitSummary {
        examples: processed,
        average_loss,
        final_lr: model.learning_rate(),
        elapsed: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::DenseMatrix;
    use shallow_core::{LossKind, ModelConfig};

    fn toy_model() -> Model<DenseMatrix> {
        let cfg = ModelConfig {
            dim: 8,
            loss: LossKind::Softmax,
            lr: 0.5,
            ..ModelConfig::supervised(4, 2)
        };
        let wi = DenseMatrix::uniform(4, 8, 1.0 / 8.0, 3);
        let wo = DenseMatrix::zeros(2, 8);
        Model::new(wi, wo, cfg).unwrap()
    }

    fn toy_examples() -> Vec<Example> {
        vec![
            (vec![0, 1], 0),
            (vec![2, 3], 1),
            (vec![0], 0),
            (vec![3], 1),
            (vec![], 0),
        ]
    }

    #[test]
    fn test_fit_learns_separable_labels() {
        let mut model = toy_model();
        let training = TrainingConfig {
            epochs: 30,
            lr_update_rate: 5,
            log_interval: 50,
        };
        let summary = fit(&mut model, &toy_examples(), &training).unwrap();
        assert_eq!(summary.examples, 150);
        assert!(summary.average_loss.is_finite());
        assert_eq!(model.predict(&[0, 1], 1).unwrap()[0].1, 0);
        assert_eq!(model.predict(&[2, 3], 1).unwrap()[0].1, 1);
    }

    #[test]
    fn test_fit_decays_learning_rate() {
        let mut model = toy_model();
        let training = TrainingConfig {
            epochs: 2,
            lr_update_rate: 1,
            log_interval: 100,
        };
        let summary = fit(&mut model, &toy_examples(), &training).unwrap();
        // Last update ran at progress 9/10
        assert!((summary.final_lr - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_fit_stops_on_nan_weights() {
        let cfg = ModelConfig {
            dim: 2,
            loss: LossKind::Softmax,
            ..ModelConfig::supervised(2, 2)
        };
        let wi = DenseMatrix::from_rows(&[vec![f32::NAN, 0.0], vec![0.5, 0.5]]);
        let mut model = Model::new(wi, DenseMatrix::zeros(2, 2), cfg).unwrap();
        let examples: Vec<Example> = vec![(vec![1], 0), (vec![0], 1), (vec![1], 0)];

        match fit(&mut model, &examples, &TrainingConfig::default()) {
            Err(ShallowError::TrainingDiverged { loss, step }) => {
                assert!(loss.is_nan());
                assert_eq!(step, 2);
            }
            other => panic!("expected divergence, got {:?}", other),
        }
    }

    #[test]
    fn test_fit_rejects_invalid_training_config() {
        let mut model = toy_model();
        let training = TrainingConfig {
            epochs: 0,
            ..Default::default()
        };
        assert!(fit(&mut model, &toy_examples(), &training).is_err());
    }
}
