//! Linear learning-rate decay.

/// Learning rate after `processed` of `total` examples.
///
/// Decays linearly from `base_lr` at the start to 0 at the end; `progress` is
/// clamped to `[0, 1]`. The model clamps the result to its own floor.
pub fn linear_decay(base_lr: f32, processed: u64, total: u64) -> f32 {
    let progress = (processed as f64 / total.max(1) as f64).min(1.0);
    (f64::from(base_lr) * (1.0 - progress)) as f32
}
