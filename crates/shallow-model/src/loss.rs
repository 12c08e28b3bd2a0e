//! Scoring strategies: negative sampling, hierarchical softmax, full softmax.
//!
//! Each strategy turns the hidden vector and a target class into a loss,
//! updates the output rows it touched, and leaves the input-side gradient in
//! the accumulator. The accumulator is zeroed on entry.

use shallow_core::Result;

use crate::huffman::HuffmanTree;
use crate::matrix::{RowStore, Vector};
use crate::negatives::NegativeTable;

/// Floor applied before taking logarithms so losses stay finite.
const LOG_FLOOR: f32 = 1e-10;

/// Sigmoid activation function.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Natural log with the argument floored at a tiny positive value.
///
/// NaN passes through so a diverged model still reports a non-finite loss.
#[inline]
pub fn log_clamped(x: f32) -> f32 {
    if x.is_nan() {
        x
    } else {
        x.max(LOG_FLOOR).ln()
    }
}

/// Numerically stable softmax, in place.
///
/// The maximum is subtracted before exponentiating, so the largest term is
/// exactly 1 and the normalizer is never zero.
pub fn softmax_in_place(scores: &mut [f32]) {
    let max_val = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for s in scores.iter_mut() {
        *s = (*s - max_val).exp();
        sum += *s;
    }

    let inv_sum = 1.0 / sum;
    for s in scores.iter_mut() {
        *s *= inv_sum;
    }
}

/// Borrowed state for one scoring call.
pub(crate) struct Step<'a, W: RowStore> {
    pub wo: &'a mut W,
    pub hidden: &'a Vector,
    pub grad: &'a mut Vector,
    pub lr: f32,
}

impl<W: RowStore> Step<'_, W> {
    /// One logistic regression step on output row `row`.
    fn binary_logistic(&mut self, row: usize, label: bool) -> f32 {
        let score = sigmoid(self.wo.dot_row(self.hidden, row));
        let alpha = self.lr * (f32::from(u8::from(label)) - score);
        self.grad.add_row(&*self.wo, row, alpha);
        self.wo.add_to_row(self.hidden, row, alpha);
        if label {
            -log_clamped(score)
        } else {
            -log_clamped(1.0 - score)
        }
    }

    /// True class against `neg` classes drawn from `negatives`.
    ///
    /// All negatives are drawn before any row moves, so a failed draw leaves
    /// the output table untouched.
    pub fn negative_sampling(
        &mut self,
        target: usize,
        neg: usize,
        negatives: &mut NegativeTable,
    ) -> Result<f32> {
        let drawn = (0..neg)
            .map(|_| negatives.draw(target))
            .collect::<Result<Vec<usize>>>()?;

        self.grad.zero();
        let mut loss = self.binary_logistic(target, true);
        for negative in drawn {
            loss += self.binary_logistic(negative, false);
        }
        Ok(loss)
    }

    /// One binary decision per internal node on the target's path.
    pub fn hierarchical_softmax(&mut self, tree: &HuffmanTree, target: usize) -> f32 {
        self.grad.zero();
        let mut loss = 0.0;
        for (&row, &bit) in tree.path(target).iter().zip(tree.code(target)) {
            loss += self.binary_logistic(row, bit);
        }
        loss
    }

    /// Full softmax over every output row. `output` receives the probabilities.
    pub fn softmax(&mut self, output: &mut Vector, target: usize) -> f32 {
        self.grad.zero();
        output.mul_matrix(&*self.wo, self.hidden);
        softmax_in_place(output.as_mut_slice());
        for i in 0..output.len() {
            let label = if i == target { 1.0 } else { 0.0 };
            let alpha = self.lr * (label - output[i]);
            self.grad.add_row(&*self.wo, i, alpha);
            self.wo.add_to_row(self.hidden, i, alpha);
        }
        -log_clamped(output[target])
    }
}
