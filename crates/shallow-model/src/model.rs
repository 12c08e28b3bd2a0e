//! The model core: hidden-vector computation, objective dispatch, and the
//! gradient step back into the input table.
//!
//! A [`Model`] owns its scratch buffers, negative-table cursor, learning rate
//! and random source. The weight tables are whatever [`RowStore`] it was built
//! over: owned [`DenseMatrix`](crate::matrix::DenseMatrix) tables for a single
//! trainer, or `&SharedMatrix` handles when several trainers share one pair of
//! tables across threads.

use rand::rngs::StdRng;
use rand::SeedableRng;
use shallow_core::{LossKind, ModelConfig, Result, ShallowError};
use tracing::debug;

use crate::huffman::HuffmanTree;
use crate::loss::Step;
use crate::matrix::{RowStore, Vector};
use crate::negatives::NegativeTable;

/// Shallow embedding model over an input table `wi` and output table `wo`.
pub struct Model<W: RowStore> {
    pub(crate) wi: W,
    pub(crate) wo: W,
    pub(crate) config: ModelConfig,
    pub(crate) hidden: Vector,
    pub(crate) output: Vector,
    grad: Vector,
    lr: f32,
    rng: StdRng,
    negatives: Option<NegativeTable>,
    pub(crate) tree: Option<HuffmanTree>,
    loss_sum: f64,
    examples: u64,
}

impl<W: RowStore> Model<W> {
    /// Wrap the two tables. `wi` must be `input_size x dim` and `wo`
    /// `output_size x dim`.
    pub fn new(wi: W, wo: W, config: ModelConfig) -> Result<Self> {
        config.validate()?;
        check_shape("input", &wi, (config.input_size, config.dim))?;
        check_shape("output", &wo, (config.output_size, config.dim))?;

        Ok(Self {
            hidden: Vector::zeros(config.dim),
            output: Vector::zeros(config.output_size),
            grad: Vector::zeros(config.dim),
            lr: config.lr.max(config.min_lr),
            rng: StdRng::seed_from_u64(config.seed),
            negatives: None,
            tree: None,
            loss_sum: 0.0,
            examples: 0,
            wi,
            wo,
            config,
        })
    }

    /// Build the objective's lookup structure from per-class frequencies.
    ///
    /// Negative sampling builds the shuffled sampling table; hierarchical
    /// softmax builds the Huffman tree, which requires `counts` sorted in
    /// non-decreasing order. Full softmax needs nothing.
    pub fn configure(&mut self, counts: &[u64]) -> Result<()> {
        if counts.len() != self.config.output_size {
            return Err(ShallowError::FrequencyMismatch {
                expected: self.config.output_size,
                actual: counts.len(),
            });
        }
        match self.config.loss {
            LossKind::NegativeSampling => {
                let table =
                    NegativeTable::build(counts, self.config.negative_table_size, &mut self.rng)?;
                debug!(entries = table.len(), classes = counts.len(), "Built negative sampling table");
                self.negatives = Some(table);
            }
            LossKind::HierarchicalSoftmax => {
                let tree = HuffmanTree::build(counts);
                debug!(classes = counts.len(), depth = tree.depth(), "Built Huffman tree");
                self.tree = Some(tree);
            }
            LossKind::Softmax => {}
        }
        Ok(())
    }

    /// Set the learning rate, clamped to the configured floor.
    pub fn set_learning_rate(&mut self, lr: f32) {
        if lr < self.config.min_lr {
            debug!(requested = lr, floor = self.config.min_lr, "Learning rate clamped");
            self.lr = self.config.min_lr;
        } else {
            self.lr = lr;
        }
    }

    pub fn learning_rate(&self) -> f32 {
        self.lr
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn input_table(&self) -> &W {
        &self.wi
    }

    pub fn output_table(&self) -> &W {
        &self.wo
    }

    /// Give back the weight tables.
    pub fn into_tables(self) -> (W, W) {
        (self.wi, self.wo)
    }

    pub fn tree(&self) -> Option<&HuffmanTree> {
        self.tree.as_ref()
    }

    pub fn negatives(&self) -> Option<&NegativeTable> {
        self.negatives.as_ref()
    }

    /// Mean of the selected input rows. An empty bag yields the zero vector.
    pub fn compute_hidden(&mut self, input: &[usize]) -> &Vector {
        self.hidden.zero();
        for &id in input {
            self.hidden.add_row(&self.wi, id, 1.0);
        }
        if !input.is_empty() {
            self.hidden.mul(1.0 / input.len() as f32);
        }
        &self.hidden
    }

    /// One online gradient step on `(input, target)`; returns the loss.
    ///
    /// An empty `input` is a no-op returning `0.0`.
    ///
    /// # Panics
    ///
    /// Panics if `target` is not a valid class id or an input id is out of
    /// range for the input table.
    pub fn update(&mut self, input: &[usize], target: usize) -> Result<f32> {
        assert!(
            target < self.config.output_size,
            "target {} out of range for {} classes",
            target,
            self.config.output_size
        );
        if input.is_empty() {
            return Ok(0.0);
        }
        self.compute_hidden(input);

        let mut step = Step {
            wo: &mut self.wo,
            hidden: &self.hidden,
            grad: &mut self.grad,
            lr: self.lr,
        };
        let loss = match self.config.loss {
            LossKind::NegativeSampling => {
                let negatives = self
                    .negatives
                    .as_mut()
                    .ok_or(ShallowError::NotConfigured("negative sampling table"))?;
                step.negative_sampling(target, self.config.neg, negatives)?
            }
            LossKind::HierarchicalSoftmax => {
                let tree = self
                    .tree
                    .as_ref()
                    .ok_or(ShallowError::NotConfigured("Huffman tree"))?;
                step.hierarchical_softmax(tree, target)
            }
            LossKind::Softmax => step.softmax(&mut self.output, target),
        };

        if self.config.rescales_gradient() {
            self.grad.mul(1.0 / input.len() as f32);
        }
        for &id in input {
            self.wi.add_to_row(&self.grad, id, 1.0);
        }

        self.loss_sum += f64::from(loss);
        self.examples += 1;
        Ok(loss)
    }

    /// Mean loss over the updates since the last reset.
    pub fn average_loss(&self) -> f64 {
        if self.examples == 0 {
            0.0
        } else {
            self.loss_sum / self.examples as f64
        }
    }

    /// Number of non-empty updates since the last reset.
    pub fn examples_seen(&self) -> u64 {
        self.examples
    }

    pub fn reset_loss(&mut self) {
        self.loss_sum = 0.0;
        self.examples = 0;
    }
}

fn check_shape<W: RowStore>(table: &'static str, store: &W, expected: (usize, usize)) -> Result<()> {
    let actual = (store.rows(), store.cols());
    if actual != expected {
        return Err(ShallowError::ShapeMismatch {
            table,
            expected,
            actual,
        });
    }
    Ok(())
}
