//! Top-k ranking over the output vocabulary.
//!
//! Scores are log-probabilities. Under hierarchical softmax a pruned
//! depth-first search walks the Huffman tree, accumulating `ln σ` along each
//! branch; a subtree is skipped as soon as its prefix score cannot beat the
//! k-th best leaf found so far, since scores only decrease with depth. The
//! other objectives score every class densely and keep the best k in the same
//! bounded heap.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use shallow_core::{LossKind, Result, ShallowError};

use crate::huffman::HuffmanTree;
use crate::loss::{log_clamped, sigmoid, softmax_in_place};
use crate::matrix::{RowStore, Vector};
use crate::model::Model;

/// Heap entry ordered so that the *worst* candidate is the heap maximum:
/// lower score first, then higher class id.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f32,
    class: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then(self.class.cmp(&other.class))
    }
}

/// Size-capped heap keeping the k best candidates seen so far.
#[derive(Debug)]
pub struct TopK {
    k: usize,
    heap: BinaryHeap<Candidate>,
}

impl TopK {
    /// # Panics
    ///
    /// Panics if `k == 0`.
    pub fn new(k: usize) -> Self {
        assert!(k > 0, "k must be positive");
        Self {
            k,
            heap: BinaryHeap::with_capacity(k + 1),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Score of the k-th best candidate, once k candidates are held.
    pub fn threshold(&self) -> Option<f32> {
        if self.heap.len() == self.k {
            self.heap.peek().map(|c| c.score)
        } else {
            None
        }
    }

    /// Whether a candidate with `score` could still enter the heap.
    pub fn admits(&self, score: f32) -> bool {
        self.threshold().map_or(true, |min| score > min)
    }

    pub fn push(&mut self, score: f32, class: usize) {
        if !self.admits(score) {
            return;
        }
        self.heap.push(Candidate { score, class });
        if self.heap.len() > self.k {
            self.heap.pop();
        }
    }

    /// Candidates sorted by descending score (ascending class id on ties).
    pub fn into_sorted_vec(self) -> Vec<(f32, usize)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| (c.score, c.class))
            .collect()
    }
}

impl<W: RowStore> Model<W> {
    /// The `k` highest-scoring classes for `input`, best first.
    ///
    /// # Panics
    ///
    /// Panics if `k == 0`.
    pub fn predict(&mut self, input: &[usize], k: usize) -> Result<Vec<(f32, usize)>> {
        self.predict_with_threshold(input, k, 0.0)
    }

    /// Like [`predict`](Self::predict), dropping classes whose probability is
    /// below `threshold`.
    pub fn predict_with_threshold(
        &mut self,
        input: &[usize],
        k: usize,
        threshold: f32,
    ) -> Result<Vec<(f32, usize)>> {
        let mut top = TopK::new(k);
        if input.is_empty() {
            return Ok(Vec::new());
        }
        let floor = if threshold > 0.0 {
            threshold.ln()
        } else {
            f32::NEG_INFINITY
        };
        self.compute_hidden(input);

        match self.config.loss {
            LossKind::HierarchicalSoftmax => {
                let tree = self
                    .tree
                    .as_ref()
                    .ok_or(ShallowError::NotConfigured("Huffman tree"))?;
                let search = TreeSearch {
                    wo: &self.wo,
                    hidden: &self.hidden,
                    tree,
                    floor,
                };
                search.dfs(tree.root(), 0.0, &mut top);
            }
            LossKind::Softmax => {
                self.output.mul_matrix(&self.wo, &self.hidden);
                softmax_in_place(self.output.as_mut_slice());
                find_k_best(&self.output, floor, log_clamped, &mut top);
            }
            LossKind::NegativeSampling => {
                self.output.mul_matrix(&self.wo, &self.hidden);
                find_k_best(&self.output, floor, |s| log_clamped(sigmoid(s)), &mut top);
            }
        }
        Ok(top.into_sorted_vec())
    }

    /// [`predict`](Self::predict) with scores mapped back to probabilities.
    pub fn predict_probs(&mut self, input: &[usize], k: usize) -> Result<Vec<(f32, usize)>> {
        Ok(self
            .predict(input, k)?
            .into_iter()
            .map(|(score, class)| (score.exp(), class))
            .collect())
    }
}

fn find_k_best(output: &Vector, floor: f32, to_log_prob: impl Fn(f32) -> f32, top: &mut TopK) {
    for (class, &raw) in output.as_slice().iter().enumerate() {
        let score = to_log_prob(raw);
        if score < floor || !top.admits(score) {
            continue;
        }
        top.push(score, class);
    }
}

struct TreeSearch<'a, W: RowStore> {
    wo: &'a W,
    hidden: &'a Vector,
    tree: &'a HuffmanTree,
    floor: f32,
}

impl<W: RowStore> TreeSearch<'_, W> {
    fn dfs(&self, id: usize, score: f32, top: &mut TopK) {
        if score < self.floor || !top.admits(score) {
            return;
        }
        let node = self.tree.node(id);
        match (node.left, node.right) {
            (Some(left), Some(right)) => {
                let row = id - self.tree.classes();
                let f = sigmoid(self.wo.dot_row(self.hidden, row));
                self.dfs(left, score + log_clamped(1.0 - f), top);
                self.dfs(right, score + log_clamped(f), top);
            }
            _ => top.push(score, id),
        }
    }
}
