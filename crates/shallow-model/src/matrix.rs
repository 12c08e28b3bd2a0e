//! Dense row-store primitives.
//!
//! Both weight tables are addressed row by row: the model only ever needs a
//! row dot product, a scaled row accumulation, and a matrix-vector product.
//! [`RowStore`] captures exactly that, so the same training code runs over an
//! owned [`DenseMatrix`] or a [`SharedMatrix`] updated lock-free from many
//! threads.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU32, Ordering};

/// Row-addressable weight table.
pub trait RowStore {
    /// Number of rows.
    fn rows(&self) -> usize;

    /// Row length.
    fn cols(&self) -> usize;

    /// Dot product of row `i` with `vec`.
    fn dot_row(&self, vec: &Vector, i: usize) -> f32;

    /// `row[i] += a * vec`.
    fn add_to_row(&mut self, vec: &Vector, i: usize, a: f32);

    /// `out += a * row[i]`.
    fn accumulate_row(&self, i: usize, out: &mut [f32], a: f32);
}

/// Dense `f32` vector used for the hidden state, gradient and score buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    pub fn from_vec(data: Vec<f32>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn zero(&mut self) {
        self.data.fill(0.0);
    }

    /// Scale every element by `a`.
    pub fn mul(&mut self, a: f32) {
        for x in self.data.iter_mut() {
            *x *= a;
        }
    }

    /// `self += a * store[i]`.
    pub fn add_row<S: RowStore + ?Sized>(&mut self, store: &S, i: usize, a: f32) {
        debug_assert_eq!(store.cols(), self.len());
        store.accumulate_row(i, &mut self.data, a);
    }

    /// `self = store * vec`, one entry per row.
    pub fn mul_matrix<S: RowStore + ?Sized>(&mut self, store: &S, vec: &Vector) {
        debug_assert_eq!(store.rows(), self.len());
        for (i, out) in self.data.iter_mut().enumerate() {
            *out = store.dot_row(vec, i);
        }
    }
}

impl Index<usize> for Vector {
    type Output = f32;

    fn index(&self, i: usize) -> &f32 {
        &self.data[i]
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, i: usize) -> &mut f32 {
        &mut self.data[i]
    }
}

/// Owned row-major matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl DenseMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Entries drawn uniformly from `[-bound, bound)` with a seeded generator.
    ///
    /// Input tables are conventionally initialised with `bound = 1 / dim`.
    pub fn uniform(rows: usize, cols: usize, bound: f32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = if bound > 0.0 {
            let dist = Uniform::new(-bound, bound);
            (0..rows * cols).map(|_| dist.sample(&mut rng)).collect()
        } else {
            vec![0.0; rows * cols]
        };
        Self { data, rows, cols }
    }

    pub fn from_rows(rows: &[Vec<f32>]) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            assert_eq!(row.len(), cols, "ragged rows");
            data.extend_from_slice(row);
        }
        Self {
            data,
            rows: rows.len(),
            cols,
        }
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f32] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

impl RowStore for DenseMatrix {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn dot_row(&self, vec: &Vector, i: usize) -> f32 {
        self.row(i)
            .iter()
            .zip(vec.as_slice())
            .map(|(w, x)| w * x)
            .sum()
    }

    fn add_to_row(&mut self, vec: &Vector, i: usize, a: f32) {
        for (w, &x) in self.row_mut(i).iter_mut().zip(vec.as_slice()) {
            *w += a * x;
        }
    }

    fn accumulate_row(&self, i: usize, out: &mut [f32], a: f32) {
        for (o, &w) in out.iter_mut().zip(self.row(i)) {
            *o += a * w;
        }
    }
}

/// Row-major matrix that many threads may read and write at once.
///
/// Each entry is an `f32` stored as bits in an [`AtomicU32`] with relaxed
/// ordering. A row update is a sequence of independent load/store pairs, so
/// concurrent updates to the same row can lose contributions (Hogwild). No
/// entry is ever torn.
#[derive(Debug)]
pub struct SharedMatrix {
    data: Vec<AtomicU32>,
    rows: usize,
    cols: usize,
}

impl SharedMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::from_dense(&DenseMatrix::zeros(rows, cols))
    }

    pub fn from_dense(dense: &DenseMatrix) -> Self {
        Self {
            data: dense
                .as_slice()
                .iter()
                .map(|x| AtomicU32::new(x.to_bits()))
                .collect(),
            rows: dense.rows,
            cols: dense.cols,
        }
    }

    /// Snapshot of the current contents.
    pub fn to_dense(&self) -> DenseMatrix {
        DenseMatrix {
            data: self.data.iter().map(|x| load(x)).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    fn row(&self, i: usize) -> &[AtomicU32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }
}

#[inline]
fn load(x: &AtomicU32) -> f32 {
    f32::from_bits(x.load(Ordering::Relaxed))
}

impl RowStore for &SharedMatrix {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn dot_row(&self, vec: &Vector, i: usize) -> f32 {
        self.row(i)
            .iter()
            .zip(vec.as_slice())
            .map(|(w, x)| load(w) * x)
            .sum()
    }

    fn add_to_row(&mut self, vec: &Vector, i: usize, a: f32) {
        for (w, &x) in self.row(i).iter().zip(vec.as_slice()) {
            let updated = load(w) + a * x;
            w.store(updated.to_bits(), Ordering::Relaxed);
        }
    }

    fn accumulate_row(&self, i: usize, out: &mut [f32], a: f32) {
        for (o, w) in out.iter_mut().zip(self.row(i)) {
            *o += a * load(w);
        }
    }
}
