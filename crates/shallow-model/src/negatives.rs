//! Negative sampling table.
//!
//! A fixed-capacity table of class ids approximating `P(c) ∝ freq(c)^0.5`,
//! shuffled once, then read sequentially through a wrapping cursor.

use rand::seq::SliceRandom;
use rand::Rng;
use shallow_core::{Result, ShallowError};

/// Smoothed unigram table plus its read cursor.
#[derive(Debug, Clone)]
pub struct NegativeTable {
    table: Vec<usize>,
    pos: usize,
}

impl NegativeTable {
    /// Build a table of exactly `capacity` entries from class frequencies.
    ///
    /// Each class gets `floor(sqrt(freq) / Σ sqrt(freq) * capacity)` slots; the
    /// slots lost to truncation go to the classes with the largest remainders
    /// (lowest id first on ties). The table is then shuffled with `rng`.
    pub fn build<R: Rng + ?Sized>(counts: &[u64], capacity: usize, rng: &mut R) -> Result<Self> {
        if capacity == 0 {
            return Err(ShallowError::InvalidConfig(
                "negative table capacity must be > 0".into(),
            ));
        }
        let weights: Vec<f64> = counts.iter().map(|&c| (c as f64).sqrt()).collect();
        let z: f64 = weights.iter().sum();
        if !(z > 0.0) {
            return Err(ShallowError::InvalidConfig(
                "negative sampling needs at least one class with non-zero frequency".into(),
            ));
        }

        let mut copies = Vec::with_capacity(weights.len());
        let mut remainders = Vec::with_capacity(weights.len());
        for (class, w) in weights.iter().enumerate() {
            let exact = w / z * capacity as f64;
            let whole = exact.floor() as usize;
            copies.push(whole);
            remainders.push((class, exact - whole as f64));
        }

        let assigned: usize = copies.iter().sum();
        let mut leftover = capacity.saturating_sub(assigned);
        remainders.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        for &(class, _) in remainders.iter().filter(|(class, _)| weights[*class] > 0.0) {
            if leftover == 0 {
                break;
            }
            copies[class] += 1;
            leftover -= 1;
        }

        let mut table = Vec::with_capacity(capacity);
        for (class, &n) in copies.iter().enumerate() {
            table.extend(std::iter::repeat(class).take(n));
        }
        table.truncate(capacity);
        table.shuffle(rng);

        Ok(Self { table, pos: 0 })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.table
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Next class id that differs from `target`.
    ///
    /// Gives up after one full lap of the table: if every entry equals
    /// `target`, no amount of retrying can succeed.
    pub fn draw(&mut self, target: usize) -> Result<usize> {
        for _ in 0..self.table.len() {
            let negative = self.table[self.pos];
            self.pos = (self.pos + 1) % self.table.len();
            if negative != target {
                return Ok(negative);
            }
        }
        Err(ShallowError::DegenerateSamplingTable {
            target,
            attempts: self.table.len(),
        })
    }
}
