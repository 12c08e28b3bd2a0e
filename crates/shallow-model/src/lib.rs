//! # Shallow embedding model core
//!
//! Training and ranking for bag-of-features embedding models: a hidden vector
//! is the mean of the selected input rows, an output objective scores it
//! against one class, and the gradient flows back into both tables.
//!
//! - **Objectives**: negative sampling, hierarchical softmax over a Huffman
//!   tree, full softmax
//! - **Ranking**: bounded-heap top-k, with branch-and-bound tree search under
//!   hierarchical softmax
//! - **Concurrency**: tables can be shared across threads as lock-free
//!   [`SharedMatrix`] handles; each thread owns its own [`Model`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shallow_core::{LossKind, ModelConfig};
//! use shallow_model::{DenseMatrix, Model};
//!
//! # fn main() -> shallow_core::Result<()> {
//! let config = ModelConfig {
//!     loss: LossKind::HierarchicalSoftmax,
//!     ..ModelConfig::supervised(1000, 4)
//! };
//! let wi = DenseMatrix::uniform(1000, config.dim, 1.0 / config.dim as f32, 0);
//! let wo = DenseMatrix::zeros(4, config.dim);
//! let mut model = Model::new(wi, wo, config)?;
//!
//! // Class frequencies, sorted ascending
//! model.configure(&[10, 20, 40, 80])?;
//! let loss = model.update(&[3, 17, 256], 2)?;
//! let top = model.predict(&[3, 17, 256], 2)?;
//! # let _ = (loss, top);
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod huffman;
pub mod logging;
pub mod loss;
pub mod matrix;
pub mod model;
pub mod negatives;
pub mod predict;
pub mod schedule;

pub use driver::{fit, Example, FitSummary};
pub use huffman::{HuffmanTree, Node};
pub use matrix::{DenseMatrix, RowStore, SharedMatrix, Vector};
pub use model::Model;
pub use negatives::NegativeTable;
pub use predict::TopK;
