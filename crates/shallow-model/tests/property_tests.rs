//! Property-based tests using proptest.
//!
//! Validates invariants that must hold for all frequency tables and weights:
//! - Huffman trees are full binary trees whose codes decode back to their leaf
//! - Negative tables have the configured size and never return the target
//! - Top-k results are ordered and agree with an exhaustive ranking

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shallow_core::{LossKind, ModelConfig, ModelKind, ShallowError};
use shallow_model::loss::softmax_in_place;
use shallow_model::{DenseMatrix, HuffmanTree, Model, NegativeTable};

fn sorted_counts(max_len: usize) -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(1u64..1000, 1..max_len).prop_map(|mut v| {
        v.sort_unstable();
        v
    })
}

fn ranking_model(loss: LossKind, rows: Vec<Vec<f32>>, hidden: Vec<f32>) -> Model<DenseMatrix> {
    let classes = rows.len();
    let dim = hidden.len();
    let cfg = ModelConfig {
        dim,
        input_size: 1,
        output_size: classes,
        loss,
        model: ModelKind::Supervised,
        neg: 1,
        lr: 0.1,
        min_lr: 1e-6,
        seed: 0,
        negative_table_size: 64,
    };
    let wi = DenseMatrix::from_rows(&[hidden]);
    let wo = DenseMatrix::from_rows(&rows);
    let mut model = Model::new(wi, wo, cfg).unwrap();
    let counts: Vec<u64> = (1..=classes as u64).collect();
    model.configure(&counts).unwrap();
    model
}

fn weights(classes: std::ops::Range<usize>, dim: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(prop::collection::vec(-2.0f32..2.0, dim), classes)
}

proptest! {
    /// Property: a tree over C classes has 2C-1 nodes, every internal node has
    /// two children whose weights sum to its own.
    #[test]
    fn huffman_tree_is_full(counts in sorted_counts(64)) {
        let tree = HuffmanTree::build(&counts);
        let c = counts.len();
        prop_assert_eq!(tree.nodes().len(), 2 * c - 1);

        for (id, node) in tree.nodes().iter().enumerate() {
            if id < c {
                prop_assert!(node.is_leaf());
                continue;
            }
            let (left, right) = (node.left.unwrap(), node.right.unwrap());
            prop_assert_eq!(tree.node(left).parent, Some(id));
            prop_assert_eq!(tree.node(right).parent, Some(id));
            prop_assert!(tree.node(right).is_right);
            prop_assert!(!tree.node(left).is_right);
            let sum = tree.node(left).weight + tree.node(right).weight;
            prop_assert!((node.weight - sum).abs() < 1e-6);
        }
        prop_assert_eq!(tree.node(tree.root()).parent, None);
    }

    /// Property: codes round-trip through the tree and align with paths.
    #[test]
    fn huffman_codes_round_trip(counts in sorted_counts(64)) {
        let tree = HuffmanTree::build(&counts);
        for class in 0..counts.len() {
            prop_assert_eq!(tree.path(class).len(), tree.code(class).len());
            prop_assert!(tree.path(class).iter().all(|&row| row < counts.len() - 1));
            prop_assert_eq!(tree.decode(tree.code(class)), Some(class));
        }
    }

    /// Property: a strictly heavier class never gets a longer code.
    #[test]
    fn huffman_heavier_is_not_deeper(counts in sorted_counts(40)) {
        let tree = HuffmanTree::build(&counts);
        for i in 0..counts.len() {
            for j in i + 1..counts.len() {
                if counts[i] < counts[j] {
                    prop_assert!(tree.code(i).len() >= tree.code(j).len());
                }
            }
        }
    }

    /// Property: the table always has exactly the configured capacity.
    #[test]
    fn negative_table_has_capacity(
        counts in prop::collection::vec(0u64..100, 1..30),
        capacity in 1usize..5000,
        seed in any::<u64>(),
    ) {
        prop_assume!(counts.iter().any(|&c| c > 0));
        let table = NegativeTable::build(&counts, capacity, &mut StdRng::seed_from_u64(seed)).unwrap();
        prop_assert_eq!(table.len(), capacity);
        prop_assert!(table.as_slice().iter().all(|&c| counts[c] > 0));
    }

    /// Property: draws never return the excluded target.
    #[test]
    fn negative_draws_skip_target(
        counts in prop::collection::vec(0u64..50, 2..20),
        seed in any::<u64>(),
        target_pick in any::<prop::sample::Index>(),
    ) {
        prop_assume!(counts.iter().any(|&c| c > 0));
        let mut table = NegativeTable::build(&counts, 500, &mut StdRng::seed_from_u64(seed)).unwrap();
        let target = target_pick.index(counts.len());
        let has_other = table.as_slice().iter().any(|&c| c != target);
        for _ in 0..200 {
            match table.draw(target) {
                Ok(negative) => prop_assert_ne!(negative, target),
                Err(ShallowError::DegenerateSamplingTable { .. }) => prop_assert!(!has_other),
                Err(other) => prop_assert!(false, "unexpected error {}", other),
            }
        }
    }

    /// Property: softmax sums to one and ignores a constant shift.
    #[test]
    fn softmax_normalized_and_shift_invariant(
        scores in prop::collection::vec(-20.0f32..20.0, 1..50),
        shift in -50.0f32..50.0,
    ) {
        let mut a = scores.clone();
        let mut b: Vec<f32> = scores.iter().map(|s| s + shift).collect();
        softmax_in_place(&mut a);
        softmax_in_place(&mut b);
        let total: f32 = a.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-4);
        for (x, y) in a.iter().zip(&b) {
            prop_assert!((x - y).abs() < 1e-4);
        }
    }

    /// Property: dense top-k is ordered, sized min(k, C), and equals the head
    /// of the full ranking.
    #[test]
    fn dense_top_k_matches_full_ranking(
        rows in weights(1..16, 4),
        hidden in prop::collection::vec(-1.0f32..1.0, 4),
        k in 1usize..20,
    ) {
        let classes = rows.len();
        let mut model = ranking_model(LossKind::Softmax, rows, hidden);
        let top = model.predict(&[0], k).unwrap();
        prop_assert_eq!(top.len(), k.min(classes));
        for w in top.windows(2) {
            prop_assert!(w[0].0 > w[1].0 || (w[0].0 == w[1].0 && w[0].1 < w[1].1));
        }
        let full = model.predict(&[0], classes).unwrap();
        prop_assert_eq!(&top[..], &full[..top.len()]);
    }

    /// Property: pruning in the tree search never changes the answer.
    #[test]
    fn tree_search_matches_full_ranking(
        rows in weights(2..16, 3),
        hidden in prop::collection::vec(-1.0f32..1.0, 3),
        k in 1usize..20,
    ) {
        let classes = rows.len();
        let mut model = ranking_model(LossKind::HierarchicalSoftmax, rows, hidden);
        let full = model.predict(&[0], classes).unwrap();
        prop_assert_eq!(full.len(), classes);
        let total: f32 = full.iter().map(|p| p.0.exp()).sum();
        prop_assert!((total - 1.0).abs() < 1e-3);

        let top = model.predict(&[0], k).unwrap();
        prop_assert_eq!(top.len(), k.min(classes));
        prop_assert_eq!(&top[..], &full[..top.len()]);
    }
}
