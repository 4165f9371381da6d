//! Property tests over randomly shaped training problems.

mod common;

use common::same_multiset;
use ndarray::Array2;
use proptest::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use regforest::RegressionTree;
use std::io::Cursor;

fn random_problem(seed: u64, n_rows: usize, n_dim_in: usize, n_dim_out: usize) -> (Array2<f64>, Array2<f64>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    // a coarse grid makes tied feature values likely
    let features = Array2::from_shape_fn((n_rows, n_dim_in), |_| rng.gen_range(0..6) as f64);
    let labels = Array2::from_shape_fn((n_rows, n_dim_out), |_| rng.gen_range(-10.0..10.0));
    let bag = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
    (features, labels, bag)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_trained_tree_is_consistent(
        seed in any::<u64>(),
        n_rows in 1usize..60,
        n_dim_in in 1usize..5,
        n_dim_out in 1usize..4,
        max_depth in 0usize..7,
        min_sample_count in 1usize..6,
        n_dim_trials in 1usize..6,
        n_thresh_trials in 1usize..6,
    ) {
        let (features, labels, bag) = random_problem(seed, n_rows, n_dim_in, n_dim_out);
        let mut tree = RegressionTree::new(0, max_depth, n_dim_in, n_dim_out, min_sample_count).unwrap();
        let mut rng = StdRng::seed_from_u64(seed ^ 0x5eed);
        tree.train(features.view(), labels.view(), &bag, n_dim_trials, n_thresh_trials, &mut rng).unwrap();

        prop_assert!(tree.validate().is_ok());
        prop_assert!(tree.depth() <= max_depth);
        prop_assert_eq!(tree.n_nodes(), 2 * tree.n_leaves() - 1);

        let mut collected = Vec::new();
        for leaf in tree.leaves() {
            let samples = leaf.samples().unwrap();
            prop_assert!(!samples.is_empty());
            for &s in samples {
                prop_assert_eq!(tree.terminal_node_id(&features.row(s)).unwrap(), leaf.id());
            }
            collected.extend_from_slice(samples);
        }
        prop_assert!(same_multiset(&collected, &bag));
    }

    #[test]
    fn prop_serialized_tree_routes_identically(
        seed in any::<u64>(),
        n_rows in 2usize..40,
        max_depth in 1usize..6,
    ) {
        let (features, labels, bag) = random_problem(seed, n_rows, 3, 2);
        let mut tree = RegressionTree::new(5, max_depth, 3, 2, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        tree.train(features.view(), labels.view(), &bag, 2, 3, &mut rng).unwrap();

        let mut bytes = Vec::new();
        tree.write_binary(&mut bytes).unwrap();
        let from_binary = RegressionTree::read_binary(Cursor::new(bytes)).unwrap();

        let mut text = Vec::new();
        tree.write_text(&mut text).unwrap();
        let from_text = RegressionTree::read_text(Cursor::new(text)).unwrap();

        prop_assert_eq!(&from_binary, &tree);
        prop_assert_eq!(&from_text, &tree);
        for row in features.outer_iter() {
            let expected = tree.terminal_node_id(&row).unwrap();
            prop_assert_eq!(from_binary.terminal_node_id(&row).unwrap(), expected);
            prop_assert_eq!(from_text.terminal_node_id(&row).unwrap(), expected);
        }
    }
}
