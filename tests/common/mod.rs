//! Common test utilities for regforest integration tests.

#![allow(dead_code)]

use ndarray::Array2;
use rand::prelude::*;
use regforest::{RegressionTree, TreeConfig, TreeConfigBuilder};

/// Uniform features in `[-5, 5)`.
pub fn create_test_features(num_samples: usize, num_features: usize) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(42);
    Array2::from_shape_fn((num_samples, num_features), |_| rng.gen_range(-5.0..5.0))
}

/// Two outputs: a linear combination of the features and its square.
pub fn create_test_labels(features: &Array2<f64>) -> Array2<f64> {
    let mut labels = Array2::zeros((features.nrows(), 2));
    for (i, row) in features.outer_iter().enumerate() {
        let linear: f64 = row.iter().enumerate().map(|(j, x)| x * (j + 1) as f64 * 0.1).sum();
        labels[[i, 0]] = linear;
        labels[[i, 1]] = linear * linear;
    }
    labels
}

/// Two well separated clusters along feature 0; feature 1 is noise.
///
/// Rows `0..n` have `x[0]` in `[0, 1)` and labels near `(0, 0)`; rows
/// `n..2n` have `x[0]` in `[10, 11)` and labels near `(10, -10)`.
pub fn create_two_clusters(n: usize) -> (Array2<f64>, Array2<f64>) {
    let mut rng = StdRng::seed_from_u64(123);
    let mut features = Array2::zeros((2 * n, 2));
    let mut labels = Array2::zeros((2 * n, 2));
    for i in 0..2 * n {
        let (offset, target) = if i < n { (0.0, (0.0, 0.0)) } else { (10.0, (10.0, -10.0)) };
        features[[i, 0]] = offset + rng.gen_range(0.0..1.0);
        features[[i, 1]] = rng.gen_range(-5.0..5.0);
        labels[[i, 0]] = target.0 + rng.gen_range(-0.1..0.1);
        labels[[i, 1]] = target.1 + rng.gen_range(-0.1..0.1);
    }
    (features, labels)
}

/// Bootstrap sample of `n` rows drawn with replacement.
pub fn create_bootstrap(num_rows: usize, n: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(0..num_rows)).collect()
}

pub fn test_config(max_depth: usize, min_sample_count: usize) -> TreeConfig {
    TreeConfigBuilder::new()
        .max_depth(max_depth)
        .min_sample_count(min_sample_count)
        .n_dim_trials(3)
        .n_thresh_trials(8)
        .random_seed(42)
        .build()
        .unwrap()
}

/// Trains a tree on the regression test data with the given limits.
pub fn trained_tree(max_depth: usize, min_sample_count: usize) -> (RegressionTree, Array2<f64>, Vec<usize>) {
    let features = create_test_features(200, 3);
    let labels = create_test_labels(&features);
    let bag = create_bootstrap(features.nrows(), 200, 7);
    let config = test_config(max_depth, min_sample_count);

    let mut tree = RegressionTree::from_config(1, &config, 3, 2).unwrap();
    let mut rng = config.rng();
    tree.train(
        features.view(),
        labels.view(),
        &bag,
        config.n_dim_trials,
        config.n_thresh_trials,
        &mut rng,
    )
    .unwrap();
    (tree, features, bag)
}

/// Multiset equality of two index lists.
pub fn same_multiset(a: &[usize], b: &[usize]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}
