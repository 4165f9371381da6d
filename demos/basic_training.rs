//! Basic training example for regforest.
//!
//! Grows a tree on a synthetic two-output problem, queries it, and writes it
//! out in every supported format.
//!
//! Run with: `cargo run --example basic_training`

use anyhow::Context;
use ndarray::{Array2, Axis};
use rand::prelude::*;
use regforest::io::{load_tree, save_tree};
use regforest::{ImportanceType, RegressionTree, SerializationFormat, TreeConfig};

fn main() -> anyhow::Result<()> {
    regforest::init_logging();

    println!("regforest {} - Basic Training Example", regforest::VERSION);
    println!("======================================");

    let (features, labels) = synthetic_data(400, 3);

    let mut config = TreeConfig {
        max_depth: 6,
        min_sample_count: 8,
        n_dim_trials: 3,
        n_thresh_trials: 16,
        random_seed: Some(7),
        ..TreeConfig::default()
    };
    config
        .apply_environment_overrides()
        .context("invalid REGFOREST_* override")?;

    // bootstrap sample with replacement
    let mut rng = config.rng();
    let bag: Vec<usize> = (0..features.nrows())
        .map(|_| rng.gen_range(0..features.nrows()))
        .collect();

    let mut tree = RegressionTree::from_config(0, &config, features.ncols(), labels.ncols())?;
    tree.train(
        features.view(),
        labels.view(),
        &bag,
        config.n_dim_trials,
        config.n_thresh_trials,
        &mut rng,
    )?;

    println!(
        "Trained tree: {} nodes, {} leaves, depth {}",
        tree.n_nodes(),
        tree.n_leaves(),
        tree.depth()
    );
    println!("Gain importance: {}", tree.feature_importance(ImportanceType::Gain));

    for row in features.axis_iter(Axis(0)).take(3) {
        let prediction = tree.test(&row)?;
        println!(
            "x = {} -> leaf {} mean {}",
            row,
            tree.terminal_node_id(&row)?,
            prediction.mean()
        );
    }

    let dir = std::env::temp_dir().join("regforest-demo");
    std::fs::create_dir_all(&dir)?;
    for name in ["tree.bin", "tree.txt", "tree.json"] {
        let path = dir.join(name);
        let format = SerializationFormat::from_path(&path)?;
        save_tree(&tree, &path, format)?;
        let restored = load_tree(&path, format)?;
        anyhow::ensure!(restored == tree, "{} round trip changed the tree", format);
        println!("Round trip through {} ok ({})", format, path.display());
    }

    Ok(())
}

/// Two outputs driven by the first two inputs; the third input is noise.
fn synthetic_data(n: usize, n_dim_in: usize) -> (Array2<f64>, Array2<f64>) {
    let mut rng = StdRng::seed_from_u64(42);
    let features = Array2::from_shape_fn((n, n_dim_in), |_| rng.gen_range(-3.0..3.0));
    let mut labels = Array2::zeros((n, 2));
    for (i, row) in features.axis_iter(Axis(0)).enumerate() {
        let step = if row[0] > 0.0 { 4.0 } else { -4.0 };
        labels[[i, 0]] = step + rng.gen_range(-0.5..0.5);
        labels[[i, 1]] = 0.5 * row[1] + rng.gen_range(-0.5..0.5);
    }
    (features, labels)
}
