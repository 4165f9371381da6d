//! # regforest
//!
//! Multivariate regression trees with Gaussian leaves, the building block of
//! a random regression forest.
//!
//! A tree is grown from a bootstrap sample of rows of a feature matrix and a
//! row-aligned multi-output label matrix. Each node draws a few random input
//! dimensions and thresholds, keeps the split that most reduces the label
//! impurity and recurses until a depth or sample-count limit is hit. Every
//! leaf holds a multivariate Gaussian fitted to the labels that landed there,
//! so a prediction is a full distribution rather than a point estimate.
//!
//! ## Features
//!
//! - **Randomized split search** with a caller-supplied random source, so
//!   seeded training is reproducible.
//! - **Gaussian leaves** exposing mean, covariance and log-density.
//! - **Persistence** in a little-endian binary format, a whitespace separated
//!   text format and JSON, all reproducing the identical topology.
//! - **Configuration** from code, JSON or TOML files and `REGFOREST_*`
//!   environment variables.
//!
//! ## Quick Start
//!
//! ```rust
//! use regforest::{RegressionTree, TreeConfigBuilder};
//! use ndarray::array;
//!
//! # fn main() -> regforest::Result<()> {
//! let features = array![[0.0, 1.0], [0.5, 0.0], [4.0, 1.0], [4.5, 0.0]];
//! let labels = array![[1.0], [1.2], [9.0], [9.4]];
//!
//! let config = TreeConfigBuilder::new()
//!     .max_depth(3)
//!     .min_sample_count(1)
//!     .n_dim_trials(2)
//!     .random_seed(42)
//!     .build()?;
//!
//! let mut tree = RegressionTree::from_config(0, &config, 2, 1)?;
//! let mut rng = config.rng();
//! tree.train(
//!     features.view(),
//!     labels.view(),
//!     &[0, 1, 2, 3],
//!     config.n_dim_trials,
//!     config.n_thresh_trials,
//!     &mut rng,
//! )?;
//!
//! let prediction = tree.test(&array![4.2, 0.5].view())?;
//! println!("mean {} covariance {}", prediction.mean(), prediction.covariance());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod distribution;
pub mod io;
pub mod tree;

pub use crate::config::{TreeConfig, TreeConfigBuilder};
pub use crate::core::error::{RegForestError, Result};
pub use crate::core::init_logging;
pub use crate::core::types::{ImportanceType, ImpurityMeasure, NodeId, SampleIndex, TreeId};
pub use crate::distribution::MultivariateGaussian;
pub use crate::io::SerializationFormat;
pub use crate::tree::{NodeRecord, RegressionTree, TreeNode};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_surface() {
        init_logging();
        assert!(!VERSION.is_empty());
        let tree = RegressionTree::from_config(0, &TreeConfig::default(), 3, 2).unwrap();
        assert_eq!(tree.n_dim_in(), 3);
        assert_eq!(tree.n_dim_out(), 2);
    }
}
