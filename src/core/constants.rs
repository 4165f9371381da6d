//! Constants and configuration defaults for the regression tree.

use crate::core::types::ImpurityMeasure;

/// Deepest tree whose complete-binary-tree ids still fit the `i32` id field
/// of the persisted formats.
pub const MAX_TREE_DEPTH: usize = 30;

/// Largest up-front arena reservation for a pre-sized tree; a header may
/// declare more, storage then grows as records arrive.
pub const MAX_RESERVED_NODES: usize = 1 << 20;

/// Upper bound on speculative allocation driven by a stream-declared count.
pub const MAX_PREALLOCATED_VALUES: usize = 1 << 16;

/// Default maximum tree depth.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default minimum number of samples a node needs to be considered for a split.
/// Nodes holding this many samples or fewer become leaves.
pub const DEFAULT_MIN_SAMPLE_COUNT: usize = 5;

/// Default number of random input dimensions tried per node.
pub const DEFAULT_N_DIM_TRIALS: usize = 10;

/// Default number of random thresholds tried per dimension.
pub const DEFAULT_N_THRESH_TRIALS: usize = 10;

/// Default impurity statistic.
pub const DEFAULT_IMPURITY: ImpurityMeasure = ImpurityMeasure::Trace;

/// Default ridge added to covariance diagonals before factorization.
pub const DEFAULT_COVARIANCE_REGULARIZATION: f64 = 1e-6;

/// Split dimension written for leaf records.
pub const LEAF_SPLIT_DIM_SENTINEL: i32 = -1;

/// Split threshold written for leaf records.
pub const LEAF_SPLIT_THRESH_SENTINEL: f64 = 0.0;

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "REGFOREST_";
