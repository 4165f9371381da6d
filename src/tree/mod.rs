//! Regression tree subsystem.
//!
//! Node representation, the randomized split search, the serial learner and
//! the [`RegressionTree`] that owns and queries the nodes.

pub mod learner;
pub mod node;
pub mod split;
pub mod tree;

pub use learner::{LearnerConfig, SerialTreeLearner, TreeLearner};
pub use node::{LeafData, NodeRecord, SplitRule, TreeNode};
pub use split::{ImpurityEvaluator, SplitFinder, SplitFinderConfig, SplitInfo};
pub use tree::RegressionTree;
