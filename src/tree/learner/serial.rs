//! Serial tree learner.
//!
//! Grows a tree depth-first from an explicit work stack of pending nodes, so
//! deep trees never deepen the call stack. Each node is inserted into the
//! tree as soon as it is decided, which links it to its already-present
//! parent.

use crate::core::error::{RegForestError, Result};
use crate::core::types::{node_id, ImpurityMeasure, NodeId, SampleIndex};
use crate::distribution::MultivariateGaussian;
use crate::tree::learner::TreeLearner;
use crate::tree::node::TreeNode;
use crate::tree::split::{ImpurityEvaluator, SplitFinder, SplitFinderConfig};
use crate::tree::tree::RegressionTree;
use ndarray::ArrayView2;
use rand::Rng;

/// Configuration for the serial tree learner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearnerConfig {
    /// Number of input dimensions drawn per node
    pub n_dim_trials: usize,
    /// Number of thresholds drawn per dimension
    pub n_thresh_trials: usize,
    /// Label dispersion statistic minimized by the splits
    pub impurity: ImpurityMeasure,
    /// Ridge added to covariance diagonals by the log-determinant impurity
    pub covariance_regularization: f64,
}

/// A node waiting to be decided.
#[derive(Debug)]
struct PendingNode {
    id: NodeId,
    samples: Vec<SampleIndex>,
}

/// Single-threaded learner over borrowed feature and label matrices.
#[derive(Debug)]
pub struct SerialTreeLearner<'a> {
    features: ArrayView2<'a, f64>,
    labels: ArrayView2<'a, f64>,
    finder: SplitFinder,
}

impl<'a> SerialTreeLearner<'a> {
    /// Creates a learner over row-aligned feature and label matrices.
    pub fn new(features: ArrayView2<'a, f64>, labels: ArrayView2<'a, f64>, config: LearnerConfig) -> Result<Self> {
        if features.nrows() != labels.nrows() {
            return Err(RegForestError::dimension_mismatch(
                format!("{} label rows", features.nrows()),
                labels.nrows().to_string(),
            ));
        }
        if config.n_dim_trials < 1 {
            return Err(RegForestError::invalid_parameter("n_dim_trials", "0", "must be at least 1"));
        }
        if config.n_thresh_trials < 1 {
            return Err(RegForestError::invalid_parameter("n_thresh_trials", "0", "must be at least 1"));
        }

        let evaluator = ImpurityEvaluator::new(config.impurity, config.covariance_regularization);
        let finder = SplitFinder::new(
            SplitFinderConfig {
                n_dim_trials: config.n_dim_trials,
                n_thresh_trials: config.n_thresh_trials,
            },
            evaluator,
        );

        Ok(SerialTreeLearner {
            features,
            labels,
            finder,
        })
    }

    fn check_inputs(&self, tree: &RegressionTree, bag: &[SampleIndex]) -> Result<()> {
        if !tree.is_empty() {
            return Err(RegForestError::invalid_state(format!(
                "tree {} already holds {} nodes",
                tree.id(),
                tree.n_nodes()
            )));
        }
        if tree.is_presized() {
            return Err(RegForestError::invalid_state(format!(
                "tree {} is sized for reconstruction, not training",
                tree.id()
            )));
        }
        if self.features.ncols() != tree.n_dim_in() {
            return Err(RegForestError::dimension_mismatch(
                format!("{} feature columns", tree.n_dim_in()),
                self.features.ncols().to_string(),
            ));
        }
        if self.labels.ncols() != tree.n_dim_out() {
            return Err(RegForestError::dimension_mismatch(
                format!("{} label columns", tree.n_dim_out()),
                self.labels.ncols().to_string(),
            ));
        }
        if bag.is_empty() {
            return Err(RegForestError::invalid_parameter("bag", "[]", "bootstrap sample is empty"));
        }
        if let Some(&row) = bag.iter().find(|&&row| row >= self.features.nrows()) {
            return Err(RegForestError::invalid_parameter(
                "bag",
                row.to_string(),
                format!("row index out of range for {} rows", self.features.nrows()),
            ));
        }
        Ok(())
    }

    fn make_leaf(&self, tree: &mut RegressionTree, id: NodeId, impurity: f64, samples: Vec<SampleIndex>) -> Result<()> {
        let distribution = MultivariateGaussian::fit(self.labels, &samples)?;
        tree.insert_node(TreeNode::new_leaf(id, impurity, distribution, samples))?;
        Ok(())
    }
}

impl<'a> TreeLearner for SerialTreeLearner<'a> {
    fn train<R: Rng>(&self, tree: &mut RegressionTree, bag: &[SampleIndex], rng: &mut R) -> Result<()> {
        self.check_inputs(tree, bag)?;
        log::info!(
            "Training tree {} on {} samples (max_depth={}, min_sample_count={}, impurity={})",
            tree.id(),
            bag.len(),
            tree.max_depth(),
            tree.min_sample_count(),
            self.finder.evaluator().measure()
        );

        let evaluator = *self.finder.evaluator();
        let mut stack = vec![PendingNode {
            id: node_id::ROOT,
            samples: bag.to_vec(),
        }];

        while let Some(PendingNode { id, samples }) = stack.pop() {
            let depth = node_id::depth(id);
            let impurity = evaluator.impurity(self.labels, &samples)?;

            if depth >= tree.max_depth() || samples.len() <= tree.min_sample_count() {
                self.make_leaf(tree, id, impurity, samples)?;
                continue;
            }

            let split = self
                .finder
                .find_best_split(self.features, self.labels, &samples, impurity, rng)?;
            match split {
                Some(split) => {
                    log::debug!(
                        "node {}: split x[{}] <= {} (gain {}, {} / {} samples)",
                        id,
                        split.rule.dim,
                        split.rule.threshold,
                        split.score,
                        split.left_samples.len(),
                        split.right_samples.len()
                    );
                    tree.insert_node(TreeNode::new_internal(id, split.rule, split.score))?;
                    stack.push(PendingNode {
                        id: node_id::right_child(id),
                        samples: split.right_samples,
                    });
                    stack.push(PendingNode {
                        id: node_id::left_child(id),
                        samples: split.left_samples,
                    });
                }
                None => {
                    log::debug!("node {}: no valid split among {} samples, forced leaf", id, samples.len());
                    self.make_leaf(tree, id, impurity, samples)?;
                }
            }
        }

        log::info!(
            "Finished tree {}: {} nodes, {} leaves, depth {}",
            tree.id(),
            tree.n_nodes(),
            tree.n_leaves(),
            tree.depth()
        );
        Ok(())
    }
}
