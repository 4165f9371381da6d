//! Tree learning algorithms.
//!
//! Only a serial learner exists: a single tree is always grown on one thread.
//! Independent trees may be trained concurrently by the caller.

pub mod serial;

pub use serial::{LearnerConfig, SerialTreeLearner};

use crate::core::error::Result;
use crate::core::types::SampleIndex;
use crate::tree::tree::RegressionTree;
use rand::Rng;

/// Grows a regression tree from a bootstrap sample.
pub trait TreeLearner {
    /// Populates the empty `tree` from the rows listed in `bag`.
    fn train<R: Rng>(&self, tree: &mut RegressionTree, bag: &[SampleIndex], rng: &mut R) -> Result<()>;
}
