//! Split finding and evaluation.
//!
//! The evaluator turns a set of label rows into a scalar impurity and scores
//! candidate partitions; the finder draws the random candidates and keeps the
//! best one.

pub mod evaluator;
pub mod finder;

pub use evaluator::ImpurityEvaluator;
pub use finder::{SplitFinder, SplitFinderConfig, SplitInfo};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ImpurityMeasure;
    use crate::core::utils::random::rng_from_seed;
    use ndarray::array;

    #[test]
    fn test_split_workflow() {
        let features = array![[0.0, 1.0], [1.0, 1.0], [2.0, 1.0], [3.0, 1.0]];
        let labels = array![[0.0, 0.0], [0.0, 0.5], [8.0, 8.0], [8.0, 8.5]];
        let samples = [0, 1, 2, 3];

        let evaluator = ImpurityEvaluator::new(ImpurityMeasure::Trace, 0.0);
        let parent = evaluator.impurity(labels.view(), &samples).unwrap();
        let finder = SplitFinder::new(
            SplitFinderConfig {
                n_dim_trials: 2,
                n_thresh_trials: 60,
            },
            evaluator,
        );

        let mut rng = rng_from_seed(Some(42));
        let split = finder
            .find_best_split(features.view(), labels.view(), &samples, parent, &mut rng)
            .unwrap()
            .unwrap();

        // dimension 1 is constant and can never win
        assert_eq!(split.rule.dim, 0);
        assert_eq!(split.left_samples, vec![0, 1]);
        assert!(split.score > 0.0 && split.score <= parent);
    }
}
