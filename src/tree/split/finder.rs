//! Randomized split search.
//!
//! For each node the finder draws a handful of input dimensions and, for each
//! of them, a handful of thresholds uniformly inside the range the node's
//! samples span on that dimension. Every `(dimension, threshold)` pair is
//! scored by its impurity decrease and the best one wins.

use crate::core::error::Result;
use crate::core::types::{FeatureIndex, SampleIndex};
use crate::core::utils::random::{sample_dimensions, uniform_threshold};
use crate::tree::node::SplitRule;
use crate::tree::split::evaluator::ImpurityEvaluator;
use ndarray::ArrayView2;
use rand::Rng;

/// Search breadth of the randomized split finder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitFinderConfig {
    /// Number of input dimensions drawn per node
    pub n_dim_trials: usize,
    /// Number of thresholds drawn per dimension
    pub n_thresh_trials: usize,
}

/// Best split found for a node, together with the sample partition it induces.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitInfo {
    pub rule: SplitRule,
    /// Impurity decrease achieved by the split
    pub score: f64,
    pub left_samples: Vec<SampleIndex>,
    pub right_samples: Vec<SampleIndex>,
}

/// Randomized split finder.
#[derive(Debug, Clone)]
pub struct SplitFinder {
    config: SplitFinderConfig,
    evaluator: ImpurityEvaluator,
}

impl SplitFinder {
    pub fn new(config: SplitFinderConfig, evaluator: ImpurityEvaluator) -> Self {
        SplitFinder { config, evaluator }
    }

    pub fn config(&self) -> &SplitFinderConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &ImpurityEvaluator {
        &self.evaluator
    }

    /// Finds the best of the randomly drawn candidate splits for `samples`.
    ///
    /// Returns `None` when no candidate leaves both sides non-empty, e.g. when
    /// every drawn dimension is constant over the samples.
    pub fn find_best_split<R: Rng>(
        &self,
        features: ArrayView2<f64>,
        labels: ArrayView2<f64>,
        samples: &[SampleIndex],
        parent_impurity: f64,
        rng: &mut R,
    ) -> Result<Option<SplitInfo>> {
        if samples.len() < 2 {
            return Ok(None);
        }

        let dims = sample_dimensions(rng, features.ncols(), self.config.n_dim_trials);
        let mut best: Option<SplitInfo> = None;
        let mut left = Vec::with_capacity(samples.len());
        let mut right = Vec::with_capacity(samples.len());

        for dim in dims {
            let range = value_range(features, samples, dim);

            for _ in 0..self.config.n_thresh_trials {
                let threshold = match range.draw_threshold(rng) {
                    Some(t) => t,
                    // constant dimension, no threshold separates anything
                    None => break,
                };

                left.clear();
                right.clear();
                for &sample in samples {
                    if features[[sample, dim]] <= threshold {
                        left.push(sample);
                    } else {
                        right.push(sample);
                    }
                }
                if left.is_empty() || right.is_empty() {
                    continue;
                }

                let score = self.evaluator.score(
                    parent_impurity,
                    left.len(),
                    self.evaluator.impurity(labels, &left)?,
                    right.len(),
                    self.evaluator.impurity(labels, &right)?,
                );

                let improves = match &best {
                    None => true,
                    Some(current) => score > current.score,
                };
                if improves {
                    best = Some(SplitInfo {
                        rule: SplitRule::new(dim, threshold),
                        score,
                        left_samples: left.clone(),
                        right_samples: right.clone(),
                    });
                }
            }
        }

        Ok(best)
    }
}

/// Spread of a feature column over a node's samples.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ValueRange {
    /// Smallest finite value, `+inf` when there is none
    lower: f64,
    /// Largest finite value, `-inf` when there is none
    upper: f64,
    has_neg_inf: bool,
    has_pos_inf: bool,
}

impl ValueRange {
    /// Draws a threshold uniformly between the finite extremes.
    ///
    /// When the finite values are all equal but an infinite value lies beside
    /// them, the threshold that separates the two is returned instead.
    fn draw_threshold<R: Rng>(&self, rng: &mut R) -> Option<f64> {
        if let Some(threshold) = uniform_threshold(rng, self.lower, self.upper) {
            return Some(threshold);
        }
        let has_finite = self.lower <= self.upper;
        match (has_finite, self.has_neg_inf, self.has_pos_inf) {
            (true, _, true) => Some(self.upper),
            (true, true, false) => Some(f64::MIN),
            (false, true, true) => Some(0.0),
            _ => None,
        }
    }
}

/// Finite extremes of a feature column over the given samples.
///
/// NaN values are ignored; infinite values are only flagged so a single
/// outlier does not widen the sampling interval.
fn value_range(features: ArrayView2<f64>, samples: &[SampleIndex], dim: FeatureIndex) -> ValueRange {
    let mut range = ValueRange {
        lower: f64::INFINITY,
        upper: f64::NEG_INFINITY,
        has_neg_inf: false,
        has_pos_inf: false,
    };
    for &sample in samples {
        let value = features[[sample, dim]];
        if value.is_finite() {
            range.lower = range.lower.min(value);
            range.upper = range.upper.max(value);
        } else if value == f64::NEG_INFINITY {
            range.has_neg_inf = true;
        } else if value == f64::INFINITY {
            range.has_pos_inf = true;
        }
    }
    range
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ImpurityMeasure;
    use crate::core::utils::random::rng_from_seed;
    use ndarray::array;

    fn finder(n_dim_trials: usize, n_thresh_trials: usize) -> SplitFinder {
        SplitFinder::new(
            SplitFinderConfig {
                n_dim_trials,
                n_thresh_trials,
            },
            ImpurityEvaluator::new(ImpurityMeasure::Trace, 0.0),
        )
    }

    #[test]
    fn test_finds_separating_split() {
        // dimension 1 is noise, dimension 0 separates the labels
        let features = array![[0.0, 5.0], [0.1, 1.0], [0.2, 3.0], [10.0, 2.0], [10.1, 4.0], [10.2, 0.0]];
        let labels = array![[1.0], [1.0], [1.0], [9.0], [9.0], [9.0]];
        let samples: Vec<usize> = (0..6).collect();
        let f = finder(2, 50);
        let parent = f.evaluator().impurity(labels.view(), &samples).unwrap();

        let mut rng = rng_from_seed(Some(3));
        let best = f
            .find_best_split(features.view(), labels.view(), &samples, parent, &mut rng)
            .unwrap()
            .unwrap();

        assert_eq!(best.rule.dim, 0);
        assert!(best.rule.threshold >= 0.2 && best.rule.threshold < 10.0);
        assert_eq!(best.left_samples, vec![0, 1, 2]);
        assert_eq!(best.right_samples, vec![3, 4, 5]);
        assert!((best.score - parent).abs() < 1e-12);
    }

    #[test]
    fn test_constant_features_have_no_split() {
        let features = array![[1.0, 2.0], [1.0, 2.0], [1.0, 2.0]];
        let labels = array![[0.0], [5.0], [9.0]];
        let f = finder(2, 10);
        let mut rng = rng_from_seed(Some(1));
        let best = f
            .find_best_split(features.view(), labels.view(), &[0, 1, 2], 10.0, &mut rng)
            .unwrap();
        assert!(best.is_none());
    }

    #[test]
    fn test_single_sample_has_no_split() {
        let features = array![[1.0], [2.0]];
        let labels = array![[0.0], [5.0]];
        let mut rng = rng_from_seed(Some(1));
        let best = finder(1, 10)
            .find_best_split(features.view(), labels.view(), &[1], 0.0, &mut rng)
            .unwrap();
        assert!(best.is_none());
    }

    #[test]
    fn test_partition_covers_samples() {
        let features = array![[3.0], [1.0], [2.0], [5.0], [4.0]];
        let labels = array![[3.0], [1.0], [2.0], [5.0], [4.0]];
        let samples = vec![4, 0, 2, 1, 3];
        let mut rng = rng_from_seed(Some(11));
        let best = finder(1, 5)
            .find_best_split(features.view(), labels.view(), &samples, 2.0, &mut rng)
            .unwrap()
            .unwrap();

        let mut all: Vec<_> = best.left_samples.iter().chain(&best.right_samples).copied().collect();
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3, 4]);
        assert!(best
            .left_samples
            .iter()
            .all(|&s| features[[s, 0]] <= best.rule.threshold));
        assert!(best
            .right_samples
            .iter()
            .all(|&s| features[[s, 0]] > best.rule.threshold));
    }

    #[test]
    fn test_value_range_ignores_nan() {
        let features = array![[f64::NAN], [2.0], [-1.0]];
        let range = value_range(features.view(), &[0, 1, 2], 0);
        assert_eq!((range.lower, range.upper), (-1.0, 2.0));
        let empty = value_range(features.view(), &[0], 0);
        assert_eq!((empty.lower, empty.upper), (f64::INFINITY, f64::NEG_INFINITY));
        let mut rng = rng_from_seed(Some(1));
        assert_eq!(empty.draw_threshold(&mut rng), None);
    }

    #[test]
    fn test_value_range_flags_infinities() {
        let features = array![[f64::NEG_INFINITY], [0.0], [11.0], [f64::INFINITY]];
        let range = value_range(features.view(), &[0, 1, 2, 3], 0);
        assert_eq!((range.lower, range.upper), (0.0, 11.0));
        assert!(range.has_neg_inf && range.has_pos_inf);
    }

    #[test]
    fn test_infinite_value_does_not_block_split() {
        let features = array![[f64::NEG_INFINITY], [0.0], [1.0], [10.0], [11.0]];
        let labels = array![[0.0], [0.0], [0.0], [10.0], [10.0]];
        let samples: Vec<usize> = (0..5).collect();
        let f = finder(1, 50);
        let parent = f.evaluator().impurity(labels.view(), &samples).unwrap();

        let mut rng = rng_from_seed(Some(9));
        let best = f
            .find_best_split(features.view(), labels.view(), &samples, parent, &mut rng)
            .unwrap()
            .unwrap();
        assert!(best.rule.threshold >= 1.0 && best.rule.threshold < 10.0);
        assert_eq!(best.left_samples, vec![0, 1, 2]);
        assert_eq!(best.right_samples, vec![3, 4]);
    }

    #[test]
    fn test_constant_finite_values_split_from_infinity() {
        let features = array![[2.0], [2.0], [f64::INFINITY]];
        let labels = array![[0.0], [0.0], [5.0]];
        let mut rng = rng_from_seed(Some(4));
        let best = finder(1, 3)
            .find_best_split(features.view(), labels.view(), &[0, 1, 2], 10.0, &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(best.rule.threshold, 2.0);
        assert_eq!(best.right_samples, vec![2]);

        let features = array![[f64::NEG_INFINITY], [2.0], [2.0]];
        let best = finder(1, 3)
            .find_best_split(features.view(), labels.view(), &[0, 1, 2], 10.0, &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(best.left_samples, vec![0]);
    }
}
