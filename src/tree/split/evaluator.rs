//! Impurity computation and split scoring.

use crate::core::error::Result;
use crate::core::types::{ImpurityMeasure, SampleIndex};
use crate::distribution::MultivariateGaussian;
use ndarray::ArrayView2;

/// Measures label dispersion of sample sets and scores candidate splits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpurityEvaluator {
    measure: ImpurityMeasure,
    regularization: f64,
}

impl ImpurityEvaluator {
    pub fn new(measure: ImpurityMeasure, regularization: f64) -> Self {
        ImpurityEvaluator {
            measure,
            regularization,
        }
    }

    pub fn measure(&self) -> ImpurityMeasure {
        self.measure
    }

    pub fn regularization(&self) -> f64 {
        self.regularization
    }

    /// Impurity of the label rows selected by `samples`.
    ///
    /// An empty sample set has zero impurity.
    pub fn impurity(&self, labels: ArrayView2<f64>, samples: &[SampleIndex]) -> Result<f64> {
        if samples.is_empty() {
            return Ok(0.0);
        }
        match self.measure {
            ImpurityMeasure::Trace => Ok(total_variance(labels, samples)),
            ImpurityMeasure::LogDeterminant => {
                let fitted = MultivariateGaussian::fit(labels, samples)?;
                Ok(fitted.log_determinant(self.regularization))
            }
        }
    }

    /// Impurity decrease of a split: the parent impurity minus the
    /// sample-weighted mean of the child impurities.
    pub fn score(
        &self,
        parent_impurity: f64,
        n_left: usize,
        left_impurity: f64,
        n_right: usize,
        right_impurity: f64,
    ) -> f64 {
        let n = (n_left + n_right) as f64;
        if n == 0.0 {
            return f64::NEG_INFINITY;
        }
        let weighted = (n_left as f64 * left_impurity + n_right as f64 * right_impurity) / n;
        let score = parent_impurity - weighted;
        if score.is_nan() {
            f64::NEG_INFINITY
        } else {
            score
        }
    }
}

/// Sum of per-output variances without materializing the covariance.
fn total_variance(labels: ArrayView2<f64>, samples: &[SampleIndex]) -> f64 {
    let n = samples.len() as f64;
    let mut total = 0.0;
    for column in labels.columns() {
        let mean = samples.iter().map(|&i| column[i]).sum::<f64>() / n;
        total += samples
            .iter()
            .map(|&i| {
                let d = column[i] - mean;
                d * d
            })
            .sum::<f64>()
            / n;
    }
    total
}
