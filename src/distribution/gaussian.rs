//! Multivariate Gaussian fitted to the label rows of a leaf.

use crate::core::error::{RegForestError, Result};
use crate::core::types::{ImpurityMeasure, SampleIndex};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Multivariate normal distribution over the label space.
///
/// The covariance is the maximum-likelihood estimate (normalized by the
/// sample count), so a leaf holding a single sample has a zero covariance.
/// Operations that need an invertible matrix add a caller-chosen ridge to the
/// diagonal first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultivariateGaussian {
    mean: Array1<f64>,
    covariance: Array2<f64>,
}

impl MultivariateGaussian {
    /// Fit mean and covariance over the given rows of `labels`.
    pub fn fit(labels: ArrayView2<f64>, rows: &[SampleIndex]) -> Result<Self> {
        if rows.is_empty() {
            return Err(RegForestError::invalid_parameter(
                "rows",
                "[]",
                "cannot fit a distribution to an empty sample set",
            ));
        }
        if let Some(&row) = rows.iter().find(|&&r| r >= labels.nrows()) {
            return Err(RegForestError::invalid_parameter(
                "rows",
                row.to_string(),
                format!("row index out of range for {} label rows", labels.nrows()),
            ));
        }

        let selected = labels.select(Axis(0), rows);
        let n = rows.len() as f64;
        let mean = selected.sum_axis(Axis(0)) / n;
        let centered = &selected - &mean;
        let covariance = centered.t().dot(&centered) / n;

        Ok(MultivariateGaussian { mean, covariance })
    }

    /// Build a distribution from stored parameters.
    ///
    /// `covariance` is the row-major flattening of a `mean.len()` square matrix.
    pub fn from_parts(mean: Vec<f64>, covariance: Vec<f64>) -> Result<Self> {
        let dim = mean.len();
        if covariance.len() != dim * dim {
            return Err(RegForestError::dimension_mismatch(
                format!("{} covariance entries", dim * dim),
                format!("{}", covariance.len()),
            ));
        }
        let covariance = Array2::from_shape_vec((dim, dim), covariance)
            .map_err(|e| RegForestError::dimension_mismatch(format!("{}x{}", dim, dim), e.to_string()))?;
        Ok(MultivariateGaussian {
            mean: Array1::from_vec(mean),
            covariance,
        })
    }

    /// Output dimensionality.
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }

    /// Per-output variances (the covariance diagonal).
    pub fn variances(&self) -> Array1<f64> {
        self.covariance.diag().to_owned()
    }

    /// Total variance.
    pub fn trace(&self) -> f64 {
        self.covariance.diag().sum()
    }

    /// `ln det(covariance + regularization * I)`.
    ///
    /// Returns negative infinity when the regularized matrix is still not
    /// positive definite.
    pub fn log_determinant(&self, regularization: f64) -> f64 {
        match cholesky(&self.regularized(regularization)) {
            Some(l) => 2.0 * l.diag().iter().map(|v| v.ln()).sum::<f64>(),
            None => f64::NEG_INFINITY,
        }
    }

    /// Dispersion statistic used as node impurity.
    pub fn impurity(&self, measure: ImpurityMeasure, regularization: f64) -> f64 {
        match measure {
            ImpurityMeasure::Trace => self.trace(),
            ImpurityMeasure::LogDeterminant => self.log_determinant(regularization),
        }
    }

    /// Log-density of `x` under the regularized distribution.
    pub fn log_pdf(&self, x: ArrayView1<f64>, regularization: f64) -> Result<f64> {
        if x.len() != self.dim() {
            return Err(RegForestError::dimension_mismatch(
                format!("{} outputs", self.dim()),
                format!("{} outputs", x.len()),
            ));
        }
        let l = cholesky(&self.regularized(regularization)).ok_or_else(|| {
            RegForestError::invalid_state(
                "covariance is not positive definite; increase the regularization",
            )
        })?;

        let diff = &x - &self.mean;
        let z = forward_substitute(&l, diff.view());
        let mahalanobis = z.dot(&z);
        let log_det = 2.0 * l.diag().iter().map(|v| v.ln()).sum::<f64>();
        let d = self.dim() as f64;

        Ok(-0.5 * (d * (2.0 * PI).ln() + log_det + mahalanobis))
    }

    /// Density of `x` under the regularized distribution.
    pub fn pdf(&self, x: ArrayView1<f64>, regularization: f64) -> Result<f64> {
        self.log_pdf(x, regularization).map(f64::exp)
    }

    fn regularized(&self, regularization: f64) -> Array2<f64> {
        let mut cov = self.covariance.clone();
        cov.diag_mut().mapv_inplace(|v| v + regularization);
        cov
    }
}

impl fmt::Display for MultivariateGaussian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N(mean={:?}, trace={:.6})",
            self.mean.as_slice().unwrap_or(&[]),
            self.trace()
        )
    }
}

/// Lower-triangular Cholesky factor of a symmetric matrix.
fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if !(sum > 0.0) || !sum.is_finite() {
                    return None;
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }
    Some(l)
}

/// Solve `L z = b` for lower-triangular `L`.
fn forward_substitute(l: &Array2<f64>, b: ArrayView1<f64>) -> Array1<f64> {
    let n = b.len();
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * z[k];
        }
        z[i] = sum / l[[i, i]];
    }
    z
}
