//! Random draws used by the split search.
//!
//! All helpers take the random source explicitly so that training is
//! reproducible whenever the caller seeds it.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

/// Create the random source for a training run.
///
/// A fixed seed gives reproducible trees; `None` draws the seed from entropy.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Pick `n_trials` dimensions out of `0..n_dims`.
///
/// Draws without replacement while `n_trials <= n_dims`; asking for more
/// trials than there are dimensions returns every dimension once followed by
/// uniformly drawn duplicates.
pub fn sample_dimensions<R: Rng>(rng: &mut R, n_dims: usize, n_trials: usize) -> Vec<usize> {
    if n_dims == 0 || n_trials == 0 {
        return Vec::new();
    }

    let unique = n_trials.min(n_dims);
    let mut dims = index::sample(rng, n_dims, unique).into_vec();
    dims.extend((unique..n_trials).map(|_| rng.gen_range(0..n_dims)));
    dims
}

/// Draw a threshold uniformly in `[lower, upper)`.
///
/// Returns `None` when the interval is empty, i.e. all observed values of the
/// dimension are identical and no threshold can separate them.
pub fn uniform_threshold<R: Rng>(rng: &mut R, lower: f64, upper: f64) -> Option<f64> {
    if !(lower < upper) || !lower.is_finite() || !upper.is_finite() {
        return None;
    }
    if !(upper - lower).is_finite() {
        // span overflows; the sampler needs a finite width
        return Some(lower / 2.0 + upper / 2.0);
    }
    Some(rng.gen_range(lower..upper))
}
