//! Label distributions stored in tree leaves.

pub mod gaussian;

pub use gaussian::MultivariateGaussian;
