//! Tree configuration structure and builder.
//!
//! [`TreeConfig`] carries every hyperparameter of a single regression tree
//! together with the split-search breadth and the random seed used to train
//! it. It can be loaded from JSON or TOML files and overridden through
//! `REGFOREST_*` environment variables.

use crate::core::constants::*;
use crate::core::error::{RegForestError, Result};
use crate::core::types::ImpurityMeasure;
use crate::core::utils::random::rng_from_seed;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hyperparameters for building one regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Maximum tree depth (the root has depth 0)
    pub max_depth: usize,
    /// Nodes with this many samples or fewer become leaves
    pub min_sample_count: usize,
    /// Number of random input dimensions tried per node
    pub n_dim_trials: usize,
    /// Number of random thresholds tried per dimension
    pub n_thresh_trials: usize,
    /// Label dispersion statistic minimized by the split search
    pub impurity: ImpurityMeasure,
    /// Ridge added to covariance diagonals before factorization
    pub covariance_regularization: f64,
    /// Seed for the split search; `None` draws from entropy
    pub random_seed: Option<u64>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            max_depth: DEFAULT_MAX_DEPTH,
            min_sample_count: DEFAULT_MIN_SAMPLE_COUNT,
            n_dim_trials: DEFAULT_N_DIM_TRIALS,
            n_thresh_trials: DEFAULT_N_THRESH_TRIALS,
            impurity: DEFAULT_IMPURITY,
            covariance_regularization: DEFAULT_COVARIANCE_REGULARIZATION,
            random_seed: None,
        }
    }
}

impl TreeConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_depth > MAX_TREE_DEPTH {
            return Err(RegForestError::invalid_parameter(
                "max_depth",
                self.max_depth.to_string(),
                format!("must be at most {}", MAX_TREE_DEPTH),
            ));
        }

        if self.min_sample_count < 1 {
            return Err(RegForestError::invalid_parameter(
                "min_sample_count",
                self.min_sample_count.to_string(),
                "must be at least 1",
            ));
        }

        if self.n_dim_trials < 1 {
            return Err(RegForestError::invalid_parameter(
                "n_dim_trials",
                self.n_dim_trials.to_string(),
                "must be at least 1",
            ));
        }

        if self.n_thresh_trials < 1 {
            return Err(RegForestError::invalid_parameter(
                "n_thresh_trials",
                self.n_thresh_trials.to_string(),
                "must be at least 1",
            ));
        }

        if !self.covariance_regularization.is_finite() || self.covariance_regularization < 0.0 {
            return Err(RegForestError::invalid_parameter(
                "covariance_regularization",
                self.covariance_regularization.to_string(),
                "must be finite and non-negative",
            ));
        }

        if self.impurity == ImpurityMeasure::LogDeterminant && self.covariance_regularization == 0.0 {
            return Err(RegForestError::invalid_parameter(
                "covariance_regularization",
                "0",
                "must be positive with the log_determinant impurity",
            ));
        }

        Ok(())
    }

    /// Warn about settings that are valid but likely unintended for the
    /// given input dimensionality.
    pub fn check_against_inputs(&self, n_dim_in: usize) {
        if self.n_dim_trials > n_dim_in {
            log::warn!(
                "n_dim_trials ({}) exceeds input dimensionality ({}); dimensions will be retried",
                self.n_dim_trials,
                n_dim_in
            );
        }
    }

    /// Random source for a training run.
    pub fn rng(&self) -> StdRng {
        rng_from_seed(self.random_seed)
    }

    /// Load configuration from a `.json` or `.toml` file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RegForestError::config(format!("Failed to read config file: {}", e)))?;

        let config: TreeConfig = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| RegForestError::config(format!("Failed to parse JSON config: {}", e)))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| RegForestError::config(format!("Failed to parse TOML config: {}", e)))?,
            _ => {
                return Err(RegForestError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        config.validate()?;
        log::info!("Loaded tree configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a `.json` or `.toml` file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)
                .map_err(|e| RegForestError::config(format!("Failed to serialize to JSON: {}", e)))?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| RegForestError::config(format!("Failed to serialize to TOML: {}", e)))?,
            _ => {
                return Err(RegForestError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        std::fs::write(path, content)
            .map_err(|e| RegForestError::config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Apply `REGFOREST_*` environment variable overrides
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Keys are the upper-cased field names with the `REGFOREST_` prefix,
    /// e.g. `REGFOREST_MAX_DEPTH`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
            value
                .trim()
                .parse()
                .map_err(|_| RegForestError::config(format!("Invalid {}: '{}'", key, value)))
        }

        let key = |name: &str| format!("{}{}", ENV_PREFIX, name);

        if let Some(val) = lookup(&key("MAX_DEPTH")) {
            self.max_depth = parsed(&key("MAX_DEPTH"), &val)?;
        }
        if let Some(val) = lookup(&key("MIN_SAMPLE_COUNT")) {
            self.min_sample_count = parsed(&key("MIN_SAMPLE_COUNT"), &val)?;
        }
        if let Some(val) = lookup(&key("N_DIM_TRIALS")) {
            self.n_dim_trials = parsed(&key("N_DIM_TRIALS"), &val)?;
        }
        if let Some(val) = lookup(&key("N_THRESH_TRIALS")) {
            self.n_thresh_trials = parsed(&key("N_THRESH_TRIALS"), &val)?;
        }
        if let Some(val) = lookup(&key("IMPURITY")) {
            self.impurity = val
                .parse()
                .map_err(|e: String| RegForestError::config(format!("Invalid {}: {}", key("IMPURITY"), e)))?;
        }
        if let Some(val) = lookup(&key("COVARIANCE_REGULARIZATION")) {
            self.covariance_regularization = parsed(&key("COVARIANCE_REGULARIZATION"), &val)?;
        }
        if let Some(val) = lookup(&key("RANDOM_SEED")) {
            self.random_seed = Some(parsed(&key("RANDOM_SEED"), &val)?);
        }

        self.validate()
    }
}

/// Fluent builder for [`TreeConfig`].
#[derive(Debug, Clone, Default)]
pub struct TreeConfigBuilder {
    config: TreeConfig,
    validation_errors: Vec<String>,
}

impl TreeConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum tree depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        if depth > MAX_TREE_DEPTH {
            self.validation_errors
                .push(format!("max_depth must be at most {}", MAX_TREE_DEPTH));
        }
        self.config.max_depth = depth;
        self
    }

    /// Set the minimum sample count for splitting
    pub fn min_sample_count(mut self, count: usize) -> Self {
        if count < 1 {
            self.validation_errors
                .push("min_sample_count must be at least 1".to_string());
        }
        self.config.min_sample_count = count;
        self
    }

    /// Set the number of dimensions tried per node
    pub fn n_dim_trials(mut self, trials: usize) -> Self {
        if trials < 1 {
            self.validation_errors
                .push("n_dim_trials must be at least 1".to_string());
        }
        self.config.n_dim_trials = trials;
        self
    }

    /// Set the number of thresholds tried per dimension
    pub fn n_thresh_trials(mut self, trials: usize) -> Self {
        if trials < 1 {
            self.validation_errors
                .push("n_thresh_trials must be at least 1".to_string());
        }
        self.config.n_thresh_trials = trials;
        self
    }

    pub fn impurity(mut self, impurity: ImpurityMeasure) -> Self {
        self.config.impurity = impurity;
        self
    }

    pub fn covariance_regularization(mut self, ridge: f64) -> Self {
        self.config.covariance_regularization = ridge;
        self
    }

    /// Fix the random seed
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = Some(seed);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<TreeConfig> {
        if !self.validation_errors.is_empty() {
            return Err(RegForestError::config(self.validation_errors.join("; ")));
        }
        self.config.validate()?;
        Ok(self.config)
    }
}
