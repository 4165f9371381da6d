//! Configuration management for regression tree training.
//!
//! Provides the type-checked [`TreeConfig`], its fluent builder and the file
//! and environment loaders.

pub mod core;

pub use self::core::{TreeConfig, TreeConfigBuilder};
