//! Core infrastructure module.
//!
//! Fundamental identifiers, constants, the crate error type and the small
//! utilities (binary codec primitives, random sampling helpers) that the tree
//! and its serialization build on.
//!
//! ```rust
//! use regforest::core::{
//!     constants::MAX_TREE_DEPTH,
//!     error::{RegForestError, Result},
//!     types::{node_id, NodeId},
//! };
//!
//! let child: NodeId = node_id::left_child(node_id::ROOT);
//! assert_eq!(node_id::depth(child), 1);
//! assert!(MAX_TREE_DEPTH >= 1);
//! let _err = RegForestError::invalid_state("no root");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod constants;
pub mod error;
pub mod types;
pub mod utils;

pub use constants::*;
pub use error::{RegForestError, Result};
pub use types::*;

/// Version of the crate
pub const CORE_MODULE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the `env_logger` backend for the `log` facade.
///
/// Uses `RUST_LOG` when set and falls back to `info`. Calling it more than
/// once, or after another logger was installed, is harmless.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env).try_init().is_ok() {
        log::debug!("regforest {} logging initialized", CORE_MODULE_VERSION);
    }
}
