//! Tree serialization.
//!
//! Two stream formats carry the same content: a header with the tree id,
//! max depth, node and leaf counts and the input and output dimensionality,
//! followed by one record per node in breadth-first (id) order. The binary
//! form uses fixed-width little-endian fields, the text form whitespace
//! separated values with one node per line. Reading goes through a pre-sized
//! tree and [`RegressionTree::add_node`], so a stream is rejected exactly
//! when the records it carries do not form a valid tree.

pub mod binary;
pub mod text;

pub use binary::{read_binary, write_binary};
pub use text::{read_text, write_text};

use crate::core::error::{RegForestError, Result};
use crate::core::types::TreeId;
use crate::tree::RegressionTree;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerializationFormat {
    /// Fixed-width little-endian records
    Binary,
    /// Whitespace separated records, one node per line
    Text,
    /// JSON document
    Json,
}

impl Default for SerializationFormat {
    fn default() -> Self {
        SerializationFormat::Binary
    }
}

impl SerializationFormat {
    /// Format implied by a file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.parse(),
            None => Err(RegForestError::config(format!(
                "cannot infer a tree format from '{}'",
                path.display()
            ))),
        }
    }
}

impl std::fmt::Display for SerializationFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationFormat::Binary => write!(f, "binary"),
            SerializationFormat::Text => write!(f, "text"),
            SerializationFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for SerializationFormat {
    type Err = RegForestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "binary" | "bin" => Ok(SerializationFormat::Binary),
            "text" | "txt" | "tree" => Ok(SerializationFormat::Text),
            "json" => Ok(SerializationFormat::Json),
            _ => Err(RegForestError::config(format!("Unknown tree format: {}", s))),
        }
    }
}

/// Header fields shared by both stream formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TreeHeader {
    pub id: TreeId,
    pub max_depth: usize,
    pub n_nodes: usize,
    pub n_leaves: usize,
    pub n_dim_in: usize,
    pub n_dim_out: usize,
}

impl TreeHeader {
    pub fn of(tree: &RegressionTree) -> Self {
        TreeHeader {
            id: tree.id(),
            max_depth: tree.max_depth(),
            n_nodes: tree.n_nodes(),
            n_leaves: tree.n_leaves(),
            n_dim_in: tree.n_dim_in(),
            n_dim_out: tree.n_dim_out(),
        }
    }

    /// Pre-sized tree ready to receive the header's node records.
    pub fn presized_tree(&self) -> Result<RegressionTree> {
        RegressionTree::with_capacity(
            self.id,
            self.max_depth,
            self.n_nodes,
            self.n_leaves,
            self.n_dim_in,
            self.n_dim_out,
        )
    }
}

/// Narrows a count or index to the 32-bit wire field.
pub(crate) fn to_wire(value: usize, field: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| RegForestError::stream(format!("{} {} does not fit a 32-bit field", field, value)))
}

/// Widens a 32-bit wire field, rejecting negative values.
pub(crate) fn from_wire(value: i32, field: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| RegForestError::malformed_record(format!("negative {}: {}", field, value)))
}
