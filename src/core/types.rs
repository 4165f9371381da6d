//! Core data types for the regression tree implementation.
//!
//! This module defines the identifiers and small enumerations shared by the
//! tree, its nodes, the split search and the serialization codecs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tree node identifier in complete-binary-tree indexing.
///
/// The root is `0` and the children of node `i` are `2i + 1` and `2i + 2`.
pub type NodeId = u32;

/// Index of a node inside a tree's arena.
pub type NodeHandle = usize;

/// Feature (input dimension) index.
pub type FeatureIndex = usize;

/// Row index into the feature and label matrices.
pub type SampleIndex = usize;

/// Identifier assigned to a tree by its caller.
pub type TreeId = i32;

/// Which side of a split a child hangs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildSide {
    /// Samples with `x[split_dim] <= split_thresh`
    Left,
    /// Samples with `x[split_dim] > split_thresh`
    Right,
}

impl ChildSide {
    /// Side of its parent a node with the given id occupies.
    ///
    /// Returns `None` for the root.
    pub fn of(id: NodeId) -> Option<ChildSide> {
        if id == 0 {
            None
        } else if id % 2 == 1 {
            Some(ChildSide::Left)
        } else {
            Some(ChildSide::Right)
        }
    }
}

impl fmt::Display for ChildSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildSide::Left => write!(f, "left"),
            ChildSide::Right => write!(f, "right"),
        }
    }
}

/// Scalar statistic used to measure the label dispersion of a sample set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpurityMeasure {
    /// Trace of the maximum-likelihood covariance (total variance)
    Trace,
    /// Log-determinant of the regularized covariance
    LogDeterminant,
}

impl Default for ImpurityMeasure {
    fn default() -> Self {
        ImpurityMeasure::Trace
    }
}

impl fmt::Display for ImpurityMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImpurityMeasure::Trace => write!(f, "trace"),
            ImpurityMeasure::LogDeterminant => write!(f, "log_determinant"),
        }
    }
}

impl std::str::FromStr for ImpurityMeasure {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(ImpurityMeasure::Trace),
            "log_determinant" | "logdet" => Ok(ImpurityMeasure::LogDeterminant),
            other => Err(format!("unknown impurity measure '{}'", other)),
        }
    }
}

/// Aggregation used by split-based feature importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportanceType {
    /// Number of internal nodes splitting on the feature
    Split,
    /// Total impurity decrease of the splits on the feature
    Gain,
}

/// Complete-binary-tree id arithmetic.
pub mod node_id {
    use super::NodeId;

    /// Id of the root node.
    pub const ROOT: NodeId = 0;

    /// Id of the left child of `id`.
    #[inline]
    pub fn left_child(id: NodeId) -> NodeId {
        2 * id + 1
    }

    /// Id of the right child of `id`.
    #[inline]
    pub fn right_child(id: NodeId) -> NodeId {
        2 * id + 2
    }

    /// Id of the parent of `id`, `None` for the root.
    #[inline]
    pub fn parent(id: NodeId) -> Option<NodeId> {
        if id == ROOT {
            None
        } else {
            Some((id - 1) / 2)
        }
    }

    /// Depth of `id` (the root has depth 0).
    #[inline]
    pub fn depth(id: NodeId) -> usize {
        // floor(log2(id + 1)), computed on u64 so u32::MAX does not overflow
        (63 - (id as u64 + 1).leading_zeros()) as usize
    }
}
