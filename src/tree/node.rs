//! Tree node representation.
//!
//! A node is either an internal split node or a leaf holding the fitted
//! label distribution and the training rows that ended there. Node ids follow
//! complete-binary-tree indexing, so the id alone fixes a node's depth and its
//! position under its parent; child links are arena handles filled in when the
//! children are inserted.

use crate::core::constants::{LEAF_SPLIT_DIM_SENTINEL, LEAF_SPLIT_THRESH_SENTINEL};
use crate::core::types::{node_id, ChildSide, FeatureIndex, NodeHandle, NodeId, SampleIndex};
use crate::distribution::MultivariateGaussian;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned split: `x[dim] <= threshold` goes left, everything else right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRule {
    pub dim: FeatureIndex,
    pub threshold: f64,
}

impl SplitRule {
    pub fn new(dim: FeatureIndex, threshold: f64) -> Self {
        SplitRule { dim, threshold }
    }

    /// Side a feature vector is routed to.
    #[inline]
    pub fn side(&self, features: &ArrayView1<f64>) -> ChildSide {
        if features[self.dim] <= self.threshold {
            ChildSide::Left
        } else {
            ChildSide::Right
        }
    }
}

/// Leaf payload: fitted distribution plus the rows it was fitted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafData {
    pub distribution: MultivariateGaussian,
    pub samples: Vec<SampleIndex>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum NodeKind {
    Internal {
        split: SplitRule,
        #[serde(skip)]
        left: Option<NodeHandle>,
        #[serde(skip)]
        right: Option<NodeHandle>,
    },
    Leaf(LeafData),
}

/// A single vertex of a regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    id: NodeId,
    /// Impurity decrease of the split for internal nodes, label dispersion
    /// for leaves
    impurity: f64,
    kind: NodeKind,
}

impl TreeNode {
    /// Creates a split node without children attached yet.
    pub fn new_internal(id: NodeId, split: SplitRule, impurity: f64) -> Self {
        TreeNode {
            id,
            impurity,
            kind: NodeKind::Internal {
                split,
                left: None,
                right: None,
            },
        }
    }

    /// Creates a leaf node.
    pub fn new_leaf(
        id: NodeId,
        impurity: f64,
        distribution: MultivariateGaussian,
        samples: Vec<SampleIndex>,
    ) -> Self {
        TreeNode {
            id,
            impurity,
            kind: NodeKind::Leaf(LeafData {
                distribution,
                samples,
            }),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Depth implied by the node id (the root has depth 0).
    pub fn depth(&self) -> usize {
        node_id::depth(self.id)
    }

    pub fn impurity(&self) -> f64 {
        self.impurity
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// Split rule of an internal node.
    pub fn split(&self) -> Option<&SplitRule> {
        match &self.kind {
            NodeKind::Internal { split, .. } => Some(split),
            NodeKind::Leaf(_) => None,
        }
    }

    pub fn split_dim(&self) -> Option<FeatureIndex> {
        self.split().map(|s| s.dim)
    }

    pub fn split_threshold(&self) -> Option<f64> {
        self.split().map(|s| s.threshold)
    }

    /// Arena handle of the left child.
    pub fn left_child(&self) -> Option<NodeHandle> {
        match self.kind {
            NodeKind::Internal { left, .. } => left,
            NodeKind::Leaf(_) => None,
        }
    }

    /// Arena handle of the right child.
    pub fn right_child(&self) -> Option<NodeHandle> {
        match self.kind {
            NodeKind::Internal { right, .. } => right,
            NodeKind::Leaf(_) => None,
        }
    }

    /// Arena handle of the child on `side`.
    pub fn child(&self, side: ChildSide) -> Option<NodeHandle> {
        match side {
            ChildSide::Left => self.left_child(),
            ChildSide::Right => self.right_child(),
        }
    }

    pub fn leaf(&self) -> Option<&LeafData> {
        match &self.kind {
            NodeKind::Leaf(data) => Some(data),
            NodeKind::Internal { .. } => None,
        }
    }

    /// Fitted label distribution of a leaf.
    pub fn distribution(&self) -> Option<&MultivariateGaussian> {
        self.leaf().map(|l| &l.distribution)
    }

    /// Training rows that terminated in a leaf.
    pub fn samples(&self) -> Option<&[SampleIndex]> {
        self.leaf().map(|l| l.samples.as_slice())
    }

    /// Records `handle` as the child on `side`.
    ///
    /// Returns false for leaves, which cannot have children.
    pub(crate) fn attach_child(&mut self, side: ChildSide, handle: NodeHandle) -> bool {
        match &mut self.kind {
            NodeKind::Internal { left, right, .. } => {
                match side {
                    ChildSide::Left => *left = Some(handle),
                    ChildSide::Right => *right = Some(handle),
                }
                true
            }
            NodeKind::Leaf(_) => false,
        }
    }

    /// Flat record of this node, without arena links.
    pub fn to_record(&self) -> NodeRecord {
        match &self.kind {
            NodeKind::Internal { split, .. } => NodeRecord::internal(self.id, split.dim, split.threshold, self.impurity),
            NodeKind::Leaf(data) => NodeRecord::leaf(
                self.id,
                self.impurity,
                data.distribution.clone(),
                data.samples.clone(),
            ),
        }
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Internal { split, .. } => write!(
                f,
                "Internal(id={}, x[{}] <= {:.6}, gain={:.6})",
                self.id, split.dim, split.threshold, self.impurity
            ),
            NodeKind::Leaf(data) => write!(
                f,
                "Leaf(id={}, samples={}, impurity={:.6}, {})",
                self.id,
                data.samples.len(),
                self.impurity,
                data.distribution
            ),
        }
    }
}

/// Flat, link-free description of one node as stored on disk.
///
/// `leaf` must be present exactly when `is_leaf` is set; the tree rejects
/// records where the flag and the payload disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub id: NodeId,
    pub is_leaf: bool,
    /// `LEAF_SPLIT_DIM_SENTINEL` for leaves
    pub split_dim: i32,
    pub split_thresh: f64,
    pub impurity: f64,
    pub leaf: Option<LeafData>,
}

impl NodeRecord {
    pub fn internal(id: NodeId, split_dim: FeatureIndex, split_thresh: f64, impurity: f64) -> Self {
        NodeRecord {
            id,
            is_leaf: false,
            split_dim: split_dim as i32,
            split_thresh,
            impurity,
            leaf: None,
        }
    }

    pub fn leaf(
        id: NodeId,
        impurity: f64,
        distribution: MultivariateGaussian,
        samples: Vec<SampleIndex>,
    ) -> Self {
        NodeRecord {
            id,
            is_leaf: true,
            split_dim: LEAF_SPLIT_DIM_SENTINEL,
            split_thresh: LEAF_SPLIT_THRESH_SENTINEL,
            impurity,
            leaf: Some(LeafData {
                distribution,
                samples,
            }),
        }
    }
}
