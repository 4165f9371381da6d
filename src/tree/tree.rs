//! Multivariate regression tree.
//!
//! [`RegressionTree`] owns every node in an arena and keeps a non-owning
//! id -> handle index next to it. Nodes enter the arena one at a time, either
//! from the learner during training or from [`RegressionTree::add_node`] while
//! a persisted tree is read back; both paths share the same insertion logic,
//! which links a node to whichever parent and children are already present.

use crate::config::TreeConfig;
use crate::core::constants::{
    DEFAULT_COVARIANCE_REGULARIZATION, DEFAULT_IMPURITY, DEFAULT_MIN_SAMPLE_COUNT, MAX_RESERVED_NODES, MAX_TREE_DEPTH,
};
use crate::core::error::{RegForestError, Result};
use crate::core::types::{
    node_id, ChildSide, FeatureIndex, ImportanceType, ImpurityMeasure, NodeHandle, NodeId,
    SampleIndex, TreeId,
};
use crate::distribution::MultivariateGaussian;
use crate::io::serialization;
use crate::tree::learner::{LearnerConfig, SerialTreeLearner, TreeLearner};
use crate::tree::node::{NodeRecord, SplitRule, TreeNode};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::{BufRead, Read, Write};
use std::path::Path;

/// Binary regression tree with multivariate Gaussian leaves.
///
/// A tree is created either empty and trainable ([`RegressionTree::new`]) or
/// pre-sized for reconstruction ([`RegressionTree::with_capacity`]). Once
/// populated it is read-only for queries.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    id: TreeId,
    max_depth: usize,
    n_dim_in: usize,
    n_dim_out: usize,
    /// Nodes holding this many samples or fewer become leaves
    min_sample_count: usize,
    impurity: ImpurityMeasure,
    covariance_regularization: f64,
    /// Deepest node present
    depth: usize,
    n_nodes: usize,
    n_leaves: usize,
    /// Node and leaf counts announced by a persisted header
    declared: Option<(usize, usize)>,
    nodes: Vec<TreeNode>,
    index: HashMap<NodeId, NodeHandle>,
}

/// JSON document form of a tree.
#[derive(Debug, Serialize, Deserialize)]
struct TreeDocument {
    id: TreeId,
    max_depth: usize,
    n_dim_in: usize,
    n_dim_out: usize,
    min_sample_count: usize,
    impurity: ImpurityMeasure,
    covariance_regularization: f64,
    nodes: Vec<TreeNode>,
}

fn check_shape(max_depth: usize, n_dim_in: usize, n_dim_out: usize) -> Result<()> {
    if max_depth > MAX_TREE_DEPTH {
        return Err(RegForestError::invalid_parameter(
            "max_depth",
            max_depth.to_string(),
            format!("must be at most {}", MAX_TREE_DEPTH),
        ));
    }
    if n_dim_in == 0 {
        return Err(RegForestError::invalid_parameter("n_dim_in", "0", "must be at least 1"));
    }
    if n_dim_out == 0 {
        return Err(RegForestError::invalid_parameter("n_dim_out", "0", "must be at least 1"));
    }
    Ok(())
}

impl RegressionTree {
    fn empty(id: TreeId, max_depth: usize, n_dim_in: usize, n_dim_out: usize, min_sample_count: usize) -> Self {
        RegressionTree {
            id,
            max_depth,
            n_dim_in,
            n_dim_out,
            min_sample_count,
            impurity: DEFAULT_IMPURITY,
            covariance_regularization: DEFAULT_COVARIANCE_REGULARIZATION,
            depth: 0,
            n_nodes: 0,
            n_leaves: 0,
            declared: None,
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Creates an empty, trainable tree.
    pub fn new(
        id: TreeId,
        max_depth: usize,
        n_dim_in: usize,
        n_dim_out: usize,
        min_sample_count: usize,
    ) -> Result<Self> {
        check_shape(max_depth, n_dim_in, n_dim_out)?;
        if min_sample_count < 1 {
            return Err(RegForestError::invalid_parameter(
                "min_sample_count",
                "0",
                "must be at least 1",
            ));
        }
        Ok(Self::empty(id, max_depth, n_dim_in, n_dim_out, min_sample_count))
    }

    /// Creates an empty, trainable tree from a validated configuration.
    pub fn from_config(id: TreeId, config: &TreeConfig, n_dim_in: usize, n_dim_out: usize) -> Result<Self> {
        config.validate()?;
        config.check_against_inputs(n_dim_in);
        let mut tree = Self::new(id, config.max_depth, n_dim_in, n_dim_out, config.min_sample_count)?;
        tree.impurity = config.impurity;
        tree.covariance_regularization = config.covariance_regularization;
        Ok(tree)
    }

    /// Creates a tree pre-sized for exactly `n_nodes` records, `n_leaves` of
    /// them leaves, to be filled through [`add_node`](Self::add_node) and
    /// closed with [`finish`](Self::finish).
    ///
    /// Hyperparameters that are not persisted take their defaults.
    pub fn with_capacity(
        id: TreeId,
        max_depth: usize,
        n_nodes: usize,
        n_leaves: usize,
        n_dim_in: usize,
        n_dim_out: usize,
    ) -> Result<Self> {
        check_shape(max_depth, n_dim_in, n_dim_out)?;
        if n_leaves > n_nodes {
            return Err(RegForestError::invalid_parameter(
                "n_leaves",
                n_leaves.to_string(),
                format!("exceeds the node count {}", n_nodes),
            ));
        }
        let max_nodes = (1u64 << (max_depth + 1)) - 1;
        if n_nodes as u64 > max_nodes {
            return Err(RegForestError::invalid_parameter(
                "n_nodes",
                n_nodes.to_string(),
                format!("a tree of depth {} holds at most {} nodes", max_depth, max_nodes),
            ));
        }

        let mut tree = Self::empty(id, max_depth, n_dim_in, n_dim_out, DEFAULT_MIN_SAMPLE_COUNT);
        tree.declared = Some((n_nodes, n_leaves));
        let reserved = n_nodes.min(MAX_RESERVED_NODES);
        tree.nodes.reserve_exact(reserved);
        tree.index.reserve(reserved);
        Ok(tree)
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn n_dim_in(&self) -> usize {
        self.n_dim_in
    }

    pub fn n_dim_out(&self) -> usize {
        self.n_dim_out
    }

    pub fn min_sample_count(&self) -> usize {
        self.min_sample_count
    }

    pub fn impurity_measure(&self) -> ImpurityMeasure {
        self.impurity
    }

    pub fn covariance_regularization(&self) -> f64 {
        self.covariance_regularization
    }

    /// Depth of the deepest node (0 for a single leaf or an empty tree).
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    pub fn n_leaves(&self) -> usize {
        self.n_leaves
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn is_presized(&self) -> bool {
        self.declared.is_some()
    }

    /// The root node, once inserted.
    pub fn root(&self) -> Option<&TreeNode> {
        self.node(node_id::ROOT)
    }

    /// Looks a node up by id.
    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.index.get(&id).map(|&handle| &self.nodes[handle])
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter()
    }

    /// Leaf nodes in insertion order.
    pub fn leaves(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    /// Nodes sorted by id, which is breadth-first order.
    pub fn nodes_by_id(&self) -> Vec<&TreeNode> {
        let mut ordered: Vec<&TreeNode> = self.nodes.iter().collect();
        ordered.sort_unstable_by_key(|n| n.id());
        ordered
    }

    /// Flat records of all nodes in breadth-first order.
    pub fn records(&self) -> Vec<NodeRecord> {
        self.nodes_by_id().into_iter().map(TreeNode::to_record).collect()
    }

    /// Adds a split node while reconstructing a tree.
    pub fn add_internal_node(
        &mut self,
        id: NodeId,
        split_dim: FeatureIndex,
        split_thresh: f64,
        impurity: f64,
    ) -> Result<NodeHandle> {
        self.insert_node(TreeNode::new_internal(id, SplitRule::new(split_dim, split_thresh), impurity))
    }

    /// Adds a leaf while reconstructing a tree.
    pub fn add_leaf_node(
        &mut self,
        id: NodeId,
        impurity: f64,
        distribution: MultivariateGaussian,
        samples: Vec<SampleIndex>,
    ) -> Result<NodeHandle> {
        self.insert_node(TreeNode::new_leaf(id, impurity, distribution, samples))
    }

    /// Adds a node of either kind from its flat record.
    pub fn add_node(&mut self, record: NodeRecord) -> Result<NodeHandle> {
        match (record.is_leaf, record.leaf) {
            (true, Some(leaf)) => self.add_leaf_node(record.id, record.impurity, leaf.distribution, leaf.samples),
            (false, None) => {
                let dim = FeatureIndex::try_from(record.split_dim).map_err(|_| {
                    RegForestError::malformed_record(format!(
                        "internal node {} has negative split dimension {}",
                        record.id, record.split_dim
                    ))
                })?;
                self.add_internal_node(record.id, dim, record.split_thresh, record.impurity)
            }
            (true, None) => Err(RegForestError::malformed_record(format!(
                "leaf node {} carries no distribution",
                record.id
            ))),
            (false, Some(_)) => Err(RegForestError::malformed_record(format!(
                "internal node {} carries a leaf payload",
                record.id
            ))),
        }
    }

    /// Validates `node` against the tree and links it in.
    ///
    /// Every check runs before the first mutation, so a rejected node leaves
    /// the tree untouched.
    pub(crate) fn insert_node(&mut self, node: TreeNode) -> Result<NodeHandle> {
        let id = node.id();

        if let Some((declared_nodes, declared_leaves)) = self.declared {
            if self.n_nodes >= declared_nodes {
                return Err(RegForestError::malformed_record(format!(
                    "node {} exceeds the declared node count {}",
                    id, declared_nodes
                )));
            }
            if node.is_leaf() && self.n_leaves >= declared_leaves {
                return Err(RegForestError::malformed_record(format!(
                    "leaf {} exceeds the declared leaf count {}",
                    id, declared_leaves
                )));
            }
        }

        if self.index.contains_key(&id) {
            return Err(RegForestError::malformed_record(format!("duplicate node id {}", id)));
        }
        if node.depth() > self.max_depth {
            return Err(RegForestError::malformed_record(format!(
                "node {} at depth {} exceeds max depth {}",
                id,
                node.depth(),
                self.max_depth
            )));
        }
        if let Some(dim) = node.split_dim() {
            if dim >= self.n_dim_in {
                return Err(RegForestError::malformed_record(format!(
                    "node {} splits on dimension {} of {} inputs",
                    id, dim, self.n_dim_in
                )));
            }
        }
        if let Some(leaf) = node.leaf() {
            if leaf.distribution.dim() != self.n_dim_out {
                return Err(RegForestError::malformed_record(format!(
                    "leaf {} has a {}-dimensional distribution, tree outputs {}",
                    id,
                    leaf.distribution.dim(),
                    self.n_dim_out
                )));
            }
            if leaf.samples.is_empty() {
                return Err(RegForestError::malformed_record(format!("leaf {} has no samples", id)));
            }
        }

        let parent = node_id::parent(id).and_then(|p| self.index.get(&p).copied());
        if let Some(p) = parent {
            if self.nodes[p].is_leaf() {
                return Err(RegForestError::malformed_record(format!(
                    "parent {} of node {} is a leaf",
                    self.nodes[p].id(),
                    id
                )));
            }
        }

        let children = [
            (ChildSide::Left, self.index.get(&node_id::left_child(id)).copied()),
            (ChildSide::Right, self.index.get(&node_id::right_child(id)).copied()),
        ];
        if node.is_leaf() && children.iter().any(|(_, c)| c.is_some()) {
            return Err(RegForestError::malformed_record(format!(
                "leaf {} would have children",
                id
            )));
        }

        let handle = self.nodes.len();
        let mut node = node;
        for (side, child) in children {
            if let Some(child) = child {
                node.attach_child(side, child);
            }
        }
        if let (Some(p), Some(side)) = (parent, ChildSide::of(id)) {
            self.nodes[p].attach_child(side, handle);
        }

        self.n_nodes += 1;
        if node.is_leaf() {
            self.n_leaves += 1;
        }
        self.depth = self.depth.max(node.depth());
        self.nodes.push(node);
        self.index.insert(id, handle);

        Ok(handle)
    }

    /// Closes a reconstruction: the declared counts must have been met and
    /// the topology must be complete.
    pub fn finish(&mut self) -> Result<()> {
        if let Some((declared_nodes, declared_leaves)) = self.declared {
            if self.n_nodes != declared_nodes || self.n_leaves != declared_leaves {
                return Err(RegForestError::malformed_record(format!(
                    "declared {} nodes and {} leaves, got {} and {}",
                    declared_nodes, declared_leaves, self.n_nodes, self.n_leaves
                )));
            }
        }
        self.validate()
    }

    /// Checks that the nodes form a single full binary tree rooted at id 0.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Ok(());
        }
        if !self.index.contains_key(&node_id::ROOT) {
            return Err(RegForestError::malformed_record("tree has nodes but no root"));
        }

        for node in &self.nodes {
            if let Some(parent) = node_id::parent(node.id()) {
                if !self.index.contains_key(&parent) {
                    return Err(RegForestError::malformed_record(format!(
                        "node {} has no parent {}",
                        node.id(),
                        parent
                    )));
                }
            }
            if node.is_leaf() {
                continue;
            }
            for (side, expected) in [
                (ChildSide::Left, node_id::left_child(node.id())),
                (ChildSide::Right, node_id::right_child(node.id())),
            ] {
                let linked = node.child(side).and_then(|h| self.nodes.get(h)).map(TreeNode::id);
                if linked != Some(expected) {
                    return Err(RegForestError::malformed_record(format!(
                        "internal node {} is missing its {} child",
                        node.id(),
                        side
                    )));
                }
            }
        }

        Ok(())
    }

    /// Grows the tree from the bootstrap rows `bag`.
    ///
    /// `features` and `labels` are row-aligned with `n_dim_in` and
    /// `n_dim_out` columns. The tree must be empty.
    pub fn train<'a, R: Rng>(
        &mut self,
        features: ArrayView2<'a, f64>,
        labels: ArrayView2<'a, f64>,
        bag: &[SampleIndex],
        n_dim_trials: usize,
        n_thresh_trials: usize,
        rng: &mut R,
    ) -> Result<()> {
        let learner = SerialTreeLearner::new(
            features,
            labels,
            LearnerConfig {
                n_dim_trials,
                n_thresh_trials,
                impurity: self.impurity,
                covariance_regularization: self.covariance_regularization,
            },
        )?;
        learner.train(self, bag, rng)
    }

    /// Routes `x` from the root to its leaf.
    pub fn terminal_node(&self, x: &ArrayView1<f64>) -> Result<&TreeNode> {
        if x.len() != self.n_dim_in {
            return Err(RegForestError::dimension_mismatch(
                format!("{} input values", self.n_dim_in),
                x.len().to_string(),
            ));
        }

        let mut handle = *self
            .index
            .get(&node_id::ROOT)
            .ok_or_else(|| RegForestError::invalid_state("tree has no root node"))?;

        loop {
            let node = &self.nodes[handle];
            match node.split() {
                None => return Ok(node),
                Some(rule) => {
                    let side = rule.side(x);
                    handle = node.child(side).ok_or_else(|| {
                        RegForestError::invalid_state(format!("internal node {} has no {} child", node.id(), side))
                    })?;
                }
            }
        }
    }

    /// Id of the leaf `x` is routed to.
    pub fn terminal_node_id(&self, x: &ArrayView1<f64>) -> Result<NodeId> {
        self.terminal_node(x).map(TreeNode::id)
    }

    /// Predictive distribution for `x`: the Gaussian of its leaf.
    pub fn test(&self, x: &ArrayView1<f64>) -> Result<&MultivariateGaussian> {
        let leaf = self.terminal_node(x)?;
        leaf.distribution()
            .ok_or_else(|| RegForestError::invalid_state(format!("leaf {} has no distribution", leaf.id())))
    }

    /// Predictive distribution for every row of `rows`.
    pub fn predict_batch(&self, rows: ArrayView2<f64>) -> Result<Vec<&MultivariateGaussian>> {
        rows.outer_iter().map(|row| self.test(&row)).collect()
    }

    /// Predicted label means, one row per input row.
    pub fn predict_means(&self, rows: ArrayView2<f64>) -> Result<Array2<f64>> {
        let mut means = Array2::zeros((rows.nrows(), self.n_dim_out));
        for (row, mut out) in rows.outer_iter().zip(means.outer_iter_mut()) {
            out.assign(self.test(&row)?.mean());
        }
        Ok(means)
    }

    /// Per-input-dimension importance aggregated over the split nodes.
    pub fn feature_importance(&self, importance_type: ImportanceType) -> Array1<f64> {
        let mut importance = Array1::zeros(self.n_dim_in);
        for node in &self.nodes {
            if let Some(rule) = node.split() {
                importance[rule.dim] += match importance_type {
                    ImportanceType::Split => 1.0,
                    ImportanceType::Gain => node.impurity(),
                };
            }
        }
        importance
    }

    /// Serializes the tree to a JSON document.
    pub fn to_json(&self) -> Result<String> {
        let document = TreeDocument {
            id: self.id,
            max_depth: self.max_depth,
            n_dim_in: self.n_dim_in,
            n_dim_out: self.n_dim_out,
            min_sample_count: self.min_sample_count,
            impurity: self.impurity,
            covariance_regularization: self.covariance_regularization,
            nodes: self.nodes_by_id().into_iter().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Rebuilds a tree from a JSON document produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        let document: TreeDocument = serde_json::from_str(json)?;
        if document.min_sample_count < 1 {
            return Err(RegForestError::invalid_parameter(
                "min_sample_count",
                "0",
                "must be at least 1",
            ));
        }

        let n_leaves = document.nodes.iter().filter(|n| n.is_leaf()).count();
        let mut tree = Self::with_capacity(
            document.id,
            document.max_depth,
            document.nodes.len(),
            n_leaves,
            document.n_dim_in,
            document.n_dim_out,
        )?;
        for node in &document.nodes {
            tree.add_node(node.to_record())?;
        }
        tree.finish()?;

        tree.min_sample_count = document.min_sample_count;
        tree.impurity = document.impurity;
        tree.covariance_regularization = document.covariance_regularization;
        Ok(tree)
    }

    /// Writes the whitespace-separated text form.
    pub fn write_text<W: Write>(&self, writer: W) -> Result<()> {
        serialization::write_text(self, writer)
    }

    /// Reads a tree from its text form.
    pub fn read_text<R: BufRead>(reader: R) -> Result<Self> {
        serialization::read_text(reader)
    }

    /// Writes the little-endian binary form.
    pub fn write_binary<W: Write>(&self, writer: W) -> Result<()> {
        serialization::write_binary(self, writer)
    }

    /// Reads a tree from its binary form.
    pub fn read_binary<R: Read>(reader: R) -> Result<Self> {
        serialization::read_binary(reader)
    }

    pub fn save_text<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::io::save_text(self, path)
    }

    pub fn load_text<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::io::load_text(path)
    }

    pub fn save_binary<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::io::save_binary(self, path)
    }

    pub fn load_binary<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::io::load_binary(path)
    }
}

/// Trees compare equal when their persisted content matches: header fields
/// and node records. Arena layout and training-only hyperparameters are
/// ignored.
impl PartialEq for RegressionTree {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.max_depth == other.max_depth
            && self.n_dim_in == other.n_dim_in
            && self.n_dim_out == other.n_dim_out
            && self.n_nodes == other.n_nodes
            && self.n_leaves == other.n_leaves
            && self.depth == other.depth
            && self.records() == other.records()
    }
}

impl fmt::Display for RegressionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "RegressionTree(id={}, nodes={}, leaves={}, depth={}/{}, dims={}->{})",
            self.id, self.n_nodes, self.n_leaves, self.depth, self.max_depth, self.n_dim_in, self.n_dim_out
        )?;

        // pre-order, left subtree first
        let mut stack: Vec<NodeHandle> = self.index.get(&node_id::ROOT).copied().into_iter().collect();
        while let Some(handle) = stack.pop() {
            let node = &self.nodes[handle];
            writeln!(f, "{}{}", "  ".repeat(node.depth() + 1), node)?;
            stack.extend(node.right_child());
            stack.extend(node.left_child());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn gaussian(mean: f64) -> MultivariateGaussian {
        MultivariateGaussian::from_parts(vec![mean], vec![0.25]).unwrap()
    }

    /// root splits x[0] at 0.5; node 2 splits x[1] at 2.0
    fn small_tree() -> RegressionTree {
        let mut tree = RegressionTree::with_capacity(7, 3, 5, 3, 2, 1).unwrap();
        tree.add_internal_node(0, 0, 0.5, 1.5).unwrap();
        tree.add_leaf_node(1, 0.25, gaussian(-1.0), vec![0, 1]).unwrap();
        tree.add_internal_node(2, 1, 2.0, 0.75).unwrap();
        tree.add_leaf_node(5, 0.25, gaussian(1.0), vec![2]).unwrap();
        tree.add_leaf_node(6, 0.25, gaussian(2.0), vec![3, 4]).unwrap();
        tree.finish().unwrap();
        tree
    }

    #[test]
    fn test_new_validates_parameters() {
        assert!(RegressionTree::new(0, 5, 2, 1, 1).is_ok());
        assert!(RegressionTree::new(0, 5, 0, 1, 1).is_err());
        assert!(RegressionTree::new(0, 5, 2, 0, 1).is_err());
        assert!(RegressionTree::new(0, 5, 2, 1, 0).is_err());
        assert!(RegressionTree::new(0, MAX_TREE_DEPTH + 1, 2, 1, 1).is_err());

        let tree = RegressionTree::new(3, 4, 2, 1, 2).unwrap();
        assert!(tree.is_empty());
        assert!(tree.root().is_none());
        assert_eq!(tree.id(), 3);
        assert_eq!(tree.n_nodes(), 0);
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_with_capacity_validates_counts() {
        assert!(RegressionTree::with_capacity(0, 2, 3, 4, 1, 1).is_err());
        // depth 1 holds at most three nodes
        assert!(RegressionTree::with_capacity(0, 1, 5, 3, 1, 1).is_err());
        let tree = RegressionTree::with_capacity(0, 1, 3, 2, 1, 1).unwrap();
        assert_eq!(tree.min_sample_count(), DEFAULT_MIN_SAMPLE_COUNT);
    }

    #[test]
    fn test_from_config() {
        let config = TreeConfig {
            max_depth: 3,
            impurity: ImpurityMeasure::LogDeterminant,
            covariance_regularization: 1e-3,
            ..TreeConfig::default()
        };
        let tree = RegressionTree::from_config(1, &config, 4, 2).unwrap();
        assert_eq!(tree.max_depth(), 3);
        assert_eq!(tree.impurity_measure(), ImpurityMeasure::LogDeterminant);
        assert_eq!(tree.covariance_regularization(), 1e-3);

        let bad = TreeConfig {
            min_sample_count: 0,
            ..TreeConfig::default()
        };
        assert!(RegressionTree::from_config(1, &bad, 4, 2).is_err());
    }

    #[test]
    fn test_reconstruction_counters_and_links() {
        let tree = small_tree();
        assert_eq!(tree.n_nodes(), 5);
        assert_eq!(tree.n_leaves(), 3);
        assert_eq!(tree.depth(), 2);
        assert!(tree.validate().is_ok());

        let root = tree.root().unwrap();
        let right = root.right_child().unwrap();
        assert_eq!(tree.nodes().nth(right).unwrap().id(), 2);
        assert_eq!(tree.node(2).unwrap().split_dim(), Some(1));
        assert_eq!(tree.leaves().count(), 3);
    }

    #[test]
    fn test_out_of_order_insertion_links_children() {
        let mut tree = RegressionTree::with_capacity(0, 2, 3, 2, 1, 1).unwrap();
        tree.add_leaf_node(2, 0.0, gaussian(3.0), vec![1]).unwrap();
        tree.add_leaf_node(1, 0.0, gaussian(-3.0), vec![0]).unwrap();
        tree.add_internal_node(0, 0, 0.0, 1.0).unwrap();
        tree.finish().unwrap();

        assert_eq!(tree.terminal_node_id(&array![-1.0].view()).unwrap(), 1);
        assert_eq!(tree.terminal_node_id(&array![1.0].view()).unwrap(), 2);
    }

    #[test]
    fn test_rejected_nodes_leave_tree_unchanged() {
        let mut tree = RegressionTree::with_capacity(0, 1, 3, 2, 2, 1).unwrap();
        tree.add_internal_node(0, 0, 0.0, 1.0).unwrap();

        let failures = vec![
            tree.add_internal_node(0, 1, 0.0, 1.0),
            tree.add_leaf_node(3, 0.0, gaussian(0.0), vec![0]),
            tree.add_internal_node(1, 2, 0.0, 1.0),
            tree.add_leaf_node(1, 0.0, MultivariateGaussian::from_parts(vec![0.0, 0.0], vec![0.0; 4]).unwrap(), vec![0]),
            tree.add_leaf_node(1, 0.0, gaussian(0.0), vec![]),
        ];
        for result in failures {
            assert!(matches!(result, Err(RegForestError::MalformedRecord { .. })));
        }
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.n_leaves(), 0);
        assert_eq!(tree.root().unwrap().left_child(), None);
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut tree = RegressionTree::with_capacity(0, 2, 1, 1, 1, 1).unwrap();
        tree.add_leaf_node(0, 0.0, gaussian(0.0), vec![0]).unwrap();
        let err = tree.add_leaf_node(1, 0.0, gaussian(0.0), vec![1]).unwrap_err();
        assert!(matches!(err, RegForestError::MalformedRecord { .. }));
        tree.finish().unwrap();
    }

    #[test]
    fn test_finish_detects_missing_nodes() {
        let mut tree = RegressionTree::with_capacity(0, 2, 3, 2, 1, 1).unwrap();
        tree.add_internal_node(0, 0, 0.0, 1.0).unwrap();
        tree.add_leaf_node(1, 0.0, gaussian(0.0), vec![0]).unwrap();
        assert!(tree.finish().is_err());
    }

    #[test]
    fn test_validate_detects_orphans_and_missing_children() {
        let mut tree = RegressionTree::new(0, 3, 1, 1, 1).unwrap();
        tree.add_internal_node(0, 0, 0.0, 1.0).unwrap();
        tree.add_leaf_node(1, 0.0, gaussian(0.0), vec![0]).unwrap();
        assert!(tree.validate().is_err());

        let mut orphan = RegressionTree::new(0, 3, 1, 1, 1).unwrap();
        orphan.add_leaf_node(5, 0.0, gaussian(0.0), vec![0]).unwrap();
        assert!(orphan.validate().is_err());
    }

    #[test]
    fn test_add_node_checks_flag_and_payload() {
        let mut tree = RegressionTree::new(0, 3, 1, 1, 1).unwrap();
        let mut record = NodeRecord::leaf(0, 0.0, gaussian(0.0), vec![0]);
        record.is_leaf = false;
        assert!(tree.add_node(record).is_err());

        let mut record = NodeRecord::internal(0, 0, 0.0, 0.0);
        record.is_leaf = true;
        assert!(tree.add_node(record).is_err());

        let mut record = NodeRecord::internal(0, 0, 0.0, 0.0);
        record.split_dim = -1;
        assert!(tree.add_node(record).is_err());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_routing() {
        let tree = small_tree();
        assert_eq!(tree.terminal_node_id(&array![0.5, 9.0].view()).unwrap(), 1);
        assert_eq!(tree.terminal_node_id(&array![0.6, 2.0].view()).unwrap(), 5);
        assert_eq!(tree.terminal_node_id(&array![0.6, 2.5].view()).unwrap(), 6);
        assert_eq!(tree.test(&array![3.0, 3.0].view()).unwrap().mean()[0], 2.0);
    }

    #[test]
    fn test_query_errors() {
        let empty = RegressionTree::new(0, 3, 2, 1, 1).unwrap();
        assert!(matches!(
            empty.terminal_node(&array![0.0, 0.0].view()),
            Err(RegForestError::InvalidState { .. })
        ));

        let tree = small_tree();
        assert!(matches!(
            tree.test(&array![0.0].view()),
            Err(RegForestError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_batch_prediction() {
        let tree = small_tree();
        let rows = array![[0.0, 0.0], [1.0, 1.0], [1.0, 5.0]];
        let dists = tree.predict_batch(rows.view()).unwrap();
        assert_eq!(dists.len(), 3);
        assert_eq!(tree.predict_means(rows.view()).unwrap(), array![[-1.0], [1.0], [2.0]]);
    }

    #[test]
    fn test_feature_importance() {
        let tree = small_tree();
        assert_eq!(tree.feature_importance(ImportanceType::Split), array![1.0, 1.0]);
        assert_eq!(tree.feature_importance(ImportanceType::Gain), array![1.5, 0.75]);
    }

    #[test]
    fn test_records_are_breadth_first() {
        let ids: Vec<NodeId> = small_tree().records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 5, 6]);
    }

    #[test]
    fn test_json_round_trip() {
        let tree = small_tree();
        let json = tree.to_json().unwrap();
        let restored = RegressionTree::from_json(&json).unwrap();
        assert_eq!(restored, tree);
        assert!(RegressionTree::from_json("{\"id\": 1}").is_err());
    }

    #[test]
    fn test_json_round_trip_is_bit_exact() {
        let mut tree = RegressionTree::with_capacity(0, 1, 3, 2, 1, 1).unwrap();
        tree.add_internal_node(0, 0, 0.1 + 0.2, 9.764714723603913e-1).unwrap();
        tree.add_leaf_node(1, 1.0 / 3.0, gaussian(-1.5775350831000399), vec![0]).unwrap();
        tree.add_leaf_node(2, 2.0 / 7.0, gaussian(1e-300 / 3.0), vec![1]).unwrap();
        tree.finish().unwrap();

        let restored = RegressionTree::from_json(&tree.to_json().unwrap()).unwrap();
        for (a, b) in restored.records().iter().zip(tree.records().iter()) {
            assert_eq!(a.split_thresh.to_bits(), b.split_thresh.to_bits());
            assert_eq!(a.impurity.to_bits(), b.impurity.to_bits());
        }
        let mean = restored.node(1).unwrap().distribution().unwrap().mean()[0];
        assert_eq!(mean.to_bits(), (-1.5775350831000399f64).to_bits());
        assert_eq!(restored, tree);
    }

    #[test]
    fn test_display() {
        let text = small_tree().to_string();
        assert!(text.starts_with("RegressionTree(id=7, nodes=5, leaves=3"));
        assert_eq!(text.lines().count(), 6);
        assert!(text.contains("x[1] <= 2.000000"));
    }

    #[test]
    fn test_tree_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RegressionTree>();
    }
}
