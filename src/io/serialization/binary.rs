//! Little-endian binary tree format.
//!
//! Header: id, max depth, node count, leaf count, n_dim_in, n_dim_out, each
//! an `i32`. Every node record then holds its id (`i32`), the leaf flag
//! (`u8`), split dimension (`i32`, -1 for leaves), split threshold (`f64`,
//! 0.0 for leaves) and impurity (`f64`). Leaves append their mean
//! (`n_dim_out` `f64`), row-major covariance (`n_dim_out^2` `f64`), sample
//! count (`i32`) and samples (`i32` each).

use super::{from_wire, to_wire, TreeHeader};
use crate::core::constants::MAX_PREALLOCATED_VALUES;
use crate::core::error::{RegForestError, Result};
use crate::core::utils::binary_reader::BinaryReader;
use crate::core::utils::binary_writer::BinaryWriter;
use crate::distribution::MultivariateGaussian;
use crate::tree::node::{LeafData, NodeRecord};
use crate::tree::RegressionTree;
use std::io::{Read, Write};

/// Writes `tree` in binary form.
pub fn write_binary<W: Write>(tree: &RegressionTree, mut writer: W) -> Result<()> {
    let header = TreeHeader::of(tree);
    writer.write_i32(header.id)?;
    writer.write_i32(to_wire(header.max_depth, "max depth")?)?;
    writer.write_i32(to_wire(header.n_nodes, "node count")?)?;
    writer.write_i32(to_wire(header.n_leaves, "leaf count")?)?;
    writer.write_i32(to_wire(header.n_dim_in, "input dimension")?)?;
    writer.write_i32(to_wire(header.n_dim_out, "output dimension")?)?;

    for record in tree.records() {
        writer.write_i32(to_wire(record.id as usize, "node id")?)?;
        writer.write_u8(u8::from(record.is_leaf))?;
        writer.write_i32(record.split_dim)?;
        writer.write_f64(record.split_thresh)?;
        writer.write_f64(record.impurity)?;

        if let Some(leaf) = &record.leaf {
            writer.write_f64_slice(leaf.distribution.mean().iter())?;
            writer.write_f64_slice(leaf.distribution.covariance().iter())?;
            writer.write_i32(to_wire(leaf.samples.len(), "sample count")?)?;
            for &sample in &leaf.samples {
                writer.write_i32(to_wire(sample, "sample index")?)?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}

/// Reads a tree written by [`write_binary`].
///
/// Consumes exactly the declared number of node records and nothing after
/// them.
pub fn read_binary<R: Read>(mut reader: R) -> Result<RegressionTree> {
    let header = TreeHeader {
        id: reader.read_i32_field("tree id")?,
        max_depth: from_wire(reader.read_i32_field("max depth")?, "max depth")?,
        n_nodes: from_wire(reader.read_i32_field("node count")?, "node count")?,
        n_leaves: from_wire(reader.read_i32_field("leaf count")?, "leaf count")?,
        n_dim_in: from_wire(reader.read_i32_field("input dimension")?, "input dimension")?,
        n_dim_out: from_wire(reader.read_i32_field("output dimension")?, "output dimension")?,
    };

    let covariance_len = header.n_dim_out.checked_mul(header.n_dim_out).ok_or_else(|| {
        RegForestError::malformed_record(format!("output dimension {} is too large", header.n_dim_out))
    })?;
    let mut tree = header.presized_tree()?;
    for _ in 0..header.n_nodes {
        let record = read_record(&mut reader, header.n_dim_out, covariance_len)?;
        tree.add_node(record)?;
    }
    tree.finish()?;

    Ok(tree)
}

fn read_record<R: Read>(reader: &mut R, n_dim_out: usize, covariance_len: usize) -> Result<NodeRecord> {
    let id = from_wire(reader.read_i32_field("node id")?, "node id")? as u32;
    let is_leaf = match reader.read_u8_field("leaf flag")? {
        0 => false,
        1 => true,
        other => {
            return Err(RegForestError::stream(format!(
                "invalid leaf flag {} for node {}",
                other, id
            )))
        }
    };
    let split_dim = reader.read_i32_field("split dimension")?;
    let split_thresh = reader.read_f64_field("split threshold")?;
    let impurity = reader.read_f64_field("impurity")?;

    let leaf = if is_leaf {
        let mean = reader.read_f64_vec(n_dim_out, "leaf mean")?;
        let covariance = reader.read_f64_vec(covariance_len, "leaf covariance")?;
        let count = from_wire(reader.read_i32_field("sample count")?, "sample count")?;
        let mut samples = Vec::with_capacity(count.min(MAX_PREALLOCATED_VALUES));
        for _ in 0..count {
            samples.push(from_wire(reader.read_i32_field("sample index")?, "sample index")?);
        }
        Some(LeafData {
            distribution: MultivariateGaussian::from_parts(mean, covariance)?,
            samples,
        })
    } else {
        None
    };

    Ok(NodeRecord {
        id,
        is_leaf,
        split_dim,
        split_thresh,
        impurity,
        leaf,
    })
}
