//! Whitespace separated text tree format.
//!
//! ```text
//! id max_depth n_nodes n_leaves n_dim_in n_dim_out
//! id is_leaf split_dim split_thresh impurity [mean.. cov.. n_samples samples..]
//! ```
//!
//! One node per line in breadth-first order; the bracketed part is present
//! for leaves only. Floats use the shortest representation that parses back
//! to the same value. Blank lines are ignored.

use super::{from_wire, to_wire, TreeHeader};
use crate::core::error::{RegForestError, Result};
use crate::distribution::MultivariateGaussian;
use crate::tree::node::{LeafData, NodeRecord};
use crate::tree::RegressionTree;
use std::io::{BufRead, Write};
use std::str::{FromStr, SplitWhitespace};

/// Writes `tree` in text form.
pub fn write_text<W: Write>(tree: &RegressionTree, mut writer: W) -> Result<()> {
    let header = TreeHeader::of(tree);
    writeln!(
        writer,
        "{} {} {} {} {} {}",
        header.id, header.max_depth, header.n_nodes, header.n_leaves, header.n_dim_in, header.n_dim_out
    )?;

    for record in tree.records() {
        write!(
            writer,
            "{} {} {} {} {}",
            record.id,
            u8::from(record.is_leaf),
            record.split_dim,
            record.split_thresh,
            record.impurity
        )?;
        if let Some(leaf) = &record.leaf {
            for value in leaf.distribution.mean().iter().chain(leaf.distribution.covariance().iter()) {
                write!(writer, " {}", value)?;
            }
            write!(writer, " {}", leaf.samples.len())?;
            for sample in &leaf.samples {
                write!(writer, " {}", to_wire(*sample, "sample index")?)?;
            }
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Reads a tree written by [`write_text`].
///
/// Consumes the header line and exactly the declared number of node lines;
/// anything after them is left in the reader.
pub fn read_text<R: BufRead>(mut reader: R) -> Result<RegressionTree> {
    let mut line_no = 0;
    let mut buffer = String::new();

    let header_line = next_line(&mut reader, &mut buffer, &mut line_no, "tree header")?;
    let mut fields = Fields::new(header_line, line_no);
    let header = TreeHeader {
        id: fields.next("tree id")?,
        max_depth: from_wire(fields.next("max depth")?, "max depth")?,
        n_nodes: from_wire(fields.next("node count")?, "node count")?,
        n_leaves: from_wire(fields.next("leaf count")?, "leaf count")?,
        n_dim_in: from_wire(fields.next("input dimension")?, "input dimension")?,
        n_dim_out: from_wire(fields.next("output dimension")?, "output dimension")?,
    };
    fields.finish()?;

    let mut tree = header.presized_tree()?;
    for index in 0..header.n_nodes {
        let what = format!("node record {} of {}", index + 1, header.n_nodes);
        let line = next_line(&mut reader, &mut buffer, &mut line_no, &what)?;
        let record = parse_record(Fields::new(line, line_no), header.n_dim_out)?;
        tree.add_node(record)?;
    }
    tree.finish()?;

    Ok(tree)
}

/// Reads the next non-blank line into `buffer`.
fn next_line<'b, R: BufRead>(
    reader: &mut R,
    buffer: &'b mut String,
    line_no: &mut usize,
    what: &str,
) -> Result<&'b str> {
    loop {
        buffer.clear();
        if reader.read_line(buffer)? == 0 {
            return Err(RegForestError::stream(format!("stream ended before {}", what)));
        }
        *line_no += 1;
        if !buffer.trim().is_empty() {
            return Ok(buffer.as_str());
        }
    }
}

fn parse_record(mut fields: Fields<'_>, n_dim_out: usize) -> Result<NodeRecord> {
    let id = from_wire(fields.next("node id")?, "node id")? as u32;
    let is_leaf = match fields.next::<u8>("leaf flag")? {
        0 => false,
        1 => true,
        other => {
            return Err(RegForestError::stream(format!(
                "line {}: invalid leaf flag {}",
                fields.line_no, other
            )))
        }
    };
    let split_dim = fields.next("split dimension")?;
    let split_thresh = fields.next("split threshold")?;
    let impurity = fields.next("impurity")?;

    let leaf = if is_leaf {
        let mean = fields.take(n_dim_out, "leaf mean")?;
        let covariance = fields.take(n_dim_out * n_dim_out, "leaf covariance")?;
        let count = from_wire(fields.next("sample count")?, "sample count")?;
        let samples = (0..count)
            .map(|_| from_wire(fields.next("sample index")?, "sample index"))
            .collect::<Result<Vec<_>>>()?;
        Some(LeafData {
            distribution: MultivariateGaussian::from_parts(mean, covariance)?,
            samples,
        })
    } else {
        None
    };
    fields.finish()?;

    Ok(NodeRecord {
        id,
        is_leaf,
        split_dim,
        split_thresh,
        impurity,
        leaf,
    })
}

/// Typed cursor over the whitespace separated fields of one line.
struct Fields<'a> {
    tokens: SplitWhitespace<'a>,
    line_no: usize,
}

impl<'a> Fields<'a> {
    fn new(line: &'a str, line_no: usize) -> Self {
        Fields {
            tokens: line.split_whitespace(),
            line_no,
        }
    }

    fn next<T: FromStr>(&mut self, field: &str) -> Result<T> {
        let token = self
            .tokens
            .next()
            .ok_or_else(|| RegForestError::stream(format!("line {}: missing {}", self.line_no, field)))?;
        token.parse().map_err(|_| {
            RegForestError::stream(format!("line {}: cannot parse {} from '{}'", self.line_no, field, token))
        })
    }

    fn take<T: FromStr>(&mut self, count: usize, field: &str) -> Result<Vec<T>> {
        (0..count).map(|_| self.next(field)).collect()
    }

    fn finish(mut self) -> Result<()> {
        match self.tokens.next() {
            None => Ok(()),
            Some(extra) => Err(RegForestError::stream(format!(
                "line {}: unexpected trailing field '{}'",
                self.line_no, extra
            ))),
        }
    }
}
