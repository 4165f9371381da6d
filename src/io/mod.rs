//! Tree persistence.
//!
//! Stream codecs live in [`serialization`]; this module wraps them with
//! buffered file handling. Files are closed on every exit path when their
//! handles drop.

pub mod serialization;

pub use serialization::{read_binary, read_text, write_binary, write_text, SerializationFormat};

use crate::core::error::Result;
use crate::tree::RegressionTree;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Saves `tree` to `path` in binary form.
pub fn save_binary<P: AsRef<Path>>(tree: &RegressionTree, path: P) -> Result<()> {
    let path = path.as_ref();
    write_binary(tree, BufWriter::new(File::create(path)?))?;
    log::info!("Saved tree {} ({} nodes) to {}", tree.id(), tree.n_nodes(), path.display());
    Ok(())
}

/// Loads a tree saved by [`save_binary`].
pub fn load_binary<P: AsRef<Path>>(path: P) -> Result<RegressionTree> {
    let path = path.as_ref();
    let tree = read_binary(BufReader::new(File::open(path)?))?;
    log::info!("Loaded tree {} ({} nodes) from {}", tree.id(), tree.n_nodes(), path.display());
    Ok(tree)
}

/// Saves `tree` to `path` in text form.
pub fn save_text<P: AsRef<Path>>(tree: &RegressionTree, path: P) -> Result<()> {
    let path = path.as_ref();
    write_text(tree, BufWriter::new(File::create(path)?))?;
    log::info!("Saved tree {} ({} nodes) to {}", tree.id(), tree.n_nodes(), path.display());
    Ok(())
}

/// Loads a tree saved by [`save_text`].
pub fn load_text<P: AsRef<Path>>(path: P) -> Result<RegressionTree> {
    let path = path.as_ref();
    let tree = read_text(BufReader::new(File::open(path)?))?;
    log::info!("Loaded tree {} ({} nodes) from {}", tree.id(), tree.n_nodes(), path.display());
    Ok(tree)
}

/// Saves `tree` in the given format.
pub fn save_tree<P: AsRef<Path>>(tree: &RegressionTree, path: P, format: SerializationFormat) -> Result<()> {
    match format {
        SerializationFormat::Binary => save_binary(tree, path),
        SerializationFormat::Text => save_text(tree, path),
        SerializationFormat::Json => {
            let path = path.as_ref();
            std::fs::write(path, tree.to_json()?)?;
            log::info!("Saved tree {} ({} nodes) to {}", tree.id(), tree.n_nodes(), path.display());
            Ok(())
        }
    }
}

/// Loads a tree in the given format.
pub fn load_tree<P: AsRef<Path>>(path: P, format: SerializationFormat) -> Result<RegressionTree> {
    let path = path.as_ref();
    let loaded = match format {
        SerializationFormat::Binary => load_binary(path),
        SerializationFormat::Text => load_text(path),
        SerializationFormat::Json => load_json(path),
    };
    if let Err(err) = &loaded {
        log::warn!("Failed to load {} tree from {} [{}]: {}", format, path.display(), err.category(), err);
    }
    loaded
}

fn load_json(path: &Path) -> Result<RegressionTree> {
    let tree = RegressionTree::from_json(&std::fs::read_to_string(path)?)?;
    log::info!("Loaded tree {} ({} nodes) from {}", tree.id(), tree.n_nodes(), path.display());
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::RegForestError;
    use crate::distribution::MultivariateGaussian;
    use tempfile::TempDir;

    fn stump() -> RegressionTree {
        let mut tree = RegressionTree::with_capacity(9, 1, 3, 2, 1, 1).unwrap();
        tree.add_internal_node(0, 0, 0.5, 2.0).unwrap();
        tree.add_leaf_node(1, 0.0, MultivariateGaussian::from_parts(vec![0.0], vec![0.0]).unwrap(), vec![0])
            .unwrap();
        tree.add_leaf_node(2, 0.0, MultivariateGaussian::from_parts(vec![3.0], vec![0.0]).unwrap(), vec![1])
            .unwrap();
        tree.finish().unwrap();
        tree
    }

    #[test]
    fn test_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let tree = stump();

        for name in ["stump.bin", "stump.txt", "stump.json"] {
            let path = dir.path().join(name);
            let format = SerializationFormat::from_path(&path).unwrap();
            save_tree(&tree, &path, format).unwrap();
            assert_eq!(load_tree(&path, format).unwrap(), tree);
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_binary(dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, RegForestError::IO { .. }));
    }

    #[test]
    fn test_wrong_format_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stump.txt");
        save_text(&stump(), &path).unwrap();
        assert!(load_binary(&path).is_err());
    }

    #[test]
    fn test_load_tree_reports_failure_kind() {
        let dir = TempDir::new().unwrap();
        let missing = load_tree(dir.path().join("absent.json"), SerializationFormat::Json).unwrap_err();
        assert_eq!(missing.category(), "io");

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let broken = load_tree(&path, SerializationFormat::Json).unwrap_err();
        assert_eq!(broken.category(), "json");
    }
}
