//! JSON flame graph writer.
//!
//! Writes the tree in the nested `{name, libtype, value, children, extras}`
//! shape consumed by flame graph viewers.

use crate::aggregator::FlameNode;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Write a flame graph to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `tree` - Root returned by `build_flame_graph`
/// * `output_path` - Path to output JSON file
/// * `pretty` - Indent the output
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_tree(
    tree: &FlameNode,
    output_path: impl AsRef<Path>,
    pretty: bool,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing flame graph to: {}", output_path.display());

    validate_output_path(output_path)?;

    // Create parent directories if needed
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);

    if pretty {
        serde_json::to_writer_pretty(&mut writer, tree)?;
    } else {
        serde_json::to_writer(&mut writer, tree)?;
    }
    writer.flush()?;

    info!(
        "Flame graph written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Serialize a flame graph to a compact JSON string
///
/// **Public** - useful for tests and in-memory use
pub fn tree_to_string(tree: &FlameNode) -> Result<String, OutputError> {
    Ok(serde_json::to_string(tree)?)
}

/// Read a flame graph back from a JSON file
pub fn read_tree(input_path: impl AsRef<Path>) -> Result<FlameNode, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading flame graph from: {}", input_path.display());

    let file = File::open(input_path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::StackFrame;
    use tempfile::NamedTempFile;

    fn create_test_tree() -> FlameNode {
        let mut root = FlameNode::root();
        root.value = 2.0;
        root.child_for(&StackFrame::new("main", "user"), false).value = 2.0;
        root
    }

    #[test]
    fn test_write_and_read_tree() {
        let tree = create_test_tree();
        let temp_file = NamedTempFile::new().unwrap();

        write_tree(&tree, temp_file.path(), true).unwrap();
        let loaded = read_tree(temp_file.path()).unwrap();

        assert_eq!(loaded, tree);
    }

    #[test]
    fn test_tree_to_string_is_compact() {
        let json = tree_to_string(&create_test_tree()).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.starts_with(r#"{"name":"root","libtype":"","value":2.0"#));
    }

    #[test]
    fn test_validate_output_path_empty() {
        assert!(validate_output_path(Path::new("")).is_err());
    }

    #[test]
    fn test_validate_output_path_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(validate_output_path(temp_dir.path()).is_err());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested/dirs/tree.json");

        write_tree(&create_test_tree(), &nested_path, false).unwrap();

        assert!(nested_path.exists());
    }
}
