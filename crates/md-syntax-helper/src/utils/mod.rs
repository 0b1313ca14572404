pub mod discover;
pub mod unicode;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Read a whole file to a string, naming the path in any error.
pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Write content to a file, naming the path in any error.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write file: {}", path.display()))
}
