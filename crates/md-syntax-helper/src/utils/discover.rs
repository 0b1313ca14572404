//! Expansion of CLI inputs into the list of Markdown files to process.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Expand each input into files to process, in a deterministic order.
///
/// An input may be a glob pattern (expanded, with a warning when it
/// matches nothing), a literal file, or a directory (walked recursively
/// for `.md` files, skipping dotfiles and dot-directories). A literal
/// path that does not exist is a hard error, raised before any file is
/// touched. `limit` caps the total number of files.
pub fn expand_inputs(inputs: &[String], limit: Option<usize>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.contains('*') || input.contains('?') || input.contains('[') {
            let paths = glob::glob(input)
                .with_context(|| format!("Invalid glob pattern: {}", input))?;

            let mut match_count = 0;
            for path in paths {
                let path =
                    path.with_context(|| format!("Failed to read glob match for: {}", input))?;
                if path.is_dir() {
                    files.extend(walk_markdown(&path));
                } else {
                    files.push(path);
                }
                match_count += 1;
            }

            if match_count == 0 {
                eprintln!("Warning: No files matched pattern: {}", input);
            }
        } else {
            let path = PathBuf::from(input);
            if !path.exists() {
                anyhow::bail!("not found: {}", input);
            }
            if path.is_dir() {
                files.extend(walk_markdown(&path));
            } else {
                files.push(path);
            }
        }
    }

    if let Some(limit) = limit {
        files.truncate(limit);
    }
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Recursively collect `.md` files under a directory, sorted by name
/// so batch runs are deterministic.
fn walk_markdown(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
        .map(|e| e.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn literal_file_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.md");
        fs::write(&file, "x").unwrap();

        let result = expand_inputs(&[file.to_string_lossy().to_string()], None).unwrap();
        assert_eq!(result, vec![file]);
    }

    #[test]
    fn missing_literal_path_is_an_error() {
        let result = expand_inputs(&["no-such-file.md".to_string()], None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn directory_walk_is_sorted_and_skips_dotfiles() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.md"), "x").unwrap();
        fs::write(dir.path().join("a.md"), "x").unwrap();
        fs::write(dir.path().join(".hidden.md"), "x").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git").join("c.md"), "x").unwrap();

        let result =
            expand_inputs(&[dir.path().to_string_lossy().to_string()], None).unwrap();
        let names: Vec<_> = result
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.md", "b.md"]);
    }

    #[test]
    fn limit_caps_file_count() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.md", "b.md", "c.md"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }

        let result =
            expand_inputs(&[dir.path().to_string_lossy().to_string()], Some(2)).unwrap();
        assert_eq!(result.len(), 2);
    }
}
