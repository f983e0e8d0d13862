//! Exposure file discovery
//!
//! Resolves the path argument into the list of files to summarize: a file is
//! taken as-is, a directory is walked and filtered through a glob pattern.

use crate::core::error::{Result, TreeError};
use globset::{GlobBuilder, GlobMatcher};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Normalize path separators for cross-platform matching.
/// - Converts Windows backslashes to forward slashes
/// - Strips Windows UNC prefix `\\?\` if present
pub fn normalize_path_separators(path: &str) -> String {
    let stripped = path
        .strip_prefix(r"\\?\")
        .or_else(|| path.strip_prefix(r"\\.\"))
        .unwrap_or(path);
    stripped.replace('\\', "/")
}

/// Compile a glob where `*` does not cross directory boundaries
fn compile_pattern(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| TreeError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.kind().to_string(),
        })
}

/// Resolve `path` into a sorted list of exposure files
///
/// `*.fits` matches only the top level of a directory; use `**/*.fits` to
/// recurse.
pub fn discover_files(path: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(TreeError::InvalidPath {
            path: path.to_path_buf(),
        });
    }

    let matcher = compile_pattern(pattern)?;
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let relative = e.path().strip_prefix(path).unwrap_or(e.path());
            matcher.is_match(normalize_path_separators(&relative.to_string_lossy()))
        })
        .map(|e| e.into_path())
        .collect();

    if files.is_empty() {
        return Err(TreeError::NoMatch {
            pattern: pattern.to_string(),
            path: path.to_path_buf(),
        });
    }

    files.sort();
    debug!(count = files.len(), pattern, "discovered exposure files");
    Ok(files)
}
