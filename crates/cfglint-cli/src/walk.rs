//! # Directory Walker
//!
//! Depth-first traversal of the scan root in file-name order. Excluded
//! directories are pruned, symlinks are followed, and only regular files
//! are yielded. Any traversal error is fatal.
//!
//! Exclusions match by real location: a directory reached through a
//! symlink is pruned when its target is excluded, and the reverse.

use std::path::{Path, PathBuf};

use cfglint_core::CfglintError;
use walkdir::WalkDir;

/// Iterate the regular files under `root`, skipping `excludes`.
pub fn walk_files(
    root: &Path,
    excludes: &[PathBuf],
) -> impl Iterator<Item = Result<PathBuf, CfglintError>> {
    let excludes: Vec<PathBuf> = excludes
        .iter()
        .map(|e| std::fs::canonicalize(e).unwrap_or_else(|_| e.clone()))
        .collect();
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            let pruned = entry.file_type().is_dir() && is_excluded(entry.path(), &excludes);
            if pruned {
                tracing::trace!(dir = %entry.path().display(), "pruned excluded directory");
            }
            !pruned
        })
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
            Ok(_) => None,
            Err(e) => Some(Err(traversal_error(e))),
        })
}

fn is_excluded(dir: &Path, excludes: &[PathBuf]) -> bool {
    excludes.iter().any(|e| e.as_path() == dir)
        || std::fs::canonicalize(dir).is_ok_and(|real| excludes.contains(&real))
}

fn traversal_error(e: walkdir::Error) -> CfglintError {
    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
    let message = e.to_string();
    let source = e
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other(message));
    CfglintError::Traversal { path, source }
}
