//! Assertions over an exported directory tree

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// All regular files below `root`, relative to it, sorted
pub fn exported_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .expect("walkdir yields paths under root")
                .to_path_buf()
        })
        .collect();
    files.sort();
    files
}

/// Byte contents of every exported file, keyed by relative path
pub fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    exported_files(root)
        .into_iter()
        .map(|rel| {
            let bytes = std::fs::read(root.join(&rel)).expect("read exported file");
            (rel, bytes)
        })
        .collect()
}
