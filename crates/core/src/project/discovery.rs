use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Project-relative directories searched recursively for GML sources.
/// Fixed by the GameMaker project layout.
pub const SOURCE_DIRS: [&str; 4] = ["scripts", "objects", "rooms", "extensions"];

pub const SOURCE_EXTENSION: &str = "gml";

/// Checks if a path looks like a GML source file.
pub fn is_source_path(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext == SOURCE_EXTENSION)
        .unwrap_or(false)
}

/// Lists every indexable source file under `root`, sorted.
///
/// Missing or unreadable directories contribute nothing; an inaccessible
/// root simply yields an empty list.
pub fn discover_source_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for dir_name in SOURCE_DIRS {
        let dir = root.join(dir_name);
        if !dir.is_dir() {
            continue;
        }
        files.extend(
            WalkDir::new(&dir)
                .into_iter()
                .filter_map(|entry| entry.ok())
                // Linked files count; linked directories are not descended into.
                .filter(|entry| entry.path().is_file() && is_source_path(entry.path()))
                .map(|entry| entry.into_path()),
        );
    }

    // Loose files at the root are picked up, but the root is not walked.
    if let Ok(entries) = fs::read_dir(root) {
        files.extend(
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && is_source_path(path)),
        );
    }

    files.sort();
    files
}
