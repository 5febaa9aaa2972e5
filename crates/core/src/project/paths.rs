use std::path::{Component, Path, PathBuf};

/// POSIX-style path of `path` relative to `root`, used as the stable file key.
/// Returns `None` when `path` is not under `root`.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Inverse of [`relative_key`]: joins a `/`-separated key onto `root`
/// component by component, so the result uses native separators.
pub fn key_to_path(root: &Path, key: &str) -> PathBuf {
    key.split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |path, part| path.join(part))
}

/// Path identity that tolerates paths which no longer resolve.
///
/// Both sides are canonicalized when possible; if either side cannot be
/// (deleted file, dangling link), the raw paths are compared instead.
/// Purging and per-file lookups both go through here.
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => a == b,
    }
}
