use crate::error::{GmscopeError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const NESTED_PROJECT_DIR: &str = "gamemaker";

fn has_yyp(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries.filter_map(|e| e.ok()).any(|e| {
                let path = e.path();
                path.is_file() && path.extension().is_some_and(|ext| ext == "yyp")
            })
        })
        .unwrap_or(false)
}

fn nested_project(dir: &Path) -> Option<PathBuf> {
    let nested = dir.join(NESTED_PROJECT_DIR);
    (nested.is_dir() && has_yyp(&nested)).then_some(nested)
}

/// Resolves the GameMaker project directory (the folder holding a `.yyp`).
///
/// Candidates are tried in order: `hint` (ignored when empty or `.`),
/// `GM_PROJECT_ROOT`, `PROJECT_ROOT`, then the current directory.
pub fn locate_project_root(hint: Option<&Path>) -> Result<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(hint) = hint {
        let raw = hint.to_string_lossy();
        let trimmed = raw.trim();
        if !trimmed.is_empty() && trimmed != "." {
            candidates.push(PathBuf::from(trimmed));
        }
    }
    for var in ["GM_PROJECT_ROOT", "PROJECT_ROOT"] {
        if let Ok(value) = std::env::var(var) {
            if !value.trim().is_empty() {
                candidates.push(PathBuf::from(value));
            }
        }
    }
    let cwd = std::env::current_dir()?;
    candidates.push(cwd.clone());

    locate_from_candidates(&candidates, &cwd)
}

/// Candidate walk behind [`locate_project_root`], free of process state.
pub fn locate_from_candidates(candidates: &[PathBuf], cwd: &Path) -> Result<PathBuf> {
    let mut tried = Vec::new();

    for raw in candidates {
        let mut dir = if raw.is_absolute() {
            raw.clone()
        } else {
            cwd.join(raw)
        };
        dir = dir.canonicalize().unwrap_or(dir);
        if dir.is_file() {
            if let Some(parent) = dir.parent() {
                dir = parent.to_path_buf();
            }
        }
        tried.push(dir.clone());
        if !dir.is_dir() {
            continue;
        }

        if has_yyp(&dir) {
            return Ok(dir);
        }
        if let Some(nested) = nested_project(&dir) {
            return Ok(nested);
        }
        if let Some(found) = dir.ancestors().skip(1).find(|a| has_yyp(a)) {
            return Ok(found.to_path_buf());
        }
        if let Some(found) = dir.ancestors().skip(1).find_map(nested_project) {
            return Ok(found);
        }
    }

    Err(GmscopeError::ProjectNotFound { tried })
}
