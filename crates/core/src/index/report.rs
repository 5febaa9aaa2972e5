use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    /// Full scan of every discovered file.
    Built,
    /// Cache matched the disk exactly; nothing was rescanned or written.
    Cached,
    /// Only added and changed files were rescanned.
    Incremental,
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BuildStatus::Built => "built",
            BuildStatus::Cached => "cached",
            BuildStatus::Incremental => "incremental",
        })
    }
}

/// Outcome of [`GmlIndex::build`](super::GmlIndex::build).
///
/// `files` is the number of files scanned by this build, except for
/// `cached` where it is the number of tracked files.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub status: BuildStatus,
    pub symbols: usize,
    pub references: usize,
    pub files: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_files: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_files: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_files: Option<usize>,
}

impl BuildReport {
    pub fn built(symbols: usize, references: usize, files: usize) -> Self {
        Self {
            status: BuildStatus::Built,
            symbols,
            references,
            files,
            added_files: None,
            changed_files: None,
            removed_files: None,
        }
    }

    pub fn cached(symbols: usize, references: usize, files: usize) -> Self {
        Self {
            status: BuildStatus::Cached,
            ..Self::built(symbols, references, files)
        }
    }

    pub fn incremental(
        symbols: usize,
        references: usize,
        files: usize,
        added: usize,
        changed: usize,
        removed: usize,
    ) -> Self {
        Self {
            status: BuildStatus::Incremental,
            symbols,
            references,
            files,
            added_files: Some(added),
            changed_files: Some(changed),
            removed_files: Some(removed),
        }
    }
}
