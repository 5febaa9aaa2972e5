use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Cheap staleness oracle for one file: modification time and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    pub mtime_ns: i64,
    pub size_bytes: u64,
}

impl FileStamp {
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        let mtime_ns = metadata
            .modified()
            .map(|t| match t.duration_since(SystemTime::UNIX_EPOCH) {
                Ok(d) => d.as_nanos() as i64,
                Err(e) => -(e.duration().as_nanos() as i64),
            })
            .unwrap_or(0);

        Self {
            mtime_ns,
            size_bytes: metadata.len(),
        }
    }

    pub fn of(path: &Path) -> std::io::Result<Self> {
        Ok(Self::from_metadata(&fs::metadata(path)?))
    }
}

/// Per-file metadata keyed by POSIX-style project-relative path.
///
/// Kept as two parallel maps because that is how the cache document stores
/// them; a key present in one map but not the other counts as stale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTracker {
    mtimes_ns: BTreeMap<String, i64>,
    sizes: BTreeMap<String, u64>,
}

impl FileTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_maps(mtimes_ns: BTreeMap<String, i64>, sizes: BTreeMap<String, u64>) -> Self {
        Self { mtimes_ns, sizes }
    }

    pub fn record(&mut self, key: impl Into<String>, stamp: FileStamp) {
        let key = key.into();
        self.mtimes_ns.insert(key.clone(), stamp.mtime_ns);
        self.sizes.insert(key, stamp.size_bytes);
    }

    pub fn forget(&mut self, key: &str) {
        self.mtimes_ns.remove(key);
        self.sizes.remove(key);
    }

    pub fn is_stale(&self, key: &str, current: &FileStamp) -> bool {
        self.mtimes_ns.get(key) != Some(&current.mtime_ns)
            || self.sizes.get(key) != Some(&current.size_bytes)
    }

    /// Tracked files, taken from the mtime map.
    pub fn keys(&self) -> BTreeSet<String> {
        self.mtimes_ns.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.mtimes_ns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mtimes_ns.is_empty()
    }

    pub fn clear(&mut self) {
        self.mtimes_ns.clear();
        self.sizes.clear();
    }

    pub fn mtimes_ns(&self) -> &BTreeMap<String, i64> {
        &self.mtimes_ns
    }

    pub fn sizes(&self) -> &BTreeMap<String, u64> {
        &self.sizes
    }
}
