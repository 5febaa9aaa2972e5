//! Incremental, cache-backed symbol index for one GameMaker project.

pub mod cache;
pub mod files;
pub mod filter;
pub mod report;
pub mod store;

pub use cache::{CACHE_FILE_NAME, CACHE_VERSION};
pub use files::{FileStamp, FileTracker};
pub use filter::SymbolFilter;
pub use report::{BuildReport, BuildStatus};
pub use store::SymbolStore;

use filter::{sort_by_line, sort_by_name};
use crate::error::Result;
use crate::model::{Symbol, SymbolReference};
use crate::project::{discover_source_files, key_to_path, relative_key, same_file};
use crate::scanner::{GmlScanner, ScanOutput, SourceScanner};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Symbol index over the GML sources of one project root.
///
/// Owns its symbol store, file metadata and built flag; nothing is shared
/// between instances. Queries build the index on first use. All work is
/// synchronous: async callers should move it onto a blocking thread.
pub struct GmlIndex {
    project_root: PathBuf,
    scanner: Box<dyn SourceScanner>,
    store: SymbolStore,
    files: FileTracker,
    built: bool,
}

impl GmlIndex {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self::with_scanner(project_root, Box::new(GmlScanner::new()))
    }

    pub fn with_scanner(project_root: impl Into<PathBuf>, scanner: Box<dyn SourceScanner>) -> Self {
        let project_root = project_root.into();
        let project_root = project_root.canonicalize().unwrap_or(project_root);
        Self {
            project_root,
            scanner,
            store: SymbolStore::new(),
            files: FileTracker::new(),
            built: false,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn cache_path(&self) -> PathBuf {
        self.project_root.join(CACHE_FILE_NAME)
    }

    /// True once a build or cache load has populated this instance.
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Builds the index, reusing the on-disk cache unless `force` is set.
    ///
    /// With a valid cache only added and changed files are rescanned, and
    /// if nothing changed no file is read or written at all. Unreadable
    /// source files are skipped; cache failures fall back to a full scan.
    pub fn build(&mut self, force: bool) -> BuildReport {
        let cache_path = self.cache_path();

        if !force && cache_path.exists() {
            match cache::load_cache(&cache_path) {
                Ok(loaded) => {
                    self.files = loaded.files;
                    self.store = loaded.store;
                    self.built = true;
                    return self.refresh(&cache_path);
                }
                Err(e) => {
                    warn!(
                        "Ignoring index cache at {}: {}. Rebuilding from scratch.",
                        cache_path.display(),
                        e
                    );
                }
            }
        }

        self.full_build(&cache_path)
    }

    fn full_build(&mut self, cache_path: &Path) -> BuildReport {
        self.store.clear();
        self.files.clear();

        let mut scanned = 0;
        for path in discover_source_files(&self.project_root) {
            let Some(key) = relative_key(&self.project_root, &path) else {
                continue;
            };
            if self.index_file(key) {
                scanned += 1;
            }
        }

        self.built = true;
        self.persist(cache_path);

        let report = BuildReport::built(self.store.symbol_count(), self.store.reference_count(), scanned);
        info!(
            "Indexed {} files under {}: {} symbols, {} references",
            report.files,
            self.project_root.display(),
            report.symbols,
            report.references
        );
        report
    }

    /// Brings freshly loaded cache state in line with the disk.
    fn refresh(&mut self, cache_path: &Path) -> BuildReport {
        let current: BTreeSet<String> = discover_source_files(&self.project_root)
            .iter()
            .filter_map(|path| relative_key(&self.project_root, path))
            .collect();
        let cached = self.files.keys();

        let added: BTreeSet<String> = current.difference(&cached).cloned().collect();
        let removed: BTreeSet<String> = cached.difference(&current).cloned().collect();
        let mut changed = BTreeSet::new();
        for key in current.intersection(&cached) {
            let path = key_to_path(&self.project_root, key);
            match FileStamp::of(&path) {
                Ok(stamp) => {
                    if self.files.is_stale(key, &stamp) {
                        changed.insert(key.clone());
                    }
                }
                // Unstattable now: drop its entries rather than serve stale ones.
                Err(e) => {
                    debug!("Cannot stat {}: {}", path.display(), e);
                    changed.insert(key.clone());
                }
            }
        }

        if added.is_empty() && removed.is_empty() && changed.is_empty() {
            debug!("Index cache for {} is up to date", self.project_root.display());
            return BuildReport::cached(
                self.store.symbol_count(),
                self.store.reference_count(),
                self.files.len(),
            );
        }

        for key in removed.union(&changed) {
            let (defs, refs) = self.store.purge_file(&key_to_path(&self.project_root, key));
            self.files.forget(key);
            debug!("Purged {}: {} definitions, {} references", key, defs, refs);
        }

        let mut scanned = 0;
        for key in added.union(&changed) {
            if self.index_file(key.clone()) {
                scanned += 1;
            }
        }

        self.persist(cache_path);

        let report = BuildReport::incremental(
            self.store.symbol_count(),
            self.store.reference_count(),
            scanned,
            added.len(),
            changed.len(),
            removed.len(),
        );
        info!(
            "Updated index for {}: +{} ~{} -{} files, {} symbols, {} references",
            self.project_root.display(),
            added.len(),
            changed.len(),
            removed.len(),
            report.symbols,
            report.references
        );
        report
    }

    /// Scans one file into the store. Returns false if it was skipped.
    fn index_file(&mut self, key: String) -> bool {
        let path = key_to_path(&self.project_root, &key);
        match self.scan_file(&path) {
            Ok((stamp, output)) => {
                debug!(
                    "Scanned {}: {} symbols, {} references",
                    key,
                    output.symbols.len(),
                    output.references.len()
                );
                self.files.record(key, stamp);
                self.store.extend(output);
                true
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                false
            }
        }
    }

    fn scan_file(&self, path: &Path) -> Result<(FileStamp, ScanOutput)> {
        let stamp = FileStamp::of(path)?;
        let bytes = fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        Ok((stamp, self.scanner.scan_content(&content, path)))
    }

    /// Writes the cache; a failure only costs the next run a full scan.
    fn persist(&self, cache_path: &Path) {
        if let Err(e) = cache::save_cache(cache_path, &self.files, &self.store) {
            warn!("Failed to write index cache {}: {}", cache_path.display(), e);
        }
    }

    fn ensure_built(&mut self) {
        if !self.built {
            self.build(false);
        }
    }

    /// Every definition of `name`, in insertion order. Empty if unknown.
    pub fn find_definition(&mut self, name: &str) -> &[Symbol] {
        self.ensure_built();
        self.store.definitions_of(name)
    }

    /// Every usage of `name`, whether or not it has a definition.
    pub fn find_references(&mut self, name: &str) -> &[SymbolReference] {
        self.ensure_built();
        self.store.references_to(name)
    }

    /// Matching definitions sorted by name, case-insensitively.
    pub fn list_symbols(&mut self, filter: &SymbolFilter) -> Vec<&Symbol> {
        self.ensure_built();
        let mut symbols: Vec<&Symbol> = self.store.symbols().filter(|s| filter.matches(s)).collect();
        sort_by_name(&mut symbols);
        symbols
    }

    /// Definitions located in `file_path`, sorted by line. A relative path
    /// is taken relative to the project root.
    pub fn get_symbols_in_file(&mut self, file_path: &Path) -> Vec<&Symbol> {
        self.ensure_built();
        let target = if file_path.is_relative() {
            self.project_root.join(file_path)
        } else {
            file_path.to_path_buf()
        };
        let mut symbols: Vec<&Symbol> = self
            .store
            .symbols()
            .filter(|s| same_file(&s.location.file_path, &target))
            .collect();
        sort_by_line(&mut symbols);
        symbols
    }

    /// Deletes the cache file and forgets all in-memory state.
    /// Returns whether a cache file existed.
    pub fn clear_cache(&mut self) -> Result<bool> {
        self.store.clear();
        self.files.clear();
        self.built = false;

        let path = self.cache_path();
        if path.exists() {
            fs::remove_file(&path)?;
            info!("Removed index cache {}", path.display());
            return Ok(true);
        }
        Ok(false)
    }
}

impl std::fmt::Debug for GmlIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GmlIndex")
            .field("project_root", &self.project_root)
            .field("symbols", &self.store.symbol_count())
            .field("references", &self.store.reference_count())
            .field("files", &self.files.len())
            .field("built", &self.built)
            .finish()
    }
}
