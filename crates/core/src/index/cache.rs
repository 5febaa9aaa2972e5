//! On-disk snapshot of the index: one JSON document per project.
//!
//! ```json
//! {
//!   "version": 2,
//!   "file_mtimes_ns": { "scripts/a/a.gml": 1700000000000000000 },
//!   "file_sizes": { "scripts/a/a.gml": 120 },
//!   "definitions": [ { "name": "a", "kind": "function", "location": { ... } } ],
//!   "references": [ { "symbol": "b", "location": { ... } } ]
//! }
//! ```

use super::files::FileTracker;
use super::store::SymbolStore;
use crate::error::{GmscopeError, Result};
use crate::model::{Symbol, SymbolReference};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub const CACHE_FILE_NAME: &str = ".gml_index_cache.json";
pub const CACHE_VERSION: u64 = 2;

#[derive(Deserialize)]
struct CacheDocument {
    #[serde(default)]
    version: Option<u64>,
    // `null` reads as an empty map; anything that is not an object of
    // integers fails the whole document.
    #[serde(default)]
    file_mtimes_ns: Option<BTreeMap<String, i64>>,
    #[serde(default)]
    file_sizes: Option<BTreeMap<String, u64>>,
    #[serde(default)]
    definitions: Vec<Symbol>,
    #[serde(default)]
    references: Vec<SymbolReference>,
}

#[derive(Serialize)]
struct CacheView<'a> {
    version: u64,
    file_mtimes_ns: &'a BTreeMap<String, i64>,
    file_sizes: &'a BTreeMap<String, u64>,
    definitions: Vec<&'a Symbol>,
    references: Vec<&'a SymbolReference>,
}

/// Fully reconstructed cache contents, ready to replace the live state.
#[derive(Debug)]
pub struct LoadedCache {
    pub files: FileTracker,
    pub store: SymbolStore,
}

/// Reads and validates a cache document.
///
/// Nothing is returned unless the whole document parses and carries the
/// expected version, so a failed load never leaves partial state behind.
pub fn load_cache(path: &Path) -> Result<LoadedCache> {
    let reader = BufReader::new(File::open(path)?);
    let doc: CacheDocument = serde_json::from_reader(reader)?;

    if doc.version != Some(CACHE_VERSION) {
        return Err(GmscopeError::CacheVersion {
            found: doc.version,
            expected: CACHE_VERSION,
        });
    }

    Ok(LoadedCache {
        files: FileTracker::from_maps(
            doc.file_mtimes_ns.unwrap_or_default(),
            doc.file_sizes.unwrap_or_default(),
        ),
        store: SymbolStore::from_records(doc.definitions, doc.references),
    })
}

/// Writes the full index as a pretty-printed cache document.
pub fn save_cache(path: &Path, files: &FileTracker, store: &SymbolStore) -> Result<()> {
    let view = CacheView {
        version: CACHE_VERSION,
        file_mtimes_ns: files.mtimes_ns(),
        file_sizes: files.sizes(),
        definitions: store.symbols().collect(),
        references: store.references().collect(),
    };

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &view)?;
    writer.flush()?;
    Ok(())
}
