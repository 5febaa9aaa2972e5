mod gml;
mod sanitize;

pub use gml::GmlScanner;

use crate::model::{Symbol, SymbolReference};
use std::path::Path;

/// Definitions and usages extracted from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutput {
    pub symbols: Vec<Symbol>,
    pub references: Vec<SymbolReference>,
}

/// Extracts symbols from source text.
///
/// Implementations must be pure with respect to `content` and `file_path`:
/// the index relies on rescanning an unchanged file producing the same output.
pub trait SourceScanner: Send + Sync {
    fn scan_content(&self, content: &str, file_path: &Path) -> ScanOutput;
}
