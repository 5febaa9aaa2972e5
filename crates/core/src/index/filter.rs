use crate::model::{Symbol, SymbolKind};

/// Conjunctive filter for [`GmlIndex::list_symbols`](super::GmlIndex::list_symbols).
///
/// Name and file filters are case-insensitive substring matches; empty
/// strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolFilter {
    pub kind: Option<SymbolKind>,
    pub name: Option<String>,
    pub file: Option<String>,
}

impl SymbolFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: SymbolKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn name(mut self, needle: impl Into<String>) -> Self {
        self.name = Some(needle.into());
        self
    }

    pub fn file(mut self, needle: impl Into<String>) -> Self {
        self.file = Some(needle.into());
        self
    }

    pub fn matches(&self, symbol: &Symbol) -> bool {
        if let Some(kind) = self.kind {
            if symbol.kind != kind {
                return false;
            }
        }
        if let Some(needle) = non_empty(&self.name) {
            if !symbol.name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(needle) = non_empty(&self.file) {
            let file = symbol.location.file_path.to_string_lossy().to_lowercase();
            if !file.contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Case-insensitive name order. Ties fall back to exact name, then
/// location, so the output never depends on hash-map iteration.
pub(crate) fn sort_by_name(symbols: &mut [&Symbol]) {
    symbols.sort_by_cached_key(|s| {
        (
            s.name.to_lowercase(),
            s.name.clone(),
            s.location.file_path.clone(),
            s.location.line,
            s.location.column,
        )
    });
}

/// Line order within one file.
pub(crate) fn sort_by_line(symbols: &mut [&Symbol]) {
    symbols.sort_by_key(|s| (s.location.line, s.location.column));
}
