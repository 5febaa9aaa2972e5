use crate::model::{Symbol, SymbolReference};
use crate::project::same_file;
use crate::scanner::ScanOutput;
use std::collections::HashMap;
use std::path::Path;

/// Name-keyed definitions and references.
///
/// Keys are bare names: one name may have any number of definitions (across
/// files or kinds) and, independently, any number of references. A name key
/// never maps to an empty list.
#[derive(Debug, Clone, Default)]
pub struct SymbolStore {
    definitions: HashMap<String, Vec<Symbol>>,
    references: HashMap<String, Vec<SymbolReference>>,
}

impl SymbolStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(
        symbols: impl IntoIterator<Item = Symbol>,
        references: impl IntoIterator<Item = SymbolReference>,
    ) -> Self {
        let mut store = Self::new();
        for symbol in symbols {
            store.insert_symbol(symbol);
        }
        for reference in references {
            store.insert_reference(reference);
        }
        store
    }

    pub fn insert_symbol(&mut self, symbol: Symbol) {
        self.definitions
            .entry(symbol.name.clone())
            .or_default()
            .push(symbol);
    }

    pub fn insert_reference(&mut self, reference: SymbolReference) {
        self.references
            .entry(reference.symbol_name.clone())
            .or_default()
            .push(reference);
    }

    pub fn extend(&mut self, output: ScanOutput) {
        for symbol in output.symbols {
            self.insert_symbol(symbol);
        }
        for reference in output.references {
            self.insert_reference(reference);
        }
    }

    pub fn definitions_of(&self, name: &str) -> &[Symbol] {
        self.definitions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn references_to(&self, name: &str) -> &[SymbolReference] {
        self.references.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.definitions.values().flatten()
    }

    pub fn references(&self) -> impl Iterator<Item = &SymbolReference> {
        self.references.values().flatten()
    }

    pub fn symbol_count(&self) -> usize {
        self.definitions.values().map(Vec::len).sum()
    }

    pub fn reference_count(&self) -> usize {
        self.references.values().map(Vec::len).sum()
    }

    /// Drops every definition and reference located in `target`, along with
    /// any name key left empty. Returns how many definitions and references
    /// were removed.
    pub fn purge_file(&mut self, target: &Path) -> (usize, usize) {
        let before = (self.symbol_count(), self.reference_count());

        self.definitions.retain(|_, symbols| {
            symbols.retain(|s| !same_file(&s.location.file_path, target));
            !symbols.is_empty()
        });
        self.references.retain(|_, refs| {
            refs.retain(|r| !same_file(&r.location.file_path, target));
            !refs.is_empty()
        });

        (
            before.0 - self.symbol_count(),
            before.1 - self.reference_count(),
        )
    }

    pub fn clear(&mut self) {
        self.definitions.clear();
        self.references.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty() && self.references.is_empty()
    }
}
