pub mod symbol;

pub use symbol::{Symbol, SymbolKind, SymbolLocation, SymbolReference};
