pub mod error;
pub mod index;
pub mod logging;
pub mod model;
pub mod project;
pub mod scanner;

pub use error::{GmscopeError, Result};
pub use index::{BuildReport, BuildStatus, GmlIndex, SymbolFilter};
pub use model::{Symbol, SymbolKind, SymbolLocation, SymbolReference};
pub use scanner::{GmlScanner, ScanOutput, SourceScanner};
