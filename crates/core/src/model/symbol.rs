use crate::error::GmscopeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Kind of a GML definition site.
///
/// Serialized as the lowercase names the cache format and the tool layer use.
/// A cache entry carrying any other string fails to deserialize, which
/// rejects the whole cache document.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Constructor,
    Enum,
    EnumMember,
    Macro,
    #[serde(rename = "globalvar")]
    GlobalVar,
}

impl SymbolKind {
    pub const ALL: [SymbolKind; 6] = [
        SymbolKind::Function,
        SymbolKind::Constructor,
        SymbolKind::Enum,
        SymbolKind::EnumMember,
        SymbolKind::Macro,
        SymbolKind::GlobalVar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Enum => "enum",
            SymbolKind::EnumMember => "enum_member",
            SymbolKind::Macro => "macro",
            SymbolKind::GlobalVar => "globalvar",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymbolKind {
    type Err = GmscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        SymbolKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| GmscopeError::InvalidKind(s.to_string()))
    }
}

/// Position of a definition or reference. Lines and columns are 1-based.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolLocation {
    #[serde(rename = "file")]
    pub file_path: PathBuf,
    pub line: usize,
    #[serde(default)]
    pub column: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
}

impl SymbolLocation {
    pub fn new(file_path: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            file_path: file_path.into(),
            line,
            column,
            end_line: None,
            end_column: None,
        }
    }

    pub fn with_end(mut self, end_line: usize, end_column: usize) -> Self {
        self.end_line = Some(end_line);
        self.end_column = Some(end_column);
        self
    }
}

/// A definition site.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub location: SymbolLocation,
    #[serde(rename = "doc", default, skip_serializing_if = "Option::is_none")]
    pub doc_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_enum: Option<String>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, location: SymbolLocation) -> Self {
        Self {
            name: name.into(),
            kind,
            location,
            doc_comment: None,
            parameters: Vec::new(),
            parent_enum: None,
        }
    }
}

/// A usage site. The referenced name may have no definition at all
/// (built-in engine functions are the common case).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SymbolReference {
    #[serde(rename = "symbol")]
    pub symbol_name: String,
    pub location: SymbolLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl SymbolReference {
    pub fn new(symbol_name: impl Into<String>, location: SymbolLocation) -> Self {
        Self {
            symbol_name: symbol_name.into(),
            location,
            context: None,
        }
    }
}
