use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GmscopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported cache version: {found:?} (expected {expected})")]
    CacheVersion { found: Option<u64>, expected: u64 },
    #[error("Could not find a GameMaker project directory (.yyp). Tried: {tried:?}")]
    ProjectNotFound { tried: Vec<PathBuf> },
    #[error("Unknown symbol kind '{0}' (expected one of: function, constructor, enum, enum_member, macro, globalvar)")]
    InvalidKind(String),
}

pub type Result<T> = std::result::Result<T, GmscopeError>;
