// src/sheets/database/error.rs

use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
    SerdeJson(serde_json::Error),
    EntityNotFound(String),
    HeaderOutOfRange(usize),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Sqlite(e) => write!(f, "SQLite error: {}", e),
            StoreError::Io(e) => write!(f, "I/O error: {}", e),
            StoreError::SerdeJson(e) => write!(f, "JSON error: {}", e),
            StoreError::EntityNotFound(id) => write!(f, "Spreadsheet entity not found: {}", id),
            StoreError::HeaderOutOfRange(i) => write!(f, "No header at index {}", i),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Sqlite(e)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::SerdeJson(e)
    }
}
