// src/sheets/database/mod.rs

pub mod error;
pub mod library;
pub mod store;

pub use error::StoreError;
pub use library::SheetLibrary;
#[cfg(test)]
pub use store::MemoryStore;
pub use store::{SpreadsheetStore, SqliteStore};

use std::path::{Path, PathBuf};

const DB_FILE_NAME: &str = "sheets.db";
const WORKFLOW_FILE_NAME: &str = "workflow.json";
const CACHE_DIR_NAME: &str = "llm_cache";

/// Where the library database, the workflow file and the LLM cache live.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn default_path() -> PathBuf {
        directories_next::ProjectDirs::from("com", "sheetflow", "sheetflow")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".sheetflow"))
    }

    pub fn new() -> Self {
        Self {
            data_dir: Self::default_path(),
        }
    }

    pub fn at(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn workflow_path(&self) -> PathBuf {
        self.data_dir.join(WORKFLOW_FILE_NAME)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join(CACHE_DIR_NAME)
    }

    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new()
    }
}
