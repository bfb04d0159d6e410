// src/sheets/database/store.rs
//! Blob stores keyed by a fixed identifier.

#[cfg(test)]
use std::collections::HashMap;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use super::error::StoreResult;

/// Key under which the whole spreadsheet library is persisted.
pub const STORAGE_KEY: &str = "spreadsheet_workflow_data";

pub trait SpreadsheetStore {
    fn load(&self, key: &str) -> StoreResult<Option<String>>;
    fn save(&mut self, key: &str, blob: &str) -> StoreResult<()>;
}

/// In-process store; nothing survives the process.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl SpreadsheetStore for MemoryStore {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, blob: &str) -> StoreResult<()> {
        self.entries.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

/// Single key/value table in a SQLite file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        // PRAGMA journal_mode returns the mode that was set
        let journal_mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        if journal_mode.to_uppercase() != "WAL" {
            warn!(
                "Failed to set WAL mode on store {:?}. Current mode: {}",
                path.file_name(),
                journal_mode
            );
        } else {
            debug!("WAL mode activated for store {:?}", path.file_name());
        }

        Self::init(conn)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;
             CREATE TABLE IF NOT EXISTS kv_store (
                 key TEXT PRIMARY KEY,
                 value TEXT NOT NULL,
                 updated_at TEXT NOT NULL
             );",
        )?;
        Ok(Self { conn })
    }
}

impl SpreadsheetStore for SqliteStore {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn save(&mut self, key: &str, blob: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, blob, chrono::Utc::now().to_rfc3339()],
        )?;
        debug!("Store: saved {} bytes under '{}'", blob.len(), key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load(STORAGE_KEY).unwrap(), None);
        store.save(STORAGE_KEY, "{}").unwrap();
        assert_eq!(store.load(STORAGE_KEY).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_sqlite_store_overwrites_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheets.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.save(STORAGE_KEY, "first").unwrap();
            store.save(STORAGE_KEY, "second").unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.load(STORAGE_KEY).unwrap().as_deref(), Some("second"));
        assert_eq!(store.load("other").unwrap(), None);
    }
}
