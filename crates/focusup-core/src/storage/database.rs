//! SQLite-backed durable store.
//!
//! One `kv` table holds both scopes; values are JSON text.

use std::path::Path;

use rusqlite::{params, Connection};
use serde_json::Value;

use super::{data_dir, KeyValueStore, Scope};
use crate::error::{CoreError, StoreError};

/// SQLite database holding the extension's durable key-value state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/focusup/focusup.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("focusup.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                scope TEXT NOT NULL,
                key   TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (scope, key)
            );",
        )?;
        Ok(())
    }

    /// Get a raw value from the kv store.
    pub fn kv_get(&self, scope: Scope, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv WHERE scope = ?1 AND key = ?2")?;
        let result = stmt.query_row(params![scope.as_str(), key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a raw value in the kv store.
    pub fn kv_set(&self, scope: Scope, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (scope, key, value) VALUES (?1, ?2, ?3)",
            params![scope.as_str(), key, value],
        )?;
        Ok(())
    }

    /// All keys of a scope, sorted.
    pub fn kv_keys(&self, scope: Scope) -> Result<Vec<String>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv WHERE scope = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![scope.as_str()], |row| row.get::<_, String>(0))?;
        rows.collect()
    }
}

impl KeyValueStore for Database {
    async fn get(&self, scope: Scope, key: &str) -> Result<Option<Value>, StoreError> {
        match self.kv_get(scope, key)? {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| StoreError::Corrupt {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    async fn set(&self, scope: Scope, key: &str, value: Value) -> Result<(), StoreError> {
        self.kv_set(scope, key, &value.to_string())?;
        Ok(())
    }
}
