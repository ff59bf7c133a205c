//! Durable key-value storage for roster.
//!
//! The record collection is persisted through the [`KeyValueStore`] trait.
//! [`SqliteStore`] is the on-disk backend; [`MemoryStore`] keeps everything
//! in a map and is used for tests and throwaway sessions.

mod memory;
pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use memory::MemoryStore;

/// A string-keyed store of string values.
///
/// This is the only persistence seam the [`RecordStore`](crate::RecordStore)
/// depends on.
pub trait KeyValueStore {
    /// Read the value under `key`, or `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// `SQLite`-backed key-value store.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
    /// Skip writes whose content hash matches the stored one.
    skip_unchanged_writes: bool,
}

impl SqliteStore {
    /// Open or create a database at the given path.
    ///
    /// Creates parent directories and the schema as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            path,
            conn,
            skip_unchanged_writes: true,
        })
    }

    /// Create an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
            skip_unchanged_writes: true,
        })
    }

    /// Set whether writes of an unchanged value are skipped.
    #[must_use]
    pub fn with_skip_unchanged_writes(mut self, skip: bool) -> Self {
        self.skip_unchanged_writes = skip;
        self
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `value` under `key`.
    ///
    /// Returns `false` if the write was skipped because the stored value has
    /// the same BLAKE3 hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn put(&self, key: &str, value: &str) -> Result<bool> {
        let value_hash = compute_hash(value);

        if self.skip_unchanged_writes
            && self.stored_hash(key)?.as_deref() == Some(value_hash.as_str())
        {
            debug!("Skipping unchanged write to key {key}");
            return Ok(false);
        }

        self.conn.execute(
            r"
            INSERT INTO kv (key, value, value_hash, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                value_hash = excluded.value_hash,
                updated_at = excluded.updated_at
            ",
            params![key, value, value_hash, Utc::now().to_rfc3339()],
        )?;

        debug!("Wrote {} bytes to key {key}", value.len());
        Ok(true)
    }

    /// When `key` was last written.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT updated_at FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(raw.as_deref().and_then(parse_timestamp))
    }

    fn stored_hash(&self, key: &str) -> Result<Option<String>> {
        let hash = self
            .conn
            .query_row("SELECT value_hash FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(hash)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let (total_keys, value_bytes): (i64, Option<i64>) = self.conn.query_row(
            "SELECT COUNT(*), SUM(LENGTH(CAST(value AS BLOB))) FROM kv",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map_or(0, |m| m.len())
        };

        Ok(StorageStats {
            total_keys,
            value_bytes: value_bytes.unwrap_or(0),
            db_size_bytes,
        })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.put(key, value)?;
        Ok(())
    }
}

/// Statistics about the `SQLite` store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of keys stored.
    pub total_keys: i64,
    /// Combined size of all values in bytes.
    pub value_bytes: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// BLAKE3 hex digest of a stored value.
#[must_use]
pub fn compute_hash(value: &str) -> String {
    blake3::hash(value.as_bytes()).to_hex().to_string()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("failed to create test store")
    }

    #[test]
    fn test_get_missing_key() {
        let store = create_test_store();
        assert_eq!(store.get("items").unwrap(), None);
    }

    #[test]
    fn test_set_and_get() {
        let mut store = create_test_store();
        store.set("items", "[]").unwrap();
        assert_eq!(store.get("items").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_set_overwrites() {
        let mut store = create_test_store();
        store.set("items", "[1]").unwrap();
        store.set("items", "[2]").unwrap();
        assert_eq!(store.get("items").unwrap().as_deref(), Some("[2]"));
        assert_eq!(store.stats().unwrap().total_keys, 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut store = create_test_store();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_put_skips_unchanged_value() {
        let store = create_test_store();
        assert!(store.put("items", "[]").unwrap());
        assert!(!store.put("items", "[]").unwrap());
        assert!(store.put("items", "[{}]").unwrap());
    }

    #[test]
    fn test_put_always_writes_when_skipping_disabled() {
        let store = create_test_store().with_skip_unchanged_writes(false);
        assert!(store.put("items", "[]").unwrap());
        assert!(store.put("items", "[]").unwrap());
    }

    #[test]
    fn test_updated_at() {
        let store = create_test_store();
        assert!(store.updated_at("items").unwrap().is_none());

        let before = Utc::now();
        store.put("items", "[]").unwrap();
        let written = store.updated_at("items").unwrap().unwrap();
        assert!(written >= before - chrono::Duration::seconds(1));
    }

    #[test]
    fn test_stats_empty() {
        let store = create_test_store();
        let stats = store.stats().unwrap();

        assert_eq!(stats.total_keys, 0);
        assert_eq!(stats.value_bytes, 0);
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_stats_with_data() {
        let mut store = create_test_store();
        store.set("items", "héllo").unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_keys, 1);
        assert_eq!(stats.value_bytes, 6);
    }

    #[test]
    fn test_path() {
        let store = create_test_store();
        assert_eq!(store.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_compute_hash_consistency() {
        assert_eq!(compute_hash("[]"), compute_hash("[]"));
        assert_ne!(compute_hash("[]"), compute_hash("[{}]"));
        assert_eq!(compute_hash("").len(), 64);
    }

    #[test]
    fn test_open_file_based_persists() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("roster.db");

        {
            let mut store = SqliteStore::open(&db_path).unwrap();
            assert_eq!(store.path(), db_path);
            store.set("items", r#"[{"name":"Ali"}]"#).unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        assert_eq!(
            store.get("items").unwrap().as_deref(),
            Some(r#"[{"name":"Ali"}]"#)
        );
        assert!(store.stats().unwrap().db_size_bytes > 0);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested_path = dir.path().join("nested/deeper/roster.db");

        let _store = SqliteStore::open(&nested_path).unwrap();
        assert!(nested_path.exists());
    }
}
