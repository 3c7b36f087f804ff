//! Cache storage trait and SQLite implementation.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{LearnError, Result};

/// Trait for the persistent key-value medium behind the cache.
///
/// Values are whole serialized documents; the cache layer never asks the
/// medium for anything finer-grained than a key.
pub trait CacheStorage: Send + Sync {
  /// Read the document stored under `key`.
  fn get(&self, key: &str) -> Result<Option<String>>;

  /// Replace the document stored under `key`.
  fn set(&self, key: &str, value: &str) -> Result<()>;

  /// Delete the documents stored under `keys`. Missing keys are ignored.
  fn remove(&self, keys: &[&str]) -> Result<()>;
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Create a new SQLite storage at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;
    Self::open_at(&path)
  }

  /// Create a new SQLite storage at `path`, creating parent directories.
  pub fn open_at(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| LearnError::storage(format!("Failed to create cache directory: {}", e)))?;
    }

    let conn = Connection::open(path).map_err(|e| {
      LearnError::storage(format!(
        "Failed to open cache database at {}: {}",
        path.display(),
        e
      ))
    })?;

    Self::with_connection(conn)
  }

  /// Create a storage that lives only as long as this value.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| LearnError::storage(format!("Failed to open in-memory cache: {}", e)))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| LearnError::storage("Could not determine data directory"))?;

    Ok(data_dir.join("learnlocal").join("cache.db"))
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| LearnError::storage(format!("Failed to run cache migrations: {}", e)))?;

    Ok(())
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| LearnError::storage(format!("Lock poisoned: {}", e)))
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- One serialized document per key (cached_lessons, cached_chats, ...)
CREATE TABLE IF NOT EXISTS kv_cache (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl CacheStorage for SqliteStorage {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let conn = self.lock()?;

    conn
      .query_row(
        "SELECT value FROM kv_cache WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| LearnError::storage(format!("Failed to read {}: {}", key, e)))
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute(
        "INSERT OR REPLACE INTO kv_cache (key, value, updated_at)
         VALUES (?, ?, datetime('now'))",
        params![key, value],
      )
      .map_err(|e| LearnError::storage(format!("Failed to write {}: {}", key, e)))?;

    Ok(())
  }

  fn remove(&self, keys: &[&str]) -> Result<()> {
    let mut conn = self.lock()?;

    let tx = conn
      .transaction()
      .map_err(|e| LearnError::storage(format!("Failed to begin transaction: {}", e)))?;

    for key in keys {
      tx.execute("DELETE FROM kv_cache WHERE key = ?", params![key])
        .map_err(|e| LearnError::storage(format!("Failed to remove {}: {}", key, e)))?;
    }

    tx.commit()
      .map_err(|e| LearnError::storage(format!("Failed to commit transaction: {}", e)))?;

    Ok(())
  }
}
