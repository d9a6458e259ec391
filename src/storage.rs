//! Local key-value store backed by SQLite.
//!
//! Plays the role browser local storage plays for a web app: a flat table of
//! string keys and string values that survives restarts. Typed values go
//! through `get_json` / `set_json`.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Keys used by the application.
pub mod keys {
  pub const THEME: &str = "theme";
  pub const TASKS: &str = "tasks";
  pub const TASK_FILTER: &str = "task_filter";
  pub const SEARCH_HISTORY: &str = "search_history";
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

pub struct LocalStorage {
  conn: Mutex<Connection>,
}

impl LocalStorage {
  /// Open or create the store at `path`, creating parent directories.
  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create storage directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open storage at {}: {}", path.display(), e))?;
    debug!(path = %path.display(), "opened local storage");

    Self::with_connection(conn)
  }

  /// Store that lives only as long as this value.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory storage: {}", e))?;
    Self::with_connection(conn)
  }

  /// Path of the storage file inside a data directory.
  pub fn path_in(data_dir: &Path) -> PathBuf {
    data_dir.join("storage.db")
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(SCHEMA)
      .map_err(|e| eyre!("Failed to run storage migrations: {}", e))?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  pub fn get(&self, key: &str) -> Result<Option<String>> {
    let conn = self.conn()?;
    conn
      .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
        row.get(0)
      })
      .optional()
      .map_err(|e| eyre!("Failed to read key {}: {}", key, e))
  }

  pub fn set(&self, key: &str, value: &str) -> Result<()> {
    let conn = self.conn()?;
    conn
      .execute(
        "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?, ?, datetime('now'))",
        params![key, value],
      )
      .map_err(|e| eyre!("Failed to write key {}: {}", key, e))?;
    Ok(())
  }

  /// Remove `key`. Returns whether it existed.
  pub fn remove(&self, key: &str) -> Result<bool> {
    let conn = self.conn()?;
    let removed = conn
      .execute("DELETE FROM kv WHERE key = ?", params![key])
      .map_err(|e| eyre!("Failed to remove key {}: {}", key, e))?;
    Ok(removed > 0)
  }

  /// Read and deserialize a JSON value. A value that does not parse is an error.
  pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
    match self.get(key)? {
      Some(raw) => serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| eyre!("Failed to parse stored value for {}: {}", key, e)),
      None => Ok(None),
    }
  }

  pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
    let raw =
      serde_json::to_string(value).map_err(|e| eyre!("Failed to serialize {}: {}", key, e))?;
    self.set(key, &raw)
  }
}

impl std::fmt::Debug for LocalStorage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LocalStorage").finish_non_exhaustive()
  }
}
