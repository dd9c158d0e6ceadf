//! SQLite-backed key-value store
//!
//! Every value is a JSON blob stored under a string key.

use crate::error::{Error, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Synchronous JSON blob storage keyed by string.
pub trait KeyValueStore: Send + Sync {
    /// The blob stored under `key`, if any.
    fn get_json(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Store `value` under `key`, replacing any previous blob.
    fn set_json(&self, key: &str, value: &serde_json::Value) -> Result<()>;

    /// Delete `key`. Returns whether it existed.
    fn remove(&self, key: &str) -> Result<bool>;

    /// All keys, sorted.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Typed access on top of [`KeyValueStore`].
pub trait KeyValueStoreExt: KeyValueStore {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_json(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.set_json(key, &serde_json::to_value(value)?)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

/// Database handle (single serialized connection)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        tracing::debug!(path = %path.display(), "Opened database");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.connection()?;
        super::schema::run_migrations(&conn)
    }

    /// Lock the underlying connection
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Storage("database connection lock poisoned".to_string()))
    }
}

impl KeyValueStore for Database {
    fn get_json(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.connection()?;
        let raw: Option<String> = conn
            .query_row("SELECT value FROM kv_store WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;

        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn set_json(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let conn = self.connection()?;
        let removed = conn.execute("DELETE FROM kv_store WHERE key = ?", [key])?;
        Ok(removed > 0)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    #[test]
    fn test_get_missing_key() {
        let db = test_db();
        assert!(db.get_json("habits").unwrap().is_none());
        assert!(db.keys().unwrap().is_empty());
    }

    #[test]
    fn test_set_and_overwrite() {
        let db = test_db();
        db.set_json("achievements", &json!(["streak-7"])).unwrap();
        db.set_json("achievements", &json!(["streak-7", "streak-30"]))
            .unwrap();

        assert_eq!(
            db.get_json("achievements").unwrap(),
            Some(json!(["streak-7", "streak-30"]))
        );
        assert_eq!(db.keys().unwrap(), vec!["achievements"]);
    }

    #[test]
    fn test_remove() {
        let db = test_db();
        db.set_json("a", &json!(1)).unwrap();
        assert!(db.remove("a").unwrap());
        assert!(!db.remove("a").unwrap());
        assert!(db.get_json("a").unwrap().is_none());
    }

    #[test]
    fn test_typed_helpers() {
        let db = test_db();
        db.set("ids", &vec!["x".to_string(), "y".to_string()])
            .unwrap();
        let ids: Option<Vec<String>> = db.get("ids").unwrap();
        assert_eq!(ids, Some(vec!["x".to_string(), "y".to_string()]));

        db.set_json("bad", &json!({"not": "a list"})).unwrap();
        let bad: Result<Option<Vec<String>>> = db.get("bad");
        assert!(matches!(bad, Err(Error::Json(_))));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("habits.db");

        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();
        db.set_json("k", &json!("v")).unwrap();
        drop(db);

        let reopened = Database::open(&path).unwrap();
        reopened.migrate().unwrap();
        assert_eq!(reopened.get_json("k").unwrap(), Some(json!("v")));
    }
}
