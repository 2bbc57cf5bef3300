//! Key/value persistence on SQLite

use crate::{DbError, DbPool, Result};
use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A stored value with its bookkeeping columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvRecord {
    pub key: String,
    pub value: String,
    pub updated_at: i64,
    pub expires_at: Option<i64>,
}

impl KvRecord {
    /// Has this record passed its expiry time at `now` (unix seconds)?
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }
}

/// Key/value store operations
///
/// Expired values are never returned; they are deleted lazily on read or
/// eagerly by [`KvStore::purge_expired`].
#[derive(Clone)]
pub struct KvStore {
    pool: DbPool,
}

impl KvStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Read a raw record, dropping it if expired
    pub fn get_record(&self, key: &str) -> Result<Option<KvRecord>> {
        let conn = self.pool.get().map_err(|e| DbError::Pool(e.to_string()))?;

        let record = conn
            .query_row(
                "SELECT key, value, updated_at, expires_at FROM kv_store WHERE key = ?1",
                [key],
                |row| {
                    Ok(KvRecord {
                        key: row.get(0)?,
                        value: row.get(1)?,
                        updated_at: row.get(2)?,
                        expires_at: row.get(3)?,
                    })
                },
            )
            .optional()?;

        match record {
            Some(record) if record.is_expired_at(Utc::now().timestamp()) => {
                conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
                tracing::debug!(key, "Expired value dropped");
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Read a raw string value
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get_record(key)?.map(|r| r.value))
    }

    /// Insert or replace a value, optionally expiring after `ttl`
    pub fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let conn = self.pool.get().map_err(|e| DbError::Pool(e.to_string()))?;

        let now = Utc::now().timestamp();
        let expires_at = ttl.map(|ttl| now.saturating_add(ttl.as_secs() as i64));

        conn.execute(
            r#"
            INSERT INTO kv_store (key, value, updated_at, expires_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at,
                expires_at = excluded.expires_at
            "#,
            rusqlite::params![key, value, now, expires_at],
        )?;

        Ok(())
    }

    /// Read and decode a JSON value
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encode and store a JSON value
    pub fn put_json<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.put(key, &raw, ttl)
    }

    /// Remove a value; returns whether it existed
    pub fn remove(&self, key: &str) -> Result<bool> {
        let conn = self.pool.get().map_err(|e| DbError::Pool(e.to_string()))?;

        let rows = conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
        Ok(rows > 0)
    }

    /// Delete every expired value; returns how many were removed
    pub fn purge_expired(&self) -> Result<usize> {
        let conn = self.pool.get().map_err(|e| DbError::Pool(e.to_string()))?;

        let rows = conn.execute(
            "DELETE FROM kv_store WHERE expires_at IS NOT NULL AND expires_at <= ?1",
            [Utc::now().timestamp()],
        )?;

        if rows > 0 {
            tracing::info!("Purged {} expired values", rows);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{init_pool, migrate};
    use serde::{Deserialize, Serialize};
    use tempfile::NamedTempFile;

    fn store() -> (NamedTempFile, KvStore) {
        let temp_file = NamedTempFile::new().unwrap();
        let pool = init_pool(temp_file.path()).unwrap();
        migrate(&pool).unwrap();
        (temp_file, KvStore::new(pool))
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        view_mode: String,
        count: u32,
    }

    #[test]
    fn test_put_get_replace() {
        let (_file, kv) = store();
        assert_eq!(kv.get("missing").unwrap(), None);

        kv.put("file-storage", "{\"a\":1}", None).unwrap();
        assert_eq!(kv.get("file-storage").unwrap().as_deref(), Some("{\"a\":1}"));

        kv.put("file-storage", "{\"a\":2}", None).unwrap();
        let record = kv.get_record("file-storage").unwrap().unwrap();
        assert_eq!(record.value, "{\"a\":2}");
        assert_eq!(record.expires_at, None);
    }

    #[test]
    fn test_json_helpers() {
        let (_file, kv) = store();
        let prefs = Prefs {
            view_mode: "list".into(),
            count: 3,
        };
        kv.put_json("prefs", &prefs, None).unwrap();
        assert_eq!(kv.get_json::<Prefs>("prefs").unwrap(), Some(prefs));

        kv.put("broken", "not json", None).unwrap();
        assert!(matches!(
            kv.get_json::<Prefs>("broken"),
            Err(DbError::Serialization(_))
        ));
    }

    #[test]
    fn test_expired_value_reads_as_absent() {
        let (_file, kv) = store();
        kv.put("session", "abc", Some(Duration::ZERO)).unwrap();
        assert_eq!(kv.get("session").unwrap(), None);
        // Lazily deleted on read
        assert!(!kv.remove("session").unwrap());

        kv.put("long", "xyz", Some(Duration::from_secs(3600))).unwrap();
        assert_eq!(kv.get("long").unwrap().as_deref(), Some("xyz"));
    }

    #[test]
    fn test_purge_and_remove() {
        let (_file, kv) = store();
        kv.put("a", "1", Some(Duration::ZERO)).unwrap();
        kv.put("b", "2", Some(Duration::ZERO)).unwrap();
        kv.put("c", "3", None).unwrap();

        assert_eq!(kv.purge_expired().unwrap(), 2);
        assert!(kv.remove("c").unwrap());
        assert!(!kv.remove("c").unwrap());
    }
}
