//! Pooled connections to the state database

use crate::{DbError, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use std::time::Duration;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Pool sizing and lock wait
///
/// One writer at a time is all SQLite allows, so the pool only needs to
/// cover the shell plus transfer timers saving on completion.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub max_size: u32,
    pub min_idle: Option<u32>,
    /// How long a connection waits on a locked database
    pub busy_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_size: 4,
            min_idle: Some(1),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Open a pool on `path` with default options
pub fn init_pool(path: &Path) -> Result<DbPool> {
    init_pool_with(path, &PoolOptions::default())
}

pub fn init_pool_with(path: &Path, options: &PoolOptions) -> Result<DbPool> {
    let busy_ms = options.busy_timeout.as_millis();
    let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = {busy_ms};"
        ))
    });

    Pool::builder()
        .max_size(options.max_size)
        .min_idle(options.min_idle)
        .build(manager)
        .map_err(|e| DbError::Pool(e.to_string()))
}
