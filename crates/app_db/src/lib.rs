//! Nexus Files Database Layer
//!
//! Provides a SQLite-backed key/value store for persisted client state
//! (file registry snapshots, view preferences), with optional per-key expiry.

mod kv;
mod schema;
mod pool;

pub use kv::{KvStore, KvRecord};
pub use pool::{init_pool, init_pool_with, DbPool, PoolOptions};
pub use schema::migrate;

use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Get the database directory
pub fn db_dir() -> PathBuf {
    ProjectDirs::from("com", "NexusFiles", "NexusFiles")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Open the key/value store under `dir`, creating and migrating it if needed
pub fn open(dir: &Path) -> Result<KvStore> {
    std::fs::create_dir_all(dir)?;

    let sqlite_path = dir.join("state.db");
    let pool = init_pool(&sqlite_path)?;
    migrate(&pool)?;

    tracing::info!("Database initialized at {:?}", sqlite_path);
    Ok(KvStore::new(pool))
}

/// Open the store in the default platform data directory
pub fn init() -> Result<KvStore> {
    open(&db_dir())
}
