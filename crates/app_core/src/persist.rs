//! Snapshot persistence
//!
//! The store is saved as one JSON document under a single key, the same
//! shape whichever backend holds it.

use crate::entry::{Entry, EntryId};
use crate::error::Result;
use crate::view::{SortBy, SortOrder, ViewMode};
use app_db::{DbError, KvStore};
use app_fs::VirtualPath;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Current snapshot layout version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Persisted projection of the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub current_path: VirtualPath,
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub recents: Vec<EntryId>,
    #[serde(default)]
    pub starred: Vec<EntryId>,
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            current_path: VirtualPath::root(),
            entries: Vec::new(),
            recents: Vec::new(),
            starred: Vec::new(),
            view_mode: ViewMode::default(),
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
        }
    }
}

/// Where snapshots live
pub trait StatePersistence: Send + Sync {
    /// `Ok(None)` when nothing usable is stored
    fn load(&self) -> Result<Option<Snapshot>>;
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

fn accept(snapshot: Snapshot) -> Option<Snapshot> {
    if snapshot.version > SNAPSHOT_VERSION {
        tracing::warn!(
            version = snapshot.version,
            supported = SNAPSHOT_VERSION,
            "Ignoring snapshot from a newer version"
        );
        return None;
    }
    Some(snapshot)
}

/// Snapshot stored in the SQLite key/value table
#[derive(Clone)]
pub struct KvPersistence {
    kv: KvStore,
    key: String,
    ttl: Option<Duration>,
}

impl KvPersistence {
    pub fn new(kv: KvStore, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
            ttl: None,
        }
    }

    /// Stored snapshots read as absent once `ttl` has passed since the last save
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl StatePersistence for KvPersistence {
    fn load(&self) -> Result<Option<Snapshot>> {
        match self.kv.get_json::<Snapshot>(&self.key) {
            Ok(Some(snapshot)) => Ok(accept(snapshot)),
            Ok(None) => {
                tracing::info!(key = %self.key, "No stored snapshot");
                Ok(None)
            }
            Err(DbError::Serialization(e)) => {
                tracing::warn!(key = %self.key, "Stored snapshot is unreadable: {}", e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        self.kv.put_json(&self.key, snapshot, self.ttl)?;
        tracing::debug!(key = %self.key, entries = snapshot.entries.len(), "Snapshot saved");
        Ok(())
    }
}

/// In-process persistence; clones share the same slot
#[derive(Clone, Default)]
pub struct MemoryPersistence {
    slot: Arc<Mutex<Option<String>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }

    /// Raw stored JSON
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().clone()
    }

    pub fn set_raw(&self, raw: impl Into<String>) {
        *self.slot.lock() = Some(raw.into());
    }
}

impl StatePersistence for MemoryPersistence {
    fn load(&self) -> Result<Option<Snapshot>> {
        let raw = self.slot.lock().clone();
        match raw {
            Some(raw) => match serde_json::from_str::<Snapshot>(&raw) {
                Ok(snapshot) => Ok(accept(snapshot)),
                Err(e) => {
                    tracing::warn!("Stored snapshot is unreadable: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let raw = serde_json::to_string(snapshot)
            .map_err(|e| crate::AppError::Storage(e.to_string()))?;
        *self.slot.lock() = Some(raw);
        *self.saves.lock() += 1;
        Ok(())
    }
}
