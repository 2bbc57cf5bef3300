//! Application state management

use crate::persist::{KvPersistence, StatePersistence};
use crate::registry::EntryRegistry;
use crate::simulator::TransferSimulator;
use crate::store::FileStore;
use crate::{AppConfig, AppError, Debouncer};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Lock-guarded owner of the [`FileStore`] that saves on change
///
/// Every mutation runs to completion under one lock. When it leaves the
/// store at a new revision the snapshot is written before the lock is
/// released, so saves happen in mutation order.
pub struct StoreHandle {
    store: Mutex<FileStore>,
    persistence: Box<dyn StatePersistence>,
    saved_revision: Mutex<u64>,
}

impl StoreHandle {
    pub fn new(store: FileStore, persistence: impl StatePersistence + 'static) -> Self {
        let saved = store.revision();
        Self {
            store: Mutex::new(store),
            persistence: Box::new(persistence),
            saved_revision: Mutex::new(saved),
        }
    }

    /// Load the stored snapshot (or start empty) on top of `registry`
    pub fn load(registry: EntryRegistry, config: &AppConfig, persistence: impl StatePersistence + 'static) -> Self {
        let defaults = |registry: EntryRegistry| {
            FileStore::new(registry).with_view_defaults(
                config.filer.sort_by,
                config.filer.sort_order,
                config.filer.view_mode,
            )
        };

        let store = match persistence.load() {
            Ok(Some(snapshot)) => FileStore::from_snapshot(snapshot, registry),
            Ok(None) => defaults(registry),
            Err(e) => {
                tracing::warn!("Failed to load stored state, starting empty: {}", e);
                defaults(registry)
            }
        };

        Self::new(store, persistence)
    }

    /// Run `f` with shared access
    pub fn read<R>(&self, f: impl FnOnce(&FileStore) -> R) -> R {
        f(&self.store.lock())
    }

    /// Run `f` with exclusive access, then save if persisted state changed
    pub fn update<R>(&self, f: impl FnOnce(&mut FileStore) -> R) -> R {
        let mut store = self.store.lock();
        let result = f(&mut store);

        let mut saved = self.saved_revision.lock();
        if store.revision() != *saved {
            match self.persistence.save(&store.snapshot()) {
                Ok(()) => *saved = store.revision(),
                Err(e) => tracing::error!("Failed to save state: {}", e),
            }
        }

        result
    }

    /// Write the current snapshot regardless of revision
    pub fn save_now(&self) -> Result<(), AppError> {
        let store = self.store.lock();
        self.persistence.save(&store.snapshot())?;
        *self.saved_revision.lock() = store.revision();
        Ok(())
    }

    /// Is there a change that has not been written yet?
    pub fn is_dirty(&self) -> bool {
        let store = self.store.lock();
        store.revision() != *self.saved_revision.lock()
    }
}

/// Main application state
pub struct AppState {
    /// Application configuration
    pub config: RwLock<AppConfig>,

    /// Client state and its persistence
    pub store: Arc<StoreHandle>,

    /// Simulated upload timers
    pub transfers: Arc<TransferSimulator>,

    /// Delays search-as-you-type
    pub search: Arc<Debouncer<String>>,
}

impl AppState {
    /// Create application state backed by the default database
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let kv = app_db::init().map_err(|e| AppError::Init(e.to_string()))?;
        if let Err(e) = kv.purge_expired() {
            tracing::warn!("Failed to purge expired values: {}", e);
        }
        let persistence = KvPersistence::new(kv, config.storage.store_name.clone())
            .with_ttl(config.storage.ttl());
        Ok(Self::with_persistence(config, persistence))
    }

    /// Create application state on an explicit persistence backend
    pub fn with_persistence(config: AppConfig, persistence: impl StatePersistence + 'static) -> Self {
        let registry = EntryRegistry::new(config.general.owner_id.clone())
            .with_recent_limit(config.filer.recent_limit);
        let store = Arc::new(StoreHandle::load(registry, &config, persistence));

        let transfers = Arc::new(TransferSimulator::new(Arc::clone(&store), config.transfer.clone()));

        let search_store = Arc::clone(&store);
        let search = Arc::new(Debouncer::new(config.search.debounce(), move |query: String| {
            tracing::debug!(%query, "Search applied");
            search_store.update(|s| s.set_query(query));
        }));

        Self {
            config: RwLock::new(config),
            store,
            transfers,
            search,
        }
    }

    /// Save the current configuration
    pub fn save_config(&self) -> anyhow::Result<()> {
        self.config.read().save()
    }

    /// Stop timers and flush state
    pub fn shutdown(&self) -> Result<(), AppError> {
        self.transfers.shutdown();
        self.search.flush();
        self.store.update(|s| s.clear_transfers());
        self.store.save_now()
    }
}
