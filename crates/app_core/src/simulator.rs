//! Simulated upload timers
//!
//! Each transfer gets one tokio task that ticks on a fixed cadence and
//! advances the record through the store. No bytes move anywhere.

use crate::config::TransferConfig;
use crate::entry::UploadDescriptor;
use crate::error::Result;
use crate::state::StoreHandle;
use crate::transfer::{TransferId, TransferStatus};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use xxhash_rust::xxh3::xxh3_64;

/// Progress increment for one tick, in `(0, max]`
///
/// Derived from a hash of the transfer id and tick number, so a run is
/// reproducible.
pub fn tick_increment(id: TransferId, tick: u64, max: f32) -> f32 {
    let mut seed = [0u8; 16];
    seed[..8].copy_from_slice(&id.as_u64().to_le_bytes());
    seed[8..].copy_from_slice(&tick.to_le_bytes());

    // 53 significant bits -> (0, 1]
    let bits = xxh3_64(&seed) >> 11;
    let unit = (bits as f64 + 1.0) / (1u64 << 53) as f64;
    (unit * f64::from(max.max(0.0))) as f32
}

pub struct TransferSimulator {
    store: Arc<StoreHandle>,
    config: TransferConfig,
    tasks: Mutex<HashMap<TransferId, JoinHandle<()>>>,
}

impl TransferSimulator {
    pub fn new(store: Arc<StoreHandle>, config: TransferConfig) -> Self {
        Self {
            store,
            config,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Queue uploads into the current directory and start their timers
    ///
    /// All names are checked before anything is queued. Must be called
    /// inside a tokio runtime.
    pub fn upload(&self, files: Vec<UploadDescriptor>) -> Result<Vec<TransferId>> {
        for file in &files {
            app_fs::validate_name(&file.name)?;
        }

        let ids = self.store.update(|store| {
            files
                .into_iter()
                .map(|file| store.start_upload(file))
                .collect::<Result<Vec<_>>>()
        })?;

        for &id in &ids {
            self.spawn(id);
        }
        tracing::info!(count = ids.len(), "Uploads started");
        Ok(ids)
    }

    fn spawn(&self, id: TransferId) {
        let store = Arc::clone(&self.store);
        let config = self.config.clone();
        let task = tokio::spawn(run_transfer(store, id, config));

        let mut tasks = self.tasks.lock();
        tasks.retain(|_, handle| !handle.is_finished());
        tasks.insert(id, task);
    }

    /// Timers still running, including grace periods
    pub fn active(&self) -> usize {
        let mut tasks = self.tasks.lock();
        tasks.retain(|_, handle| !handle.is_finished());
        tasks.len()
    }

    /// Abort every timer; nothing touches the store afterwards
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            tracing::info!(count = tasks.len(), "Aborting transfer timers");
        }
        for (_, handle) in tasks.drain() {
            handle.abort();
        }
    }
}

impl Drop for TransferSimulator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_transfer(store: Arc<StoreHandle>, id: TransferId, config: TransferConfig) {
    let step = config.tick_interval();
    let mut interval = tokio::time::interval(step);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    interval.tick().await;

    let mut tick = 0u64;
    loop {
        interval.tick().await;
        tick += 1;

        let increment = tick_increment(id, tick, config.increment_ceiling());
        match store.update(|s| s.advance_transfer(id, increment, step)) {
            Some(TransferStatus::Uploading) => continue,
            Some(_) => break,
            None => return,
        }
    }

    tokio::time::sleep(config.completion_grace()).await;
    store.update(|s| s.remove_transfer(id));
    tracing::debug!(%id, "Transfer record cleared");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryPersistence;
    use crate::store::FileStore;
    use app_fs::VirtualPath;
    use std::time::Duration;
    use tokio::time::sleep;

    fn setup() -> (Arc<StoreHandle>, MemoryPersistence, TransferSimulator) {
        let memory = MemoryPersistence::new();
        let store = Arc::new(StoreHandle::new(FileStore::default(), memory.clone()));
        let sim = TransferSimulator::new(Arc::clone(&store), TransferConfig::default());
        (store, memory, sim)
    }

    fn registered(store: &StoreHandle, name: &str) -> bool {
        store.read(|s| {
            s.registry()
                .get_by_path(&VirtualPath::root().join(name).unwrap())
                .is_some()
        })
    }

    #[test]
    fn test_increment_in_range() {
        let mut queue = crate::transfer::TransferQueue::new();
        let id = queue.enqueue(UploadDescriptor::new("a", 1), VirtualPath::root());
        for tick in 0..500 {
            let inc = tick_increment(id, tick, 10.0);
            assert!(inc > 0.0 && inc <= 10.0, "tick {} gave {}", tick, inc);
        }
        assert_eq!(tick_increment(id, 7, 10.0), tick_increment(id, 7, 10.0));
        assert_eq!(tick_increment(id, 7, 0.0), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_completes_then_clears() {
        let (store, memory, sim) = setup();
        let ids = sim.upload(vec![UploadDescriptor::new("a.txt", 500)]).unwrap();
        let id = ids[0];

        let mut ticks = 0;
        while !registered(&store, "a.txt") {
            sleep(Duration::from_millis(200)).await;
            ticks += 1;
            assert!(ticks < 2000, "upload never finished");
            let progress = store.read(|s| s.transfers().get(id).map(|r| r.progress));
            assert!(progress.map_or(true, |p| p <= 100.0));
        }

        let status = store.read(|s| s.transfers().get(id).map(|r| r.status.clone()));
        assert_eq!(status, Some(TransferStatus::Completed));
        assert_eq!(store.read(|s| s.registry().len()), 1);
        assert!(memory.save_count() >= 1);

        sleep(Duration::from_millis(3200)).await;
        assert!(store.read(|s| s.transfers().is_empty()));
        assert_eq!(sim.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_increment_still_finishes() {
        let memory = MemoryPersistence::new();
        let store = Arc::new(StoreHandle::new(FileStore::default(), memory));
        let config = TransferConfig {
            max_increment: 0.0,
            completion_grace_ms: 0,
            ..Default::default()
        };
        let sim = TransferSimulator::new(Arc::clone(&store), config);
        sim.upload(vec![UploadDescriptor::new("slow.bin", 1)]).unwrap();

        // Ticks add up to 0.1% each, about 2000 on average
        let mut ticks = 0;
        while !registered(&store, "slow.bin") {
            sleep(Duration::from_millis(200)).await;
            ticks += 1;
            assert!(ticks < 20_000, "upload never finished");
        }
        sleep(Duration::from_millis(200)).await;
        assert!(store.read(|s| s.transfers().is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_name_queues_nothing() {
        let (store, _memory, sim) = setup();
        let result = sim.upload(vec![
            UploadDescriptor::new("ok.txt", 1),
            UploadDescriptor::new("bad/name", 1),
        ]);
        assert!(result.is_err());
        assert!(store.read(|s| s.transfers().is_empty()));
        assert_eq!(sim.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_timers() {
        let (store, _memory, sim) = setup();
        sim.upload(vec![UploadDescriptor::new("a.txt", 500)]).unwrap();
        sim.shutdown();
        assert_eq!(sim.active(), 0);

        sleep(Duration::from_secs(60)).await;
        assert!(!registered(&store, "a.txt"));
        let status = store.read(|s| s.transfers().iter().next().map(|r| r.status.clone()));
        assert_eq!(status, Some(TransferStatus::Uploading));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_timers() {
        let (store, _memory, sim) = setup();
        sim.upload(vec![UploadDescriptor::new("a.txt", 500)]).unwrap();
        drop(sim);

        sleep(Duration::from_secs(60)).await;
        assert!(!registered(&store, "a.txt"));
    }
}
