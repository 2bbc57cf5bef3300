//! Transfer queue: ephemeral progress records for simulated uploads
//!
//! State machine per record: `Uploading -> Completed` or
//! `Uploading -> Error`. Records are never persisted.

use crate::entry::UploadDescriptor;
use app_fs::VirtualPath;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TransferId(u64);

impl TransferId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transfer-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Uploading,
    Completed,
    Error(String),
}

impl TransferStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, TransferStatus::Uploading)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub id: TransferId,
    pub file_name: String,
    pub file_size: u64,
    pub parent_path: VirtualPath,
    /// 0.0 ..= 100.0
    pub progress: f32,
    /// Bytes per second over the last step
    pub speed: u64,
    pub status: TransferStatus,
    #[serde(skip)]
    upload: UploadDescriptor,
}

impl TransferRecord {
    pub fn upload(&self) -> &UploadDescriptor {
        &self.upload
    }
}

/// Outcome of one progress step
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Still uploading, at this percentage
    Progress(f32),
    /// Reached 100%; the caller registers the entry, then calls
    /// [`TransferQueue::complete`] or [`TransferQueue::fail`]
    Finished {
        upload: UploadDescriptor,
        parent: VirtualPath,
    },
}

#[derive(Debug, Clone, Default)]
pub struct TransferQueue {
    records: Vec<TransferRecord>,
    next_id: u64,
}

impl TransferQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking an upload into `parent`
    pub fn enqueue(&mut self, upload: UploadDescriptor, parent: VirtualPath) -> TransferId {
        self.next_id += 1;
        let id = TransferId(self.next_id);

        self.records.push(TransferRecord {
            id,
            file_name: upload.name.clone(),
            file_size: upload.size,
            parent_path: parent,
            progress: 0.0,
            speed: 0,
            status: TransferStatus::Uploading,
            upload,
        });

        tracing::debug!(%id, "Transfer queued");
        id
    }

    /// Add `increment` percent, observed over `elapsed`
    ///
    /// Returns `None` for unknown or already finished transfers.
    pub fn advance(&mut self, id: TransferId, increment: f32, elapsed: Duration) -> Option<Advance> {
        let record = self.get_mut(id)?;
        if record.status.is_finished() || record.progress >= 100.0 {
            return None;
        }

        let before = record.progress;
        record.progress = (before + increment.max(0.0)).min(100.0);

        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            let bytes = f64::from(record.progress - before) / 100.0 * record.file_size as f64;
            record.speed = (bytes / secs) as u64;
        }

        if record.progress >= 100.0 {
            Some(Advance::Finished {
                upload: record.upload.clone(),
                parent: record.parent_path.clone(),
            })
        } else {
            Some(Advance::Progress(record.progress))
        }
    }

    /// Mark an uploading record as completed
    pub fn complete(&mut self, id: TransferId) -> bool {
        match self.get_mut(id) {
            Some(record) if !record.status.is_finished() => {
                record.progress = 100.0;
                record.status = TransferStatus::Completed;
                tracing::info!(%id, file = %record.file_name, "Transfer completed");
                true
            }
            _ => false,
        }
    }

    /// Mark an uploading record as failed
    pub fn fail(&mut self, id: TransferId, reason: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(record) if !record.status.is_finished() => {
                let reason = reason.into();
                tracing::warn!(%id, file = %record.file_name, %reason, "Transfer failed");
                record.status = TransferStatus::Error(reason);
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, id: TransferId) -> Option<TransferRecord> {
        let idx = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(idx))
    }

    pub fn get(&self, id: TransferId) -> Option<&TransferRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn get_mut(&mut self, id: TransferId) -> Option<&mut TransferRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransferRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records still uploading
    pub fn active_count(&self) -> usize {
        self.records.iter().filter(|r| !r.status.is_finished()).count()
    }

    /// Drop every record; used on teardown
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
