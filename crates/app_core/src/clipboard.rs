//! Pending copy/cut payload

use crate::entry::EntryId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardMode {
    Copy,
    Cut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardPayload {
    pub mode: ClipboardMode,
    pub items: Vec<EntryId>,
}

/// Holds at most one pending operation
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    pending: Option<ClipboardPayload>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending operation; returns false (and leaves the
    /// clipboard as is) when `items` is empty
    pub fn set(&mut self, mode: ClipboardMode, items: Vec<EntryId>) -> bool {
        if items.is_empty() {
            return false;
        }
        self.pending = Some(ClipboardPayload { mode, items });
        true
    }

    pub fn pending(&self) -> Option<&ClipboardPayload> {
        self.pending.as_ref()
    }

    pub fn take(&mut self) -> Option<ClipboardPayload> {
        self.pending.take()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }

    /// Drop deleted ids; an emptied payload clears the clipboard
    pub fn remove_all(&mut self, ids: &[EntryId]) {
        if let Some(payload) = &mut self.pending {
            payload.items.retain(|id| !ids.contains(id));
            if payload.items.is_empty() {
                self.pending = None;
            }
        }
    }
}
