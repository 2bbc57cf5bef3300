//! Entry registry: the canonical list of files and folders
//!
//! Every mutation validates completely before touching state, so a failed
//! call leaves the registry exactly as it was.

use crate::entry::{Entry, EntryId, EntryKind, UploadDescriptor};
use crate::error::{AppError, Result};
use app_fs::{validate_name, VirtualPath};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Source of timestamps for created/modified fields
pub type Clock = fn() -> DateTime<Utc>;

/// Default number of recent entries kept
pub const DEFAULT_RECENT_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct EntryRegistry {
    /// Insertion order is the tie-breaker for every listing
    entries: Vec<Entry>,
    /// Most recent first
    recents: Vec<EntryId>,
    /// Starring order
    starred: Vec<EntryId>,
    recent_limit: usize,
    owner_id: String,
    clock: Clock,
}

impl EntryRegistry {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            recents: Vec::new(),
            starred: Vec::new(),
            recent_limit: DEFAULT_RECENT_LIMIT,
            owner_id: owner_id.into(),
            clock: Utc::now,
        }
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self.recents.truncate(limit);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Rebuild a registry from persisted parts
    ///
    /// Entries that would break the tree invariants (duplicate paths,
    /// missing parent folder, name/path mismatch) are dropped with a warning.
    pub fn restore(
        mut self,
        entries: Vec<Entry>,
        recents: Vec<EntryId>,
        starred: Vec<EntryId>,
    ) -> Self {
        let mut order: Vec<usize> = (0..entries.len()).collect();
        order.sort_by_key(|&i| entries[i].path.depth());

        let mut paths: HashSet<VirtualPath> = HashSet::new();
        let mut folders: HashSet<VirtualPath> = HashSet::new();
        let mut ids: HashSet<EntryId> = HashSet::new();
        let mut accepted = vec![false; entries.len()];

        for i in order {
            let entry = &entries[i];
            let parent_ok = entry.parent_path.is_root() || folders.contains(&entry.parent_path);
            let shape_ok = entry.path.parent().as_ref() == Some(&entry.parent_path)
                && entry.path.file_name() == Some(entry.name.as_str());

            if !parent_ok || !shape_ok || paths.contains(&entry.path) || !ids.insert(entry.id) {
                tracing::warn!(path = %entry.path, "Dropping inconsistent entry from snapshot");
                continue;
            }

            paths.insert(entry.path.clone());
            if entry.is_folder() {
                folders.insert(entry.path.clone());
            }
            accepted[i] = true;
        }

        self.entries = entries
            .into_iter()
            .zip(accepted)
            .filter_map(|(entry, ok)| ok.then_some(entry))
            .collect();

        self.recents = recents.into_iter().filter(|id| self.contains(id)).collect();
        self.recents.truncate(self.recent_limit);

        let mut starred: Vec<EntryId> = starred
            .into_iter()
            .filter(|id| self.get(id).map_or(false, |e| e.is_starred))
            .collect();
        for entry in &self.entries {
            if entry.is_starred && !starred.contains(&entry.id) {
                starred.push(entry.id);
            }
        }
        self.starred = starred;

        self
    }

    // ===== Lookups =====

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in insertion order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn get(&self, id: &EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == *id)
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.get(id).is_some()
    }

    pub fn get_by_path(&self, path: &VirtualPath) -> Option<&Entry> {
        self.entries.iter().find(|e| e.path == *path)
    }

    /// Direct children of `path`, insertion order
    pub fn children<'a, 'p>(&'a self, path: &'p VirtualPath) -> impl Iterator<Item = &'a Entry> + 'p
    where
        'a: 'p,
    {
        self.entries.iter().filter(move |e| e.parent_path == *path)
    }

    /// Is `path` the root or a live folder?
    pub fn is_folder_path(&self, path: &VirtualPath) -> bool {
        path.is_root() || self.get_by_path(path).map_or(false, Entry::is_folder)
    }

    /// Recently used entries, most recent first
    pub fn recents(&self) -> Vec<&Entry> {
        self.recents.iter().filter_map(|id| self.get(id)).collect()
    }

    pub fn recent_ids(&self) -> &[EntryId] {
        &self.recents
    }

    /// Starred entries in starring order
    pub fn starred(&self) -> Vec<&Entry> {
        self.starred.iter().filter_map(|id| self.get(id)).collect()
    }

    pub fn starred_ids(&self) -> &[EntryId] {
        &self.starred
    }

    /// Sum of all file sizes
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    // ===== Creation =====

    /// Create an empty folder under `parent`
    pub fn create_folder(&mut self, name: &str, parent: &VirtualPath) -> Result<Entry> {
        let path = self.check_new_child(name, parent)?;
        let entry = self.new_entry(name, EntryKind::Folder, 0, path, None);

        tracing::info!(path = %entry.path, "Folder created");
        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// Register a finished upload as a file under `parent`
    pub fn register_upload(&mut self, upload: &UploadDescriptor, parent: &VirtualPath) -> Result<Entry> {
        let path = self.check_new_child(&upload.name, parent)?;
        let mime = upload
            .mime_type
            .clone()
            .or_else(|| app_fs::guess_mime(&upload.name).map(str::to_string));
        let entry = self.new_entry(&upload.name, EntryKind::File, upload.size, path, mime);

        tracing::info!(path = %entry.path, size = entry.size, "Upload registered");
        self.entries.push(entry.clone());
        self.push_recent(entry.id);
        Ok(entry)
    }

    fn check_new_child(&self, name: &str, parent: &VirtualPath) -> Result<VirtualPath> {
        validate_name(name)?;
        self.ensure_folder(parent)?;

        let path = parent.join(name)?;
        if self.get_by_path(&path).is_some() {
            return Err(AppError::Conflict(path.to_string()));
        }
        Ok(path)
    }

    fn new_entry(
        &self,
        name: &str,
        kind: EntryKind,
        size: u64,
        path: VirtualPath,
        mime_type: Option<String>,
    ) -> Entry {
        let now = (self.clock)();
        Entry {
            id: EntryId::new(),
            name: name.to_string(),
            kind,
            size,
            parent_path: path.parent().unwrap_or_default(),
            path,
            created_at: now,
            modified_at: now,
            owner_id: self.owner_id.clone(),
            mime_type,
            is_starred: false,
            is_shared: false,
            shared_with: Vec::new(),
            tags: Default::default(),
        }
    }

    // ===== Structural mutations =====

    /// Rename an entry in place; folders carry their whole subtree along
    pub fn rename(&mut self, id: &EntryId, new_name: &str) -> Result<Entry> {
        validate_name(new_name)?;
        let idx = self.index_of(id)?;

        if self.entries[idx].name == new_name {
            return Ok(self.entries[idx].clone());
        }

        let old_path = self.entries[idx].path.clone();
        let new_path = self.entries[idx].parent_path.join(new_name)?;

        let planned = self.plan_relocation(&[(old_path.clone(), new_path.clone())])?;
        self.apply_relocation(planned);

        let now = (self.clock)();
        let entry = &mut self.entries[idx];
        entry.name = new_name.to_string();
        entry.modified_at = now;

        tracing::info!(from = %old_path, to = %new_path, "Entry renamed");
        Ok(entry.clone())
    }

    /// Move entries (with their subtrees) into `destination`
    ///
    /// Entries already in `destination` are left alone. Returns the ids of
    /// the entries that actually moved.
    pub fn move_entries(&mut self, ids: &[EntryId], destination: &VirtualPath) -> Result<Vec<EntryId>> {
        self.ensure_folder(destination)?;
        let roots = self.subtree_roots(ids)?;

        let mut moves = Vec::new();
        let mut moved = Vec::new();
        for idx in roots {
            let entry = &self.entries[idx];
            if entry.is_folder() && destination.starts_with(&entry.path) {
                return Err(AppError::InvalidPath(format!(
                    "cannot move {} into itself",
                    entry.path
                )));
            }
            if entry.parent_path == *destination {
                continue;
            }
            moves.push((entry.path.clone(), destination.join(&entry.name)?));
            moved.push(idx);
        }

        let planned = self.plan_relocation(&moves)?;
        self.apply_relocation(planned);

        let now = (self.clock)();
        let moved_ids: Vec<EntryId> = moved
            .into_iter()
            .map(|idx| {
                self.entries[idx].modified_at = now;
                self.entries[idx].id
            })
            .collect();

        tracing::info!(count = moved_ids.len(), to = %destination, "Entries moved");
        Ok(moved_ids)
    }

    /// Deep-copy entries (with their subtrees) into `destination`
    ///
    /// Name clashes in the destination get a ` (n)` suffix. Returns the new
    /// top-level copies.
    pub fn copy_entries(&mut self, ids: &[EntryId], destination: &VirtualPath) -> Result<Vec<Entry>> {
        self.ensure_folder(destination)?;
        let roots = self.subtree_roots(ids)?;

        for &idx in &roots {
            let entry = &self.entries[idx];
            if entry.is_folder() && destination.starts_with(&entry.path) {
                return Err(AppError::InvalidPath(format!(
                    "cannot copy {} into itself",
                    entry.path
                )));
            }
        }

        let mut occupied: HashSet<VirtualPath> = self.entries.iter().map(|e| e.path.clone()).collect();
        let mut staged: Vec<Entry> = Vec::new();
        let mut top_level = Vec::new();
        let now = (self.clock)();

        for idx in roots {
            let source = &self.entries[idx];
            let name = free_name(destination, &source.name, source.is_folder(), &occupied)?;
            let new_root = destination.join(&name)?;

            for original in self.entries.iter().filter(|e| e.path.starts_with(&source.path)) {
                let Some(path) = original.path.rebase(&source.path, &new_root) else {
                    continue;
                };

                let mut copy = original.clone();
                copy.id = EntryId::new();
                if original.id == source.id {
                    copy.name = name.clone();
                }
                copy.parent_path = path.parent().unwrap_or_default();
                copy.path = path;
                copy.created_at = now;
                copy.modified_at = now;
                copy.owner_id = self.owner_id.clone();
                copy.is_starred = false;
                copy.is_shared = false;
                copy.shared_with.clear();

                if !occupied.insert(copy.path.clone()) {
                    return Err(AppError::Conflict(copy.path.to_string()));
                }
                if original.id == source.id {
                    top_level.push(copy.clone());
                }
                staged.push(copy);
            }
        }

        tracing::info!(count = staged.len(), to = %destination, "Entries copied");
        self.entries.extend(staged);
        Ok(top_level)
    }

    /// Delete entries and every descendant of deleted folders
    ///
    /// Returns all removed ids so dependents (selection, clipboard) can be
    /// pruned in the same step.
    pub fn delete_entries(&mut self, ids: &[EntryId]) -> Result<Vec<EntryId>> {
        let roots: Vec<VirtualPath> = self
            .subtree_roots(ids)?
            .into_iter()
            .map(|idx| self.entries[idx].path.clone())
            .collect();

        let mut removed = Vec::new();
        self.entries.retain(|e| {
            let doomed = roots.iter().any(|root| e.path.starts_with(root));
            if doomed {
                removed.push(e.id);
            }
            !doomed
        });

        let gone: HashSet<EntryId> = removed.iter().copied().collect();
        self.recents.retain(|id| !gone.contains(id));
        self.starred.retain(|id| !gone.contains(id));

        tracing::info!(count = removed.len(), "Entries deleted");
        Ok(removed)
    }

    // ===== Metadata mutations =====

    /// Flip the star flag; returns the new state
    pub fn toggle_star(&mut self, id: &EntryId) -> Result<bool> {
        let idx = self.index_of(id)?;
        let now = (self.clock)();

        let entry = &mut self.entries[idx];
        entry.is_starred = !entry.is_starred;
        entry.modified_at = now;
        let starred = entry.is_starred;

        if starred {
            self.starred.push(*id);
        } else {
            self.starred.retain(|s| s != id);
        }

        tracing::debug!(%id, starred, "Star toggled");
        Ok(starred)
    }

    /// Replace the recipient list of each entry
    ///
    /// An empty recipient list unshares.
    pub fn share(&mut self, ids: &[EntryId], recipients: &[String]) -> Result<()> {
        let indexes = ids
            .iter()
            .map(|id| self.index_of(id))
            .collect::<Result<Vec<_>>>()?;
        let now = (self.clock)();

        for idx in indexes {
            let entry = &mut self.entries[idx];
            entry.shared_with = recipients.to_vec();
            entry.is_shared = !recipients.is_empty();
            entry.modified_at = now;
        }

        tracing::info!(count = ids.len(), recipients = recipients.len(), "Entries shared");
        Ok(())
    }

    /// Attach a label; returns false if it was already present
    pub fn add_tag(&mut self, id: &EntryId, tag: &str) -> Result<bool> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(AppError::InvalidName("tag must not be empty".to_string()));
        }

        let idx = self.index_of(id)?;
        let now = (self.clock)();
        let entry = &mut self.entries[idx];
        let added = entry.tags.insert(tag.to_string());
        if added {
            entry.modified_at = now;
        }
        Ok(added)
    }

    /// Detach a label; returns false if it was not present
    pub fn remove_tag(&mut self, id: &EntryId, tag: &str) -> Result<bool> {
        let idx = self.index_of(id)?;
        let now = (self.clock)();
        let entry = &mut self.entries[idx];
        let removed = entry.tags.remove(tag.trim());
        if removed {
            entry.modified_at = now;
        }
        Ok(removed)
    }

    /// Mark an entry as recently used
    pub fn touch_recent(&mut self, id: &EntryId) -> Result<()> {
        self.index_of(id)?;
        self.push_recent(*id);
        Ok(())
    }

    // ===== Internals =====

    fn push_recent(&mut self, id: EntryId) {
        self.recents.retain(|r| *r != id);
        self.recents.insert(0, id);
        self.recents.truncate(self.recent_limit);
    }

    fn index_of(&self, id: &EntryId) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.id == *id)
            .ok_or_else(|| AppError::NotFound(format!("entry {}", id)))
    }

    fn ensure_folder(&self, path: &VirtualPath) -> Result<()> {
        if self.is_folder_path(path) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("folder {}", path)))
        }
    }

    /// Resolve ids to indexes, dropping duplicates and entries that already
    /// lie inside another named folder
    fn subtree_roots(&self, ids: &[EntryId]) -> Result<Vec<usize>> {
        let mut indexes: Vec<usize> = Vec::with_capacity(ids.len());
        for id in ids {
            let idx = self.index_of(id)?;
            if !indexes.contains(&idx) {
                indexes.push(idx);
            }
        }

        let roots = indexes
            .iter()
            .copied()
            .filter(|&idx| {
                let path = &self.entries[idx].path;
                !indexes
                    .iter()
                    .any(|&other| other != idx && path.is_descendant_of(&self.entries[other].path))
            })
            .collect();

        Ok(roots)
    }

    /// Compute new paths for every entry under each `(from, to)` pair and
    /// check they collide neither with untouched entries nor with each other
    fn plan_relocation(&self, moves: &[(VirtualPath, VirtualPath)]) -> Result<Vec<(usize, VirtualPath)>> {
        let planned: Vec<(usize, VirtualPath)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(idx, entry)| {
                moves
                    .iter()
                    .find_map(|(from, to)| entry.path.rebase(from, to))
                    .map(|path| (idx, path))
            })
            .collect();

        let moving: HashSet<usize> = planned.iter().map(|(idx, _)| *idx).collect();
        let occupied: HashSet<&VirtualPath> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(idx, _)| !moving.contains(idx))
            .map(|(_, e)| &e.path)
            .collect();

        let mut landing: HashSet<&VirtualPath> = HashSet::new();
        for (_, path) in &planned {
            if occupied.contains(path) || !landing.insert(path) {
                return Err(AppError::Conflict(path.to_string()));
            }
        }

        Ok(planned)
    }

    fn apply_relocation(&mut self, planned: Vec<(usize, VirtualPath)>) {
        for (idx, path) in planned {
            let entry = &mut self.entries[idx];
            entry.parent_path = path.parent().unwrap_or_default();
            entry.path = path;
        }
    }
}

impl Default for EntryRegistry {
    fn default() -> Self {
        Self::new("current-user")
    }
}

/// First name not taken in `dir`: `name`, then `stem (1).ext`, `stem (2).ext`, ...
fn free_name(dir: &VirtualPath, name: &str, is_folder: bool, occupied: &HashSet<VirtualPath>) -> Result<String> {
    if !occupied.contains(&dir.join(name)?) {
        return Ok(name.to_string());
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !is_folder && !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    let mut n = 1usize;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        if !occupied.contains(&dir.join(&candidate)?) {
            return Ok(candidate);
        }
        n += 1;
    }
}
