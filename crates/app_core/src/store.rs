//! FileStore: the single owner of all client state
//!
//! Registry, navigation, selection, clipboard, transfers and view settings
//! live together so cross-cutting rules hold in one call: deleting prunes
//! the selection and clipboard, changing directory clears the selection,
//! renaming a folder drags the current directory along.

use crate::clipboard::{Clipboard, ClipboardMode};
use crate::entry::{Entry, EntryId, UploadDescriptor};
use crate::error::{AppError, Result};
use crate::navigation::NavigationState;
use crate::persist::{Snapshot, SNAPSHOT_VERSION};
use crate::registry::EntryRegistry;
use crate::selection::{Modifiers, SelectionState};
use crate::transfer::{Advance, TransferId, TransferQueue, TransferStatus};
use crate::view::{self, SortBy, SortOrder, TypeFilter, ViewMode, ViewSettings};
use app_fs::{validate_name, VirtualPath};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct FileStore {
    registry: EntryRegistry,
    navigation: NavigationState,
    selection: SelectionState,
    clipboard: Clipboard,
    transfers: TransferQueue,
    view: ViewSettings,
    view_mode: ViewMode,
    /// Bumped whenever persisted state changes
    revision: u64,
}

impl FileStore {
    pub fn new(registry: EntryRegistry) -> Self {
        Self {
            registry,
            ..Default::default()
        }
    }

    /// Initial sort and view mode
    pub fn with_view_defaults(mut self, sort_by: SortBy, sort_order: SortOrder, view_mode: ViewMode) -> Self {
        self.view.sort_by = sort_by;
        self.view.sort_order = sort_order;
        self.view_mode = view_mode;
        self
    }

    /// Rebuild from a snapshot on top of an empty, configured registry
    pub fn from_snapshot(snapshot: Snapshot, registry: EntryRegistry) -> Self {
        let registry = registry.restore(snapshot.entries, snapshot.recents, snapshot.starred);

        let current = if registry.is_folder_path(&snapshot.current_path) {
            snapshot.current_path
        } else {
            tracing::warn!(path = %snapshot.current_path, "Stored directory no longer exists");
            VirtualPath::root()
        };

        tracing::info!(entries = registry.len(), path = %current, "Store restored");

        Self {
            registry,
            navigation: NavigationState::at(current),
            view: ViewSettings {
                sort_by: snapshot.sort_by,
                sort_order: snapshot.sort_order,
                ..Default::default()
            },
            view_mode: snapshot.view_mode,
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            current_path: self.navigation.current().clone(),
            entries: self.registry.entries().to_vec(),
            recents: self.registry.recent_ids().to_vec(),
            starred: self.registry.starred_ids().to_vec(),
            view_mode: self.view_mode,
            sort_by: self.view.sort_by,
            sort_order: self.view.sort_order,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // ===== Accessors =====

    pub fn registry(&self) -> &EntryRegistry {
        &self.registry
    }

    pub fn current_path(&self) -> &VirtualPath {
        self.navigation.current()
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn transfers(&self) -> &TransferQueue {
        &self.transfers
    }

    pub fn view_settings(&self) -> &ViewSettings {
        &self.view
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// View projection of the current directory
    pub fn listing(&self) -> Vec<&Entry> {
        view::list_directory(&self.registry, self.navigation.current(), &self.view)
    }

    pub fn listing_ids(&self) -> Vec<EntryId> {
        self.listing().iter().map(|e| e.id).collect()
    }

    pub fn breadcrumb(&self) -> Vec<VirtualPath> {
        view::breadcrumb(self.navigation.current())
    }

    /// Selected ids in listing order
    pub fn selected_ids(&self) -> Vec<EntryId> {
        let mut ids = self.selection.ordered(&self.listing_ids());
        // Selected entries hidden by the current filter go last
        let hidden: Vec<EntryId> = self
            .selection
            .iter()
            .filter(|id| !ids.contains(id))
            .copied()
            .collect();
        ids.extend(hidden);
        ids
    }

    // ===== Navigation =====

    /// Change directory; `NotFound` unless `path` is root or a live folder
    pub fn cd(&mut self, path: &VirtualPath) -> Result<()> {
        if !self.registry.is_folder_path(path) {
            return Err(AppError::NotFound(format!("folder {}", path)));
        }
        if self.navigation.navigate_to(path.clone()) {
            self.directory_changed();
        }
        Ok(())
    }

    pub fn go_back(&mut self) -> bool {
        let registry = &self.registry;
        let moved = self.navigation.go_back(|p| registry.is_folder_path(p));
        if moved {
            self.directory_changed();
        }
        moved
    }

    pub fn go_forward(&mut self) -> bool {
        let registry = &self.registry;
        let moved = self.navigation.go_forward(|p| registry.is_folder_path(p));
        if moved {
            self.directory_changed();
        }
        moved
    }

    pub fn go_up(&mut self) -> bool {
        let moved = self.navigation.go_up();
        if moved {
            self.directory_changed();
        }
        moved
    }

    fn directory_changed(&mut self) {
        self.selection.clear();
        tracing::debug!(path = %self.navigation.current(), "Directory changed");
        self.touch();
    }

    // ===== Registry mutations =====

    /// Create a folder in the current directory
    pub fn create_folder(&mut self, name: &str) -> Result<Entry> {
        let parent = self.navigation.current().clone();
        let entry = self.registry.create_folder(name, &parent)?;
        self.touch();
        Ok(entry)
    }

    pub fn rename(&mut self, id: &EntryId, new_name: &str) -> Result<Entry> {
        let old_path = self
            .registry
            .get(id)
            .map(|e| e.path.clone())
            .ok_or_else(|| AppError::NotFound(format!("entry {}", id)))?;

        let entry = self.registry.rename(id, new_name)?;
        if entry.is_folder() && entry.path != old_path {
            self.navigation.rebase(&old_path, &entry.path);
        }
        self.touch();
        Ok(entry)
    }

    pub fn move_entries(&mut self, ids: &[EntryId], destination: &VirtualPath) -> Result<Vec<EntryId>> {
        let folders: Vec<(EntryId, VirtualPath)> = ids
            .iter()
            .filter_map(|id| self.registry.get(id))
            .filter(|e| e.is_folder())
            .map(|e| (e.id, e.path.clone()))
            .collect();

        let moved = self.registry.move_entries(ids, destination)?;

        for (id, old_path) in folders {
            if let Some(entry) = self.registry.get(&id) {
                if entry.path != old_path {
                    self.navigation.rebase(&old_path, &entry.path);
                }
            }
        }
        if !moved.is_empty() {
            self.selection.clear();
            self.touch();
        }
        Ok(moved)
    }

    pub fn copy_entries(&mut self, ids: &[EntryId], destination: &VirtualPath) -> Result<Vec<Entry>> {
        let copies = self.registry.copy_entries(ids, destination)?;
        self.touch();
        Ok(copies)
    }

    /// Delete entries and prune every collection that refers to them
    pub fn delete(&mut self, ids: &[EntryId]) -> Result<Vec<EntryId>> {
        let removed = self.registry.delete_entries(ids)?;

        self.selection.remove_all(&removed);
        self.clipboard.remove_all(&removed);

        let registry = &self.registry;
        if self.navigation.retain(|p| registry.is_folder_path(p)) {
            self.selection.clear();
        }

        self.touch();
        Ok(removed)
    }

    pub fn delete_selection(&mut self) -> Result<Vec<EntryId>> {
        let ids = self.selected_ids();
        if ids.is_empty() {
            return Err(AppError::EmptySelection);
        }
        self.delete(&ids)
    }

    pub fn toggle_star(&mut self, id: &EntryId) -> Result<bool> {
        let starred = self.registry.toggle_star(id)?;
        self.touch();
        Ok(starred)
    }

    pub fn share(&mut self, ids: &[EntryId], recipients: &[String]) -> Result<()> {
        self.registry.share(ids, recipients)?;
        self.touch();
        Ok(())
    }

    pub fn add_tag(&mut self, id: &EntryId, tag: &str) -> Result<bool> {
        let added = self.registry.add_tag(id, tag)?;
        if added {
            self.touch();
        }
        Ok(added)
    }

    pub fn remove_tag(&mut self, id: &EntryId, tag: &str) -> Result<bool> {
        let removed = self.registry.remove_tag(id, tag)?;
        if removed {
            self.touch();
        }
        Ok(removed)
    }

    /// Record that an entry was opened
    pub fn open(&mut self, id: &EntryId) -> Result<()> {
        self.registry.touch_recent(id)?;
        self.touch();
        Ok(())
    }

    // ===== Selection & clipboard =====

    /// Click on an entry of the current listing
    pub fn select(&mut self, id: EntryId, modifiers: Modifiers) -> Result<()> {
        if !self.registry.contains(&id) {
            return Err(AppError::NotFound(format!("entry {}", id)));
        }
        let listing = self.listing_ids();
        self.selection.select(id, modifiers, &listing);
        Ok(())
    }

    pub fn select_all(&mut self) {
        let listing = self.listing_ids();
        self.selection.select_all(&listing);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn copy_selection(&mut self) -> Result<usize> {
        self.stage(ClipboardMode::Copy)
    }

    pub fn cut_selection(&mut self) -> Result<usize> {
        self.stage(ClipboardMode::Cut)
    }

    fn stage(&mut self, mode: ClipboardMode) -> Result<usize> {
        let items = self.selected_ids();
        let count = items.len();
        if !self.clipboard.set(mode, items) {
            tracing::debug!(?mode, "Nothing selected");
            return Err(AppError::EmptySelection);
        }
        tracing::info!(?mode, count, "Clipboard set");
        Ok(count)
    }

    /// Paste into the current directory
    pub fn paste(&mut self) -> Result<Vec<EntryId>> {
        let destination = self.navigation.current().clone();
        self.paste_into(&destination)
    }

    /// Copy or move the clipboard items into `destination`
    ///
    /// A cut clipboard is cleared only after the move succeeds.
    pub fn paste_into(&mut self, destination: &VirtualPath) -> Result<Vec<EntryId>> {
        let payload = self.clipboard.pending().cloned().ok_or(AppError::EmptySelection)?;

        match payload.mode {
            ClipboardMode::Copy => {
                let copies = self.copy_entries(&payload.items, destination)?;
                Ok(copies.into_iter().map(|e| e.id).collect())
            }
            ClipboardMode::Cut => {
                let moved = self.move_entries(&payload.items, destination)?;
                self.clipboard.clear();
                Ok(moved)
            }
        }
    }

    // ===== View settings =====

    /// Session-only search query
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.view.query = query.into();
    }

    /// Session-only type filter
    pub fn set_filter(&mut self, filter: TypeFilter) {
        self.view.filter = filter;
    }

    pub fn set_sort(&mut self, sort_by: SortBy, sort_order: SortOrder) {
        if self.view.sort_by != sort_by || self.view.sort_order != sort_order {
            self.view.sort_by = sort_by;
            self.view.sort_order = sort_order;
            self.touch();
        }
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view_mode != mode {
            self.view_mode = mode;
            self.touch();
        }
    }

    // ===== Transfers =====

    /// Queue a simulated upload into the current directory
    pub fn start_upload(&mut self, upload: UploadDescriptor) -> Result<TransferId> {
        let parent = self.navigation.current().clone();
        self.start_upload_into(upload, parent)
    }

    /// Queue a simulated upload into `parent`
    ///
    /// Name and destination are checked up front; a name clash is only
    /// detected at completion, when the entry is registered.
    pub fn start_upload_into(&mut self, upload: UploadDescriptor, parent: VirtualPath) -> Result<TransferId> {
        validate_name(&upload.name)?;
        if !self.registry.is_folder_path(&parent) {
            return Err(AppError::NotFound(format!("folder {}", parent)));
        }
        Ok(self.transfers.enqueue(upload, parent))
    }

    /// Advance a transfer; on reaching 100% the file is registered
    ///
    /// Returns the record's status after the step, `None` if the transfer
    /// is unknown or already finished.
    pub fn advance_transfer(&mut self, id: TransferId, increment: f32, elapsed: Duration) -> Option<TransferStatus> {
        match self.transfers.advance(id, increment, elapsed)? {
            Advance::Progress(_) => {}
            Advance::Finished { upload, parent } => match self.registry.register_upload(&upload, &parent) {
                Ok(_) => {
                    self.transfers.complete(id);
                    self.touch();
                }
                Err(e) => {
                    self.transfers.fail(id, e.user_message());
                }
            },
        }
        self.transfers.get(id).map(|r| r.status.clone())
    }

    pub fn fail_transfer(&mut self, id: TransferId, reason: impl Into<String>) -> bool {
        self.transfers.fail(id, reason)
    }

    pub fn remove_transfer(&mut self, id: TransferId) -> bool {
        self.transfers.remove(id).is_some()
    }

    pub fn clear_transfers(&mut self) {
        self.transfers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;

    fn p(s: &str) -> VirtualPath {
        VirtualPath::parse(s).unwrap()
    }

    fn upload(store: &mut FileStore, name: &str, size: u64) -> Entry {
        let id = store.start_upload(UploadDescriptor::new(name, size)).unwrap();
        assert_eq!(
            store.advance_transfer(id, 100.0, Duration::from_millis(200)),
            Some(TransferStatus::Completed)
        );
        store.remove_transfer(id);
        store.registry().get_by_path(&store.current_path().join(name).unwrap()).unwrap().clone()
    }

    fn names(store: &FileStore) -> Vec<String> {
        store.listing().iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn test_create_folder_and_conflict() {
        let mut store = FileStore::default();
        let docs = store.create_folder("Docs").unwrap();
        assert_eq!(docs.name, "Docs");
        assert_eq!(docs.path.as_str(), "/Docs");
        assert!(docs.parent_path.is_root());
        assert_eq!(docs.kind, EntryKind::Folder);

        assert!(matches!(store.create_folder("Docs"), Err(AppError::Conflict(_))));
        assert_eq!(store.registry().len(), 1);
    }

    #[test]
    fn test_upload_appears_in_listing() {
        let mut store = FileStore::default();
        store.create_folder("Docs").unwrap();
        store.cd(&p("/Docs")).unwrap();

        let file = upload(&mut store, "a.txt", 500);
        assert_eq!(file.size, 500);
        assert_eq!(file.parent_path, p("/Docs"));
        assert_eq!(names(&store), vec!["a.txt"]);
        assert_eq!(store.registry().recent_ids(), &[file.id]);
    }

    #[test]
    fn test_shift_click_selects_range() {
        let mut store = FileStore::default();
        let a = upload(&mut store, "A", 1);
        let b = upload(&mut store, "B", 1);
        let c = upload(&mut store, "C", 1);

        store.select(a.id, Modifiers::NONE).unwrap();
        store.select(c.id, Modifiers::SHIFT).unwrap();
        assert_eq!(store.selected_ids(), vec![a.id, b.id, c.id]);
    }

    #[test]
    fn test_cut_paste_moves_and_clears_clipboard() {
        let mut store = FileStore::default();
        store.create_folder("Docs").unwrap();
        store.create_folder("Images").unwrap();
        store.cd(&p("/Docs")).unwrap();
        let file = upload(&mut store, "a.txt", 500);

        store.select(file.id, Modifiers::NONE).unwrap();
        assert_eq!(store.cut_selection().unwrap(), 1);
        store.cd(&p("/Images")).unwrap();
        assert!(store.selection().is_empty());
        assert!(!store.clipboard().is_empty());

        store.paste().unwrap();
        assert!(store.registry().get_by_path(&p("/Docs/a.txt")).is_none());
        let moved = store.registry().get_by_path(&p("/Images/a.txt")).unwrap();
        assert_eq!(moved.size, 500);
        assert!(store.clipboard().is_empty());
    }

    #[test]
    fn test_copy_paste_keeps_clipboard() {
        let mut store = FileStore::default();
        let file = upload(&mut store, "a.txt", 5);
        store.create_folder("Backup").unwrap();

        store.select(file.id, Modifiers::NONE).unwrap();
        store.copy_selection().unwrap();
        store.paste_into(&p("/Backup")).unwrap();
        store.paste_into(&p("/Backup")).unwrap();

        assert!(store.registry().get_by_path(&p("/a.txt")).is_some());
        assert!(store.registry().get_by_path(&p("/Backup/a.txt")).is_some());
        assert!(store.registry().get_by_path(&p("/Backup/a (1).txt")).is_some());
        assert!(!store.clipboard().is_empty());
    }

    #[test]
    fn test_failed_cut_paste_keeps_clipboard() {
        let mut store = FileStore::default();
        let folder = store.create_folder("Docs").unwrap();
        store.select(folder.id, Modifiers::NONE).unwrap();
        store.cut_selection().unwrap();

        assert!(matches!(store.paste_into(&p("/Docs")), Err(AppError::InvalidPath(_))));
        assert!(!store.clipboard().is_empty());
    }

    #[test]
    fn test_empty_selection_is_noop() {
        let mut store = FileStore::default();
        let before = store.revision();
        assert!(matches!(store.copy_selection(), Err(AppError::EmptySelection)));
        assert!(matches!(store.paste(), Err(AppError::EmptySelection)));
        assert!(matches!(store.delete_selection(), Err(AppError::EmptySelection)));
        assert_eq!(store.revision(), before);
    }

    #[test]
    fn test_rename_folder_rebases_descendants_and_cwd() {
        let mut store = FileStore::default();
        let docs = store.create_folder("Docs").unwrap();
        store.cd(&p("/Docs")).unwrap();
        upload(&mut store, "a.txt", 1);

        store.rename(&docs.id, "Papers").unwrap();
        assert!(store.registry().get_by_path(&p("/Papers")).is_some());
        assert!(store.registry().get_by_path(&p("/Papers/a.txt")).is_some());
        assert_eq!(store.current_path(), &p("/Papers"));
        assert_eq!(names(&store), vec!["a.txt"]);
    }

    #[test]
    fn test_delete_prunes_everything() {
        let mut store = FileStore::default();
        let docs = store.create_folder("Docs").unwrap();
        store.cd(&p("/Docs")).unwrap();
        let file = upload(&mut store, "a.txt", 1);
        store.registry.toggle_star(&file.id).unwrap();
        store.select(file.id, Modifiers::NONE).unwrap();
        store.copy_selection().unwrap();

        let removed = store.delete(&[docs.id]).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(store.selection().is_empty());
        assert!(store.clipboard().is_empty());
        assert!(store.registry().recent_ids().is_empty());
        assert!(store.registry().starred_ids().is_empty());
        // The current directory was deleted
        assert!(store.current_path().is_root());
    }

    #[test]
    fn test_cd_rules() {
        let mut store = FileStore::default();
        let file = upload(&mut store, "a.txt", 1);
        store.create_folder("Docs").unwrap();

        assert!(matches!(store.cd(&p("/a.txt")), Err(AppError::NotFound(_))));
        assert!(matches!(store.cd(&p("/missing")), Err(AppError::NotFound(_))));

        store.select(file.id, Modifiers::NONE).unwrap();
        store.cd(&p("/Docs")).unwrap();
        assert!(store.selection().is_empty());

        assert!(store.go_back());
        assert!(store.current_path().is_root());
        assert!(store.go_forward());
        assert_eq!(store.current_path(), &p("/Docs"));
        assert!(store.go_up());
        assert!(store.current_path().is_root());
    }

    #[test]
    fn test_upload_conflict_becomes_error() {
        let mut store = FileStore::default();
        upload(&mut store, "a.txt", 1);

        let id = store.start_upload(UploadDescriptor::new("a.txt", 2)).unwrap();
        let status = store.advance_transfer(id, 150.0, Duration::from_millis(200));
        assert!(matches!(status, Some(TransferStatus::Error(_))));
        assert_eq!(store.transfers().get(id).unwrap().progress, 100.0);
        assert_eq!(store.registry().len(), 1);

        assert!(matches!(
            store.start_upload(UploadDescriptor::new("bad/name", 1)),
            Err(AppError::InvalidName(_))
        ));
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut store = FileStore::default();
        store.create_folder("Docs").unwrap();
        store.cd(&p("/Docs")).unwrap();
        let file = upload(&mut store, "a.txt", 7);
        store.toggle_star(&file.id).unwrap();
        store.set_sort(SortBy::Size, SortOrder::Descending);
        store.set_view_mode(ViewMode::List);
        store.set_query("zzz");

        let restored = FileStore::from_snapshot(store.snapshot(), EntryRegistry::default());
        assert_eq!(restored.registry().entries(), store.registry().entries());
        assert_eq!(restored.current_path(), &p("/Docs"));
        assert_eq!(restored.registry().starred_ids(), &[file.id]);
        assert_eq!(restored.view_mode(), ViewMode::List);
        assert_eq!(restored.view_settings().sort_by, SortBy::Size);
        // Query is session-only
        assert!(restored.view_settings().query.is_empty());
    }

    #[test]
    fn test_spaced_names_survive_reload() {
        let mut store = FileStore::default();
        assert!(matches!(store.create_folder("Docs "), Err(AppError::InvalidName(_))));
        assert!(store.registry().is_empty());

        store.create_folder("My Docs").unwrap();
        store.cd(&p("/My Docs")).unwrap();
        store.create_folder("2024 reports").unwrap();

        let json = serde_json::to_string(&store.snapshot()).unwrap();
        let snapshot: Snapshot = serde_json::from_str(&json).unwrap();
        let restored = FileStore::from_snapshot(snapshot, EntryRegistry::default());
        assert_eq!(restored.registry().len(), 2);
        assert_eq!(restored.current_path(), &p("/My Docs"));
        assert_eq!(
            restored.registry().entries(),
            store.registry().entries()
        );
    }

    #[test]
    fn test_move_clears_selection() {
        let mut store = FileStore::default();
        store.create_folder("Docs").unwrap();
        let a = upload(&mut store, "a.txt", 1);
        let b = upload(&mut store, "b.txt", 1);

        store.select(a.id, Modifiers::NONE).unwrap();
        store.select(b.id, Modifiers::CTRL).unwrap();
        let moved = store.move_entries(&[a.id], &p("/Docs")).unwrap();
        assert_eq!(moved, vec![a.id]);
        assert!(store.selection().is_empty());
        assert!(store.registry().get_by_path(&p("/Docs/a.txt")).is_some());
    }

    #[test]
    fn test_revision_tracks_persisted_changes() {
        let mut store = FileStore::default();
        let r0 = store.revision();
        store.set_query("x");
        store.set_filter(TypeFilter::Image);
        assert_eq!(store.revision(), r0);

        store.create_folder("Docs").unwrap();
        assert!(store.revision() > r0);

        let r1 = store.revision();
        assert!(store.create_folder("Docs").is_err());
        assert_eq!(store.revision(), r1);
    }
}
