//! Selection model for the current directory listing

use crate::entry::EntryId;
use std::collections::HashSet;

/// Keyboard modifiers held during a click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Ctrl on Windows/Linux, Cmd on macOS
    pub ctrl: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { ctrl: false, shift: false };
    pub const CTRL: Modifiers = Modifiers { ctrl: true, shift: false };
    pub const SHIFT: Modifiers = Modifiers { ctrl: false, shift: true };
}

/// Selected entry ids plus the anchor used for shift-click ranges
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: HashSet<EntryId>,
    last_selected: Option<EntryId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a click on `id`
    ///
    /// `listing` is the current directory order used to resolve shift ranges.
    pub fn select(&mut self, id: EntryId, modifiers: Modifiers, listing: &[EntryId]) {
        if modifiers.shift {
            if let Some(range) = self.range_to(id, listing) {
                self.selected.extend(range);
                return;
            }
            // No usable anchor: behave like a plain click
            self.select_single(id);
            return;
        }

        if modifiers.ctrl {
            if !self.selected.remove(&id) {
                self.selected.insert(id);
            }
            self.last_selected = Some(id);
            return;
        }

        self.select_single(id);
    }

    fn select_single(&mut self, id: EntryId) {
        self.selected.clear();
        self.selected.insert(id);
        self.last_selected = Some(id);
    }

    fn range_to(&self, target: EntryId, listing: &[EntryId]) -> Option<Vec<EntryId>> {
        if self.selected.is_empty() {
            return None;
        }
        let anchor = self.last_selected?;
        let ia = listing.iter().position(|id| *id == anchor)?;
        let it = listing.iter().position(|id| *id == target)?;
        let (lo, hi) = if ia <= it { (ia, it) } else { (it, ia) };
        Some(listing[lo..=hi].to_vec())
    }

    /// Select every entry of the listing
    pub fn select_all(&mut self, listing: &[EntryId]) {
        self.selected = listing.iter().copied().collect();
        self.last_selected = listing.last().copied();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.last_selected = None;
    }

    /// Drop ids that no longer exist
    pub fn remove_all(&mut self, ids: &[EntryId]) {
        for id in ids {
            self.selected.remove(id);
        }
        if self.last_selected.map_or(false, |last| ids.contains(&last)) {
            self.last_selected = None;
        }
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn last_selected(&self) -> Option<EntryId> {
        self.last_selected
    }

    /// Selected ids in listing order; ids not in the listing come last
    pub fn ordered(&self, listing: &[EntryId]) -> Vec<EntryId> {
        let mut ids: Vec<EntryId> = listing
            .iter()
            .filter(|id| self.selected.contains(id))
            .copied()
            .collect();
        let mut rest: Vec<EntryId> = self
            .selected
            .iter()
            .filter(|id| !listing.contains(id))
            .copied()
            .collect();
        rest.sort();
        ids.extend(rest);
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntryId> {
        self.selected.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<EntryId> {
        (0..n).map(|_| EntryId::new()).collect()
    }

    fn set(sel: &SelectionState) -> HashSet<EntryId> {
        sel.iter().copied().collect()
    }

    #[test]
    fn test_plain_click_replaces() {
        let l = ids(3);
        let mut sel = SelectionState::new();
        sel.select(l[0], Modifiers::NONE, &l);
        sel.select(l[1], Modifiers::NONE, &l);
        assert_eq!(set(&sel), HashSet::from([l[1]]));
        assert_eq!(sel.last_selected(), Some(l[1]));
    }

    #[test]
    fn test_ctrl_click_toggles() {
        let l = ids(3);
        let mut sel = SelectionState::new();
        sel.select(l[0], Modifiers::CTRL, &l);
        sel.select(l[2], Modifiers::CTRL, &l);
        assert_eq!(set(&sel), HashSet::from([l[0], l[2]]));
        sel.select(l[0], Modifiers::CTRL, &l);
        assert_eq!(set(&sel), HashSet::from([l[2]]));
    }

    #[test]
    fn test_shift_click_range() {
        let l = ids(3);
        let mut sel = SelectionState::new();
        sel.select(l[0], Modifiers::NONE, &l);
        sel.select(l[2], Modifiers::SHIFT, &l);
        assert_eq!(set(&sel), HashSet::from([l[0], l[1], l[2]]));
        // Anchor stays on the plain-clicked entry
        assert_eq!(sel.last_selected(), Some(l[0]));
    }

    #[test]
    fn test_shift_click_backwards_extends() {
        let l = ids(5);
        let mut sel = SelectionState::new();
        sel.select(l[4], Modifiers::CTRL, &l);
        sel.select(l[3], Modifiers::CTRL, &l);
        sel.select(l[1], Modifiers::SHIFT, &l);
        assert_eq!(set(&sel), HashSet::from([l[1], l[2], l[3], l[4]]));
    }

    #[test]
    fn test_shift_without_selection_is_plain() {
        let l = ids(3);
        let mut sel = SelectionState::new();
        sel.select(l[1], Modifiers::SHIFT, &l);
        assert_eq!(set(&sel), HashSet::from([l[1]]));

        // Anchor no longer listed
        let other = ids(2);
        sel.select(other[0], Modifiers::SHIFT, &other);
        assert_eq!(set(&sel), HashSet::from([other[0]]));
    }

    #[test]
    fn test_select_all_clear_prune() {
        let l = ids(3);
        let mut sel = SelectionState::new();
        sel.select_all(&l);
        assert_eq!(sel.len(), 3);
        assert_eq!(sel.ordered(&l), l);

        sel.remove_all(&[l[2]]);
        assert!(!sel.contains(&l[2]));
        assert_eq!(sel.last_selected(), None);

        sel.clear();
        assert!(sel.is_empty());
    }
}
